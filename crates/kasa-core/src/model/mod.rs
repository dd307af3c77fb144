// Domain model for a single plug.

pub mod identity;
pub mod state;

pub use identity::MacAddress;
pub use state::{DeviceInfo, DeviceState, DeviceTime, Energy, Location, ScheduledAction};
