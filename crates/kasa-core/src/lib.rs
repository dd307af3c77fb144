// kasa-core: Device sessions and typed device state for Kasa smart plugs.

pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::PlugConfig;
pub use error::{CoreError, ErrorKind, Property};
pub use session::{ConnectionState, Session};

pub use model::{
    DeviceInfo, DeviceState, DeviceTime, Energy, Location, MacAddress, ScheduledAction,
};

// Wire-level types callers need for raw exchanges.
pub use kasa_api::{Command, Request, Response};
