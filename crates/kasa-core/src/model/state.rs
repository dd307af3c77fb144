// Device state: the caller-owned, unit-normalized snapshot of a plug.
//
// The session writes into a `DeviceState` only while an operation holds
// it; nothing mutates it in the background.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use super::identity::MacAddress;

/// Last known properties of one plug.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeviceState {
    /// User-assigned name.
    pub alias: String,
    pub icon_hash: String,
    /// Relay closed.
    pub power_on: bool,
    /// Indicator light lit (the inverse of the wire's `led_off`).
    pub light_on: bool,
    /// Seconds since the relay last switched on.
    pub uptime_secs: u64,
    pub info: DeviceInfo,
    /// Wi-Fi signal strength in dBm.
    pub signal_strength: i64,
    pub location: Location,
    pub next_action: ScheduledAction,
    pub time: Option<DeviceTime>,
    pub energy: Energy,
    /// When `refresh_state` last completed.
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Identity and firmware facts from `get_sysinfo`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    /// Product name, e.g. "Wi-Fi Smart Plug With Energy Monitoring".
    pub name: String,
    pub model: String,
    pub device_id: String,
    pub hardware_id: String,
    pub oem_id: String,
    pub hardware_version: String,
    pub firmware_version: String,
    /// Capability flags, e.g. `["TIM", "ENE"]`.
    pub features: Vec<String>,
    pub mac: MacAddress,
    pub status: String,
    pub updating: bool,
    pub obd_src: String,
    pub mic_type: String,
    pub ntc_state: i64,
}

impl DeviceInfo {
    /// Whether the plug advertises energy monitoring.
    pub fn has_energy_meter(&self) -> bool {
        self.features.iter().any(|f| f == "ENE")
    }
}

/// Geolocation in decimal degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// The plug's next pending scheduled action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduledAction {
    /// Active scheduling mode, e.g. `"schedule"` or `"none"`.
    pub mode: String,
    pub action_type: i64,
    pub id: String,
    /// Seconds after local midnight at which the action fires.
    pub scheduled_secs: i64,
    pub action: i64,
}

/// The plug's wall clock.
///
/// The firmware reports its timezone only as an index into its own table;
/// the offset here is always zero and the raw index is kept alongside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeviceTime {
    pub local: DateTime<FixedOffset>,
    pub timezone_index: i64,
}

/// Energy telemetry in base units. `total_wh` is cumulative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Energy {
    pub current_a: f64,
    pub voltage_v: f64,
    pub power_w: f64,
    pub total_wh: i64,
}
