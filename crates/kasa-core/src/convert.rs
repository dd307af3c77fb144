// ── API-to-domain type conversions ──
//
// Bridges raw `kasa_api` response types into `kasa_core::model` types.
// Fixed-point coordinates and milli-units are scaled to base units, the
// inverted LED flag is flipped, and calendar fields are validated.

use chrono::{FixedOffset, NaiveDate, TimeZone as _};

use kasa_api::models::{DeviceClock, NextAction, Realtime, SysInfo, TimeZone};

use crate::error::CoreError;
use crate::model::{
    DeviceInfo, DeviceState, DeviceTime, Energy, Location, MacAddress, ScheduledAction,
};

// ── Helpers ────────────────────────────────────────────────────────

/// Divide a raw wire integer down to base units.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn scaled(raw: i64, divisor: f64) -> f64 {
    raw as f64 / divisor
}

fn calendar_field(name: &str, value: i64) -> Result<u32, CoreError> {
    u32::try_from(value).map_err(|_| CoreError::Protocol {
        message: format!("invalid {name} in device time: {value}"),
    })
}

// ── SysInfo ────────────────────────────────────────────────────────

impl From<&SysInfo> for DeviceInfo {
    fn from(raw: &SysInfo) -> Self {
        Self {
            name: raw.dev_name.clone(),
            model: raw.model.clone(),
            device_id: raw.device_id.clone(),
            hardware_id: raw.hw_id.clone(),
            oem_id: raw.oem_id.clone(),
            hardware_version: raw.hw_ver.clone(),
            firmware_version: raw.sw_ver.clone(),
            features: raw
                .feature
                .split(':')
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect(),
            mac: MacAddress::new(&raw.mac),
            status: raw.status.clone(),
            updating: raw.updating != 0,
            obd_src: raw.obd_src.clone(),
            mic_type: raw.mic_type.clone(),
            ntc_state: raw.ntc_state,
        }
    }
}

impl Location {
    /// Convert fixed-point `*_i` fields (1e-4 degree resolution).
    pub fn from_fixed(latitude_i: i64, longitude_i: i64) -> Self {
        Self {
            latitude: scaled(latitude_i, 10_000.0),
            longitude: scaled(longitude_i, 10_000.0),
        }
    }
}

impl ScheduledAction {
    fn from_wire(mode: &str, next: &NextAction) -> Self {
        Self {
            mode: mode.to_owned(),
            action_type: next.action_type,
            id: next.id.clone(),
            scheduled_secs: next.schd_sec,
            action: next.action,
        }
    }
}

impl DeviceState {
    /// Overwrite every sysinfo-derived field from a fresh snapshot.
    pub fn apply_sysinfo(&mut self, raw: &SysInfo) {
        self.alias.clone_from(&raw.alias);
        self.icon_hash.clone_from(&raw.icon_hash);
        self.power_on = raw.relay_state != 0;
        self.light_on = raw.led_off == 0;
        self.uptime_secs = u64::try_from(raw.on_time).unwrap_or(0);
        self.info = DeviceInfo::from(raw);
        self.signal_strength = raw.rssi;
        self.location = Location::from_fixed(raw.latitude_i, raw.longitude_i);
        self.next_action = ScheduledAction::from_wire(&raw.active_mode, &raw.next_action);
    }
}

// ── Energy ─────────────────────────────────────────────────────────

impl From<&Realtime> for Energy {
    fn from(raw: &Realtime) -> Self {
        Self {
            current_a: scaled(raw.current_ma, 1000.0),
            voltage_v: scaled(raw.voltage_mv, 1000.0),
            power_w: scaled(raw.power_mw, 1000.0),
            total_wh: raw.total_wh,
        }
    }
}

// ── Time ───────────────────────────────────────────────────────────

impl DeviceTime {
    /// Assemble the plug's clock from its separate calendar fields.
    ///
    /// Out-of-range fields (month 13, Feb 30, negative values) are a
    /// protocol error.
    pub fn from_wire(clock: &DeviceClock, zone: &TimeZone) -> Result<Self, CoreError> {
        let invalid = || CoreError::Protocol {
            message: format!(
                "invalid device time {}-{:02}-{:02} {:02}:{:02}:{:02}",
                clock.year, clock.month, clock.mday, clock.hour, clock.min, clock.sec
            ),
        };
        let year = i32::try_from(clock.year).map_err(|_| invalid())?;
        let naive = NaiveDate::from_ymd_opt(
            year,
            calendar_field("month", clock.month)?,
            calendar_field("day", clock.mday)?,
        )
        .and_then(|date| {
            date.and_hms_opt(
                u32::try_from(clock.hour).ok()?,
                u32::try_from(clock.min).ok()?,
                u32::try_from(clock.sec).ok()?,
            )
        })
        .ok_or_else(invalid)?;

        let offset = FixedOffset::east_opt(0).ok_or_else(invalid)?;
        let local = offset.from_local_datetime(&naive).single().ok_or_else(invalid)?;
        Ok(Self {
            local,
            timezone_index: zone.index,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sysinfo() -> SysInfo {
        SysInfo {
            alias: "Desk Lamp".into(),
            dev_name: "Smart Wi-Fi Plug With Energy Monitoring".into(),
            model: "HS110(EU)".into(),
            feature: "TIM:ENE".into(),
            mac: "50:C7:BF:00:11:22".into(),
            relay_state: 1,
            led_off: 0,
            on_time: 3600,
            rssi: -61,
            latitude_i: 515_074,
            longitude_i: -1278,
            active_mode: "schedule".into(),
            next_action: NextAction {
                action_type: 1,
                id: "6C7E9A".into(),
                schd_sec: 68_400,
                action: 0,
            },
            ..SysInfo::default()
        }
    }

    #[test]
    fn sysinfo_maps_flags_and_identity() {
        let mut state = DeviceState::default();
        state.apply_sysinfo(&sysinfo());

        assert!(state.power_on);
        assert!(state.light_on);
        assert_eq!(state.uptime_secs, 3600);
        assert_eq!(state.signal_strength, -61);
        assert_eq!(state.info.features, vec!["TIM".to_owned(), "ENE".to_owned()]);
        assert!(state.info.has_energy_meter());
        assert_eq!(state.info.mac.as_str(), "50:c7:bf:00:11:22");
        assert_eq!(
            state.next_action,
            ScheduledAction {
                mode: "schedule".into(),
                action_type: 1,
                id: "6C7E9A".into(),
                scheduled_secs: 68_400,
                action: 0,
            }
        );
    }

    #[test]
    fn led_flag_is_inverted() {
        let mut state = DeviceState::default();
        let mut raw = sysinfo();

        raw.led_off = 1;
        raw.relay_state = 0;
        state.apply_sysinfo(&raw);
        assert!(!state.light_on);
        assert!(!state.power_on);

        raw.led_off = 0;
        state.apply_sysinfo(&raw);
        assert!(state.light_on);
    }

    #[test]
    fn coordinates_are_decimal_degrees() {
        let location = Location::from_fixed(515_074, -1278);
        assert!((location.latitude - 51.5074).abs() < 1e-9);
        assert!((location.longitude + 0.1278).abs() < 1e-9);
    }

    #[test]
    fn energy_is_in_base_units() {
        let energy = Energy::from(&Realtime {
            current_ma: 1234,
            voltage_mv: 230_000,
            power_mw: 5000,
            total_wh: 42,
            ..Realtime::default()
        });
        assert!((energy.current_a - 1.234).abs() < 1e-9);
        assert!((energy.voltage_v - 230.0).abs() < 1e-9);
        assert!((energy.power_w - 5.0).abs() < 1e-9);
        assert_eq!(energy.total_wh, 42);
    }

    #[test]
    fn negative_uptime_clamps_to_zero() {
        let mut state = DeviceState::default();
        state.apply_sysinfo(&SysInfo {
            on_time: -5,
            ..sysinfo()
        });
        assert_eq!(state.uptime_secs, 0);
    }

    #[test]
    fn device_time_from_calendar_fields() {
        let clock = DeviceClock {
            year: 2024,
            month: 2,
            mday: 29,
            hour: 13,
            min: 5,
            sec: 9,
            ..DeviceClock::default()
        };
        let time = DeviceTime::from_wire(&clock, &TimeZone { index: 39, ..TimeZone::default() })
            .unwrap();
        assert_eq!(time.local.to_rfc3339(), "2024-02-29T13:05:09+00:00");
        assert_eq!(time.timezone_index, 39);
    }

    #[test]
    fn impossible_date_is_protocol_error() {
        let clock = DeviceClock {
            year: 2023,
            month: 2,
            mday: 30,
            ..DeviceClock::default()
        };
        let err = DeviceTime::from_wire(&clock, &TimeZone::default()).unwrap_err();
        assert!(matches!(err, CoreError::Protocol { .. }));

        let clock = DeviceClock {
            year: 2023,
            month: -1,
            mday: 1,
            ..DeviceClock::default()
        };
        assert!(DeviceTime::from_wire(&clock, &TimeZone::default()).is_err());
    }
}
