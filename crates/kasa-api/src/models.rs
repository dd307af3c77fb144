// Response schema
//
// Models for every response shape the plug firmware returns. A response
// mirrors the request namespace and only populates the sub-object of the
// issued command. Every struct is `#[serde(default)]` because firmware
// revisions disagree about which fields are present; unknown fields are
// ignored.

use serde::{Deserialize, Serialize};

use crate::command::{Command, Target};
use crate::error::Error;

// ── Response Envelope ────────────────────────────────────────────────

/// Decoded response envelope.
///
/// ```json
/// { "system": { "get_sysinfo": { "err_code": 0, ... } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    pub system: Option<SystemResponse>,
    pub time: Option<TimeResponse>,
    pub emeter: Option<EmeterResponse>,
}

impl Response {
    /// Parse a decrypted response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(body).map_err(|e| {
            let body = String::from_utf8_lossy(body).into_owned();
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    /// Status reported for `command`: its own sub-object if present,
    /// otherwise the namespace-level status some firmware returns instead
    /// (e.g. `{"emeter":{"err_code":-1,"err_msg":"module not support"}}`).
    fn status_of(&self, command: Command) -> Option<(&Status, bool)> {
        let namespace = match command.target() {
            Target::System => self.system.as_ref().map(|s| (&s.status, s.result(command))),
            Target::Time => self.time.as_ref().map(|t| (&t.status, t.result(command))),
            Target::Emeter => self.emeter.as_ref().map(|e| (&e.status, e.result(command))),
        };
        match namespace? {
            (_, Some(result)) => Some((result, true)),
            (status, None) => Some((status, false)),
        }
    }

    /// Check the authoritative `err_code` for `command`.
    ///
    /// Returns `Error::Device` for a non-zero code and
    /// `Error::MissingResponse` if the reply carries no result for it.
    pub fn check(&self, command: Command) -> Result<(), Error> {
        let missing = || Error::MissingResponse {
            target: command.target().to_string(),
            command: command.name().into(),
        };
        let (status, present) = self.status_of(command).ok_or_else(missing)?;
        if status.err_code != 0 {
            return Err(Error::Device {
                target: command.target().to_string(),
                command: command.name().into(),
                code: status.err_code,
                message: status.err_msg.clone(),
            });
        }
        if present { Ok(()) } else { Err(missing()) }
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// `err_code` / `err_msg` pair carried by every sub-object. `0` means success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub err_code: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err_msg: Option<String>,
}

// ── system ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemResponse {
    pub get_sysinfo: Option<SysInfo>,
    pub set_relay_state: Option<Status>,
    pub set_led_off: Option<Status>,
    pub reboot: Option<Status>,
    /// Namespace-level status (present when the whole module rejects a call).
    #[serde(flatten)]
    pub status: Status,
}

impl SystemResponse {
    fn result(&self, command: Command) -> Option<&Status> {
        match command {
            Command::GetSysInfo => self.get_sysinfo.as_ref().map(|r| &r.status_code),
            Command::SetRelayState { .. } => self.set_relay_state.as_ref(),
            Command::SetLedOff { .. } => self.set_led_off.as_ref(),
            Command::Reboot { .. } => self.reboot.as_ref(),
            _ => None,
        }
    }
}

/// `system.get_sysinfo` payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysInfo {
    pub sw_ver: String,
    pub hw_ver: String,
    pub model: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(rename = "oemId")]
    pub oem_id: String,
    #[serde(rename = "hwId")]
    pub hw_id: String,
    /// Wi-Fi signal strength in dBm.
    pub rssi: i64,
    /// Fixed-point latitude, 1e-4 degree resolution.
    pub latitude_i: i64,
    /// Fixed-point longitude, 1e-4 degree resolution.
    pub longitude_i: i64,
    pub alias: String,
    pub status: String,
    pub obd_src: String,
    pub mic_type: String,
    /// Colon-separated feature flags, e.g. `"TIM:ENE"`.
    pub feature: String,
    pub mac: String,
    pub updating: i64,
    /// Inverted: `0` means the indicator light is on.
    pub led_off: i64,
    pub relay_state: i64,
    /// Seconds since the relay last switched on.
    pub on_time: i64,
    pub icon_hash: String,
    pub dev_name: String,
    pub active_mode: String,
    pub next_action: NextAction,
    pub ntc_state: i64,
    /// `err_code`/`err_msg`; the wire's own `status` field is the string above.
    #[serde(flatten)]
    pub status_code: Status,
}

/// Pending scheduled action from `get_sysinfo.next_action`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextAction {
    #[serde(rename = "type")]
    pub action_type: i64,
    pub id: String,
    pub schd_sec: i64,
    pub action: i64,
}

// ── time ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeResponse {
    pub get_time: Option<DeviceClock>,
    pub get_timezone: Option<TimeZone>,
    #[serde(flatten)]
    pub status: Status,
}

impl TimeResponse {
    fn result(&self, command: Command) -> Option<&Status> {
        match command {
            Command::GetTime => self.get_time.as_ref().map(|r| &r.status),
            Command::GetTimezone => self.get_timezone.as_ref().map(|r| &r.status),
            _ => None,
        }
    }
}

/// `time.get_time` payload: the plug's local wall clock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceClock {
    pub year: i64,
    pub month: i64,
    pub mday: i64,
    pub hour: i64,
    pub min: i64,
    pub sec: i64,
    #[serde(flatten)]
    pub status: Status,
}

/// `time.get_timezone` payload. `index` refers to the firmware's own
/// timezone table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeZone {
    pub index: i64,
    #[serde(flatten)]
    pub status: Status,
}

// ── emeter ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmeterResponse {
    pub get_realtime: Option<Realtime>,
    pub get_daystat: Option<DayStat>,
    pub get_monthstat: Option<MonthStat>,
    #[serde(flatten)]
    pub status: Status,
}

impl EmeterResponse {
    fn result(&self, command: Command) -> Option<&Status> {
        match command {
            Command::GetRealtime => self.get_realtime.as_ref().map(|r| &r.status),
            Command::GetDayStat { .. } => self.get_daystat.as_ref().map(|r| &r.status),
            Command::GetMonthStat { .. } => self.get_monthstat.as_ref().map(|r| &r.status),
            _ => None,
        }
    }
}

/// `emeter.get_realtime` payload, in milli-units except `total_wh`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Realtime {
    pub current_ma: i64,
    pub voltage_mv: i64,
    pub power_mw: i64,
    pub total_wh: i64,
    #[serde(flatten)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayStat {
    pub day_list: Vec<DayEnergy>,
    #[serde(flatten)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayEnergy {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub energy_wh: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthStat {
    pub month_list: Vec<MonthEnergy>,
    #[serde(flatten)]
    pub status: Status,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonthEnergy {
    pub year: i64,
    pub month: i64,
    pub energy_wh: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HS110_SYSINFO: &str = r#"{"system":{"get_sysinfo":{
        "err_code":0,"sw_ver":"1.2.5 Build 171213 Rel.101523","hw_ver":"1.0",
        "type":"IOT.SMARTPLUGSWITCH","model":"HS110(EU)","mac":"50:C7:BF:00:11:22",
        "deviceId":"8006ABCDEF","hwId":"45E29DA8382494D2E82688B52A0B2EB5",
        "fwId":"00000000000000000000000000000000","oemId":"3D341ECE302C0642C99E31CE2430544B",
        "alias":"Desk Lamp","dev_name":"Wi-Fi Smart Plug With Energy Monitoring",
        "icon_hash":"","relay_state":1,"on_time":3600,"active_mode":"schedule",
        "feature":"TIM:ENE","updating":0,"rssi":-52,"led_off":0,
        "latitude_i":515074,"longitude_i":-1278,"status":"new","obd_src":"tplink",
        "mic_type":"IOT.SMARTPLUGSWITCH","ntc_state":0,
        "next_action":{"type":1,"id":"6C7E9A","schd_sec":68400,"action":0}}}}"#;

    #[test]
    fn parses_full_sysinfo() {
        let response = Response::from_slice(HS110_SYSINFO.as_bytes()).unwrap();
        response.check(Command::GetSysInfo).unwrap();

        let info = response.system.unwrap().get_sysinfo.unwrap();
        assert_eq!(info.alias, "Desk Lamp");
        assert_eq!(info.model, "HS110(EU)");
        assert_eq!(info.device_id, "8006ABCDEF");
        assert_eq!(info.relay_state, 1);
        assert_eq!(info.led_off, 0);
        assert_eq!(info.rssi, -52);
        assert_eq!(info.latitude_i, 515_074);
        assert_eq!(info.status, "new");
        assert_eq!(info.next_action.action_type, 1);
        assert_eq!(info.next_action.schd_sec, 68_400);
        assert_eq!(info.status_code.err_code, 0);
    }

    #[test]
    fn missing_fields_take_zero_values() {
        let response =
            Response::from_slice(br#"{"emeter":{"get_realtime":{"err_code":0}}}"#).unwrap();
        let realtime = response.emeter.unwrap().get_realtime.unwrap();
        assert_eq!(realtime, Realtime::default());
    }

    #[test]
    fn non_zero_code_is_device_error() {
        let response =
            Response::from_slice(br#"{"system":{"set_relay_state":{"err_code":1}}}"#).unwrap();
        let err = response.check(Command::SetRelayState { on: true }).unwrap_err();
        assert_eq!(err.device_code(), Some(1));
    }

    #[test]
    fn namespace_level_code_is_device_error() {
        let response = Response::from_slice(
            br#"{"emeter":{"err_code":-1,"err_msg":"module not support"}}"#,
        )
        .unwrap();
        let err = response.check(Command::GetRealtime).unwrap_err();
        assert!(
            matches!(&err, Error::Device { code: -1, message: Some(m), .. } if m == "module not support"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn reply_for_another_command_is_missing_response() {
        let response =
            Response::from_slice(br#"{"time":{"get_timezone":{"index":39,"err_code":0}}}"#)
                .unwrap();
        let err = response.check(Command::GetTime).unwrap_err();
        assert!(matches!(err, Error::MissingResponse { .. }));
        assert!(err.is_protocol());
        assert!(matches!(
            response.check(Command::GetSysInfo),
            Err(Error::MissingResponse { .. })
        ));
    }

    #[test]
    fn empty_body_is_deserialization_error() {
        let err = Response::from_slice(b"").unwrap_err();
        assert!(matches!(err, Error::Deserialization { .. }));
    }

    #[test]
    fn history_statistics_parse_through() {
        let response = Response::from_slice(
            br#"{"emeter":{"get_monthstat":{"month_list":[
                {"year":2023,"month":1,"energy_wh":12000},
                {"year":2023,"month":2,"energy_wh":9800}],"err_code":0}}}"#,
        )
        .unwrap();
        response.check(Command::GetMonthStat { year: 2023 }).unwrap();
        let months = response.emeter.unwrap().get_monthstat.unwrap().month_list;
        assert_eq!(months.len(), 2);
        assert_eq!(months[1].energy_wh, 9800);
    }
}
