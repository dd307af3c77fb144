// Request envelope and the typed command set
//
// Every request is `{ "<target>": { "<command>": { ...integer args } } }`.
// `Request` is the open-ended form; `Command` enumerates the operations
// whose responses are modelled in `models`.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use strum::{Display, EnumString, IntoStaticStr};

use crate::error::Error;

// ── Target ──────────────────────────────────────────────────────────

/// Top-level namespace of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Target {
    System,
    Time,
    Emeter,
}

impl Target {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

// ── Request ─────────────────────────────────────────────────────────

/// A single `{target: {command: args}}` request.
///
/// Arguments are always integers; booleans travel as `0`/`1`. The argument
/// map is ordered so the serialized JSON is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    target: String,
    command: String,
    arguments: BTreeMap<String, i64>,
}

impl Request {
    pub fn new(target: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            command: command.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Add an integer argument.
    pub fn arg(mut self, name: impl Into<String>, value: i64) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    /// Add a boolean argument, encoded as `0`/`1`.
    pub fn flag(self, name: impl Into<String>, value: bool) -> Self {
        self.arg(name, i64::from(value))
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn arguments(&self) -> &BTreeMap<String, i64> {
        &self.arguments
    }

    /// Serialize to the UTF-8 JSON body sent on the wire.
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(Error::Serialization)
    }
}

/// `{ command: arguments }`, the inner object of the envelope.
struct CommandBody<'a>(&'a Request);

impl Serialize for CommandBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.0.command, &self.0.arguments)?;
        map.end()
    }
}

impl Serialize for Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.target, &CommandBody(self))?;
        map.end()
    }
}

// ── Command ─────────────────────────────────────────────────────────

/// Every operation with a modelled response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    GetSysInfo,
    SetRelayState { on: bool },
    /// Note the inversion: `off: true` turns the indicator light off.
    SetLedOff { off: bool },
    /// Delay is clamped to at least one second on the wire.
    Reboot { delay_secs: u32 },
    GetTime,
    GetTimezone,
    GetRealtime,
    GetDayStat { year: i32, month: u32 },
    GetMonthStat { year: i32 },
}

impl Command {
    pub fn target(self) -> Target {
        match self {
            Self::GetSysInfo
            | Self::SetRelayState { .. }
            | Self::SetLedOff { .. }
            | Self::Reboot { .. } => Target::System,
            Self::GetTime | Self::GetTimezone => Target::Time,
            Self::GetRealtime | Self::GetDayStat { .. } | Self::GetMonthStat { .. } => {
                Target::Emeter
            }
        }
    }

    /// Wire name of the command inside its target namespace.
    pub fn name(self) -> &'static str {
        match self {
            Self::GetSysInfo => "get_sysinfo",
            Self::SetRelayState { .. } => "set_relay_state",
            Self::SetLedOff { .. } => "set_led_off",
            Self::Reboot { .. } => "reboot",
            Self::GetTime => "get_time",
            Self::GetTimezone => "get_timezone",
            Self::GetRealtime => "get_realtime",
            Self::GetDayStat { .. } => "get_daystat",
            Self::GetMonthStat { .. } => "get_monthstat",
        }
    }

    /// Build the request envelope for this command.
    pub fn request(self) -> Request {
        let request = Request::new(self.target().as_str(), self.name());
        match self {
            Self::SetRelayState { on } => request.flag("state", on),
            Self::SetLedOff { off } => request.flag("off", off),
            Self::Reboot { delay_secs } => request.arg("delay", i64::from(delay_secs.max(1))),
            Self::GetDayStat { year, month } => request
                .arg("year", i64::from(year))
                .arg("month", i64::from(month)),
            Self::GetMonthStat { year } => request.arg("year", i64::from(year)),
            Self::GetSysInfo | Self::GetTime | Self::GetTimezone | Self::GetRealtime => request,
        }
    }
}

impl From<Command> for Request {
    fn from(command: Command) -> Self {
        command.request()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn json(command: Command) -> String {
        String::from_utf8(command.request().to_json().unwrap()).unwrap()
    }

    #[test]
    fn sysinfo_envelope_has_empty_arguments() {
        insta::assert_snapshot!(json(Command::GetSysInfo), @r#"{"system":{"get_sysinfo":{}}}"#);
    }

    #[test]
    fn relay_state_encodes_bool_as_integer() {
        insta::assert_snapshot!(
            json(Command::SetRelayState { on: true }),
            @r#"{"system":{"set_relay_state":{"state":1}}}"#
        );
        insta::assert_snapshot!(
            json(Command::SetRelayState { on: false }),
            @r#"{"system":{"set_relay_state":{"state":0}}}"#
        );
    }

    #[test]
    fn led_off_keeps_wire_inversion() {
        insta::assert_snapshot!(
            json(Command::SetLedOff { off: true }),
            @r#"{"system":{"set_led_off":{"off":1}}}"#
        );
    }

    #[test]
    fn reboot_delay_is_clamped_to_one_second() {
        insta::assert_snapshot!(
            json(Command::Reboot { delay_secs: 0 }),
            @r#"{"system":{"reboot":{"delay":1}}}"#
        );
        insta::assert_snapshot!(
            json(Command::Reboot { delay_secs: 30 }),
            @r#"{"system":{"reboot":{"delay":30}}}"#
        );
    }

    #[test]
    fn daystat_arguments_are_sorted() {
        insta::assert_snapshot!(
            json(Command::GetDayStat { year: 2023, month: 4 }),
            @r#"{"emeter":{"get_daystat":{"month":4,"year":2023}}}"#
        );
    }

    #[test]
    fn commands_route_to_their_namespace() {
        assert_eq!(Command::GetTimezone.target(), Target::Time);
        assert_eq!(Command::GetRealtime.target().to_string(), "emeter");
        assert_eq!(Command::Reboot { delay_secs: 1 }.target().as_str(), "system");
        assert_eq!("time".parse::<Target>().unwrap(), Target::Time);
    }

    #[test]
    fn open_request_serializes_like_typed_one() {
        let request = Request::new("cnCloud", "get_info").flag("verbose", true);
        assert_eq!(
            request.to_json().unwrap(),
            br#"{"cnCloud":{"get_info":{"verbose":1}}}"#
        );
    }
}
