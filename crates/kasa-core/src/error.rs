// ── Core error types ──
//
// User-facing errors from kasa-core. Callers never see frame codecs or
// serde failures directly; the `From<kasa_api::Error>` impl sorts
// wire-level failures into the transport / protocol / device taxonomy
// and the session adds its own precondition and usage errors.

use strum::Display;
use thiserror::Error;

/// Device property guarded by a state-change precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Property {
    #[strum(serialize = "power")]
    Power,
    #[strum(serialize = "light")]
    Light,
}

/// Coarse error class, for callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect, read, write or framing failure.
    Transport,
    /// Bytes arrived but did not decode to the expected response.
    Protocol,
    /// The plug answered with a non-zero `err_code`.
    Device,
    /// The requested change or read does not apply to the current state.
    Precondition,
    /// The session was used outside its contract.
    Usage,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Transport errors ─────────────────────────────────────────────
    #[error("Cannot connect to plug at {addr}: {reason}")]
    ConnectionFailed { addr: String, reason: String },

    #[error("Plug did not respond within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Transport error: {message}")]
    Transport { message: String },

    // ── Usage errors ─────────────────────────────────────────────────
    #[error("Session is not connected")]
    NotConnected,

    #[error("Session is busy with another request")]
    Busy,

    // ── Protocol errors ──────────────────────────────────────────────
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Device errors ────────────────────────────────────────────────
    #[error("Device rejected {target}.{command} (err_code {code}){}", fmt_message(.message.as_deref()))]
    Device {
        target: String,
        command: String,
        code: i64,
        message: Option<String>,
    },

    // ── Precondition errors ──────────────────────────────────────────
    #[error("{property} is already {}", on_off(.on))]
    AlreadyInState { property: Property, on: bool },

    #[error("Relay is off; power-on time is undefined")]
    RelayOff,
}

fn fmt_message(message: Option<&str>) -> String {
    message.map(|m| format!(": {m}")).unwrap_or_default()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn on_off(on: &bool) -> &'static str {
    if *on { "on" } else { "off" }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Transport { .. } => {
                ErrorKind::Transport
            }
            Self::NotConnected | Self::Busy => ErrorKind::Usage,
            Self::Protocol { .. } => ErrorKind::Protocol,
            Self::Device { .. } => ErrorKind::Device,
            Self::AlreadyInState { .. } | Self::RelayOff => ErrorKind::Precondition,
        }
    }

    /// Only transport failures may succeed on a fresh attempt; the core
    /// itself never retries.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Device-reported `err_code`, if any.
    pub fn device_code(&self) -> Option<i64> {
        match self {
            Self::Device { code, .. } => Some(*code),
            _ => None,
        }
    }
}

// ── Conversion from wire-level errors ────────────────────────────────

impl From<kasa_api::Error> for CoreError {
    fn from(err: kasa_api::Error) -> Self {
        match err {
            kasa_api::Error::Connect { addr, source } => CoreError::ConnectionFailed {
                addr,
                reason: source.to_string(),
            },
            kasa_api::Error::ConnectTimeout { addr, timeout_ms } => CoreError::ConnectionFailed {
                addr,
                reason: format!("timed out after {timeout_ms}ms"),
            },
            kasa_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            err @ (kasa_api::Error::Io(_)
            | kasa_api::Error::ConnectionClosed
            | kasa_api::Error::TruncatedFrame { .. }
            | kasa_api::Error::FrameTooLarge { .. }) => CoreError::Transport {
                message: err.to_string(),
            },
            err @ (kasa_api::Error::Deserialization { .. }
            | kasa_api::Error::Serialization(_)
            | kasa_api::Error::MissingResponse { .. }) => CoreError::Protocol {
                message: err.to_string(),
            },
            kasa_api::Error::Device {
                target,
                command,
                code,
                message,
            } => CoreError::Device {
                target,
                command,
                code,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_errors_keep_their_class() {
        let truncated = CoreError::from(kasa_api::Error::TruncatedFrame {
            expected: 40,
            received: 12,
        });
        assert_eq!(truncated.kind(), ErrorKind::Transport);
        assert!(truncated.is_retryable());

        let missing = CoreError::from(kasa_api::Error::MissingResponse {
            target: "system".into(),
            command: "get_sysinfo".into(),
        });
        assert_eq!(missing.kind(), ErrorKind::Protocol);
        assert!(!missing.is_retryable());

        let device = CoreError::from(kasa_api::Error::Device {
            target: "system".into(),
            command: "set_relay_state".into(),
            code: 1,
            message: None,
        });
        assert_eq!(device.kind(), ErrorKind::Device);
        assert_eq!(device.device_code(), Some(1));
    }

    #[test]
    fn every_variant_maps_to_a_kind() {
        let cases = [
            (CoreError::Timeout { timeout_ms: 10 }, ErrorKind::Transport),
            (CoreError::Transport { message: "reset".into() }, ErrorKind::Transport),
            (CoreError::NotConnected, ErrorKind::Usage),
            (CoreError::Busy, ErrorKind::Usage),
            (CoreError::Protocol { message: "bad json".into() }, ErrorKind::Protocol),
            (CoreError::RelayOff, ErrorKind::Precondition),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{err}");
            assert_eq!(err.is_retryable(), kind == ErrorKind::Transport, "{err}");
        }
    }

    #[test]
    fn precondition_messages() {
        let err = CoreError::AlreadyInState {
            property: Property::Power,
            on: true,
        };
        assert_eq!(err.to_string(), "power is already on");
        assert_eq!(err.kind(), ErrorKind::Precondition);

        let err = CoreError::AlreadyInState {
            property: Property::Light,
            on: false,
        };
        assert_eq!(err.to_string(), "light is already off");
        assert_eq!(CoreError::RelayOff.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn connect_timeout_is_connection_failure() {
        let err = CoreError::from(kasa_api::Error::ConnectTimeout {
            addr: "10.0.0.5:9999".into(),
            timeout_ms: 5000,
        });
        assert_eq!(
            err.to_string(),
            "Cannot connect to plug at 10.0.0.5:9999: timed out after 5000ms"
        );
        assert_eq!(CoreError::Busy.kind(), ErrorKind::Usage);
    }
}
