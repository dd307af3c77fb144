use thiserror::Error;

/// Top-level error type for the `kasa-api` crate.
///
/// Covers every failure mode of a single plug connection: transport,
/// framing, payload decoding, and device-reported status codes.
/// `kasa-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// TCP connect was refused or failed before the deadline.
    #[error("Cannot connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// TCP connect did not complete before the deadline.
    #[error("Connecting to {addr} timed out after {timeout_ms}ms")]
    ConnectTimeout { addr: String, timeout_ms: u64 },

    /// A read or write on an established connection missed its deadline.
    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Socket-level failure (reset, broken pipe, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The plug closed the connection before answering.
    #[error("Connection closed by device")]
    ConnectionClosed,

    /// The stream ended in the middle of a frame.
    #[error("Truncated frame: expected {expected} bytes, received {received}")]
    TruncatedFrame { expected: usize, received: usize },

    /// The length prefix exceeds the configured frame limit.
    #[error("Frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    // ── Protocol ────────────────────────────────────────────────────
    /// The response body was not valid JSON for the known schema.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// The request could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response carried no result for the issued command.
    #[error("Response is missing {target}.{command}")]
    MissingResponse { target: String, command: String },

    // ── Device ──────────────────────────────────────────────────────
    /// The plug answered with a non-zero `err_code`.
    #[error("Device rejected {target}.{command} with err_code {code}{}", fmt_message(.message.as_deref()))]
    Device {
        target: String,
        command: String,
        code: i64,
        message: Option<String>,
    },
}

fn fmt_message(message: Option<&str>) -> String {
    message.map(|m| format!(": {m}")).unwrap_or_default()
}

impl Error {
    /// Returns `true` if the connection itself failed and can no longer
    /// be trusted to stay in frame sync.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. }
                | Self::ConnectTimeout { .. }
                | Self::Timeout { .. }
                | Self::Io(_)
                | Self::ConnectionClosed
                | Self::TruncatedFrame { .. }
                | Self::FrameTooLarge { .. }
        )
    }

    /// Returns `true` if the bytes arrived but could not be understood.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Self::Deserialization { .. } | Self::Serialization(_) | Self::MissingResponse { .. }
        )
    }

    /// Extract the device `err_code`, if this is a device-reported failure.
    pub fn device_code(&self) -> Option<i64> {
        match self {
            Self::Device { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_display_includes_message() {
        let err = Error::Device {
            target: "emeter".into(),
            command: "get_realtime".into(),
            code: -1,
            message: Some("module not support".into()),
        };
        assert_eq!(
            err.to_string(),
            "Device rejected emeter.get_realtime with err_code -1: module not support"
        );
        assert_eq!(err.device_code(), Some(-1));
        assert!(!err.is_transport());
        assert!(!err.is_protocol());
    }

    #[test]
    fn truncated_frame_is_transport() {
        let err = Error::TruncatedFrame {
            expected: 10,
            received: 3,
        };
        assert!(err.is_transport());
        assert_eq!(err.device_code(), None);
    }
}
