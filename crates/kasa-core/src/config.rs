// ── Runtime plug configuration ──
//
// Describes how to reach one plug: address, port, cipher seed and
// timeouts. Callers build a `PlugConfig` and hand it to `Session`;
// core never reads config files.

use std::time::Duration;

use kasa_api::cipher::DEFAULT_INITIAL_KEY;
use kasa_api::{AutokeyCipher, DEFAULT_PORT, TransportConfig};

/// Configuration for a session with a single plug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlugConfig {
    /// Hostname or IP address of the plug.
    pub host: String,
    pub port: u16,
    /// Seed of the autokey transform. Only overridden for unusual firmware.
    pub initial_key: u8,
    pub connect_timeout: Duration,
    /// Deadline for each request write and each response read.
    pub timeout: Duration,
}

impl Default for PlugConfig {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            initial_key: DEFAULT_INITIAL_KEY,
            connect_timeout: transport.connect_timeout,
            timeout: transport.timeout,
        }
    }
}

impl PlugConfig {
    /// Config for `host` with every other setting at its default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Use the cipher key derived from an integer seed. Any integer is
    /// accepted; only its low byte reaches the wire.
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.initial_key = AutokeyCipher::from_seed(seed).initial_key();
        self
    }

    /// Wire-level transport settings for this plug.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            connect_timeout: self.connect_timeout,
            timeout: self.timeout,
            cipher: AutokeyCipher::new(self.initial_key),
            ..TransportConfig::default()
        }
    }

    /// `host:port`, for logs and error messages.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
