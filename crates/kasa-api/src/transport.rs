// Shared transport configuration for plug connections.
//
// Timeouts, the cipher seed, and the frame size limit travel together so
// every `KasaClient` is built from one value.

use std::time::Duration;

use crate::cipher::AutokeyCipher;
use crate::frame::{DEFAULT_MAX_FRAME_LEN, FrameCodec};

/// Default port of the plug's local protocol listener.
pub const DEFAULT_PORT: u16 = 9999;

/// Shared transport configuration for plug connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Deadline for the TCP handshake.
    pub connect_timeout: Duration,
    /// Deadline for each request write and each response read.
    pub timeout: Duration,
    pub cipher: AutokeyCipher,
    pub max_frame_len: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(10),
            cipher: AutokeyCipher::default(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

impl TransportConfig {
    /// Build the frame codec for a connection using this config.
    pub fn codec(&self) -> FrameCodec {
        FrameCodec::new(self.cipher).with_max_frame_len(self.max_frame_len)
    }
}

/// Saturating milliseconds for error reporting.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
