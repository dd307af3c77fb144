// Length-prefixed frame codec
//
// Wire format: `[u32 big-endian length][ciphered JSON body]`. The codec
// applies the autokey transform itself, so a `Framed` stream yields and
// accepts plaintext JSON bodies.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::cipher::AutokeyCipher;
use crate::error::Error;

/// Size of the big-endian length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest body accepted by default (1 MiB). Sysinfo replies are ~1 KiB.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;

/// Tokio codec for ciphered, length-prefixed plug messages.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    cipher: AutokeyCipher,
    max_frame_len: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(AutokeyCipher::default())
    }
}

impl FrameCodec {
    pub fn new(cipher: AutokeyCipher) -> Self {
        Self {
            cipher,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn cipher(&self) -> AutokeyCipher {
        self.cipher
    }

    /// Body length advertised by the prefix at the head of `src`, if complete.
    fn peek_len(src: &[u8]) -> Option<usize> {
        let prefix: [u8; LENGTH_PREFIX_LEN] = src.get(..LENGTH_PREFIX_LEN)?.try_into().ok()?;
        Some(usize::try_from(u32::from_be_bytes(prefix)).unwrap_or(usize::MAX))
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, Error> {
        let Some(len) = Self::peek_len(src) else {
            src.reserve(LENGTH_PREFIX_LEN - src.len());
            return Ok(None);
        };

        if len > self.max_frame_len {
            return Err(Error::FrameTooLarge {
                len,
                max: self.max_frame_len,
            });
        }

        let total = LENGTH_PREFIX_LEN + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LENGTH_PREFIX_LEN);
        let mut body = src.split_to(len);
        self.cipher.decrypt_in_place(&mut body);
        Ok(Some(body.freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let expected = Self::peek_len(src).map_or(LENGTH_PREFIX_LEN, |len| LENGTH_PREFIX_LEN + len);
        Err(Error::TruncatedFrame {
            expected,
            received: src.len(),
        })
    }
}

impl Encoder<&[u8]> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, body: &[u8], dst: &mut BytesMut) -> Result<(), Error> {
        if body.len() > self.max_frame_len {
            return Err(Error::FrameTooLarge {
                len: body.len(),
                max: self.max_frame_len,
            });
        }
        let len = u32::try_from(body.len()).map_err(|_| Error::FrameTooLarge {
            len: body.len(),
            max: self.max_frame_len,
        })?;

        dst.reserve(LENGTH_PREFIX_LEN + body.len());
        dst.put_u32(len);
        let start = dst.len();
        dst.extend_from_slice(body);
        self.cipher.encrypt_in_place(&mut dst[start..]);
        Ok(())
    }
}
