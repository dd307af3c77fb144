// Autokey XOR stream transform
//
// Every payload on the wire is obfuscated with a rolling XOR whose key is
// the previous ciphertext byte, seeded with a fixed initial key. It is
// fully reversible without any secret and provides no confidentiality.

/// Initial key used by all known plug firmware.
pub const DEFAULT_INITIAL_KEY: u8 = 171;

/// Byte-wise autokey XOR cipher seeded with a per-device initial key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutokeyCipher {
    initial_key: u8,
}

impl Default for AutokeyCipher {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_KEY)
    }
}

impl AutokeyCipher {
    pub const fn new(initial_key: u8) -> Self {
        Self { initial_key }
    }

    /// Build a cipher from an arbitrary integer seed.
    ///
    /// The transform works on single bytes, so only the low 8 bits of the
    /// seed are significant (`-85` and `427` both behave like `171`).
    pub fn from_seed(seed: i64) -> Self {
        Self::new(seed.to_le_bytes()[0])
    }

    pub fn initial_key(self) -> u8 {
        self.initial_key
    }

    /// Encrypt `buf` in place. Each output byte becomes the key for the next.
    pub fn encrypt_in_place(self, buf: &mut [u8]) {
        let mut key = self.initial_key;
        for byte in buf.iter_mut() {
            key ^= *byte;
            *byte = key;
        }
    }

    /// Decrypt `buf` in place. Each input byte becomes the key for the next.
    pub fn decrypt_in_place(self, buf: &mut [u8]) {
        let mut key = self.initial_key;
        for byte in buf.iter_mut() {
            let cipher = *byte;
            *byte = key ^ cipher;
            key = cipher;
        }
    }

    pub fn encrypt(self, plaintext: &[u8]) -> Vec<u8> {
        let mut out = plaintext.to_vec();
        self.encrypt_in_place(&mut out);
        out
    }

    pub fn decrypt(self, ciphertext: &[u8]) -> Vec<u8> {
        let mut out = ciphertext.to_vec();
        self.decrypt_in_place(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSINFO_QUERY: &[u8] = br#"{"system":{"get_sysinfo":{}}}"#;

    /// Captured from a real HS110 exchange (key 171).
    const SYSINFO_QUERY_CIPHERTEXT: [u8; 29] = [
        0xd0, 0xf2, 0x81, 0xf8, 0x8b, 0xff, 0x9a, 0xf7, 0xd5, 0xef, 0x94, 0xb6, 0xd1, 0xb4, 0xc0,
        0x9f, 0xec, 0x95, 0xe6, 0x8f, 0xe1, 0x87, 0xe8, 0xca, 0xf0, 0x8b, 0xf6, 0x8b, 0xf6,
    ];

    #[test]
    fn encrypt_matches_captured_sysinfo_query() {
        let cipher = AutokeyCipher::default();
        assert_eq!(cipher.encrypt(SYSINFO_QUERY), SYSINFO_QUERY_CIPHERTEXT);
    }

    #[test]
    fn decrypt_recovers_captured_sysinfo_query() {
        let cipher = AutokeyCipher::default();
        assert_eq!(cipher.decrypt(&SYSINFO_QUERY_CIPHERTEXT), SYSINFO_QUERY);
    }

    #[test]
    fn round_trips_under_every_key() {
        let payload: Vec<u8> = (0..=255).collect();
        for key in 0..=u8::MAX {
            let cipher = AutokeyCipher::new(key);
            assert_eq!(cipher.decrypt(&cipher.encrypt(&payload)), payload, "key {key}");
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        let cipher = AutokeyCipher::new(7);
        assert!(cipher.encrypt(&[]).is_empty());
        assert!(cipher.decrypt(&[]).is_empty());
    }

    #[test]
    fn first_byte_is_xored_with_initial_key() {
        let cipher = AutokeyCipher::new(0x0f);
        assert_eq!(cipher.encrypt(&[0xf0, 0x00]), vec![0xff, 0xff]);
    }

    #[test]
    fn seed_keeps_only_low_byte() {
        assert_eq!(AutokeyCipher::from_seed(171).initial_key(), 171);
        assert_eq!(AutokeyCipher::from_seed(427).initial_key(), 171);
        assert_eq!(AutokeyCipher::from_seed(-85).initial_key(), 171);
    }
}
