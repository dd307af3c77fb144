// MacAddress normalizes the plug's reported hardware address so it
// compares equal regardless of firmware formatting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC address from colon-separated,
    /// dash-separated, or bare 12-digit hex input.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let lower = raw.as_ref().trim().to_lowercase();
        if lower.len() == 12 && lower.chars().all(|c| c.is_ascii_hexdigit()) {
            let pairs: Vec<&str> = (0..12)
                .step_by(2)
                .filter_map(|i| lower.get(i..i + 2))
                .collect();
            return Self(pairs.join(":"));
        }
        Self(lower.replace('-', ":"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_plug_format() {
        let mac = MacAddress::new("50:C7:BF:00:11:22");
        assert_eq!(mac.as_str(), "50:c7:bf:00:11:22");
    }

    #[test]
    fn normalizes_dashes() {
        let mac: MacAddress = "50-C7-BF-00-11-22".parse().unwrap();
        assert_eq!(mac.to_string(), "50:c7:bf:00:11:22");
    }

    #[test]
    fn splits_bare_hex() {
        assert_eq!(MacAddress::new("50C7BF001122").as_str(), "50:c7:bf:00:11:22");
    }

    #[test]
    fn empty_stays_empty() {
        assert!(MacAddress::new("").is_empty());
    }
}
