//! Capability table and capability parsing
//!
//! Firmware reports capabilities as 1-based codes into a fixed, ordered table.
//! Firmware that predates capability reporting gets a per-model default list.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::device::{CapabilityCode, DeviceState};

/// A named feature a firmware build may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "Capability_Bitcoin")]
    Bitcoin,
    #[serde(rename = "Capability_Bitcoin_like")]
    BitcoinLike,
    #[serde(rename = "Capability_Binance")]
    Binance,
    #[serde(rename = "Capability_Cardano")]
    Cardano,
    #[serde(rename = "Capability_Crypto")]
    Crypto,
    #[serde(rename = "Capability_EOS")]
    Eos,
    #[serde(rename = "Capability_Ethereum")]
    Ethereum,
    #[serde(rename = "Capability_Lisk")]
    Lisk,
    #[serde(rename = "Capability_Monero")]
    Monero,
    #[serde(rename = "Capability_NEM")]
    Nem,
    #[serde(rename = "Capability_Ripple")]
    Ripple,
    #[serde(rename = "Capability_Stellar")]
    Stellar,
    #[serde(rename = "Capability_Tezos")]
    Tezos,
    #[serde(rename = "Capability_U2F")]
    U2f,
    #[serde(rename = "Capability_Shamir")]
    Shamir,
    #[serde(rename = "Capability_ShamirGroups")]
    ShamirGroups,
    #[serde(rename = "Capability_PassphraseEntry")]
    PassphraseEntry,
}

/// Ordered capability table. A reported code `n` refers to `CAPABILITY_TABLE[n - 1]`.
pub const CAPABILITY_TABLE: [Capability; 17] = [
    Capability::Bitcoin,
    Capability::BitcoinLike,
    Capability::Binance,
    Capability::Cardano,
    Capability::Crypto,
    Capability::Eos,
    Capability::Ethereum,
    Capability::Lisk,
    Capability::Monero,
    Capability::Nem,
    Capability::Ripple,
    Capability::Stellar,
    Capability::Tezos,
    Capability::U2f,
    Capability::Shamir,
    Capability::ShamirGroups,
    Capability::PassphraseEntry,
];

/// Assumed codes for model 1 firmware that does not report capabilities
pub const DEFAULT_CODES_MODEL_ONE: &[CapabilityCode] = &[1, 2, 5, 7, 10, 12, 14];

/// Assumed codes for every other model when capabilities are not reported
pub const DEFAULT_CODES_OTHER: &[CapabilityCode] = &[1, 2, 3, 4, 5, 6, 7, 9, 10, 11, 12, 13, 14];

impl Capability {
    /// Look up a 1-based capability code
    pub fn from_code(code: CapabilityCode) -> Option<Self> {
        let index = usize::try_from(code).ok()?.checked_sub(1)?;
        CAPABILITY_TABLE.get(index).copied()
    }

    /// 1-based code of this capability
    pub fn code(self) -> CapabilityCode {
        // The table holds every variant exactly once.
        CAPABILITY_TABLE
            .iter()
            .position(|c| *c == self)
            .map(|i| i as CapabilityCode + 1)
            .unwrap_or(0)
    }

    /// Canonical name, e.g. `Capability_Bitcoin_like`
    pub fn name(self) -> &'static str {
        match self {
            Self::Bitcoin => "Capability_Bitcoin",
            Self::BitcoinLike => "Capability_Bitcoin_like",
            Self::Binance => "Capability_Binance",
            Self::Cardano => "Capability_Cardano",
            Self::Crypto => "Capability_Crypto",
            Self::Eos => "Capability_EOS",
            Self::Ethereum => "Capability_Ethereum",
            Self::Lisk => "Capability_Lisk",
            Self::Monero => "Capability_Monero",
            Self::Nem => "Capability_NEM",
            Self::Ripple => "Capability_Ripple",
            Self::Stellar => "Capability_Stellar",
            Self::Tezos => "Capability_Tezos",
            Self::U2f => "Capability_U2F",
            Self::Shamir => "Capability_Shamir",
            Self::ShamirGroups => "Capability_ShamirGroups",
            Self::PassphraseEntry => "Capability_PassphraseEntry",
        }
    }

    /// Look up a capability by its canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        CAPABILITY_TABLE.iter().copied().find(|c| c.name() == name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Insertion-ordered set of capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(Vec<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Add a capability, returning false if it was already present
    pub fn insert(&mut self, capability: Capability) -> bool {
        if self.0.contains(&capability) {
            return false;
        }
        self.0.push(capability);
        true
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Map raw codes through the capability table, dropping unknown codes
    pub fn from_codes(codes: &[CapabilityCode]) -> Self {
        let mut set = Self::new();
        for &code in codes {
            match Capability::from_code(code) {
                Some(capability) => {
                    set.insert(capability);
                }
                None => debug!(code, "Ignoring unknown capability code"),
            }
        }
        set
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::new();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

/// Default codes assumed for firmware that does not report capabilities
pub fn default_codes(major_version: u32) -> &'static [CapabilityCode] {
    if major_version == 1 {
        DEFAULT_CODES_MODEL_ONE
    } else {
        DEFAULT_CODES_OTHER
    }
}

/// Derive the effective capability set of a device
///
/// Without a device or without installed firmware nothing can be determined
/// and the set is empty. Never fails.
pub fn parse_capabilities(device: Option<&DeviceState>) -> CapabilitySet {
    let device = match device {
        Some(device) if device.firmware_present => device,
        _ => return CapabilitySet::new(),
    };

    match device.capabilities.as_deref() {
        Some(codes) if !codes.is_empty() => CapabilitySet::from_codes(codes),
        _ => {
            debug!(
                major = device.major_version,
                "Firmware does not report capabilities, using model defaults"
            );
            CapabilitySet::from_codes(default_codes(device.major_version))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::FirmwareVersion;

    fn device(major: u32, codes: Option<Vec<CapabilityCode>>) -> DeviceState {
        DeviceState {
            capabilities: codes,
            ..DeviceState::new(FirmwareVersion::new(major, 0, 0))
        }
    }

    fn at(indices: &[CapabilityCode]) -> Vec<Capability> {
        indices.iter().map(|i| CAPABILITY_TABLE[*i as usize - 1]).collect()
    }

    #[test]
    fn test_table_bounds() {
        assert_eq!(Capability::from_code(0), None);
        assert_eq!(Capability::from_code(1), Some(Capability::Bitcoin));
        assert_eq!(Capability::from_code(17), Some(Capability::PassphraseEntry));
        assert_eq!(Capability::from_code(18), None);
        assert_eq!(Capability::from_code(u32::MAX), None);
    }

    #[test]
    fn test_codes_and_names_round_trip() {
        for (i, capability) in CAPABILITY_TABLE.iter().enumerate() {
            assert_eq!(capability.code(), i as u32 + 1);
            assert_eq!(Capability::from_name(capability.name()), Some(*capability));
        }
        assert_eq!(Capability::from_name("Capability_Dogecoin"), None);
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&Capability::BitcoinLike).unwrap();
        assert_eq!(json, "\"Capability_Bitcoin_like\"");
        let parsed: Capability = serde_json::from_str("\"Capability_NEM\"").unwrap();
        assert_eq!(parsed, Capability::Nem);
    }

    #[test]
    fn test_no_device_or_no_firmware() {
        assert!(parse_capabilities(None).is_empty());
        let bootloader = DeviceState::bootloader(2).with_capabilities(vec![1, 2]);
        assert!(parse_capabilities(Some(&bootloader)).is_empty());
    }

    #[test]
    fn test_model_one_defaults() {
        for codes in [None, Some(vec![])] {
            let caps = parse_capabilities(Some(&device(1, codes)));
            assert_eq!(caps.iter().collect::<Vec<_>>(), at(&[1, 2, 5, 7, 10, 12, 14]));
        }
    }

    #[test]
    fn test_other_model_defaults() {
        for major in [2, 3] {
            let caps = parse_capabilities(Some(&device(major, None)));
            assert_eq!(
                caps.iter().collect::<Vec<_>>(),
                at(&[1, 2, 3, 4, 5, 6, 7, 9, 10, 11, 12, 13, 14])
            );
        }
    }

    #[test]
    fn test_reported_codes_drop_unknown() {
        let caps = parse_capabilities(Some(&device(2, Some(vec![0, 7, 99, 1, 7]))));
        assert_eq!(
            caps.iter().collect::<Vec<_>>(),
            vec![Capability::Ethereum, Capability::Bitcoin]
        );
    }
}
