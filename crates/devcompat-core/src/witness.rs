//! Witness path collection for staking-aware transactions
//!
//! A transaction must be signed with every key whose derivation path appears
//! in its inputs, in stake delegation/deregistration certificates, among
//! pool owners, or in withdrawals. Each distinct path is signed once.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bit marking a hardened derivation index
pub const HARDENED: u32 = 0x8000_0000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path component '{0}'")]
    InvalidComponent(String),
    #[error("Path component {0} out of range")]
    OutOfRange(u64),
}

/// Key derivation path as a sequence of indices
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PathRepr", into = "Vec<u32>")]
pub struct DerivationPath(pub Vec<u32>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Indices(Vec<u32>),
    Text(String),
}

impl TryFrom<PathRepr> for DerivationPath {
    type Error = PathError;

    fn try_from(repr: PathRepr) -> Result<Self, Self::Error> {
        match repr {
            PathRepr::Indices(indices) => Ok(Self(indices)),
            PathRepr::Text(text) => text.parse(),
        }
    }
}

impl From<DerivationPath> for Vec<u32> {
    fn from(path: DerivationPath) -> Self {
        path.0
    }
}

impl From<Vec<u32>> for DerivationPath {
    fn from(indices: Vec<u32>) -> Self {
        Self(indices)
    }
}

impl DerivationPath {
    pub fn indices(&self) -> &[u32] {
        &self.0
    }
}

impl FromStr for DerivationPath {
    type Err = PathError;

    /// Parse `m/1852'/1815'/0'/2/0`. Hardened components end in `'`, `h` or `H`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let rest = s
            .strip_prefix("m/")
            .or_else(|| s.strip_prefix("M/"))
            .unwrap_or(if s.eq_ignore_ascii_case("m") { "" } else { s });

        if rest.is_empty() {
            return Ok(Self::default());
        }

        rest.split('/')
            .map(|component| {
                let (digits, hardened) = match component.strip_suffix(['\'', 'h', 'H']) {
                    Some(digits) => (digits, true),
                    None => (component, false),
                };
                let value: u64 = digits
                    .parse()
                    .map_err(|_| PathError::InvalidComponent(component.to_string()))?;
                if value >= HARDENED as u64 {
                    return Err(PathError::OutOfRange(value));
                }
                let index = value as u32;
                Ok(if hardened { index | HARDENED } else { index })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            if index & HARDENED != 0 {
                write!(f, "/{}'", index & !HARDENED)?;
            } else {
                write!(f, "/{}", index)?;
            }
        }
        Ok(())
    }
}

/// Transaction input; script inputs carry no path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    #[serde(default)]
    pub path: Option<DerivationPath>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateKind {
    StakeRegistration,
    StakeDeregistration,
    StakeDelegation,
    StakePoolRegistration,
}

impl CertificateKind {
    /// Certificates signed with the staking key at their own path
    pub fn requires_witness(self) -> bool {
        matches!(self, Self::StakeDelegation | Self::StakeDeregistration)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolOwner {
    #[serde(default)]
    pub staking_key_path: Option<DerivationPath>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(rename = "type")]
    pub kind: CertificateKind,
    #[serde(default)]
    pub path: Option<DerivationPath>,
    #[serde(default)]
    pub pool_owners: Vec<PoolOwner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub path: DerivationPath,
}

/// Collect the distinct paths a transaction must be witnessed with
///
/// Order: input paths, then per certificate its own path (delegation and
/// deregistration only) followed by its pool owners' staking key paths, then
/// withdrawal paths. A repeated path keeps its first position.
pub fn collect_witness_paths(
    inputs: &[TxInput],
    certificates: &[Certificate],
    withdrawals: &[Withdrawal],
) -> Vec<DerivationPath> {
    let input_paths = inputs.iter().filter_map(|input| input.path.as_ref());
    let certificate_paths = certificates.iter().flat_map(|certificate| {
        let own = certificate
            .path
            .as_ref()
            .filter(|_| certificate.kind.requires_witness());
        let owners = certificate
            .pool_owners
            .iter()
            .filter_map(|owner| owner.staking_key_path.as_ref());
        own.into_iter().chain(owners)
    });
    let withdrawal_paths = withdrawals.iter().map(|withdrawal| &withdrawal.path);

    let mut seen = HashSet::new();
    input_paths
        .chain(certificate_paths)
        .chain(withdrawal_paths)
        .filter(|path| seen.insert(*path))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> DerivationPath {
        s.parse().unwrap()
    }

    fn input(s: &str) -> TxInput {
        TxInput { path: Some(path(s)) }
    }

    #[test]
    fn test_parse_and_format() {
        let p = path("m/1852'/1815'/0'/2/0");
        assert_eq!(p.indices(), &[1852 | HARDENED, 1815 | HARDENED, HARDENED, 2, 0]);
        assert_eq!(p.to_string(), "m/1852'/1815'/0'/2/0");
        assert_eq!(path("m/44h/1815H/0"), path("m/44'/1815'/0"));
        assert_eq!(path("m"), DerivationPath::default());
        assert_eq!(path("0/1/2").indices(), &[0, 1, 2]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "m/44'/x".parse::<DerivationPath>(),
            Err(PathError::InvalidComponent("x".to_string()))
        );
        assert_eq!(
            "m/2147483648".parse::<DerivationPath>(),
            Err(PathError::OutOfRange(2147483648))
        );
        assert!("m//1".parse::<DerivationPath>().is_err());
    }

    #[test]
    fn test_serde_accepts_array_or_string() {
        let from_array: DerivationPath = serde_json::from_str("[0, 1, 2]").unwrap();
        let from_text: DerivationPath = serde_json::from_str("\"m/0/1/2\"").unwrap();
        assert_eq!(from_array, from_text);
        assert_eq!(serde_json::to_string(&from_array).unwrap(), "[0,1,2]");
    }

    #[test]
    fn test_duplicate_input_paths_collapse() {
        let inputs = [input("m/0/1/2"), input("m/0/1/2")];
        let paths = collect_witness_paths(&inputs, &[], &[]);
        assert_eq!(paths, vec![path("m/0/1/2")]);
    }

    #[test]
    fn test_collection_order_and_certificate_filter() {
        let inputs = [input("m/1852'/1815'/0'/0/0"), TxInput::default()];
        let certificates = [
            Certificate {
                kind: CertificateKind::StakeRegistration,
                path: Some(path("m/1852'/1815'/0'/2/9")),
                pool_owners: vec![],
            },
            Certificate {
                kind: CertificateKind::StakeDelegation,
                path: Some(path("m/1852'/1815'/0'/2/0")),
                pool_owners: vec![],
            },
            Certificate {
                kind: CertificateKind::StakePoolRegistration,
                path: Some(path("m/1852'/1815'/0'/2/8")),
                pool_owners: vec![
                    PoolOwner { staking_key_path: Some(path("m/1852'/1815'/1'/2/0")) },
                    PoolOwner { staking_key_path: None },
                ],
            },
            Certificate {
                kind: CertificateKind::StakeDeregistration,
                path: Some(path("m/1852'/1815'/0'/2/0")),
                pool_owners: vec![],
            },
        ];
        let withdrawals = [
            Withdrawal { path: path("m/1852'/1815'/0'/2/0") },
            Withdrawal { path: path("m/1852'/1815'/2'/2/0") },
        ];

        let paths = collect_witness_paths(&inputs, &certificates, &withdrawals);
        let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "m/1852'/1815'/0'/0/0",
                "m/1852'/1815'/0'/2/0",
                "m/1852'/1815'/1'/2/0",
                "m/1852'/1815'/2'/2/0",
            ]
        );
    }

    #[test]
    fn test_certificate_json() {
        let json = r#"{"type": "stake_delegation", "path": "m/1852'/1815'/0'/2/0"}"#;
        let certificate: Certificate = serde_json::from_str(json).unwrap();
        assert!(certificate.kind.requires_witness());
        assert!(certificate.pool_owners.is_empty());
    }
}
