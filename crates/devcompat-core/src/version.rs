//! Firmware version triples and dotted version comparison
//!
//! Support tables carry minimum/maximum versions as dotted strings
//! (`"1.9.0"`, `"2.3"`), while the device reports a numeric
//! `(major, minor, patch)` triple. This module compares the two.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    #[error("Empty version string")]
    Empty,
    #[error("Invalid version segment '{segment}' in '{version}'")]
    InvalidSegment { version: String, segment: String },
}

/// Firmware version reported by a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FirmwareVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl FirmwareVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version string such as `"2.3.1"`, `"v1.9"` or `"2.0.0-rc1"`
    ///
    /// Uses semver as the primary parser and falls back to plain dotted
    /// numbers, padding missing trailing segments with zero.
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        let clean = clean_version_string(version);
        if clean.is_empty() {
            return Err(VersionError::Empty);
        }

        if let Ok(v) = semver::Version::parse(clean) {
            if let (Ok(major), Ok(minor), Ok(patch)) = (
                u32::try_from(v.major),
                u32::try_from(v.minor),
                u32::try_from(v.patch),
            ) {
                return Ok(Self::new(major, minor, patch));
            }
        }

        let mut parts = [0u32; 3];
        for (i, segment) in clean.split('.').enumerate() {
            let parsed = segment.parse::<u32>().ok().filter(|_| i < 3);
            match parsed {
                Some(n) => parts[i] = n,
                None => {
                    return Err(VersionError::InvalidSegment {
                        version: version.to_string(),
                        segment: segment.to_string(),
                    })
                }
            }
        }

        Ok(Self::new(parts[0], parts[1], parts[2]))
    }

    /// Key used in asset support tables for this device generation
    pub fn model_key(&self) -> String {
        format!("trezor{}", self.major)
    }

    fn segments(&self) -> [u64; 3] {
        [self.major as u64, self.minor as u64, self.patch as u64]
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<(u32, u32, u32)> for FirmwareVersion {
    fn from((major, minor, patch): (u32, u32, u32)) -> Self {
        Self::new(major, minor, patch)
    }
}

/// Compare a dotted version string against a device firmware triple
///
/// Returns `Ordering::Greater` when `version` is newer than `firmware`.
/// Segments are compared numerically left to right and the shorter side is
/// padded with zeros. Non-numeric segments count as zero; numeric segments
/// too large to represent saturate.
pub fn compare(version: &str, firmware: &FirmwareVersion) -> Ordering {
    let lhs = dotted_segments(version);
    compare_segments(&lhs, &firmware.segments())
}

fn compare_segments(a: &[u64], b: &[u64]) -> Ordering {
    let len = a.len().max(b.len());
    for i in 0..len {
        let na = a.get(i).copied().unwrap_or(0);
        let nb = b.get(i).copied().unwrap_or(0);
        match na.cmp(&nb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn dotted_segments(version: &str) -> Vec<u64> {
    version
        .trim()
        .split('.')
        .map(|segment| match segment.trim().parse::<u64>() {
            Ok(n) => n,
            Err(_) if is_all_digits(segment.trim()) => u64::MAX,
            Err(_) => {
                warn!(version = %version, segment = %segment, "Non-numeric version segment, treating as 0");
                0
            }
        })
        .collect()
}

fn is_all_digits(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Removes a leading `v`/`V` and surrounding whitespace
fn clean_version_string(version: &str) -> &str {
    let v = version.trim();
    v.strip_prefix('v')
        .or_else(|| v.strip_prefix('V'))
        .unwrap_or(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_equal() {
        let fw = FirmwareVersion::new(2, 0, 0);
        assert_eq!(compare("2.0.0", &fw), Ordering::Equal);
    }

    #[test]
    fn test_compare_newer_and_older() {
        let fw = FirmwareVersion::new(1, 9, 0);
        assert_eq!(compare("2.0.0", &fw), Ordering::Greater);
        assert_eq!(compare("1.8.9", &fw), Ordering::Less);
        assert_eq!(compare("1.10.0", &fw), Ordering::Greater);
    }

    #[test]
    fn test_compare_pads_missing_segments() {
        let fw = FirmwareVersion::new(1, 9, 0);
        assert_eq!(compare("1.9", &fw), Ordering::Equal);
        assert_eq!(compare("2", &fw), Ordering::Greater);
        assert_eq!(compare("1.9.0.1", &fw), Ordering::Greater);
    }

    #[test]
    fn test_compare_non_numeric_segment_is_zero() {
        let fw = FirmwareVersion::new(1, 0, 0);
        assert_eq!(compare("1.x.0", &fw), Ordering::Equal);
    }

    #[test]
    fn test_compare_oversized_segment_saturates() {
        let fw = FirmwareVersion::new(2, 5, 0);
        assert_eq!(compare("2.99999999999999999999.0", &fw), Ordering::Greater);
        assert_eq!(compare("1.99999999999999999999.0", &fw), Ordering::Less);
    }

    #[test]
    fn test_parse_semver_and_partial() {
        assert_eq!(FirmwareVersion::parse("2.3.1").unwrap(), FirmwareVersion::new(2, 3, 1));
        assert_eq!(FirmwareVersion::parse("v1.9").unwrap(), FirmwareVersion::new(1, 9, 0));
        assert_eq!(FirmwareVersion::parse("2.0.0-rc1").unwrap(), FirmwareVersion::new(2, 0, 0));
        assert_eq!(FirmwareVersion::parse("3").unwrap(), FirmwareVersion::new(3, 0, 0));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(FirmwareVersion::parse("  "), Err(VersionError::Empty));
        assert!(matches!(
            FirmwareVersion::parse("1.a.2"),
            Err(VersionError::InvalidSegment { .. })
        ));
        assert!(FirmwareVersion::parse("1.2.3.4").is_err());
    }

    #[test]
    fn test_display_and_model_key() {
        let fw = FirmwareVersion::new(2, 4, 3);
        assert_eq!(fw.to_string(), "2.4.3");
        assert_eq!(fw.model_key(), "trezor2");
    }
}
