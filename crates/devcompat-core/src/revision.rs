//! Firmware revision normalization
//!
//! Depending on the device generation the build revision is reported either as
//! a plain hex commit hash (`"8b2b2f3c"`) or as the hex encoding of that hash's
//! ASCII bytes (`"3862326232663363"`). Both are normalized to the plain form.
//!
//! A plain revision made only of digits is indistinguishable from the encoded
//! form and may be decoded by mistake if its bytes happen to spell hex digits.
//! Real commit hashes practically always contain a letter.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    /// Plain notation: hex digits only, with at least one letter
    static ref PLAIN_REVISION: Regex = Regex::new(r"(?i)^[0-9a-f]*[a-f][0-9a-f]*$").unwrap();

    /// Any non-empty run of hex digits
    static ref HEX_DIGITS: Regex = Regex::new(r"(?i)^[0-9a-f]+$").unwrap();
}

/// Returns true if the revision is already in plain hex notation
pub fn is_plain_revision(revision: &str) -> bool {
    PLAIN_REVISION.is_match(revision)
}

/// Normalize a reported revision to plain hex notation
///
/// Absent or empty input stays absent. Input that does not decode to a hex
/// string is returned unchanged.
pub fn normalize_revision(revision: Option<&str>) -> Option<String> {
    let revision = revision.filter(|r| !r.is_empty())?;

    if is_plain_revision(revision) {
        return Some(revision.to_string());
    }

    let decoded = hex::decode(revision)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok());

    match decoded {
        Some(text) if HEX_DIGITS.is_match(&text) => {
            debug!(raw = %revision, revision = %text, "Decoded hex-encoded revision");
            Some(text)
        }
        Some(_) => {
            warn!(raw = %revision, "Revision decoded to non-hex text, keeping raw value");
            Some(revision.to_string())
        }
        None => Some(revision.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_and_empty() {
        assert_eq!(normalize_revision(None), None);
        assert_eq!(normalize_revision(Some("")), None);
    }

    #[test]
    fn test_plain_revision_unchanged() {
        for rev in ["8b2b2f3c", "ABCDEF0123", "f"] {
            assert!(is_plain_revision(rev));
            assert_eq!(normalize_revision(Some(rev)).as_deref(), Some(rev));
        }
    }

    #[test]
    fn test_encoded_revision_decoded() {
        let plain = "8b2b2f3cdd1c7a04f0d8c1d1b3a0e1e5c5b0a9f2";
        let encoded = hex::encode(plain);
        assert!(!is_plain_revision(&encoded));
        assert_eq!(normalize_revision(Some(&encoded)).as_deref(), Some(plain));
    }

    #[test]
    fn test_uppercase_encoded_revision_decoded() {
        let encoded = hex::encode("ABC123");
        assert_eq!(normalize_revision(Some(&encoded)).as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_undecodable_revision_kept() {
        // odd length
        assert_eq!(normalize_revision(Some("12345")).as_deref(), Some("12345"));
        // not hex at all
        assert_eq!(normalize_revision(Some("v2.3.1")).as_deref(), Some("v2.3.1"));
        // decodes to bytes that are not hex digits
        assert_eq!(normalize_revision(Some("1234")).as_deref(), Some("1234"));
        // decodes to valid UTF-8 that is not hex
        let garbage = hex::encode("xy");
        assert_eq!(normalize_revision(Some(&garbage)).as_deref(), Some(garbage.as_str()));
    }

    #[test]
    fn test_all_digit_plain_revision_false_positive() {
        // "3031" is also the encoding of "01"; the decoded form wins.
        assert_eq!(normalize_revision(Some("3031")).as_deref(), Some("01"));
    }
}
