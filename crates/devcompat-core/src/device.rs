//! Device state snapshot as reported by the firmware

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::version::FirmwareVersion;

/// Raw capability code as reported by the device (1-based table index)
pub type CapabilityCode = u32;

/// Immutable snapshot of a device's firmware state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    /// False when the device is in bootloader mode without installed firmware.
    /// Devices running firmware usually omit the field.
    #[serde(default = "default_true")]
    pub firmware_present: bool,
    pub major_version: u32,
    #[serde(default)]
    pub minor_version: u32,
    #[serde(default)]
    pub patch_version: u32,
    /// Capability codes reported by newer firmware; older firmware omits them
    #[serde(default, deserialize_with = "deserialize_codes")]
    pub capabilities: Option<Vec<CapabilityCode>>,
    /// Build revision (commit hash), absent in bootloader mode
    #[serde(default)]
    pub revision: Option<String>,
}

fn default_true() -> bool {
    true
}

impl DeviceState {
    /// Create a device running firmware with the given version and no reported capabilities
    pub fn new(version: FirmwareVersion) -> Self {
        Self {
            firmware_present: true,
            major_version: version.major,
            minor_version: version.minor,
            patch_version: version.patch,
            capabilities: None,
            revision: None,
        }
    }

    /// Create a device in bootloader mode with no firmware installed
    pub fn bootloader(major_version: u32) -> Self {
        Self {
            firmware_present: false,
            ..Self::new(FirmwareVersion::new(major_version, 0, 0))
        }
    }

    pub fn with_capabilities(mut self, codes: Vec<CapabilityCode>) -> Self {
        self.capabilities = Some(codes);
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn version(&self) -> FirmwareVersion {
        FirmwareVersion::new(self.major_version, self.minor_version, self.patch_version)
    }
}

/// Capability codes arrive as numbers from the wire decoder but as numeric
/// strings from some bridges. Both are converted here, once. Anything else
/// (floats, out-of-range integers, objects) is dropped.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCode {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

fn deserialize_codes<'de, D>(deserializer: D) -> Result<Option<Vec<CapabilityCode>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<RawCode>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|codes| {
        codes
            .into_iter()
            .filter_map(|code| {
                let parsed = match &code {
                    RawCode::Number(n) => CapabilityCode::try_from(*n).ok(),
                    RawCode::Text(s) => s.trim().parse::<CapabilityCode>().ok(),
                    RawCode::Other(_) => None,
                };
                if parsed.is_none() {
                    match code {
                        RawCode::Number(n) => debug!(code = n, "Dropping invalid capability code"),
                        RawCode::Text(s) => debug!(code = %s, "Dropping invalid capability code"),
                        RawCode::Other(v) => debug!(code = %v, "Dropping invalid capability code"),
                    }
                }
                parsed
            })
            .collect()
    }))
}
