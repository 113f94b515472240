//! Asset and capability availability resolution
//!
//! Combines the device firmware version, its capability set, the asset
//! catalog and the capability support ranges into a single report of
//! everything that is *not* available. Anything absent from the report is
//! available as far as this client can tell.
//!
//! Resolution runs in four stages, later stages overwriting earlier ones for
//! the same key:
//! 1. assets without a minimum version for this model: `no-support`
//! 2. assets whose required capability is missing: `no-capability`
//! 3. assets whose minimum version is newer than the device: `update-required`
//! 4. capability groups outside their firmware range, keyed by capability name

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::capability::{Capability, CapabilitySet};
use crate::catalog::{AssetDescriptor, AssetKind, SupportRangeEntry, UNSUPPORTED_SENTINEL};
use crate::device::DeviceState;
use crate::version::{self, FirmwareVersion};

/// Why an asset or capability is unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnavailableReason {
    /// Not supported on this device model at all
    #[serde(rename = "no-support")]
    NoSupport,
    /// The firmware build lacks the required capability
    #[serde(rename = "no-capability")]
    NoCapability,
    /// Supported by a newer firmware than the one installed
    #[serde(rename = "update-required")]
    UpdateRequired,
    /// The firmware is newer than this client knows how to handle
    #[serde(rename = "trezor-connect-outdated")]
    ClientOutdated,
}

impl UnavailableReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoSupport => "no-support",
            Self::NoCapability => "no-capability",
            Self::UpdateRequired => "update-required",
            Self::ClientOutdated => "trezor-connect-outdated",
        }
    }
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map of unavailable keys to the reason they are unavailable
///
/// Asset entries are keyed by lower-cased shortcut, capability group entries
/// by capability name. Both share one key space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnavailabilityReport(BTreeMap<String, UnavailableReason>);

impl UnavailabilityReport {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Record a reason, replacing any previous one for the key
    pub fn mark(&mut self, key: impl Into<String>, reason: UnavailableReason) {
        self.0.insert(key.into(), reason);
    }

    pub fn reason(&self, key: &str) -> Option<UnavailableReason> {
        self.0.get(key).copied()
    }

    /// True unless the key is known to be blocked
    pub fn is_available(&self, key: &str) -> bool {
        !self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UnavailableReason)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Assets whose required capability is decided by shortcut rather than kind
const SHORTCUT_OVERRIDES: &[(&str, Capability)] = &[
    ("BNB", Capability::Binance),
    ("XRP", Capability::Ripple),
    ("tXRP", Capability::Ripple),
];

/// Capability a device needs to handle an asset
///
/// Returns `None` when the asset names a capability this client does not
/// know, which no device can satisfy.
pub fn required_capability(asset: &AssetDescriptor) -> Option<Capability> {
    match asset.kind {
        AssetKind::Bitcoin => match asset.name.as_str() {
            "Bitcoin" | "Testnet" => Some(Capability::Bitcoin),
            _ => Some(Capability::BitcoinLike),
        },
        AssetKind::Ethereum => Some(Capability::Ethereum),
        AssetKind::Nem => Some(Capability::Nem),
        AssetKind::Misc => SHORTCUT_OVERRIDES
            .iter()
            .find(|(shortcut, _)| *shortcut == asset.shortcut)
            .map(|(_, capability)| *capability)
            .or_else(|| Capability::from_name(&format!("Capability_{}", asset.name))),
    }
}

/// Resolve which assets and capability groups are unavailable on a device
///
/// Never fails. A device without firmware still runs every stage; with the
/// empty capability set it parses to, every supported asset is
/// `no-capability`.
pub fn resolve(
    device: &DeviceState,
    capabilities: &CapabilitySet,
    catalog: &[AssetDescriptor],
    support_ranges: &[SupportRangeEntry],
) -> UnavailabilityReport {
    let mut report = UnavailabilityReport::new();

    let firmware = device.version();
    let model_key = firmware.model_key();

    // Stage 1: support table must name this model
    let mut supported: Vec<(&AssetDescriptor, &str)> = Vec::with_capacity(catalog.len());
    for asset in catalog {
        match asset.min_version(&model_key) {
            Some(min) => supported.push((asset, min)),
            None => {
                debug!(asset = %asset.shortcut, model = %model_key, "Asset not supported on model");
                report.mark(asset.report_key(), UnavailableReason::NoSupport);
            }
        }
    }

    // Stage 2: the firmware must carry the asset's capability
    for (asset, _) in &supported {
        let capable = required_capability(asset).is_some_and(|c| capabilities.contains(c));
        if !capable {
            debug!(asset = %asset.shortcut, required = ?required_capability(asset), "Missing capability");
            report.mark(asset.report_key(), UnavailableReason::NoCapability);
        }
    }

    // Stage 3: the firmware must be at least the asset's minimum version
    for (asset, min) in &supported {
        if version::compare(min, &firmware) == Ordering::Greater {
            debug!(asset = %asset.shortcut, min = %min, firmware = %firmware, "Firmware update required");
            report.mark(asset.report_key(), UnavailableReason::UpdateRequired);
        }
    }

    // Stage 4: capability groups gated by firmware range
    for entry in support_ranges {
        apply_support_range(&mut report, entry, &firmware);
    }

    report
}

fn apply_support_range(
    report: &mut UnavailabilityReport,
    entry: &SupportRangeEntry,
    firmware: &FirmwareVersion,
) {
    if entry.capabilities.is_empty() {
        return;
    }

    if let Some(min) = entry.min_for(firmware.major) {
        let reason = if min == UNSUPPORTED_SENTINEL {
            Some(UnavailableReason::NoSupport)
        } else if version::compare(min, firmware) == Ordering::Greater {
            Some(UnavailableReason::UpdateRequired)
        } else {
            None
        };

        if let Some(reason) = reason {
            for capability in &entry.capabilities {
                debug!(capability = %capability, min = %min, %reason, "Capability below supported range");
                report.mark(capability.name(), reason);
            }
            return;
        }
    }

    if let Some(max) = entry.max_for(firmware.major) {
        if version::compare(max, firmware) == Ordering::Less {
            for capability in &entry.capabilities {
                debug!(capability = %capability, max = %max, "Firmware newer than supported range");
                report.mark(capability.name(), UnavailableReason::ClientOutdated);
            }
        }
    }
}
