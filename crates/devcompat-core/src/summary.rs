//! Combined compatibility view of a connected device

use serde::{Deserialize, Serialize};

use crate::capability::{parse_capabilities, CapabilitySet};
use crate::catalog::{AssetDescriptor, SupportRangeEntry};
use crate::device::DeviceState;
use crate::resolver::{resolve, UnavailabilityReport};
use crate::revision::normalize_revision;

/// Everything the client derives from a device snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub capabilities: CapabilitySet,
    pub revision: Option<String>,
    pub unavailable: UnavailabilityReport,
}

/// Parse capabilities, normalize the revision and resolve availability in one pass
pub fn analyze(
    device: Option<&DeviceState>,
    catalog: &[AssetDescriptor],
    support_ranges: &[SupportRangeEntry],
) -> DeviceSummary {
    let capabilities = parse_capabilities(device);
    let revision = device.and_then(|d| normalize_revision(d.revision.as_deref()));
    let unavailable = device
        .map(|d| resolve(d, &capabilities, catalog, support_ranges))
        .unwrap_or_default();

    DeviceSummary {
        capabilities,
        revision,
        unavailable,
    }
}
