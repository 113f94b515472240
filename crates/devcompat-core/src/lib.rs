//! Devcompat Core - Firmware capability and asset compatibility resolution
//!
//! This crate turns a device's reported firmware state into compatibility
//! metadata for the client:
//! - Capability parsing from reported codes, with per-model defaults
//! - Asset and capability-group availability resolution
//! - Firmware revision normalization
//! - Witness path collection for staking transactions
//!
//! All operations are pure and never fail; malformed input degrades to an
//! empty or partial result.

pub mod capability;
pub mod catalog;
pub mod device;
pub mod resolver;
pub mod revision;
pub mod summary;
pub mod version;
pub mod witness;

pub use capability::{parse_capabilities, Capability, CapabilitySet, CAPABILITY_TABLE};
pub use catalog::{AssetCatalog, AssetDescriptor, AssetKind, CatalogError, SupportRangeEntry};
pub use device::{CapabilityCode, DeviceState};
pub use resolver::{required_capability, resolve, UnavailabilityReport, UnavailableReason};
pub use revision::normalize_revision;
pub use summary::{analyze, DeviceSummary};
pub use version::{compare, FirmwareVersion, VersionError};
pub use witness::{
    collect_witness_paths, Certificate, CertificateKind, DerivationPath, PathError, PoolOwner,
    TxInput, Withdrawal,
};
