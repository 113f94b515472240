//! Asset catalog and capability support ranges
//!
//! The asset catalog lists the coins/assets the client knows about, each with
//! the minimum firmware version per device model. Support ranges gate whole
//! capability groups by firmware version, independently of the catalog.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::capability::Capability;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML catalog: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Failed to parse JSON catalog: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Unsupported catalog format: {0}")]
    UnsupportedFormat(String),
}

/// Family an asset belongs to, which decides the capability it needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    #[serde(rename = "bitcoin", alias = "bitcoin-like")]
    Bitcoin,
    #[serde(rename = "ethereum", alias = "ethereum-like")]
    Ethereum,
    #[serde(rename = "nem")]
    Nem,
    #[serde(rename = "misc", alias = "other")]
    Misc,
}

/// Entry of an asset's per-model support table
///
/// Catalogs use a version string for supported models and `false` (or any
/// other value) for unsupported ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SupportValue {
    Version(String),
    Other(serde_json::Value),
}

impl SupportValue {
    pub fn as_version(&self) -> Option<&str> {
        match self {
            Self::Version(v) => Some(v),
            Self::Other(_) => None,
        }
    }
}

/// A single asset known to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    /// Ticker-like identifier (e.g. "BTC", "tXRP")
    pub shortcut: String,
    /// Display name (e.g. "Bitcoin")
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// Model key (`trezor1`, `trezor2`, ...) to minimum firmware version
    #[serde(default)]
    pub support: BTreeMap<String, SupportValue>,
}

impl AssetDescriptor {
    pub fn new(shortcut: impl Into<String>, name: impl Into<String>, kind: AssetKind) -> Self {
        Self {
            shortcut: shortcut.into(),
            name: name.into(),
            kind,
            support: BTreeMap::new(),
        }
    }

    /// Declare the minimum firmware version for a model key
    pub fn with_support(mut self, model_key: impl Into<String>, min_version: impl Into<String>) -> Self {
        self.support
            .insert(model_key.into(), SupportValue::Version(min_version.into()));
        self
    }

    /// Minimum version for a model key, if the asset is supported there
    pub fn min_version(&self, model_key: &str) -> Option<&str> {
        self.support.get(model_key).and_then(SupportValue::as_version)
    }

    /// Key under which this asset appears in an unavailability report
    pub fn report_key(&self) -> String {
        self.shortcut.to_lowercase()
    }
}

/// Firmware range gating a group of capabilities
///
/// `min` and `max` are indexed by `major_version - 1`. A minimum of `"0"`
/// means the group is not supported on that model at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportRangeEntry {
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub min: Option<Vec<String>>,
    #[serde(default)]
    pub max: Option<Vec<String>>,
}

/// Minimum version marking a capability group as unsupported on a model
pub const UNSUPPORTED_SENTINEL: &str = "0";

impl SupportRangeEntry {
    pub fn min_for(&self, major_version: u32) -> Option<&str> {
        bound_for(self.min.as_deref(), major_version)
    }

    pub fn max_for(&self, major_version: u32) -> Option<&str> {
        bound_for(self.max.as_deref(), major_version)
    }
}

fn bound_for(bounds: Option<&[String]>, major_version: u32) -> Option<&str> {
    let index = usize::try_from(major_version).ok()?.checked_sub(1)?;
    bounds?
        .get(index)
        .map(String::as_str)
        .filter(|bound| !bound.is_empty())
}

/// The asset catalog file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetCatalog {
    #[serde(default, rename = "asset")]
    pub assets: Vec<AssetDescriptor>,
}

impl AssetCatalog {
    pub fn new(assets: Vec<AssetDescriptor>) -> Self {
        Self { assets }
    }

    /// Load a catalog, choosing the format by file extension
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        let catalog = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content)?,
            Some("json") => Self::from_json(&content)?,
            other => {
                return Err(CatalogError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        debug!(path = %path.display(), assets = catalog.assets.len(), "Loaded asset catalog");
        Ok(catalog)
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    /// JSON catalogs are either `{"asset": [...]}` or a bare array
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum JsonCatalog {
            Wrapped(AssetCatalog),
            Bare(Vec<AssetDescriptor>),
        }

        Ok(match serde_json::from_str::<JsonCatalog>(content)? {
            JsonCatalog::Wrapped(catalog) => catalog,
            JsonCatalog::Bare(assets) => Self::new(assets),
        })
    }

    pub fn find(&self, shortcut: &str) -> Option<&AssetDescriptor> {
        self.assets
            .iter()
            .find(|a| a.shortcut.eq_ignore_ascii_case(shortcut))
    }
}
