//! Runtime mappings: which torcx packages go with which Kubernetes version.
//!
//! The file is the static fallback used when the remote manifest cannot
//! tell us what to install:
//!
//! ```json
//! {
//!   "kind": "VersionManifestV0",
//!   "value": {
//!     "1.15.0": [{ "name": "docker", "version": "18.06" }],
//!     "1.14":   [{ "name": "docker", "version": "18.06" }]
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// The only manifest kind understood.
pub const VERSION_MANIFEST_KIND: &str = "VersionManifestV0";

/// A torcx package pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
}

/// Parsed runtime mappings.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    kind: String,
    value: BTreeMap<String, Vec<Package>>,
}

impl VersionManifest {
    /// Load and check a runtime-mappings file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read version manifest {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("invalid version manifest {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(content)?;
        if manifest.kind != VERSION_MANIFEST_KIND {
            bail!(
                "unsupported manifest kind {:?} (expected {:?})",
                manifest.kind,
                VERSION_MANIFEST_KIND
            );
        }
        Ok(manifest)
    }

    /// Number of Kubernetes versions mapped.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Packages for a Kubernetes version.
    ///
    /// Tries the exact normalized version first, then its `major.minor`.
    pub fn runtime_for(&self, kube_version: &str) -> Option<&[Package]> {
        let version = normalize_version(kube_version);
        if let Some(packages) = self.value.get(version) {
            return Some(packages.as_slice());
        }
        let minor = minor_version(version)?;
        self.value.get(minor).map(Vec::as_slice)
    }
}

/// Strip a leading `v` and any pre-release or build suffix.
///
/// `v1.15.0+coreos.0` and `1.15.0-rc.1` both become `1.15.0`.
pub fn normalize_version(version: &str) -> &str {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    match version.find(['+', '-']) {
        Some(end) => &version[..end],
        None => version,
    }
}

fn minor_version(version: &str) -> Option<&str> {
    let mut dots = version.match_indices('.');
    dots.next()?;
    match dots.next() {
        Some((end, _)) => Some(&version[..end]),
        None => None,
    }
}
