//! Facts about the local OS that the manifest URL depends on.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Release file shipped with the OS image.
pub const RELEASE_FILE: &str = "/usr/share/coreos/release";

/// Variable overriding [`RELEASE_FILE`].
pub const RELEASE_FILE_VAR: &str = "KUBE_TORCX_RELEASE_FILE";

/// Board assumed when the release file doesn't name one.
pub const DEFAULT_BOARD: &str = "amd64-usr";

/// OS board and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFacts {
    pub board: String,
    pub os_version: String,
}

/// Release file to read: `KUBE_TORCX_RELEASE_FILE` if set and non-empty.
pub fn release_file() -> PathBuf {
    std::env::var_os(RELEASE_FILE_VAR)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(RELEASE_FILE))
}

impl NodeFacts {
    /// Read a KEY=VALUE release file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut vars = HashMap::new();
        let entries = dotenvy::from_path_iter(path)
            .with_context(|| format!("failed to open release file {}", path.display()))?;
        for entry in entries {
            let (key, value) =
                entry.with_context(|| format!("malformed release file {}", path.display()))?;
            vars.insert(key, value);
        }

        let os_version = vars
            .remove("COREOS_RELEASE_VERSION")
            .or_else(|| vars.remove("VERSION_ID"))
            .with_context(|| format!("no OS version in {}", path.display()))?;
        let board = vars
            .remove("COREOS_RELEASE_BOARD")
            .unwrap_or_else(|| DEFAULT_BOARD.to_string());

        Ok(Self { board, os_version })
    }
}
