//! Resolved bootstrap configuration.
//!
//! A [`Config`] only exists after every check in [`crate::validate`] has
//! passed. It is immutable from then on and handed to the selected behavior
//! by reference.

use std::fmt;
use std::path::PathBuf;

use tracing::level_filters::LevelFilter;

use crate::manifest::ManifestLocator;

/// Kubeconfig used for dynamic version discovery.
pub const DEFAULT_KUBECONFIG: &str = "/etc/kubernetes/kubeconfig";

/// Torcx profile created when none is given.
pub const DEFAULT_PROFILE: &str = "kube-torcx";

/// GPG keyring checked against remote assets.
pub const DEFAULT_KEYRING: &str = "/pubring.gpg";

/// Name searched on `PATH` for the torcx binary.
pub const TORCX_BIN_NAME: &str = "torcx";

/// Resolved kube-torcx configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Kubeconfig for version discovery. `None` only when a version is forced.
    pub kubeconfig: Option<PathBuf>,
    /// Path to the torcx executable, if one was given or found.
    pub torcx_bin: Option<PathBuf>,
    /// Compiled torcx manifest URL template.
    pub manifest_url: ManifestLocator,
    /// Torcx profile to create and activate.
    pub profile_name: String,
    /// Kubernetes version that overrides discovery.
    pub force_kube_version: Option<String>,
    /// Whether remote assets must be GPG-verified.
    pub verify_signatures: bool,
    /// GPG keyring. Always set when `verify_signatures` is true.
    pub gpg_keyring: Option<PathBuf>,
    /// Runtime mappings (Kubernetes version to package set).
    pub version_manifest: PathBuf,
    /// Log level applied during resolution.
    pub verbosity: LevelFilter,
}

impl Config {
    /// Print configuration for debugging.
    ///
    /// Goes to stderr: stdout belongs to the behavior's output.
    pub fn print(&self) {
        eprint!("{}", self);
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(path: &Option<PathBuf>) -> String {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(unset)".to_string())
        }

        writeln!(f, "Configuration:")?;
        writeln!(f, "  kubeconfig: {}", show(&self.kubeconfig))?;
        writeln!(f, "  torcx-bin: {}", show(&self.torcx_bin))?;
        writeln!(f, "  torcx-manifest-url: {}", self.manifest_url.source())?;
        writeln!(f, "  torcx-profile: {}", self.profile_name)?;
        writeln!(
            f,
            "  force-kube-version: {}",
            self.force_kube_version.as_deref().unwrap_or("(unset)")
        )?;
        writeln!(f, "  verify-signatures: {}", self.verify_signatures)?;
        writeln!(f, "  keyring: {}", show(&self.gpg_keyring))?;
        writeln!(f, "  version-manifest: {}", self.version_manifest.display())?;
        writeln!(f, "  verbose: {}", self.verbosity)
    }
}

/// Variable naming an env file to load before flags are bound.
pub const ENV_FILE_VAR: &str = "KUBE_TORCX_ENV_FILE";

/// Env file loaded when `KUBE_TORCX_ENV_FILE` is unset, if it exists.
pub const DEFAULT_ENV_FILE: &str = "/etc/kube-torcx/kube-torcx.env";

/// Load `KUBE_TORCX_*` overrides from an env file.
///
/// Variables already set in the environment take precedence. An explicitly
/// named file must exist; the default one is optional.
pub fn load_env_file() -> anyhow::Result<Option<PathBuf>> {
    use anyhow::Context;

    if let Some(path) = std::env::var_os(ENV_FILE_VAR) {
        let path = PathBuf::from(path);
        dotenvy::from_path(&path)
            .with_context(|| format!("failed to load env file {}", path.display()))?;
        return Ok(Some(path));
    }

    let path = PathBuf::from(DEFAULT_ENV_FILE);
    if !path.exists() {
        return Ok(None);
    }
    dotenvy::from_path(&path)
        .with_context(|| format!("failed to load env file {}", path.display()))?;
    Ok(Some(path))
}
