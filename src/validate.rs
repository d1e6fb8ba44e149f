//! Ordered config resolution.
//!
//! Checks run in a fixed order and stop at the first failure.
//! The order decides which error a multiply-broken command line reports:
//!
//! 1. `verbosity` - parse the level and apply it, so later steps can log
//! 2. `version-source` - kubeconfig or forced version
//! 3. `profile` - non-empty profile name
//! 4. `keyring` - keyring path when verification is on
//! 5. `manifest-url` - compile the URL template (default if empty)
//! 6. `version-manifest` - caller default if empty
//!
//! Cheap structural checks come before template compilation.

use std::path::{Path, PathBuf};

use tracing::level_filters::LevelFilter;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::flags::Flags;
use crate::logging::{self, LevelSink};
use crate::manifest::{ManifestLocator, MANIFEST_URL_TEMPLATE};

/// Resolve bound flags into a [`Config`].
///
/// `default_version_manifest` is supplied by the calling behavior. The log
/// level is applied to `levels` as soon as it parses.
pub fn resolve(
    flags: &Flags,
    default_version_manifest: &Path,
    levels: &dyn LevelSink,
) -> Result<Config> {
    let verbosity = verbosity(flags, levels)?;
    version_source(flags)?;
    profile(flags)?;
    keyring(flags)?;
    let manifest_url = manifest_url(flags)?;
    let version_manifest = version_manifest(flags, default_version_manifest);

    let config = Config {
        kubeconfig: non_empty(&flags.kubeconfig).map(PathBuf::from),
        torcx_bin: non_empty(&flags.torcx_bin).map(PathBuf::from),
        manifest_url,
        profile_name: flags.torcx_profile.clone(),
        force_kube_version: non_empty(&flags.force_kube_version).map(str::to_string),
        verify_signatures: !flags.no_verify_signatures,
        gpg_keyring: non_empty(&flags.keyring).map(PathBuf::from),
        version_manifest,
        verbosity,
    };

    tracing::debug!(profile = %config.profile_name, "configuration resolved");
    Ok(config)
}

fn verbosity(flags: &Flags, levels: &dyn LevelSink) -> Result<LevelFilter> {
    let level = logging::parse_verbosity(&flags.verbose)?;
    levels.set_level(level);
    Ok(level)
}

fn version_source(flags: &Flags) -> Result<()> {
    if flags.kubeconfig.is_empty() && flags.force_kube_version.is_empty() {
        return Err(Error::MissingVersionSource);
    }
    if !flags.force_kube_version.is_empty() {
        tracing::debug!(
            version = %flags.force_kube_version,
            "kubernetes version forced, skipping discovery"
        );
    }
    Ok(())
}

fn profile(flags: &Flags) -> Result<()> {
    if flags.torcx_profile.is_empty() {
        return Err(Error::MissingProfile);
    }
    Ok(())
}

fn keyring(flags: &Flags) -> Result<()> {
    if !flags.no_verify_signatures && flags.keyring.is_empty() {
        return Err(Error::MissingKeyring);
    }
    if flags.no_verify_signatures {
        tracing::warn!("signature verification disabled");
    }
    Ok(())
}

fn manifest_url(flags: &Flags) -> Result<ManifestLocator> {
    let template = non_empty(&flags.torcx_manifest_url).unwrap_or(MANIFEST_URL_TEMPLATE);
    ManifestLocator::compile(template)
}

fn version_manifest(flags: &Flags, default: &Path) -> PathBuf {
    match non_empty(&flags.version_manifest) {
        Some(path) => PathBuf::from(path),
        None => {
            tracing::debug!(path = %default.display(), "using default version manifest");
            default.to_path_buf()
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
