//! Command-line options shared by every behavior.
//!
//! Binding only assigns values. Whether they make sense together is decided
//! by [`crate::validate`].

use std::ffi::OsString;

use clap::{Args, Command, FromArgMatches};

use crate::config::{DEFAULT_KEYRING, DEFAULT_KUBECONFIG, DEFAULT_PROFILE, TORCX_BIN_NAME};
use crate::error::Result;
use crate::manifest::MANIFEST_URL_TEMPLATE;

/// Raw option values, as bound from the command line and environment.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Flags {
    /// Path to kubeconfig
    #[arg(long, env = "KUBE_TORCX_KUBECONFIG", default_value = DEFAULT_KUBECONFIG)]
    pub kubeconfig: String,

    /// Path to torcx
    #[arg(long = "torcx-bin", env = "KUBE_TORCX_BIN", default_value_t = discover_torcx_bin())]
    pub torcx_bin: String,

    /// URL (template) for torcx package manifest
    #[arg(long = "torcx-manifest-url", env = "KUBE_TORCX_MANIFEST_URL", default_value = MANIFEST_URL_TEMPLATE)]
    pub torcx_manifest_url: String,

    /// Torcx profile to create, if needed
    #[arg(long = "torcx-profile", env = "KUBE_TORCX_PROFILE", default_value = DEFAULT_PROFILE)]
    pub torcx_profile: String,

    /// Force a kubernetes version, rather than determining from the apiserver
    #[arg(long = "force-kube-version", env = "KUBE_TORCX_FORCE_KUBE_VERSION", default_value = "")]
    pub force_kube_version: String,

    /// Don't gpg-verify remote assets
    #[arg(long = "no-verify-signatures", env = "KUBE_TORCX_NO_VERIFY_SIGNATURES")]
    pub no_verify_signatures: bool,

    /// Path to the gpg keyring
    #[arg(long, env = "KUBE_TORCX_KEYRING", default_value = DEFAULT_KEYRING)]
    pub keyring: String,

    /// Path to the runtime-mappings manifest file
    #[arg(long = "version-manifest", env = "KUBE_TORCX_VERSION_MANIFEST", default_value = "")]
    pub version_manifest: String,

    /// Verbosity level
    #[arg(long, env = "KUBE_TORCX_VERBOSE", default_value = "info")]
    pub verbose: String,
}

/// Look up torcx on `PATH`.
///
/// A missing binary is not an error here; the behaviors that need it say so.
pub fn discover_torcx_bin() -> String {
    which::which(TORCX_BIN_NAME)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Bind `args` (including the program name) for the command called `name`.
pub fn bind<I, T>(name: &'static str, about: &'static str, args: I) -> Result<Flags>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    // Repeated options take the last value.
    let command = Command::new(name)
        .about(about)
        .version(env!("CARGO_PKG_VERSION"))
        .args_override_self(true);
    let command = Flags::augment_args(command);
    let matches = command.try_get_matches_from(args)?;
    Ok(Flags::from_arg_matches(&matches)?)
}
