//! Error taxonomy for kube-torcx.
//!
//! Every variant is terminal for the current invocation. Nothing here is
//! transient, so nothing is retried.

/// Errors surfaced by dispatch, flag binding and config resolution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unknown option or malformed command line (also carries `--help`).
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error(
        "invalid verbosity level {token:?} (expected one of: {expected})",
        expected = crate::logging::VERBOSITY_TOKENS.join(", ")
    )]
    InvalidVerbosity { token: String },

    #[error("kubeconfig required: pass --kubeconfig or --force-kube-version")]
    MissingVersionSource,

    #[error("profile name required: --torcx-profile must not be empty")]
    MissingProfile,

    #[error("keyring path required: pass --keyring or --no-verify-signatures")]
    MissingKeyring,

    #[error("error parsing URL template {template:?}")]
    InvalidManifestTemplate {
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("unknown behavior {0:?} (known: kube-torcx-bootstrap, kube-torcx-hook-pre)")]
    UnknownBehavior(String),

    /// Behavior registry is malformed. Only possible at startup.
    #[error("behavior registration failed: {0}")]
    Registration(String),

    /// A selected behavior failed after its configuration resolved.
    #[error(transparent)]
    Behavior(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
