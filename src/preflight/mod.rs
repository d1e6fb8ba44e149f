//! Pre-start checks for the kubelet hook.
//!
//! Verifies that everything the install stage needs is in place before the
//! kubelet is allowed to start.

mod types;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::kube::{self, KubeVersionSource};
use crate::versions::VersionManifest;

pub use types::{CheckReport, CheckResult, CheckStatus};

pub const CHECK_TORCX_BIN: &str = "torcx binary";
pub const CHECK_KEYRING: &str = "gpg keyring";
pub const CHECK_VERSION_MANIFEST: &str = "version manifest";
pub const CHECK_KUBE_VERSION: &str = "kubernetes version";
pub const CHECK_RUNTIME: &str = "runtime mapping";

/// Run all pre-start checks.
pub fn run_checks(config: &Config, source: &dyn KubeVersionSource) -> CheckReport {
    let mut checks = vec![check_torcx_bin(config), check_keyring(config)];

    let manifest = match VersionManifest::load(&config.version_manifest) {
        Ok(manifest) => {
            checks.push(CheckResult::pass_with(
                CHECK_VERSION_MANIFEST,
                &format!("{} version(s) mapped", manifest.len()),
            ));
            Some(manifest)
        }
        Err(e) => {
            checks.push(CheckResult::fail(CHECK_VERSION_MANIFEST, &format!("{:#}", e)));
            None
        }
    };

    // Discovery failing is expected while the control plane is still coming up.
    let version = match kube::resolve_kube_version(config, source) {
        Ok(version) => {
            checks.push(CheckResult::pass_with(CHECK_KUBE_VERSION, &version));
            Some(version)
        }
        Err(e) => {
            checks.push(CheckResult::warn(CHECK_KUBE_VERSION, &format!("{:#}", e)));
            None
        }
    };

    checks.push(match (&manifest, &version) {
        (Some(manifest), Some(version)) => match manifest.runtime_for(version) {
            Some(packages) => {
                let list: Vec<String> = packages
                    .iter()
                    .map(|p| format!("{}:{}", p.name, p.version))
                    .collect();
                CheckResult::pass_with(CHECK_RUNTIME, &list.join(", "))
            }
            None => CheckResult::fail(
                CHECK_RUNTIME,
                &format!("no runtime mapping for kubernetes {}", version),
            ),
        },
        _ => CheckResult::skip(CHECK_RUNTIME, "version or manifest unavailable"),
    });

    CheckReport { checks }
}

/// Run checks, print the report, and bail if any failed.
pub fn run_checks_or_fail(config: &Config, source: &dyn KubeVersionSource) -> Result<CheckReport> {
    let report = run_checks(config, source);
    report.print();

    if !report.all_passed() {
        bail!(
            "pre-start checks failed: {} check(s) failed",
            report.fail_count()
        );
    }

    tracing::info!(warnings = report.warn_count(), "pre-start checks passed");
    Ok(report)
}

fn check_torcx_bin(config: &Config) -> CheckResult {
    match &config.torcx_bin {
        Some(path) if path.is_file() => {
            CheckResult::pass_with(CHECK_TORCX_BIN, &path.display().to_string())
        }
        Some(path) => CheckResult::fail(
            CHECK_TORCX_BIN,
            &format!("{} does not exist", path.display()),
        ),
        None => CheckResult::fail(CHECK_TORCX_BIN, "not found on PATH; pass --torcx-bin"),
    }
}

fn check_keyring(config: &Config) -> CheckResult {
    if !config.verify_signatures {
        return CheckResult::skip(CHECK_KEYRING, "signature verification disabled");
    }
    match &config.gpg_keyring {
        Some(path) if path.is_file() => {
            CheckResult::pass_with(CHECK_KEYRING, &path.display().to_string())
        }
        Some(path) => CheckResult::fail(
            CHECK_KEYRING,
            &format!("{} does not exist", path.display()),
        ),
        None => CheckResult::fail(CHECK_KEYRING, "no keyring configured"),
    }
}
