//! Kubernetes version resolution.
//!
//! A forced version always wins. Otherwise the apiserver named by the
//! kubeconfig is asked, which only works once the control plane is up.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::config::Config;
use crate::process::Cmd;

/// Source of the cluster's Kubernetes version.
pub trait KubeVersionSource {
    fn server_version(&self, kubeconfig: &Path) -> Result<String>;
}

/// Queries the apiserver through `kubectl version`.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
}

impl Kubectl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Kubectl {
    fn default() -> Self {
        Self::new("kubectl")
    }
}

impl KubeVersionSource for Kubectl {
    fn server_version(&self, kubeconfig: &Path) -> Result<String> {
        let stdout = Cmd::new(&self.program)
            .arg("--kubeconfig")
            .arg_path(kubeconfig)
            .args(["version", "-o", "json"])
            .error_msg("kubectl version query failed")
            .run()?;
        parse_server_version(&stdout)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionOutput {
    server_version: Option<VersionInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    git_version: String,
}

/// Extract `serverVersion.gitVersion` from `kubectl version -o json` output.
pub fn parse_server_version(output: &str) -> Result<String> {
    let parsed: VersionOutput =
        serde_json::from_str(output).context("unparseable kubectl version output")?;
    match parsed.server_version {
        Some(info) if !info.git_version.is_empty() => Ok(info.git_version),
        _ => bail!("apiserver did not report a version"),
    }
}

/// Decide which Kubernetes version drives package selection.
pub fn resolve_kube_version(config: &Config, source: &dyn KubeVersionSource) -> Result<String> {
    if let Some(version) = &config.force_kube_version {
        tracing::info!(version = %version, "using forced kubernetes version");
        return Ok(version.clone());
    }

    let Some(kubeconfig) = &config.kubeconfig else {
        bail!("no kubernetes version source configured");
    };

    let version = source
        .server_version(kubeconfig)
        .with_context(|| format!("failed to discover version via {}", kubeconfig.display()))?;
    tracing::info!(version = %version, "discovered kubernetes version");
    Ok(version)
}
