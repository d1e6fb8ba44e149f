//! Bootstrap behavior - decides what torcx should install on this node.
//!
//! Installation itself belongs to the next stage. This behavior only
//! resolves its inputs and prints them as JSON on stdout.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::Config;
use crate::kube::{self, KubeVersionSource};
use crate::manifest::ManifestParams;
use crate::node::NodeFacts;
use crate::versions::{self, Package, VersionManifest};

use super::Behavior;

/// Everything the install stage needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BootstrapPlan {
    pub profile: String,
    pub kube_version: String,
    pub packages: Vec<Package>,
    pub manifest_url: String,
    pub verify_signatures: bool,
    pub keyring: Option<PathBuf>,
    pub torcx_bin: PathBuf,
}

pub struct Bootstrap {
    kube: Box<dyn KubeVersionSource>,
    release_file: PathBuf,
}

impl Bootstrap {
    pub fn new(kube: Box<dyn KubeVersionSource>, release_file: PathBuf) -> Self {
        Self { kube, release_file }
    }

    /// Resolve the install plan without printing it.
    pub fn plan(&self, config: &Config) -> Result<BootstrapPlan> {
        let torcx_bin = config
            .torcx_bin
            .clone()
            .context("torcx binary not found on PATH; pass --torcx-bin")?;

        let kube_version = kube::resolve_kube_version(config, self.kube.as_ref())?;
        let normalized = versions::normalize_version(&kube_version).to_string();

        let mappings = VersionManifest::load(&config.version_manifest)?;
        let packages = mappings
            .runtime_for(&normalized)
            .with_context(|| {
                format!(
                    "no runtime mapping for kubernetes {} in {}",
                    normalized,
                    config.version_manifest.display()
                )
            })?
            .to_vec();

        let facts = NodeFacts::load(&self.release_file)?;
        let manifest_url = config.manifest_url.render(&ManifestParams {
            board: facts.board,
            os_version: facts.os_version,
            kube_version: normalized.clone(),
        })?;

        tracing::info!(
            kube_version = %normalized,
            manifest_url = %manifest_url,
            packages = packages.len(),
            "bootstrap plan resolved"
        );

        Ok(BootstrapPlan {
            profile: config.profile_name.clone(),
            kube_version: normalized,
            packages,
            manifest_url,
            verify_signatures: config.verify_signatures,
            keyring: config
                .gpg_keyring
                .clone()
                .filter(|_| config.verify_signatures),
            torcx_bin,
        })
    }
}

impl Behavior for Bootstrap {
    fn run(&self, config: &Config) -> Result<()> {
        let plan = self.plan(config)?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        Ok(())
    }
}
