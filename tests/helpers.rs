//! Shared test utilities for kube-torcx tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tempfile::TempDir;

use kube_torcx::flags::Flags;
use kube_torcx::kube::KubeVersionSource;
use kube_torcx::manifest::MANIFEST_URL_TEMPLATE;

pub const MAPPINGS: &str = r#"{
    "kind": "VersionManifestV0",
    "value": {
        "1.15.0": [{ "name": "docker", "version": "18.06" }],
        "1.14": [
            { "name": "docker", "version": "17.03" },
            { "name": "runc", "version": "1.0.0" }
        ]
    }
}"#;

/// Node filesystem stand-in: torcx binary, keyring, mappings, release file.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub torcx_bin: PathBuf,
    pub keyring: PathBuf,
    pub mappings: PathBuf,
    pub release: PathBuf,
    /// Empty env file, so the host's default one is never read.
    pub env_file: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path();

        let torcx_bin = base.join("torcx");
        let keyring = base.join("pubring.gpg");
        let mappings = base.join("runtime-mappings.json");
        let release = base.join("release");
        let env_file = base.join("kube-torcx.env");

        fs::write(&torcx_bin, "#!/bin/sh\n").expect("Failed to write torcx");
        fs::write(&keyring, b"\x99\x01\x0d").expect("Failed to write keyring");
        fs::write(&mappings, MAPPINGS).expect("Failed to write mappings");
        fs::write(
            &release,
            "COREOS_RELEASE_VERSION=2135.4.0\nCOREOS_RELEASE_BOARD=amd64-usr\n",
        )
        .expect("Failed to write release file");
        fs::write(&env_file, "").expect("Failed to write env file");

        Self {
            _temp_dir: temp_dir,
            torcx_bin,
            keyring,
            mappings,
            release,
            env_file,
        }
    }

    /// Command line for `name` pointing at this environment's files.
    pub fn argv(&self, name: &str, extra: &[&str]) -> Vec<String> {
        let mut argv = vec![
            name.to_string(),
            format!("--torcx-bin={}", self.torcx_bin.display()),
            format!("--keyring={}", self.keyring.display()),
            format!("--version-manifest={}", self.mappings.display()),
        ];
        argv.extend(extra.iter().map(|s| s.to_string()));
        argv
    }
}

/// Flags that pass every check.
pub fn valid_flags() -> Flags {
    Flags {
        kubeconfig: "/etc/kubernetes/kubeconfig".to_string(),
        torcx_bin: "/usr/bin/torcx".to_string(),
        torcx_manifest_url: MANIFEST_URL_TEMPLATE.to_string(),
        torcx_profile: "node-profile".to_string(),
        force_kube_version: String::new(),
        no_verify_signatures: false,
        keyring: "/pubring.gpg".to_string(),
        version_manifest: String::new(),
        verbose: "info".to_string(),
    }
}

/// Version source that always answers the same way.
pub struct FixedVersion(pub Option<&'static str>);

impl KubeVersionSource for FixedVersion {
    fn server_version(&self, kubeconfig: &Path) -> Result<String> {
        match self.0 {
            Some(version) => Ok(version.to_string()),
            None => bail!("apiserver at {} unreachable", kubeconfig.display()),
        }
    }
}
