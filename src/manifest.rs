//! Torcx manifest URL templates.
//!
//! The URL is compiled early, during config resolution, but rendered late:
//! the Kubernetes version it may reference is only known once a behavior
//! has resolved it. Forced and discovered versions both go through
//! [`ManifestLocator::render`].

use serde::Serialize;
use tera::{Context, Tera};

use crate::error::{Error, Result};

/// Default torcx manifest URL template.
pub const MANIFEST_URL_TEMPLATE: &str =
    "https://tectonic-torcx.release.core-os.net/manifests/{{ board }}/{{ os_version }}/torcx_manifest.json";

const TEMPLATE_NAME: &str = "torcx_manifest_url";

/// Values available to the manifest URL template.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestParams {
    pub board: String,
    pub os_version: String,
    pub kube_version: String,
}

/// A compiled manifest URL template.
#[derive(Debug, Clone)]
pub struct ManifestLocator {
    source: String,
    tera: Tera,
}

impl ManifestLocator {
    /// Compile a template string. Syntax errors are reported here, not at render time.
    pub fn compile(source: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(|e| Error::InvalidManifestTemplate {
                template: source.to_string(),
                source: e,
            })?;

        tracing::debug!(template = source, "compiled manifest URL template");

        Ok(Self {
            source: source.to_string(),
            tera,
        })
    }

    /// The template text this locator was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Produce the concrete manifest URL.
    ///
    /// Fails if the template references a variable not in [`ManifestParams`].
    pub fn render(&self, params: &ManifestParams) -> anyhow::Result<String> {
        let context = Context::from_serialize(params)?;
        let url = self.tera.render(TEMPLATE_NAME, &context).map_err(|e| {
            anyhow::anyhow!("failed to render manifest URL {:?}: {}", self.source, e)
        })?;
        Ok(url.trim().to_string())
    }
}

impl PartialEq for ManifestLocator {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for ManifestLocator {}
