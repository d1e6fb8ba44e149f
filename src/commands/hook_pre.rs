//! Hook-pre behavior - kubelet pre-start checks.

use anyhow::Result;

use crate::config::Config;
use crate::kube::KubeVersionSource;
use crate::preflight;

use super::Behavior;

pub struct HookPre {
    kube: Box<dyn KubeVersionSource>,
}

impl HookPre {
    pub fn new(kube: Box<dyn KubeVersionSource>) -> Self {
        Self { kube }
    }
}

impl Behavior for HookPre {
    fn run(&self, config: &Config) -> Result<()> {
        preflight::run_checks_or_fail(config, self.kube.as_ref())?;
        Ok(())
    }
}
