//! Behavior handlers.
//!
//! Each submodule handles one multicall behavior:
//! - `bootstrap` - resolve what torcx should install and print the plan
//! - `hook_pre` - kubelet pre-start checks

pub mod bootstrap;
pub mod hook_pre;

use std::path::Path;

use anyhow::Result;

use crate::config::Config;
use crate::kube::Kubectl;
use crate::node;

pub use bootstrap::{Bootstrap, BootstrapPlan};
pub use hook_pre::HookPre;

/// A behavior selected by invocation name.
pub trait Behavior {
    fn run(&self, config: &Config) -> Result<()>;
}

/// The closed set of behaviors this binary can act as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BehaviorKind {
    Bootstrap,
    HookPre,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 2] = [BehaviorKind::Bootstrap, BehaviorKind::HookPre];

    /// Invocation name (symlink name) for this behavior.
    pub fn name(self) -> &'static str {
        match self {
            BehaviorKind::Bootstrap => "kube-torcx-bootstrap",
            BehaviorKind::HookPre => "kube-torcx-hook-pre",
        }
    }

    /// Name accepted as the first argument of the bare `kube-torcx` binary.
    pub fn short_name(self) -> &'static str {
        match self {
            BehaviorKind::Bootstrap => "bootstrap",
            BehaviorKind::HookPre => "hook-pre",
        }
    }

    pub fn about(self) -> &'static str {
        match self {
            BehaviorKind::Bootstrap => "Resolve the torcx runtime for this node's Kubernetes version",
            BehaviorKind::HookPre => "Check torcx runtime prerequisites before the kubelet starts",
        }
    }

    /// Runtime mappings used when `--version-manifest` is empty.
    pub fn default_version_manifest(self) -> &'static Path {
        match self {
            // Shipped with the image; the only option before anything is installed.
            BehaviorKind::Bootstrap => Path::new("/usr/share/kube-torcx/runtime-mappings.json"),
            BehaviorKind::HookPre => Path::new("/etc/kube-torcx/runtime-mappings.json"),
        }
    }

    /// Production handler for this behavior.
    pub fn handler(self) -> Box<dyn Behavior> {
        match self {
            BehaviorKind::Bootstrap => Box::new(Bootstrap::new(
                Box::new(Kubectl::default()),
                node::release_file(),
            )),
            BehaviorKind::HookPre => Box::new(HookPre::new(Box::new(Kubectl::default()))),
        }
    }
}
