//! kube-torcx - torcx runtime bootstrapper for Kubernetes nodes.
//!
//! One binary, several behaviors, picked by the name it was invoked as:
//! - `kube-torcx-bootstrap` resolves the runtime packages for the node
//! - `kube-torcx-hook-pre` checks prerequisites before the kubelet starts

use anyhow::Result;

use kube_torcx::config;
use kube_torcx::logging;
use kube_torcx::multicall::Dispatcher;
use kube_torcx::Error;

fn main() -> Result<()> {
    let levels = logging::init()?;

    if let Some(path) = config::load_env_file()? {
        tracing::debug!(path = %path.display(), "loaded env file");
    }

    let dispatcher = Dispatcher::init(&levels)?;
    match dispatcher.dispatch(std::env::args_os()) {
        Err(Error::Usage(e)) => e.exit(),
        result => Ok(result?),
    }
}
