//! Command execution: wires configuration, the GitHub forge and the
//! orchestrator together for a single run.
use log::*;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

use crate::{
    Result, actions, cli,
    forge::{github::Github, throttle::ThrottledForge, traits::Forge},
    orchestrator::{Orchestrator, RunOutputs},
};

/// Single-threaded runtime for a run. Uploads fan out as tasks that
/// interleave on this one thread.
pub fn runtime() -> Result<Runtime> {
    Ok(Builder::new_current_thread().enable_all().build()?)
}

/// Execute a release run and report its outputs.
pub async fn execute(args: &cli::Args) -> Result<RunOutputs> {
    let config = args.to_config()?;
    let remote = args.remote_config()?;

    info!("using repository {} at {}", remote.path(), remote.api_url);

    let github = Github::new(remote)?;
    let forge: Arc<dyn Forge> = Arc::new(ThrottledForge::new(Box::new(github)));

    let outputs = Orchestrator::new(config, forge).run().await?;

    actions::write_outputs(&outputs)?;

    Ok(outputs)
}
