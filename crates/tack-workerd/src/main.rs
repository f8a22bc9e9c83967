//! tack worker daemon.

mod config;
mod signal;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, Result};
use clap::Parser;
use tack_core::{Collaborators, Context, Subscribe, TrustVerifier, Worker};
use tack_exec::{CommandVerifier, ProcExecutor};
use tack_observe::{Journal, logger_init};
use tack_queue::{HttpPublisher, HttpQueue};
use tracing::{error, info};

use crate::config::FileConfig;

/// Claims tasks from the queue and runs them one at a time.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "TACK_CONFIG", default_value = "/etc/tack/worker.toml")]
    config: PathBuf,

    /// Log level / filter directive; overrides `[log].level`
    #[arg(long, env = "TACK_LOG_LEVEL")]
    log_level: Option<String>,

    /// JSON file with `{clientId, accessToken}`; overrides `[worker.credentials]`
    #[arg(long)]
    credentials: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut cfg = FileConfig::from_file(&args.config)?;
    if let Some(level) = args.log_level {
        cfg.log.level = level;
    }
    if let Some(path) = &args.credentials {
        cfg.load_credentials(path)?;
    }
    logger_init(&cfg.log)?;
    cfg.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        worker_type = %cfg.worker.worker_type,
        worker_id = %cfg.worker.worker_id,
        queue = %cfg.queue.root_url,
        platform = tack_core::platform(),
        "starting tack worker"
    );

    let worker = Worker::new(Arc::new(build_context(cfg)?));
    let res = worker.run_until(signal::shutdown()).await;
    if let Err(e) = &res {
        error!(error = %e, "worker terminated by an unexpected failure");
    }
    res.context("worker failed")
}

fn build_context(cfg: FileConfig) -> Result<Context> {
    let queue = HttpQueue::new(&cfg.queue, &cfg.worker).context("queue client")?;
    let publisher = HttpPublisher::new(&cfg.queue, &cfg.worker).context("artifact publisher")?;
    let executor = ProcExecutor::new(cfg.exec, &cfg.worker);
    let verifier = (!cfg.cot.verifier.is_empty())
        .then(|| Arc::new(CommandVerifier::new(cfg.cot.verifier)) as Arc<dyn TrustVerifier>);

    let collab = Collaborators {
        queue: Arc::new(queue),
        verifier,
        executor: Arc::new(executor),
        publisher: Arc::new(publisher),
    };
    let journal = Arc::new(Journal::new()) as Arc<dyn Subscribe>;
    Ok(Context::new(cfg.worker, collab).with_subscribers(vec![journal]))
}
