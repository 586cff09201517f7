//! `vet-clinic`: build the clinic database, seed it and run the clinic
//! transactions, printing every outcome.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vet_clinic::report::Reporter;
use vet_clinic::store::ClinicStore;
use vet_clinic::walkthrough;

use crate::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.store_config();
    let mut store = ClinicStore::open(config.clone())
        .with_context(|| format!("cannot open clinic store at {}", config.db_path))?;

    if cli.fresh {
        store.drop_schema().context("cannot reset clinic schema")?;
    }

    let stdout = io::stdout();
    let mut reporter = Reporter::new(stdout.lock(), cli.format);
    let summary = walkthrough::run(&mut store, &mut reporter)
        .map_err(|e| {
            let context = walkthrough::fatal_context(&e);
            anyhow::Error::new(e).context(context)
        })?;
    tracing::info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "run complete"
    );

    store.close().context("cannot close clinic store")?;
    Ok(())
}

/// Initialize logging based on verbosity level; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let filter_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}
