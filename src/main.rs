mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use futures::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use dicom_rt_ingest::{Converter, ProgressEvent};

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let converter = Converter::new(cli.config());

    let (tx, mut rx) = futures::channel::mpsc::unbounded::<ProgressEvent>();
    let handle = converter.spawn(cli.root.clone(), tx);

    let mut terminal = None;
    while let Some(event) = rx.next().await {
        if event.is_terminal() {
            terminal = Some(event);
        } else if let ProgressEvent::Progress(pct) = event {
            info!(percent = pct, "converting");
        }
    }

    let report = handle.await.context("conversion worker did not complete")?;

    match terminal {
        Some(ProgressEvent::Finished(cases)) => {
            println!("{}", serde_json::to_string(&cases)?);
            let report = report?;
            if !report.skipped.is_empty() {
                info!(skipped = report.skipped.len(), "some inputs were skipped; RUST_LOG=debug lists them");
            }
            Ok(())
        }
        Some(ProgressEvent::NothingFound) => {
            warn!(root = %cli.root.display(), "no DICOM found");
            bail!("no DICOM cases found under {}", cli.root.display())
        }
        _ => {
            report.context("conversion failed")?;
            bail!("conversion failed")
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
