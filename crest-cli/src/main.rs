mod cli;
mod io;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use crest_config::{ConfigLoader, CrestConfig};
use crest_core::{EnvSessionCredential, Engine, RequestTemplate};
use crest_http::HttpManager;
use io::{json_lines, select_mode, JsonLinesSink, RecordStream};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Load configuration: file, then environment, then command line flags
fn load_config(cli: &Cli) -> Result<CrestConfig> {
    let loader = ConfigLoader::new();

    let mut config = match &cli.config {
        Some(path) => loader
            .layered(Some(path))
            .context(format!("Failed to load configuration from {:?}", path))?,
        None => loader
            .layered(None::<&Path>)
            .context("Failed to load configuration from environment")?,
    };

    cli.apply(&mut config)?;
    Ok(config)
}

/// Where input records come from, if anywhere
async fn open_input(cli: &Cli) -> Result<Option<RecordStream>> {
    if cli.generate {
        return Ok(None);
    }

    match &cli.input {
        Some(path) if path.as_os_str() == "-" => {
            Ok(Some(json_lines(BufReader::new(tokio::io::stdin()))))
        }
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .context(format!("Failed to open input file {:?}", path))?;
            Ok(Some(json_lines(BufReader::new(file))))
        }
        None if !std::io::stdin().is_terminal() => {
            debug!("stdin is not a terminal, reading input records from it");
            Ok(Some(json_lines(BufReader::new(tokio::io::stdin()))))
        }
        None => Ok(None),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.sample_config {
        print!("{}", CrestConfig::generate_sample());
        return Ok(());
    }

    // Load configuration first
    let config = load_config(&cli)?;

    crest_logging::init_logging_from_config(&config.logging, cli.log_level.as_deref())
        .context("Failed to initialize logging")?;
    info!("crest starting");

    let template = RequestTemplate::try_from(&config).context("Invalid request parameters")?;
    let transport = Arc::new(HttpManager::with_config(config.http.clone().into()));
    let engine = Engine::new(
        template,
        transport,
        Arc::new(EnvSessionCredential::default()),
    );

    // Stop between records on Ctrl+C
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing the current record");
            trigger.cancel();
        }
    });

    let mode = select_mode(open_input(&cli).await?, &cancel).await;

    let mut sink = JsonLinesSink::new(std::io::BufWriter::new(std::io::stdout()));
    let summary = engine
        .run(mode, &cancel, &mut sink)
        .await
        .context("Run failed")?;

    debug!("Run summary: {:?}", summary);
    Ok(())
}
