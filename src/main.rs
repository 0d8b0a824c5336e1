use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use usekit::config::Config;
use usekit::fetch::{FetchOptions, Method, UseFetch};
use usekit::logging::init_tracing;

#[derive(Debug, Parser)]
#[command(name = "usekit", version, about = "Drive usekit adapters from the command line")]
struct Cli {
    /// Config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a JSON resource with retries and print the decoded body.
    Fetch {
        url: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: Method,

        /// Request header as `Name: value`. Repeatable.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Raw request body.
        #[arg(short, long)]
        body: Option<String>,

        /// Retries after the first attempt (overrides config).
        #[arg(long)]
        retries: Option<u32>,

        /// Delay before each retry in milliseconds (overrides config).
        #[arg(long)]
        retry_delay_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Command::Fetch {
            url,
            method,
            headers,
            body,
            retries,
            retry_delay_ms,
        } => {
            let mut options = config.fetch.options().with_method(method);
            for raw in &headers {
                let (name, value) = parse_header(raw)?;
                options = options.with_header(name, value);
            }
            if let Some(body) = body {
                options = options.with_body(body);
            }
            if let Some(retries) = retries {
                options = options.with_retries(retries);
            }
            if let Some(ms) = retry_delay_ms {
                options = options.with_retry_delay(Duration::from_millis(ms));
            }
            run_fetch(url, options, &config).await
        }
    }
}

async fn run_fetch(url: String, options: FetchOptions, config: &Config) -> anyhow::Result<()> {
    let fetch = UseFetch::<serde_json::Value>::http(url, options, &config.fetch)?;
    let mut states = fetch.subscribe();

    let state = loop {
        let state = states.borrow_and_update().clone();
        tracing::info!(
            phase = ?state.phase,
            loading = state.loading,
            attempts = state.attempts,
            error = state.error.as_ref().map(|e| e.to_string()),
            "Fetch state"
        );
        if !state.loading {
            break state;
        }
        states
            .changed()
            .await
            .context("Fetch adapter stopped unexpectedly")?;
    };

    match (state.data, state.error) {
        (Some(data), _) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        (None, Some(error)) => bail!("{}", error),
        (None, None) => bail!("Fetch finished without data"),
    }
}

fn parse_header(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("Invalid header '{}': expected 'Name: value'", raw);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("Invalid header '{}': empty name", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}
