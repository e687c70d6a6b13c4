//! tf-local - main entry point
//!
//! Requests arrive as JSON on stdin (or a file) and responses go to stdout.
//! Logs go to stderr so they never interleave with responses.

use anyhow::{Context, Result};
use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tf_local::cli::{Cli, Commands};
use tf_local::config::ProviderConfig;
use tf_local::process_guard::{self, ProcessGuard};
use tf_local::provider::LocalProvider;
use tf_local::request::{Response, handle_request, parse_request};

/// Initialize logging. `--log-level` wins over `RUST_LOG`; default is `info`.
fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("Invalid --log-level filter")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.log_level.as_deref())?;
    info!(version = env!("CARGO_PKG_VERSION"), "tf-local starting up");

    let config = match &cli.config {
        Some(path) => ProviderConfig::load_from_file(path)?,
        None => ProviderConfig::default(),
    };

    if let Err(e) = process_guard::init_signal_handlers() {
        // Children still get PR_SET_PDEATHSIG and the guard below
        warn!(error = %e, "Failed to initialize signal handlers");
    }
    let _guard = ProcessGuard::new();

    // Also publishes the grace period to the child registry
    let mut provider = LocalProvider::with_config(env!("CARGO_PKG_VERSION"), config);

    match cli.command {
        Commands::Schema => {
            let schema = provider.schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Commands::Invoke { request } => {
            let text = read_request(request.as_deref())?;
            let response = match parse_request(&text) {
                Ok(request) => handle_request(&mut provider, request),
                Err(response) => response,
            };
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Serve => serve(&mut provider)?,
    }

    Ok(())
}

fn read_request(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request from {:?}", path)),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read request from stdin")?;
            Ok(text)
        }
    }
}

/// One request per line in, one response per line out.
fn serve(provider: &mut LocalProvider) -> Result<()> {
    info!("Serving requests on stdin");
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("Failed to read request line")?;
        if line.trim().is_empty() {
            continue;
        }

        let response: Response = match parse_request(&line) {
            Ok(request) => {
                debug!(operation = %request, "Handling request");
                handle_request(provider, request)
            }
            Err(response) => response,
        };

        serde_json::to_writer(&mut stdout, &response)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
