//! SOAP test processor binary.
//!
//! Run with: `soap-test-processor --endpoint https://host/svc --payload request.xml`
//!
//! Prints the response body on stdout. Exits non-zero when the test step
//! produced no body.

use anyhow::{bail, Context, Result};
use clap::Parser;
use soap_test_processor::lifecycle::{self, ProcessorRegistry, TEST_PROCESSOR_CAPABILITY};
use soap_test_processor::{ProcessorConfig, Request};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Execute one SOAP test step against an endpoint.
///
/// Certificate and hostname validation are disabled. Use against test
/// endpoints only.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target endpoint URL
    #[arg(short, long)]
    endpoint: String,

    /// File holding the XML payload ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    payload: PathBuf,

    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for the response body
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Starting SOAP test processor v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    let test_block = read_payload(&args.payload)?;

    let mut registry = ProcessorRegistry::new();
    lifecycle::start(&mut registry, config).context("Failed to start SOAP test processor")?;

    let processor = registry
        .get(TEST_PROCESSOR_CAPABILITY)
        .context("SOAP test processor not registered")?;
    let response = processor.execute_test(&Request::new(args.endpoint, test_block));

    lifecycle::stop(&mut registry);

    match response.into_body() {
        Some(body) => write_body(&mut std::io::stdout().lock(), &body),
        None => bail!("Test step produced no response body"),
    }
}

fn load_config(path: &Path) -> Result<ProcessorConfig> {
    if !path.exists() {
        info!("Config file {} not found, using defaults", path.display());
        return Ok(ProcessorConfig::default());
    }

    info!("Config file: {}", path.display());
    let content = std::fs::read_to_string(path).context("Failed to read config file")?;
    serde_yaml::from_str(&content).context("Failed to parse config file")
}

fn read_payload(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut payload = String::new();
        std::io::stdin()
            .read_to_string(&mut payload)
            .context("Failed to read payload from stdin")?;
        return Ok(payload);
    }

    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload file {}", path.display()))
}

/// Write the response body exactly as received.
fn write_body(out: &mut impl Write, body: &str) -> Result<()> {
    out.write_all(body.as_bytes())
        .and_then(|()| out.flush())
        .context("Failed to write response body")
}
