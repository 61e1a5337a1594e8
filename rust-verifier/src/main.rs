//! postal-verify - Check a captured Postal webhook against its signature.
//!
//! Reads the JSON body from a file (or stdin), verifies the base64 signature
//! taken from the `X-Postal-Signature` header, and exits with:
//! - 0 when the signature is valid
//! - 1 when it is not
//! - 2 on configuration or input errors

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use postal_verify::config::LogFormat;
use postal_verify::{is_signature_verification_enabled, verify_postal_signature_async, Config};

#[derive(Parser, Debug)]
#[command(name = "postal-verify", version, about = "Verify a Postal webhook signature")]
struct Args {
    /// Webhook body (JSON). Reads stdin when omitted or "-"
    #[arg(long)]
    body: Option<PathBuf>,

    /// Base64 signature from the X-Postal-Signature header
    #[arg(long, env = "POSTAL_SIGNATURE")]
    signature: String,

    /// Postal public key (bare base64); overrides POSTAL_WEBHOOK_PUBLIC_KEY
    #[arg(long)]
    public_key: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let (log_format, rejected_log_format) = LogFormat::from_env();
    init_logging(log_format);
    if let Some(value) = rejected_log_format {
        warn!(env_var = "LOG_FORMAT", value = %value, "Invalid log format, using default");
    }

    let config = Config::from_env();
    info!(
        public_key_configured = config.signature_verification_enabled(),
        log_format = ?log_format,
        "config_loaded"
    );

    match run(args, config).await {
        Ok(true) => {
            println!("valid");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("invalid");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().flatten_event(true).with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(args: Args, config: Config) -> Result<bool> {
    let public_key = args
        .public_key
        .or(config.postal_webhook_public_key);

    if !is_signature_verification_enabled(&public_key) {
        bail!("no public key configured (set POSTAL_WEBHOOK_PUBLIC_KEY or pass --public-key)");
    }
    let public_key = public_key.unwrap_or_default();

    let raw_body = read_body(args.body.as_ref()).await?;
    let body: Value = serde_json::from_str(&raw_body).context("Webhook body is not valid JSON")?;

    info!(
        body_length = raw_body.len(),
        signature_length = args.signature.len(),
        key_length = public_key.len(),
        "postal_verify_start"
    );

    let valid = verify_postal_signature_async(&body, &args.signature, &public_key)
        .await
        .context("Signature verification failed")?;

    info!(valid = valid, "postal_verify_complete");

    Ok(valid)
}

async fn read_body(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read body file: {}", path.display())),
        _ => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("Failed to read body from stdin")?;
            Ok(raw)
        }
    }
}
