//! Keystone license keytool
//!
//! Issues and inspects license keys on behalf of the licensing authority.
//!
//! Usage:
//!   keystone-keytool generate-keys --public-key authority.pub --private-key authority.key
//!   keystone-keytool issue --private-key authority.key --issued-to acme --expires-in-days 365
//!   keystone-keytool inspect --key AAAAAQAAAAE...

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keystone_crypto::CryptoProvider;
use keystone_keytool::{
    crypto_provider, expiration_in_days, generate_keys, inspect, issue, self_generated,
};
use keystone_license::{LicenseVerifier, now_millis};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keystone-keytool")]
#[command(about = "Issue and inspect Keystone license keys")]
struct Args {
    /// 16-byte payload passphrase (defaults to the shipped passphrase)
    #[arg(long, global = true)]
    passphrase: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new RSA key pair for the issuing authority
    GenerateKeys {
        #[arg(long)]
        public_key: PathBuf,
        #[arg(long)]
        private_key: PathBuf,
    },

    /// Issue a signed enterprise license
    Issue {
        #[arg(long)]
        private_key: PathBuf,
        #[arg(long)]
        issued_to: String,
        #[arg(long, conflicts_with = "expires_at_ms", required_unless_present = "expires_at_ms")]
        expires_in_days: Option<u32>,
        /// Absolute expiration in epoch milliseconds
        #[arg(long)]
        expires_at_ms: Option<i64>,
    },

    /// Encode a self-generated license that never expires
    SelfGenerated {
        #[arg(long)]
        issued_to: String,
    },

    /// Print the contents and validity of a license key as JSON
    Inspect {
        #[arg(long)]
        key: String,
        /// Authority public key (defaults to the bundled key)
        #[arg(long)]
        public_key: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let crypto = crypto_provider(args.passphrase.as_deref())?;
    let now = now_millis();

    match args.command {
        Command::GenerateKeys {
            public_key,
            private_key,
        } => generate_keys(&crypto, &public_key, &private_key)?,
        Command::Issue {
            private_key,
            issued_to,
            expires_in_days,
            expires_at_ms,
        } => {
            let expiration = match (expires_in_days, expires_at_ms) {
                (_, Some(at)) => at,
                (Some(days), None) => expiration_in_days(now, days)?,
                (None, None) => anyhow::bail!("Missing --expires-in-days or --expires-at-ms"),
            };
            let key = issue(&crypto, &private_key, &issued_to, expiration, now)?;
            info!("Issued enterprise license for {}", issued_to);
            println!("{key}");
        }
        Command::SelfGenerated { issued_to } => {
            println!("{}", self_generated(&crypto, &issued_to)?);
        }
        Command::Inspect { key, public_key } => {
            let verifier = load_verifier(crypto, public_key)?;
            let report = inspect(&verifier, &key, now)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn load_verifier(crypto: CryptoProvider, public_key: Option<PathBuf>) -> Result<LicenseVerifier> {
    match public_key {
        Some(path) => LicenseVerifier::with_public_key_file(crypto, &path)
            .with_context(|| format!("Failed to load public key {path:?}")),
        None => {
            LicenseVerifier::with_bundled_key(crypto).context("Failed to load bundled public key")
        }
    }
}
