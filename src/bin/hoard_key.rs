//! hoard-key — inspect cache keys and configuration
//!
//! Prints the key a call would be cached under, or the effective
//! configuration after file and environment overrides.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use hoard::{Argument, CachePolicy, CachingEngine, Config, MemoryStore, TargetIdentity};

/// Hoard key inspector
#[derive(Parser)]
#[command(name = "hoard-key")]
#[command(version)]
#[command(about = "Inspect hoard cache keys and configuration")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "HOARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the cache key for a call on a shared (type-scoped) target
    Key {
        /// Target type name
        #[arg(short = 't', long = "type")]
        type_name: String,
        /// Method name
        #[arg(short, long)]
        method: String,
        /// Arguments as a JSON array
        #[arg(short, long, default_value = "[]")]
        args: String,
        /// Explicit policy key
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .apply_env_overrides()?;

    match args.command {
        Command::Key {
            type_name,
            method,
            args: raw_args,
            key,
        } => {
            let arguments = parse_arguments(&raw_args)?;
            let policy = CachePolicy {
                key,
                ..CachePolicy::default()
            };
            policy.validate()?;

            let engine = CachingEngine::new(Arc::new(MemoryStore::new()), config);
            let target = TargetIdentity::shared(type_name);
            println!("{}", engine.cache_key(&target, &method, &arguments, &policy));
        }

        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn parse_arguments(raw: &str) -> Result<Vec<Argument>, Box<dyn std::error::Error>> {
    match serde_json::from_str(raw)? {
        serde_json::Value::Array(values) => Ok(values.into_iter().map(Argument::from).collect()),
        _ => Err("--args must be a JSON array".into()),
    }
}
