//! CLI for storing and retrieving files

use clap::{Parser, Subcommand};
use mogilefs::{ClientConfig, FileStore};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mogile")]
#[command(about = "MogileFS tracker client")]
#[command(version)]
struct Cli {
    /// Config file (TOML); falls back to $MOGILEFS_CONFIG
    #[arg(long)]
    config: Option<PathBuf>,

    /// Trackers in failover order (comma-separated, overrides config)
    #[arg(long, value_delimiter = ',')]
    tracker: Vec<String>,

    /// Domain (overrides config)
    #[arg(long)]
    domain: Option<String>,

    /// Default storage class (overrides config)
    #[arg(long)]
    class: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file
    Put {
        /// Key
        key: String,

        /// File path (stdin if omitted)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Fetch a file
    Get {
        /// Key
        key: String,

        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// List replica paths
    Paths {
        /// Key
        key: String,

        /// Skip the tracker's replica verification
        #[arg(long)]
        no_verify: bool,
    },

    /// Rename a key
    Rename {
        /// Existing key
        from: String,

        /// New key
        to: String,
    },

    /// Delete a key
    Delete {
        /// Key
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load config from file/env, then override with CLI arguments
    let mut config = ClientConfig::load(cli.config.as_deref())?;
    if !cli.tracker.is_empty() {
        config.trackers = cli.tracker;
    }
    if let Some(domain) = cli.domain {
        config.domain = domain;
    }
    if let Some(class) = cli.class {
        config.default_class = class;
    }

    let store = FileStore::from_config(&config)?;

    match cli.command {
        Commands::Put { key, file } => {
            match file {
                Some(path) => store.store_file(&key, &path, None).await?,
                None => store.store_reader(&key, tokio::io::stdin(), None, None).await?,
            }
            tracing::info!("Stored '{}'", key);
        }

        Commands::Get { key, output } => {
            let bytes = store.fetch(&key).await?;
            match output {
                Some(path) => tokio::fs::write(&path, &bytes).await?,
                None => {
                    let mut stdout = tokio::io::stdout();
                    stdout.write_all(&bytes).await?;
                    stdout.flush().await?;
                }
            }
        }

        Commands::Paths { key, no_verify } => {
            for path in store.list_paths(&key, !no_verify).await? {
                println!("{}", path);
            }
        }

        Commands::Rename { from, to } => {
            store.rename(&from, &to).await?;
            tracing::info!("Renamed '{}' to '{}'", from, to);
        }

        Commands::Delete { key } => {
            store.delete(&key).await?;
            tracing::info!("Deleted '{}'", key);
        }
    }

    store.tracker().disconnect().await;
    Ok(())
}
