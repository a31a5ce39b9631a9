//! FreyjaDB unified CLI.
//!
//! An embeddable, Bitcask-style log-structured key-value store.
//!
//! # Quick Start
//!
//! ```bash
//! # Initialize a data directory
//! freyjadb init ./data
//!
//! # Put and get a value
//! freyjadb --data-dir ./data put user:1 alice
//! freyjadb --data-dir ./data get user:1
//!
//! # Serve the REST facade
//! freyjadb serve --data-dir ./data
//! ```

mod commands;
mod style;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// FreyjaDB - an embeddable, Bitcask-style log-structured key-value store.
#[derive(Parser)]
#[command(name = "freyjadb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory the store is rooted at. Defaults to `storage.data_dir`
    /// from the layered configuration (env, `freyjadb.toml`, built-in
    /// default). Ignored by `init`, which takes its target path as a
    /// positional argument instead.
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Initialize a new data directory.
    Init {
        /// Path to the data directory to create.
        path: String,
    },

    /// Write a key/value pair.
    Put {
        /// Key to write.
        key: String,
        /// Value to write.
        value: String,
    },

    /// Read the value stored under a key.
    Get {
        /// Key to read.
        key: String,
    },

    /// Remove a key.
    Delete {
        /// Key to remove.
        key: String,
    },

    /// List keys, optionally restricted to a prefix.
    List {
        /// Only list keys beginning with this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Read key/value pairs, optionally restricted to a prefix.
    Scan {
        /// Only scan keys beginning with this prefix.
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Show live key count and log size.
    Stats,

    /// Show a diagnostic snapshot of the store's log.
    Explain {
        /// Number of sampled records to include in the report.
        #[arg(long, default_value_t = 10)]
        samples: usize,
    },

    /// Record a directed relationship between two existing keys.
    Relate {
        /// Source key.
        from: String,
        /// Destination key.
        to: String,
        /// Relation label.
        relation: String,
    },

    /// Remove a previously recorded relationship.
    Unrelate {
        /// Source key.
        from: String,
        /// Destination key.
        to: String,
        /// Relation label.
        relation: String,
    },

    /// Query relationships touching a key.
    Relationships {
        /// Key to query.
        key: String,
        /// Direction to traverse: outgoing, incoming, or both.
        #[arg(long)]
        direction: Option<String>,
        /// Restrict to a single relation label.
        #[arg(long)]
        relation: Option<String>,
        /// Maximum number of results.
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// Start the REST facade.
    Serve {
        /// Address to bind to. Defaults to `server.bind_address` from the
        /// layered configuration.
        #[arg(short, long)]
        address: Option<String>,
        /// API key required as a bearer token or `X-Api-Key` header.
        /// Defaults to `server.api_key` from the layered configuration;
        /// omit both to run without authentication.
        #[arg(long)]
        api_key: Option<String>,
    },
}

/// Builds the `freyja-core` store config from the loaded `[storage]`
/// section, overriding `data_dir` with the value resolved from the
/// `--data-dir` flag (or, for `init`, the positional path).
fn core_config(storage: &freyja_config::StorageConfig, data_dir: &str) -> freyja_core::Config {
    freyja_core::Config {
        data_dir: data_dir.into(),
        fsync_interval: storage.fsync_interval(),
        max_record_size: storage.max_record_size,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    style::set_no_color(cli.no_color);

    let config = freyja_config::FreyjaConfig::load().unwrap_or_default();
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| config.storage.data_dir.to_string_lossy().into_owned());
    let store_config = core_config(&config.storage, &data_dir);

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Init { path } => commands::init::run(&store_config, &path),
        Commands::Put { key, value } => commands::put::run(&store_config, &key, &value),
        Commands::Get { key } => commands::get::run(&store_config, &key),
        Commands::Delete { key } => commands::delete::run(&store_config, &key),
        Commands::List { prefix } => commands::list::run(&store_config, prefix.as_deref()),
        Commands::Scan { prefix } => commands::scan::run(&store_config, prefix.as_deref()),
        Commands::Stats => commands::stats::run(&store_config),
        Commands::Explain { samples } => commands::explain::run(&store_config, samples),
        Commands::Relate { from, to, relation } => {
            commands::relate::run(&store_config, &from, &to, &relation)
        }
        Commands::Unrelate { from, to, relation } => {
            commands::unrelate::run(&store_config, &from, &to, &relation)
        }
        Commands::Relationships {
            key,
            direction,
            relation,
            limit,
        } => commands::relationships::run(
            &store_config,
            &key,
            direction.as_deref(),
            relation.as_deref(),
            limit,
        ),
        Commands::Serve { address, api_key } => {
            let address = address.unwrap_or(config.server.bind_address);
            let api_key = api_key.or(config.server.api_key);
            commands::serve::run(&address, &store_config, api_key.as_deref())
        }
    }
}
