//! `init` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

use crate::style::{print_labeled, print_success};

/// Creates (or re-opens) the data directory at `path` and reports the
/// recovery outcome from the open. `config` carries the loaded
/// `fsync_interval`/`max_record_size`; its `data_dir` is overridden with
/// `path` since `init` takes its target as a positional argument.
pub fn run(config: &Config, path: &str) -> Result<()> {
    let mut config = config.clone();
    config.data_dir = path.into();

    let (store, recovery) =
        KvStore::open(config).with_context(|| format!("failed to initialize {path}"))?;
    store.close().context("failed to close store after init")?;

    print_success(&format!("Initialized data directory at {path}"));
    print_labeled("records truncated", &recovery.records_truncated.to_string());
    Ok(())
}
