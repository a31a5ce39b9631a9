//! `delete` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

use crate::style::print_success;

pub fn run(config: &Config, key: &str) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;
    store
        .delete(key.as_bytes())
        .with_context(|| format!("failed to delete key {key:?}"))?;
    store.close().context("failed to close store")?;

    print_success(&format!("Deleted {key:?}"));
    Ok(())
}
