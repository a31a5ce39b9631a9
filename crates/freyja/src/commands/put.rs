//! `put` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

use crate::style::print_success;

pub fn run(config: &Config, key: &str, value: &str) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;
    store
        .put(key.as_bytes(), value.as_bytes())
        .with_context(|| format!("failed to put key {key:?}"))?;
    store.close().context("failed to close store")?;

    print_success(&format!("Put {key:?} ({} bytes)", value.len()));
    Ok(())
}
