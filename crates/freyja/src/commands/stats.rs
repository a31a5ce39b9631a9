//! `stats` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

use crate::style::print_info_table;

pub fn run(config: &Config) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;
    let stats = store.stats().context("failed to read stats")?;
    store.close().context("failed to close store")?;

    let key_count = stats.key_count.to_string();
    let log_size = stats.log_size_bytes.to_string();
    print_info_table(&[("key_count", &key_count), ("log_size_bytes", &log_size)]);
    Ok(())
}
