//! `unrelate` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

use crate::style::print_success;

pub fn run(config: &Config, from: &str, to: &str, relation: &str) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;
    store
        .delete_relationship(from, to, relation)
        .with_context(|| format!("failed to unrelate {from:?} -{relation}-> {to:?}"))?;
    store.close().context("failed to close store")?;

    print_success(&format!("removed {from} -{relation}-> {to}"));
    Ok(())
}
