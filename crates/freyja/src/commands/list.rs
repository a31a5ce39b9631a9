//! `list` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

use crate::style::{print_labeled, print_spacer};

pub fn run(config: &Config, prefix: Option<&str>) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;
    let prefix_bytes = prefix.unwrap_or("").as_bytes();
    let mut keys = store.list_keys(prefix_bytes).context("failed to list keys")?;
    store.close().context("failed to close store")?;

    keys.sort();
    for key in &keys {
        println!("{}", String::from_utf8_lossy(key));
    }
    print_spacer();
    print_labeled("total", &keys.len().to_string());
    Ok(())
}
