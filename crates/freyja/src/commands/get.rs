//! `get` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

pub fn run(config: &Config, key: &str) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;
    let value = store
        .get(key.as_bytes())
        .with_context(|| format!("failed to get key {key:?}"))?;
    store.close().context("failed to close store")?;

    match String::from_utf8(value.clone()) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{}", hex(&value)),
    }
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
