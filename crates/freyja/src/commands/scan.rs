//! `scan` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

use crate::style::print_query_table;

pub fn run(config: &Config, prefix: Option<&str>) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;
    let prefix_bytes = prefix.unwrap_or("").as_bytes();
    let mut pairs = store
        .scan_prefix(prefix_bytes)
        .context("failed to scan prefix")?;
    store.close().context("failed to close store")?;

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let columns = vec!["key".to_string(), "value".to_string()];
    let rows: Vec<Vec<String>> = pairs
        .iter()
        .map(|(k, v)| {
            vec![
                String::from_utf8_lossy(k).to_string(),
                String::from_utf8_lossy(v).to_string(),
            ]
        })
        .collect();
    print_query_table(&columns, &rows);
    Ok(())
}
