//! `explain` command implementation.

use anyhow::{Context, Result};
use freyja_core::{Config, KvStore};

use crate::style::{print_info_table, print_query_table, print_spacer};

pub fn run(config: &Config, samples: usize) -> Result<()> {
    let (store, _) = KvStore::open(config.clone()).context("failed to open store")?;
    let report = store.explain(samples).context("failed to explain store")?;
    store.close().context("failed to close store")?;

    let summary = &report.summary;
    print_info_table(&[
        ("total_keys", &summary.total_keys.to_string()),
        ("live_keys", &summary.live_keys.to_string()),
        ("tombstones", &summary.tombstones.to_string()),
        ("total_size_mib", &format!("{:.3}", summary.total_size_mib)),
        ("live_size_mib", &format!("{:.3}", summary.live_size_mib)),
        ("elapsed", &format!("{:?}", report.elapsed)),
    ]);

    if !report.samples.is_empty() {
        print_spacer();
        let columns = vec![
            "key".to_string(),
            "value_size".to_string(),
            "timestamp".to_string(),
            "tombstone".to_string(),
        ];
        let rows: Vec<Vec<String>> = report
            .samples
            .iter()
            .map(|s| {
                vec![
                    String::from_utf8_lossy(&s.key).to_string(),
                    s.value_size.to_string(),
                    s.timestamp.to_string(),
                    s.is_tombstone.to_string(),
                ]
            })
            .collect();
        print_query_table(&columns, &rows);
    }
    Ok(())
}
