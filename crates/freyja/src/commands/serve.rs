//! `serve` command implementation.
//!
//! Hosts the `freyja-server` REST facade on a dedicated multi-thread
//! runtime. The rest of the CLI is synchronous; only this subcommand needs
//! `tokio`.

use anyhow::{Context, Result};
use freyja_core::Config;

use crate::style::print_success;

pub fn run(address: &str, config: &Config, api_key: Option<&str>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    print_success(&format!(
        "Serving {} on http://{address}",
        config.data_dir.display()
    ));

    runtime.block_on(freyja_server::serve(
        address,
        config.clone(),
        api_key.map(str::to_string),
    ))
}
