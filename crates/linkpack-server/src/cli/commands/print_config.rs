//! `linkpack print-config` – show the effective configuration.

use anyhow::{Context, Result};
use linkpack_core::config::LinkpackConfig;

pub fn run_print_config(cfg: &LinkpackConfig) -> Result<()> {
    let text = toml::to_string_pretty(cfg).context("serialize config")?;
    print!("{text}");
    Ok(())
}
