//! `adsretry config` – show where config lives and what is in effect.

use adsretry_core::config::{self, AdsRetryConfig};
use anyhow::Result;
use std::path::Path;

/// `# <path>` followed by the config as TOML. Fails on an invalid `[retry]` section.
fn render_config(cfg: &AdsRetryConfig, path: &Path) -> Result<String> {
    // Validate before printing so a bad file is reported, not echoed.
    cfg.retry_config()?;
    Ok(format!(
        "# {}\n{}",
        path.display(),
        toml::to_string_pretty(cfg)?
    ))
}

pub fn run_config(cfg: &AdsRetryConfig, explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => config::config_path()?,
    };
    print!("{}", render_config(cfg, &path)?);
    Ok(())
}
