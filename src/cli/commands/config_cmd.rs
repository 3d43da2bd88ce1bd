//! Configuration management commands.

use console::style;

use crate::config::Config;

/// Print the effective configuration (file, defaults and env overrides) as TOML.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => eprintln!("{} {}", style("# Loaded from").dim(), path.display()),
        None => eprintln!("{}", style("# No config file found, using defaults").dim()),
    }

    let toml = config.to_toml().map_err(|e| anyhow::anyhow!(e))?;
    print!("{}", toml);
    Ok(())
}
