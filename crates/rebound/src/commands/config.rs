//! Config command

use anyhow::{Context, Result};
use camino::Utf8Path;
use rebound_core::ReboundConfig;

use crate::cli::{ConfigCommands, ConfigShowArgs};
use crate::output;

pub fn run(cmd: ConfigCommands, config_dir: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, config_dir),
        ConfigCommands::Path => path(config_dir),
    }
}

fn show(args: ConfigShowArgs, config_dir: Option<&Utf8Path>) -> Result<()> {
    let loader = super::loader(config_dir)?;
    let config = loader.load().context("Failed to load configuration")?;

    if !args.json {
        let path = loader.config_path();
        if path.exists() {
            output::info(&format!("Loaded from {}", path));
        } else {
            output::info(&format!("No config file at {}, showing defaults", path));
        }
    }
    print!("{}", render(&config, args.json)?);
    Ok(())
}

fn render(config: &ReboundConfig, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(config)? + "\n")
    } else {
        Ok(serde_yaml_ng::to_string(config)?)
    }
}

fn path(config_dir: Option<&Utf8Path>) -> Result<()> {
    let loader = super::loader(config_dir)?;
    println!("{}", loader.config_path());
    Ok(())
}
