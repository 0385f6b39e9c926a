//! `cca config` command - inspect the effective configuration

use clap::Subcommand;
use console::style;
use miette::Result;
use std::collections::BTreeMap;

use crate::cli::commands::utils::{load_config, to_json, to_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::{CONFIG_KEYS, PROJECT_DIR};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,

    /// List all available configuration keys
    Keys,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

/// Run a config subcommand
pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => run_show(args, global),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Keys => run_keys(),
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);

    // If a specific key is requested, show just that value
    if let Some(key) = &args.key {
        if !CONFIG_KEYS.iter().any(|(k, _)| *k == key.as_str()) {
            return Err(miette::miette!(
                help = "Run `cca config keys` to list valid keys",
                "Unknown configuration key '{}'",
                key
            ));
        }
        return match config.get(key) {
            Some(value) => {
                println!("{}", value);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    let values = effective_values(&config);
    match global.format {
        OutputFormat::Json => println!("{}", to_json(&values)?),
        OutputFormat::Yaml => print!("{}", to_yaml(&values)?),
        _ => {
            println!("{}", style("Effective Configuration").bold().underlined());
            println!();
            for (key, _) in CONFIG_KEYS {
                print_config_value(key, values.get(*key).map(String::as_str));
            }

            println!();
            println!("{}", style("Config Sources (in priority order):").dim());
            println!("  1. Command-line flags (--database)");
            println!("  2. Environment variables (CCA_DATABASE, CCA_TABLE, CCA_MODEL, ...)");
            println!("  3. Project config ({}/config.yaml)", PROJECT_DIR);
            println!("  4. Global config (~/.config/cca/config.yaml)");
        }
    }

    Ok(())
}

fn effective_values(config: &Config) -> BTreeMap<&'static str, String> {
    CONFIG_KEYS
        .iter()
        .filter_map(|(key, _)| config.get(key).map(|value| (*key, value)))
        .collect()
}

fn print_config_value(key: &str, value: Option<&str>) {
    if let Some(v) = value {
        println!("  {}: {}", style(key).cyan(), style(v).yellow());
    } else {
        println!("  {}: {}", style(key).cyan(), style("(not set)").dim());
    }
}

fn run_path() -> Result<()> {
    println!("{}", style("Configuration file paths:").bold());
    println!();

    match Config::global_config_path() {
        Some(path) => {
            println!("  {} {}", style("Global:").cyan(), path.display());
            if path.exists() {
                println!("          {}", style("(exists)").green());
            } else {
                println!("          {}", style("(not created)").dim());
            }
        }
        None => println!(
            "  {} {}",
            style("Global:").cyan(),
            style("(no home directory)").dim()
        ),
    }

    println!();
    let cwd = std::env::current_dir().map_err(|e| miette::miette!("{}", e))?;
    match Config::project_config_path(&cwd) {
        Some(path) => {
            println!("  {} {}", style("Project:").cyan(), path.display());
            println!("          {}", style("(exists)").green());
        }
        None => println!(
            "  {} {}",
            style("Project:").cyan(),
            style(format!("(no {}/config.yaml found)", PROJECT_DIR)).dim()
        ),
    }

    Ok(())
}

fn run_keys() -> Result<()> {
    println!("{}", style("Available configuration keys:").bold());
    println!();

    for (key, description) in CONFIG_KEYS {
        println!("  {:<24} {}", style(key).cyan(), style(description).dim());
    }

    Ok(())
}
