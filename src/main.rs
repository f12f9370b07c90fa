// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! shimlink CLI - inspect an install the way the in-process resolver sees it

use anyhow::Context;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use shimlink_resolver::{
    AliasTable, InspectionContext, MetadataScanner, ModuleRequest, ResolveError, ResolverConfig,
    ResolverState, VERSION,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "shimlink",
    about = "Interop module resolution diagnostics",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read declared identities in a directory and print the derived name map
    Scan {
        /// Directory holding generated interop modules
        dir: PathBuf,

        /// Module file extension
        #[arg(long, default_value = "dll")]
        extension: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Resolve module names against an install, without loading anything
    Resolve {
        /// Module names or display names
        #[arg(required = true)]
        names: Vec<String>,

        #[command(flatten)]
        install: InstallArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the effective alias table
    Aliases {
        #[command(flatten)]
        install: InstallArgs,
    },

    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        install: InstallArgs,
    },
}

#[derive(clap::Args)]
struct InstallArgs {
    /// Game install root
    #[arg(long)]
    root: Option<PathBuf>,

    /// Primary loader's plugin directory
    #[arg(long)]
    plugin_dir: Option<PathBuf>,

    /// Configuration file (defaults to the plugin directory, then the user config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Module file extension
    #[arg(long)]
    extension: Option<String>,
}

impl InstallArgs {
    fn load(&self) -> anyhow::Result<ResolverConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = ResolverConfig::from_file(path)?;
                config.apply_env(std::env::vars());
                config
            }
            None => ResolverConfig::load(self.plugin_dir.as_deref())?,
        };

        if let Some(root) = &self.root {
            config = config.with_install_root(root);
        }
        if let Some(dir) = &self.plugin_dir {
            config = config.with_plugin_dir(dir);
        }
        if let Some(extension) = &self.extension {
            config = config.with_extension(extension.trim_start_matches('.'));
        }
        config.validate()?;
        debug!("Effective configuration: {:?}", config);
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("shimlink=debug,shimlink_resolver=debug")
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("shimlink=warn,shimlink_resolver=warn")
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Command::Scan {
            dir,
            extension,
            json,
        } => scan(&dir, &extension, json),
        Command::Resolve {
            names,
            install,
            json,
        } => {
            let unresolved = resolve(&names, &install.load()?, json)?;
            if unresolved > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Aliases { install } => {
            print_aliases(&AliasTable::with_extra(&install.load()?.aliases));
            Ok(())
        }
        Command::Config { install } => {
            print!("{}", install.load()?.to_toml());
            Ok(())
        }
    }
}

fn scan(dir: &Path, extension: &str, json: bool) -> anyhow::Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }
    let result = MetadataScanner::new(extension).scan(dir);

    if json {
        let mut mappings: Vec<_> = result.map.mappings().collect();
        mappings.sort_by(|a, b| a.from.cmp(&b.from));
        let modules: Vec<_> = result
            .modules
            .iter()
            .map(|m| {
                serde_json::json!({
                    "file": m.path,
                    "identity": m.identity,
                    "renamed": m.is_renamed(),
                })
            })
            .collect();
        let out = serde_json::json!({
            "modules": modules,
            "skipped": result.skipped,
            "mappings": mappings,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    for module in &result.modules {
        let marker = if module.is_renamed() {
            "renamed".yellow().to_string()
        } else {
            "".to_string()
        };
        println!(
            "{:<40} {} {}",
            module.stem.cyan(),
            module.identity.to_string().dimmed(),
            marker
        );
    }
    if result.skipped > 0 {
        println!("{} unreadable file(s) skipped", result.skipped.to_string().red());
    }

    let mut mappings: Vec<_> = result.map.mappings().collect();
    if !mappings.is_empty() {
        mappings.sort_by(|a, b| a.from.cmp(&b.from));
        println!();
        println!("{}", "Name map".bold());
        for mapping in mappings {
            println!(
                "  {} -> {} ({})",
                mapping.from,
                mapping.to.green(),
                mapping.provenance
            );
        }
    }
    Ok(())
}

/// Returns the number of names that did not resolve
fn resolve(names: &[String], config: &ResolverConfig, json: bool) -> anyhow::Result<usize> {
    let state = ResolverState::new(config.clone(), Arc::new(InspectionContext::new()))
        .context("invalid resolver configuration")?;

    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let request = ModuleRequest::parse(name)
            .with_context(|| format!("invalid module name '{}'", name))?;
        let outcome = state.try_resolve(&request);
        results.push((request, outcome));
    }

    let resolved = state.resolved_modules();
    let strategy_of = |name: &str| {
        resolved
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .map(|m| m.strategy)
    };
    let unresolved = results.iter().filter(|(_, r)| r.is_err()).count();

    if json {
        let entries: Vec<_> = results
            .iter()
            .map(|(request, outcome)| match outcome {
                Ok(handle) => serde_json::json!({
                    "request": request.name,
                    "resolved": true,
                    "identity": handle.identity(),
                    "path": handle.location(),
                    "strategy": strategy_of(&request.name),
                }),
                Err(e) => serde_json::json!({
                    "request": request.name,
                    "resolved": false,
                    "reason": e.to_string(),
                }),
            })
            .collect();
        let out = serde_json::json!({
            "readiness": state.readiness(),
            "results": entries,
            "stats": state.snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(unresolved);
    }

    for (request, outcome) in &results {
        match outcome {
            Ok(handle) => {
                let strategy = strategy_of(&request.name)
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                let location = handle
                    .location()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                println!(
                    "{} {} -> {} [{}]",
                    "ok".green().bold(),
                    request.name,
                    location,
                    strategy.cyan()
                );
            }
            Err(ResolveError::NotApplicable) => {
                println!("{} {} (not an interop module)", "--".dimmed(), request.name);
            }
            Err(e) => {
                println!("{} {}: {}", "no".red().bold(), request.name, e);
            }
        }
    }
    println!();
    println!("{}", state.snapshot().to_string().dimmed());
    Ok(unresolved)
}

fn print_aliases(table: &AliasTable) {
    for mapping in table.mappings() {
        println!(
            "{} -> {} ({})",
            mapping.from,
            mapping.to.green(),
            mapping.provenance
        );
    }
}
