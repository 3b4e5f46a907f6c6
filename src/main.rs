// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! lumen-resolve: inspect module resolution without a live engine
//!
//! Runs the same searcher chain the runtime uses and reports which
//! loader a module name resolves to, or the full diagnostic trail when
//! nothing matches. Handy for debugging `LUMEN_PATH`/`LUMEN_CPATH`
//! setups.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lumen_modules::module_system::Loader;
use lumen_modules::{ModuleRuntime, PathConfig};
use owo_colors::OwoColorize;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lumen-resolve", version, about = "Lumen module resolution probe")]
struct Cli {
    /// Override the source search path
    #[arg(long)]
    path: Option<String>,

    /// Override the native search path
    #[arg(long)]
    cpath: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a module name through the searcher chain
    Find {
        /// Module name, e.g. `net.socket`
        module: String,
    },
    /// Expand a search path against a name and probe the filesystem
    Search {
        /// Name to substitute for `?`
        name: String,
        /// Template list, `;`-separated
        search_path: String,
        /// Separator to rewrite in the name (default `.`)
        #[arg(long)]
        sep: Option<String>,
        /// Replacement for the separator (default platform dirsep)
        #[arg(long)]
        dirsep: Option<String>,
    },
    /// Print the active configuration
    Config,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let env = PathConfig::from_env();
    let config = PathConfig::with_paths(
        cli.path.unwrap_or(env.source_path),
        cli.cpath.unwrap_or(env.native_path),
    );
    let mut runtime = ModuleRuntime::with_config(config);

    match cli.command {
        Command::Find { module } => match runtime.find_loader(&module) {
            Ok(Loader::Source { path, .. }) => {
                println!("{} {}", "source".green().bold(), path.display());
                Ok(ExitCode::SUCCESS)
            }
            Ok(Loader::Native { path, entry }) => {
                println!(
                    "{} {} ({})",
                    "native".green().bold(),
                    path.display(),
                    entry.symbol()
                );
                Ok(ExitCode::SUCCESS)
            }
            Ok(Loader::Preloaded(_)) => {
                println!("{} {}", "preload".green().bold(), module);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}: {e}", "not found".yellow().bold());
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Search {
            name,
            search_path,
            sep,
            dirsep,
        } => match runtime.searchpath(&name, &search_path, sep.as_deref(), dirsep.as_deref()) {
            Ok(found) => {
                println!("{}", found.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}: {e}", "not found".yellow().bold());
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Config => {
            println!("path   {}", runtime.config().source_path);
            println!("cpath  {}", runtime.config().native_path);
            print!("{}", PathConfig::config_string());
            Ok(ExitCode::SUCCESS)
        }
    }
}
