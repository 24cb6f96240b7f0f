// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! qpcatalog CLI - manage pathology image projects

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use qpcatalog::commands;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qpcatalog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "QPCATALOG_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", global = true, value_parser = clap::builder::BoolishValueParser::new())]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty project
    Create {
        /// Project directory or .qpproj file
        path: PathBuf,
    },

    /// Show project metadata
    Info {
        /// Project directory or .qpproj file
        path: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Manage path classes
    Classes {
        /// Project directory or .qpproj file
        path: PathBuf,

        /// Action: list, add
        #[arg(default_value = "list")]
        action: String,

        /// Class name (for add)
        name: Option<String>,

        /// Parent class id, for a derived class
        #[arg(long)]
        parent: Option<String>,

        /// Color as R,G,B or #rrggbb
        #[arg(long)]
        color: Option<String>,

        /// Opacity between 0.0 and 1.0
        #[arg(long)]
        alpha: Option<f64>,
    },

    /// Add images (directories are searched recursively)
    Add {
        /// Project directory or .qpproj file
        project: PathBuf,

        /// Image files or directories
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Image type (e.g. brightfield_h_e, fluorescence)
        #[arg(short = 't', long = "type")]
        image_type: Option<String>,

        /// Only add files matching this glob when walking directories
        #[arg(short, long)]
        glob: Option<String>,
    },

    /// Check that every image can be opened
    Check {
        /// Project directory or .qpproj file
        project: PathBuf,
    },

    /// Point images at new locations
    Relink {
        /// Project directory or .qpproj file
        project: PathBuf,

        /// Rewrite OLD=NEW (URIs or paths; directories rewrite everything below)
        #[arg(long = "map", value_name = "OLD=NEW")]
        maps: Vec<String>,

        /// Re-anchor images that moved together with the project directory
        #[arg(long)]
        rebase: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = qpcatalog::config::load(cli.config.as_deref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => config.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();
    // Config is read before logging exists, since it sets the default level
    tracing::debug!(
        "Loaded config: thumbnail_size = {}, default_image_type = {}",
        config.thumbnail_size,
        config.default_image_type.code()
    );

    // Execute command
    match cli.command {
        Commands::Create { path } => commands::create::run(&path, &config),
        Commands::Info { path, json } => commands::info::run(&path, json, &config),
        Commands::Classes { path, action, name, parent, color, alpha } => {
            let options = commands::classes::AddOptions { parent, color, alpha };
            commands::classes::run(&path, &action, name, options, &config)
        }
        Commands::Add { project, paths, image_type, glob } => {
            commands::add::run(&project, &paths, image_type.as_deref(), glob.as_deref(), &config)
        }
        Commands::Check { project } => commands::check::run(&project, cli.no_color, &config),
        Commands::Relink { project, maps, rebase } => {
            commands::relink::run(&project, &maps, rebase, &config)
        }
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
