//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;

/// Workshop - answer the challenges laid out in a directory tree
#[derive(Parser, Debug)]
#[command(name = "workshop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Workshop root (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Directory searched for challenge definitions (default: the workshop root)
    #[arg(long, global = true, value_name = "DIR")]
    pub challenges: Option<PathBuf>,

    /// Config file path (default: ~/.config/workshop/config.toml then ./workshop.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress log output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON output and logs
    #[arg(long, global = true)]
    pub robot: bool,

    /// Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Prompt every pending challenge in order
    Run,

    /// Show the catalog with pass status
    List(commands::list::ListArgs),
}
