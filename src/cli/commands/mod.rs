//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments (when it takes any)
//! - `run()` function to execute the command

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;

pub mod list;
pub mod run;

/// Dispatch a command to its handler. No subcommand means `run`.
pub fn run(ctx: &AppContext, command: Option<&Commands>) -> Result<()> {
    match command {
        None | Some(Commands::Run) => run::run(ctx),
        Some(Commands::List(args)) => list::run(ctx, args),
    }
}
