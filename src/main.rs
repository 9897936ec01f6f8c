//! workshop - interactive, file-driven challenge runner
//!
//! Prompts each challenge found under the workshop root and remembers passes
//! in `.workshop/`.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use workshop::app::AppContext;
use workshop::cli::Cli;
use workshop::workshop::BOOT_FAILED;
use workshop::{Result, WorkshopError};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.robot {
                let error_json = serde_json::json!({
                    "error": true,
                    "message": e.to_string(),
                });
                println!("{}", serde_json::to_string(&error_json).unwrap_or_default());
            } else {
                match &e {
                    WorkshopError::StoreOpen(_) => eprintln!("{BOOT_FAILED}\n{e}"),
                    WorkshopError::Interrupted => eprintln!(),
                    _ => eprintln!("Error: {e}"),
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    workshop::cli::commands::run(&ctx, cli.command.as_ref())
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,workshop=info",
        1 => "info,workshop=debug",
        2 => "debug,workshop=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
