//! workshop run - prompt every pending challenge

use colored::Colorize;
use tracing::info;

use crate::app::AppContext;
use crate::catalog::DocumentLoader;
use crate::error::Result;
use crate::prompt::TerminalPrompter;
use crate::session::{Prompter, SessionOutcome};
use crate::workshop::{ALL_CLEARED, NO_MORE_CHALLENGES, Workshop};

pub fn run(ctx: &AppContext) -> Result<()> {
    let workshop = Workshop::from_context(ctx);
    // The terminal is only taken over when something is pending.
    let outcome = run_with(&workshop, TerminalPrompter::new)?;
    print_outcome(ctx, &outcome);
    Ok(())
}

/// Run one session, building the prompter only if there is something to ask.
pub fn run_with<L, P, F>(workshop: &Workshop<L>, make_prompter: F) -> Result<SessionOutcome>
where
    L: DocumentLoader,
    P: Prompter,
    F: FnOnce() -> Result<P>,
{
    let outcome = workshop.run_lazy(make_prompter)?;
    if let SessionOutcome::Complete(summary) = &outcome {
        info!(
            passed = summary.passed.len(),
            skipped = summary.skipped.len(),
            rejections = summary.rejections,
            "session complete"
        );
    }
    Ok(outcome)
}

fn print_outcome(ctx: &AppContext, outcome: &SessionOutcome) {
    if ctx.robot_mode {
        let json = match outcome {
            SessionOutcome::Empty => serde_json::json!({
                "status": "ok",
                "outcome": "empty",
            }),
            SessionOutcome::Complete(summary) => serde_json::json!({
                "status": "ok",
                "outcome": "complete",
                "passed": summary.passed,
                "skipped": summary.skipped,
                "rejections": summary.rejections,
            }),
        };
        println!("{json}");
        return;
    }

    match outcome {
        SessionOutcome::Empty => println!("{NO_MORE_CHALLENGES}"),
        SessionOutcome::Complete(_) => println!("\n{}", ALL_CLEARED.green().bold()),
    }
}
