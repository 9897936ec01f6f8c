//! workshop list - show the catalog and what has been passed

use std::collections::HashSet;
use std::path::Path;

use clap::Args;
use colored::Colorize;

use crate::app::AppContext;
use crate::catalog::{Catalog, Question};
use crate::error::Result;
use crate::session::filter_runnable;
use crate::workshop::Workshop;

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Only show questions that would be prompted
    #[arg(long)]
    pub pending: bool,
}

/// Status of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    Pending,
    /// No prompt, no type, or a type nothing can validate.
    Unrunnable,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Pending => "pending",
            Self::Unrunnable => "unrunnable",
        }
    }
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    let workshop = Workshop::from_context(ctx);
    let store = workshop.open_store()?;
    let passed = store.passed_identities();
    store.close()?;
    let passed = passed?;

    let catalog = workshop.catalog()?;
    let rows = classify(&workshop, &catalog, &passed, args.pending);

    if ctx.robot_mode {
        list_robot(&catalog, &rows);
    } else {
        list_human(workshop.root(), &catalog, &rows);
    }
    Ok(())
}

fn classify<'a>(
    workshop: &Workshop,
    catalog: &'a Catalog,
    passed: &HashSet<String>,
    pending_only: bool,
) -> Vec<(&'a Question, Status)> {
    let runnable: HashSet<String> =
        filter_runnable(catalog.questions.clone(), passed, workshop.registry())
            .into_iter()
            .map(|q| q.identity)
            .collect();

    catalog
        .questions
        .iter()
        .map(|q| {
            let status = if passed.contains(&q.identity) {
                Status::Passed
            } else if runnable.contains(&q.identity) {
                Status::Pending
            } else {
                Status::Unrunnable
            };
            (q, status)
        })
        .filter(|(_, status)| !pending_only || *status == Status::Pending)
        .collect()
}

fn list_human(root: &Path, catalog: &Catalog, rows: &[(&Question, Status)]) {
    if rows.is_empty() {
        println!("{}", "No questions found".dimmed());
    } else {
        println!(
            "{:40} {:10} {:12} {}",
            "IDENTITY".bold(),
            "TYPE".bold(),
            "STATUS".bold(),
            "SOURCE".bold()
        );
        println!("{}", "─".repeat(84).dimmed());

        for (question, status) in rows {
            let status_colored = match status {
                Status::Passed => status.as_str().green(),
                Status::Pending => status.as_str().yellow(),
                Status::Unrunnable => status.as_str().dimmed(),
            };
            let kind = question.kind_tag();
            println!(
                "{:40} {:10} {:12} {}",
                question.identity,
                if kind.is_empty() { "-" } else { kind },
                status_colored,
                relative(root, &question.definition).display()
            );
        }
    }

    if !catalog.issues.is_empty() {
        println!();
        println!("{}", "Excluded entries:".yellow());
        for issue in &catalog.issues {
            println!(
                "  {} {}: {}",
                relative(root, &issue.definition).display(),
                issue.identity.as_deref().unwrap_or(""),
                issue.reason
            );
        }
    }

    let passed = rows.iter().filter(|(_, s)| *s == Status::Passed).count();
    println!();
    println!(
        "{} {} questions, {} passed",
        "Total:".dimmed(),
        rows.len(),
        passed
    );
}

fn relative<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn list_robot(catalog: &Catalog, rows: &[(&Question, Status)]) {
    let questions: Vec<serde_json::Value> = rows
        .iter()
        .map(|(q, status)| {
            serde_json::json!({
                "identity": q.identity,
                "type": q.kind_tag(),
                "status": status.as_str(),
                "definition": q.definition,
            })
        })
        .collect();
    let issues: Vec<serde_json::Value> = catalog
        .issues
        .iter()
        .map(|issue| {
            serde_json::json!({
                "definition": issue.definition,
                "identity": issue.identity,
                "reason": issue.reason,
            })
        })
        .collect();

    println!(
        "{}",
        serde_json::json!({
            "status": "ok",
            "count": rows.len(),
            "questions": questions,
            "issues": issues,
        })
    );
}
