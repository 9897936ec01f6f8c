//! Sequential interactive session.
//!
//! Questions are prompted strictly one at a time, in catalog order. The
//! session is an explicit state machine driven by [`Session::step`]; the only
//! suspension point is [`Prompter::ask`], which resolves to exactly one of a
//! submitted answer or the skip signal.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::catalog::{Answer, Question};
use crate::error::Result;
use crate::storage::ProgressStore;
use crate::validate::{ValidatorRegistry, Verdict, WRONG_ANSWER};

/// Resolution of one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptOutcome {
    Answer(Answer),
    Skip,
}

/// Terminal collaborator that shows questions and collects answers.
pub trait Prompter {
    /// Block until the user submits an answer or signals a skip.
    fn ask(&mut self, question: &Question) -> Result<PromptOutcome>;

    /// Show a rejection for the answer just submitted to `question`.
    fn reject(&mut self, question: &Question, message: &str) -> Result<()>;

    /// Print a plain status line.
    fn notice(&mut self, line: &str) -> Result<()>;
}

impl<T: Prompter + ?Sized> Prompter for &mut T {
    fn ask(&mut self, question: &Question) -> Result<PromptOutcome> {
        (**self).ask(question)
    }

    fn reject(&mut self, question: &Question, message: &str) -> Result<()> {
        (**self).reject(question, message)
    }

    fn notice(&mut self, line: &str) -> Result<()> {
        (**self).notice(line)
    }
}

/// Session states. Indices point into the runnable question list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Ready,
    Empty,
    Prompting(usize),
    Accepted(usize),
    Rejected(usize, String),
    Skipped(usize),
    Advancing(usize),
    Complete,
}

impl SessionState {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Empty | Self::Complete)
    }
}

/// What happened during a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub passed: Vec<String>,
    pub skipped: Vec<String>,
    pub rejections: usize,
}

/// Terminal result of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Nothing left to prompt.
    Empty,
    /// Every question was either passed or skipped.
    Complete(SessionSummary),
}

/// Questions that may be prompted: not yet passed, non-empty prompt, and a
/// type the registry recognizes. Catalog order is preserved.
pub fn filter_runnable(
    questions: Vec<Question>,
    passed: &HashSet<String>,
    registry: &ValidatorRegistry,
) -> Vec<Question> {
    questions
        .into_iter()
        .filter(|q| {
            if passed.contains(&q.identity) {
                debug!("{} already passed", q.identity);
                return false;
            }
            if q.prompt_text.is_empty() {
                warn!("{}: no message, skipping", q.identity);
                return false;
            }
            match &q.kind {
                None => {
                    warn!("{}: no type, skipping", q.identity);
                    false
                }
                Some(kind) if !registry.recognizes(kind) => {
                    warn!("{}: unknown type '{kind}' with no validator, skipping", q.identity);
                    false
                }
                Some(kind) => {
                    if !registry.can_accept(q) {
                        warn!(
                            "{}: type '{kind}' has no expected answer and no validator, it can only be skipped",
                            q.identity
                        );
                    }
                    true
                }
            }
        })
        .collect()
}

/// One run over the runnable questions.
pub struct Session<'a, P: Prompter + ?Sized> {
    questions: Vec<Question>,
    registry: &'a ValidatorRegistry,
    store: &'a ProgressStore,
    prompter: &'a mut P,
    state: SessionState,
    summary: SessionSummary,
}

impl<'a, P: Prompter + ?Sized> Session<'a, P> {
    pub fn new(
        questions: Vec<Question>,
        registry: &'a ValidatorRegistry,
        store: &'a ProgressStore,
        prompter: &'a mut P,
    ) -> Self {
        Self {
            questions,
            registry,
            store,
            prompter,
            state: SessionState::Ready,
            summary: SessionSummary::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub const fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Perform one transition.
    ///
    /// # Errors
    ///
    /// Prompter failures (including interruption) and progress store writes
    /// propagate. A failing validator is reported as a rejection instead.
    pub fn step(&mut self) -> Result<&SessionState> {
        let next = match std::mem::replace(&mut self.state, SessionState::Ready) {
            SessionState::Ready => {
                if self.questions.is_empty() {
                    SessionState::Empty
                } else {
                    SessionState::Prompting(0)
                }
            }
            SessionState::Prompting(idx) => {
                let question = &self.questions[idx];
                match self.prompter.ask(question)? {
                    PromptOutcome::Skip => SessionState::Skipped(idx),
                    PromptOutcome::Answer(answer) => {
                        match self.registry.judge(question, &answer) {
                            Ok(Verdict::Accepted) => SessionState::Accepted(idx),
                            Ok(Verdict::Rejected(message)) => SessionState::Rejected(idx, message),
                            Err(err) => {
                                warn!("validator for {} failed: {err}", question.identity);
                                SessionState::Rejected(idx, format!("{WRONG_ANSWER} ({err})"))
                            }
                        }
                    }
                }
            }
            SessionState::Accepted(idx) => {
                let identity = &self.questions[idx].identity;
                // Persist before advancing.
                self.store.mark_passed(identity)?;
                self.summary.passed.push(identity.clone());
                SessionState::Advancing(idx)
            }
            SessionState::Rejected(idx, message) => {
                self.summary.rejections += 1;
                self.prompter.reject(&self.questions[idx], &message)?;
                SessionState::Prompting(idx)
            }
            SessionState::Skipped(idx) => {
                let identity = &self.questions[idx].identity;
                info!("skipped {identity}");
                self.prompter.notice(&skip_notice(identity))?;
                self.summary.skipped.push(identity.clone());
                SessionState::Advancing(idx)
            }
            SessionState::Advancing(idx) => {
                if idx + 1 < self.questions.len() {
                    SessionState::Prompting(idx + 1)
                } else {
                    SessionState::Complete
                }
            }
            terminal @ (SessionState::Empty | SessionState::Complete) => terminal,
        };
        self.state = next;
        Ok(&self.state)
    }

    /// Drive the session until it reaches a terminal state.
    pub fn run(mut self) -> Result<SessionOutcome> {
        while !self.step()?.is_terminal() {}
        Ok(match self.state {
            SessionState::Empty => SessionOutcome::Empty,
            _ => SessionOutcome::Complete(self.summary),
        })
    }
}

/// Status line printed when a question is skipped.
#[must_use]
pub fn skip_notice(identity: &str) -> String {
    format!("Skipped... {identity}")
}
