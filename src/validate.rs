//! Answer validation.
//!
//! Each question type resolves to one [`Validator`]. Types registered in the
//! [`ValidatorRegistry`] use their injected validator unconditionally; all
//! other types fall back to [`StrictEquality`].

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::catalog::{Answer, Question, QuestionKind};
use crate::config::ValidatorConfig;
use crate::error::{Result, WorkshopError};

/// Rejection message shown for a wrong answer.
pub const WRONG_ANSWER: &str = "Try again :(";

const OUTPUT_TAIL_CHARS: usize = 2000;

/// Outcome of judging one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(String),
}

impl Verdict {
    #[must_use]
    pub fn wrong_answer() -> Self {
        Self::Rejected(WRONG_ANSWER.to_string())
    }

    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Judges a submitted answer for a question.
pub trait Validator: Send + Sync {
    fn validate(&self, question: &Question, submitted: &Answer) -> Result<Verdict>;
}

impl<F> Validator for F
where
    F: Fn(&Question, &Answer) -> Result<Verdict> + Send + Sync,
{
    fn validate(&self, question: &Question, submitted: &Answer) -> Result<Verdict> {
        self(question, submitted)
    }
}

/// Default rule: flattened submitted answer must equal the flattened expected
/// answer exactly. No trimming, no case folding.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictEquality;

impl Validator for StrictEquality {
    fn validate(&self, question: &Question, submitted: &Answer) -> Result<Verdict> {
        let Some(expected) = &question.expected else {
            return Ok(Verdict::wrong_answer());
        };
        if expected.flatten() == submitted.flatten() {
            Ok(Verdict::Accepted)
        } else {
            Ok(Verdict::wrong_answer())
        }
    }
}

/// Runs an external command in the question's working directory; exit status
/// 0 accepts the answer.
#[derive(Debug, Clone)]
pub struct CommandValidator {
    command: String,
    timeout: Duration,
    env: BTreeMap<String, String>,
}

impl CommandValidator {
    #[must_use]
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
            env: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_seconds.max(1)),
            env: config.env.clone(),
        }
    }

    fn run(&self, question: &Question, submitted: &Answer) -> Result<CommandOutcome> {
        let shell = if cfg!(windows) { "cmd" } else { "sh" };
        let shell_arg = if cfg!(windows) { "/C" } else { "-c" };

        let mut command = Command::new(shell);
        command
            .arg(shell_arg)
            .arg(&self.command)
            .current_dir(&question.working_directory)
            .env("WORKSHOP_ANSWER", submitted.flatten())
            .env("WORKSHOP_QUESTION", &question.identity)
            .env("WORKSHOP_WORKDIR", &question.working_directory)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let cmd = &self.command;
        let mut child = command.spawn().map_err(|err| {
            WorkshopError::Validator(format!("failed to execute command '{cmd}': {err}"))
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            WorkshopError::Validator(format!("failed to capture stdout for '{cmd}'"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            WorkshopError::Validator(format!("failed to capture stderr for '{cmd}'"))
        })?;
        let stdout_handle = std::thread::spawn(move || read_all(stdout));
        let stderr_handle = std::thread::spawn(move || read_all(stderr));

        let start = Instant::now();
        let mut timed_out = false;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        timed_out = true;
                        let _ = child.kill();
                        break child.wait().map_err(|err| {
                            WorkshopError::Validator(format!("failed to wait for '{cmd}': {err}"))
                        })?;
                    }
                    std::thread::sleep(Duration::from_millis(25));
                }
                Err(err) => {
                    return Err(WorkshopError::Validator(format!(
                        "failed to wait for command '{cmd}': {err}"
                    )));
                }
            }
        };

        let stdout = stdout_handle
            .join()
            .map_err(|_| WorkshopError::Validator(format!("stdout capture panicked for '{cmd}'")))?;
        let stderr = stderr_handle
            .join()
            .map_err(|_| WorkshopError::Validator(format!("stderr capture panicked for '{cmd}'")))?;

        Ok(CommandOutcome {
            success: status.success() && !timed_out,
            timed_out,
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

impl Validator for CommandValidator {
    fn validate(&self, question: &Question, submitted: &Answer) -> Result<Verdict> {
        info!("verifying {} with `{}`", question.identity, self.command);
        let outcome = self.run(question, submitted)?;
        debug!(
            exit_code = ?outcome.exit_code,
            "validator stdout: {}\nvalidator stderr: {}",
            tail(&outcome.stdout),
            tail(&outcome.stderr)
        );

        if outcome.timed_out {
            warn!(
                "validator for {} timed out after {:?}",
                question.identity, self.timeout
            );
            return Ok(Verdict::Rejected(format!(
                "{WRONG_ANSWER} (verification timed out after {}s)",
                self.timeout.as_secs()
            )));
        }
        if outcome.success {
            Ok(Verdict::Accepted)
        } else {
            Ok(Verdict::wrong_answer())
        }
    }
}

struct CommandOutcome {
    success: bool,
    timed_out: bool,
    exit_code: Option<i32>,
    stdout: String,
    stderr: String,
}

fn read_all(mut reader: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = reader.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn tail(text: &str) -> &str {
    let trimmed = text.trim_end();
    let count = trimmed.chars().count();
    if count <= OUTPUT_TAIL_CHARS {
        return trimmed;
    }
    let skip = count - OUTPUT_TAIL_CHARS;
    trimmed
        .char_indices()
        .nth(skip)
        .map_or(trimmed, |(idx, _)| &trimmed[idx..])
}

/// Maps question types to validators.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    custom: HashMap<String, Arc<dyn Validator>>,
}

impl std::fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.custom.keys().collect();
        kinds.sort();
        f.debug_struct("ValidatorRegistry")
            .field("custom", &kinds)
            .finish()
    }
}

impl ValidatorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a [`CommandValidator`] for every configured type.
    #[must_use]
    pub fn from_config(validators: &BTreeMap<String, ValidatorConfig>) -> Self {
        let mut registry = Self::new();
        for (kind, config) in validators {
            registry.register(kind, CommandValidator::from_config(config));
        }
        registry
    }

    pub fn register(&mut self, kind: &str, validator: impl Validator + 'static) -> &mut Self {
        self.custom.insert(kind.to_string(), Arc::new(validator));
        self
    }

    #[must_use]
    pub fn has_custom(&self, kind: &QuestionKind) -> bool {
        self.custom.contains_key(kind.as_str())
    }

    /// Built-in kinds, plus custom kinds that have a registered validator.
    #[must_use]
    pub fn recognizes(&self, kind: &QuestionKind) -> bool {
        kind.is_builtin() || self.has_custom(kind)
    }

    /// Whether any answer to `question` could be accepted: a validator is
    /// registered for its type, or it carries an expected answer.
    #[must_use]
    pub fn can_accept(&self, question: &Question) -> bool {
        question
            .kind
            .as_ref()
            .is_some_and(|kind| self.has_custom(kind) || question.expected.is_some())
    }

    /// Validator for a question type.
    #[must_use]
    pub fn resolve(&self, kind: &QuestionKind) -> Arc<dyn Validator> {
        self.custom
            .get(kind.as_str())
            .cloned()
            .unwrap_or_else(|| Arc::new(StrictEquality))
    }

    /// Judge `submitted` for `question` with its resolved validator.
    pub fn judge(&self, question: &Question, submitted: &Answer) -> Result<Verdict> {
        let Some(kind) = &question.kind else {
            return Ok(Verdict::wrong_answer());
        };
        self.resolve(kind).validate(question, submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn question(kind: QuestionKind, expected: Option<Answer>) -> Question {
        Question {
            identity: "q".to_string(),
            kind: Some(kind),
            prompt_text: "prompt".to_string(),
            choices: Vec::new(),
            expected,
            default: None,
            source_files: Vec::new(),
            working_directory: std::env::temp_dir(),
            base_group: "q".to_string(),
            definition: PathBuf::from("q.yaml"),
        }
    }

    fn many(items: &[&str]) -> Answer {
        Answer::Many(items.iter().map(|s| (*s).to_string()).collect())
    }

    #[test]
    fn strict_equality_accepts_identical_sequences() {
        let q = question(QuestionKind::Checkbox, Some(many(&["x", "y"])));
        let verdict = StrictEquality.validate(&q, &many(&["x", "y"])).unwrap();
        assert_eq!(verdict, Verdict::Accepted);
    }

    #[test]
    fn strict_equality_rejects_with_fixed_message() {
        let q = question(QuestionKind::Checkbox, Some(many(&["x", "y"])));
        let verdict = StrictEquality.validate(&q, &many(&["x", "z"])).unwrap();
        assert_eq!(verdict, Verdict::Rejected("Try again :(".to_string()));
    }

    #[test]
    fn strict_equality_does_not_trim_or_fold_case() {
        let q = question(QuestionKind::Input, Some(Answer::Text("Hello".into())));
        for attempt in ["hello", "Hello ", " Hello", "HELLO"] {
            let verdict = StrictEquality.validate(&q, &Answer::Text(attempt.into())).unwrap();
            assert!(!verdict.is_accepted(), "{attempt:?} must be rejected");
        }
        let verdict = StrictEquality.validate(&q, &Answer::Text("Hello".into())).unwrap();
        assert!(verdict.is_accepted());
    }

    #[test]
    fn strict_equality_compares_flattened_forms() {
        let q = question(QuestionKind::Input, Some(Answer::Text("a,b".into())));
        assert!(StrictEquality.validate(&q, &many(&["a", "b"])).unwrap().is_accepted());
    }

    #[test]
    fn missing_expected_answer_never_accepts() {
        let q = question(QuestionKind::Input, None);
        assert!(!StrictEquality.validate(&q, &Answer::Text(String::new())).unwrap().is_accepted());
    }

    #[test]
    fn registered_validator_overrides_default() {
        let mut registry = ValidatorRegistry::new();
        registry.register("input", |_: &Question, _: &Answer| -> Result<Verdict> {
            Ok(Verdict::Accepted)
        });

        let q = question(QuestionKind::Input, Some(Answer::Text("right".into())));
        let verdict = registry.judge(&q, &Answer::Text("wrong".into())).unwrap();
        assert_eq!(verdict, Verdict::Accepted);
    }

    #[test]
    fn custom_outcome_is_trusted_as_is() {
        let mut registry = ValidatorRegistry::new();
        registry.register("regex", |_: &Question, _: &Answer| -> Result<Verdict> {
            Ok(Verdict::Rejected("pattern did not match".to_string()))
        });
        let kind = QuestionKind::parse("regex");
        let q = question(kind.clone(), None);
        assert!(registry.recognizes(&kind));
        let verdict = registry.judge(&q, &Answer::Text("x".into())).unwrap();
        assert_eq!(verdict, Verdict::Rejected("pattern did not match".into()));
    }

    #[test]
    fn unregistered_custom_kind_is_not_recognized() {
        let registry = ValidatorRegistry::new();
        assert!(!registry.recognizes(&QuestionKind::parse("essay")));
        assert!(registry.recognizes(&QuestionKind::File));
    }

    #[test]
    fn from_config_registers_command_validators() {
        let validators = BTreeMap::from([(
            "file".to_string(),
            ValidatorConfig {
                command: "true".to_string(),
                ..ValidatorConfig::default()
            },
        )]);
        let registry = ValidatorRegistry::from_config(&validators);
        assert!(registry.has_custom(&QuestionKind::File));
        assert!(!registry.has_custom(&QuestionKind::Input));
    }

    #[cfg(unix)]
    #[test]
    fn command_validator_uses_exit_status() {
        let q = question(QuestionKind::File, None);
        let pass = CommandValidator::new("test \"$WORKSHOP_ANSWER\" = ok", Duration::from_secs(10));
        assert!(pass.validate(&q, &Answer::Text("ok".into())).unwrap().is_accepted());
        assert_eq!(
            pass.validate(&q, &Answer::Text("nope".into())).unwrap(),
            Verdict::wrong_answer()
        );
    }

    #[cfg(unix)]
    #[test]
    fn command_validator_runs_in_question_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let mut q = question(QuestionKind::File, None);
        q.working_directory = dir.path().to_path_buf();

        let validator = CommandValidator::new("test -f marker", Duration::from_secs(10));
        assert!(validator.validate(&q, &Answer::Text(String::new())).unwrap().is_accepted());
    }

    #[cfg(unix)]
    #[test]
    fn command_validator_times_out() {
        let q = question(QuestionKind::File, None);
        let slow = CommandValidator::new("exec sleep 5", Duration::from_millis(100));
        let verdict = slow.validate(&q, &Answer::Text(String::new())).unwrap();
        match verdict {
            Verdict::Rejected(msg) => assert!(msg.starts_with(WRONG_ANSWER)),
            Verdict::Accepted => panic!("timed out command must not accept"),
        }
    }

    #[test]
    fn tail_keeps_end_of_long_output() {
        let long = "a".repeat(OUTPUT_TAIL_CHARS) + "END";
        let t = tail(&long);
        assert!(t.ends_with("END"));
        assert_eq!(t.chars().count(), OUTPUT_TAIL_CHARS);
    }

    #[test]
    fn file_question_without_validator_cannot_be_accepted() {
        let mut registry = ValidatorRegistry::new();
        let file = question(QuestionKind::File, None);
        assert!(registry.recognizes(&QuestionKind::File));
        assert!(!registry.can_accept(&file));

        let verdict = registry.judge(&file, &Answer::Text("/w/solution.txt".into())).unwrap();
        assert_eq!(verdict, Verdict::wrong_answer());

        registry.register("file", |_: &Question, _: &Answer| -> Result<Verdict> {
            Ok(Verdict::Accepted)
        });
        assert!(registry.can_accept(&file));
    }

    #[test]
    fn expected_answer_makes_builtin_acceptable() {
        let registry = ValidatorRegistry::new();
        assert!(registry.can_accept(&question(QuestionKind::Input, Some(Answer::Text("x".into())))));
        assert!(!registry.can_accept(&question(QuestionKind::Input, None)));
    }
}
