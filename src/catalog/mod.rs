//! Catalog building: discovery and normalization of challenge definitions.
//!
//! Each definition file holds one question mapping or a sequence of them.
//! Entries are normalized into [`Question`] records with stable identities,
//! resolved answers and augmented prompt text. Problems with a single entry
//! are recorded as [`CatalogIssue`]s and never abort the rest of the build.

pub mod discover;
pub mod loader;
pub mod question;

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Number, Value};
use tracing::{debug, warn};

use crate::error::{Result, WorkshopError};

pub use loader::{DocumentLoader, YamlLoader};
pub use question::{Answer, Question, QuestionKind};

/// Visual divider placed between prompt sections.
pub const SEPARATOR: &str = "──────────────";

fn divider() -> String {
    format!("\n{SEPARATOR}\n")
}

/// The normalized, ordered questions of one run plus per-entry problems.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    pub questions: Vec<Question>,
    pub issues: Vec<CatalogIssue>,
}

/// A definition entry that was excluded from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub definition: PathBuf,
    pub identity: Option<String>,
    pub reason: String,
}

impl CatalogIssue {
    fn new(definition: &Path, identity: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            definition: definition.to_path_buf(),
            identity: identity.map(str::to_string),
            reason: reason.into(),
        }
    }
}

/// Raw shape of one question entry.
#[derive(Debug, Default, Deserialize)]
struct RawQuestion {
    name: Option<Value>,
    message: Option<Value>,
    #[serde(rename = "type")]
    kind: Option<Value>,
    choices: Option<Value>,
    answer: Option<Value>,
    default: Option<Value>,
    source: Option<Value>,
    #[serde(rename = "messageFile")]
    message_file: Option<Value>,
}

impl RawQuestion {
    fn is_scaffolding(&self) -> bool {
        is_absent(self.message.as_ref()) && is_absent(self.kind.as_ref())
    }
}

/// Builds a [`Catalog`] from the definition files under a challenges directory.
#[derive(Debug, Clone)]
pub struct CatalogBuilder<L = YamlLoader> {
    loader: L,
    workshop_root: PathBuf,
    challenges_dir: PathBuf,
    pattern: String,
}

impl CatalogBuilder<YamlLoader> {
    pub fn new(workshop_root: impl Into<PathBuf>, challenges_dir: impl Into<PathBuf>) -> Self {
        Self::with_loader(YamlLoader, workshop_root, challenges_dir)
    }
}

impl<L: DocumentLoader> CatalogBuilder<L> {
    pub fn with_loader(
        loader: L,
        workshop_root: impl Into<PathBuf>,
        challenges_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            loader,
            workshop_root: workshop_root.into(),
            challenges_dir: challenges_dir.into(),
            pattern: "**/q.yaml".to_string(),
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Discover and normalize every question.
    ///
    /// # Errors
    ///
    /// Only discovery failures are returned; per-entry problems end up in
    /// [`Catalog::issues`].
    pub fn build(&self) -> Result<Catalog> {
        let files = discover::discover_files(&self.challenges_dir, &self.pattern)?;
        let mut catalog = Catalog::default();
        let mut seen = HashSet::new();

        for file in &files {
            for entry in self.load_file(file) {
                match entry {
                    Ok(question) => {
                        if seen.insert(question.identity.clone()) {
                            catalog.questions.push(question);
                        } else {
                            let issue = CatalogIssue::new(
                                file,
                                Some(&question.identity),
                                "duplicate identity",
                            );
                            warn!("{}: duplicate identity {}", file.display(), question.identity);
                            catalog.issues.push(issue);
                        }
                    }
                    Err(issue) => {
                        warn!(
                            "{}: excluded {}: {}",
                            issue.definition.display(),
                            issue.identity.as_deref().unwrap_or("entry"),
                            issue.reason
                        );
                        catalog.issues.push(issue);
                    }
                }
            }
        }

        debug!(
            "catalog built: {} questions, {} issues from {} files",
            catalog.questions.len(),
            catalog.issues.len(),
            files.len()
        );
        Ok(catalog)
    }

    /// Normalize all entries of one definition file, in file order.
    fn load_file(&self, file: &Path) -> Vec<std::result::Result<Question, CatalogIssue>> {
        let document = match self.loader.read_document(file) {
            Ok(document) => document,
            Err(err) => return vec![Err(CatalogIssue::new(file, None, err.to_string()))],
        };

        let entries = match document {
            Value::Sequence(items) => items,
            Value::Null => Vec::new(),
            mapping @ Value::Mapping(_) => vec![mapping],
            _ => {
                return vec![Err(CatalogIssue::new(
                    file,
                    None,
                    "document is neither a question mapping nor a sequence",
                ))];
            }
        };

        let base_group = derive_base_group(&self.workshop_root, &self.challenges_dir, file);
        let working_directory = file
            .parent()
            .map_or_else(|| self.challenges_dir.clone(), Path::to_path_buf);
        let total = entries.len();
        let mut out = Vec::with_capacity(total);

        for (idx, entry) in entries.into_iter().enumerate() {
            let fallback = derive_identity(&base_group, idx, total);
            if !entry.is_mapping() {
                out.push(Err(CatalogIssue::new(
                    file,
                    Some(&fallback),
                    "entry is not a mapping",
                )));
                continue;
            }
            let raw: RawQuestion = match serde_yaml::from_value(entry) {
                Ok(raw) => raw,
                Err(err) => {
                    out.push(Err(CatalogIssue::new(file, Some(&fallback), err.to_string())));
                    continue;
                }
            };
            if raw.is_scaffolding() {
                debug!("{}: skipping entry {} without message and type", file.display(), idx + 1);
                continue;
            }

            let identity = match raw.name.as_ref().filter(|v| !v.is_null()).map(scalar_text) {
                Some(Some(name)) => name,
                Some(None) => {
                    out.push(Err(CatalogIssue::new(file, Some(&fallback), "name is not a scalar")));
                    continue;
                }
                None => fallback,
            };

            let context = EntryContext {
                identity: &identity,
                base_group: &base_group,
                working_directory: &working_directory,
                definition: file,
            };
            out.push(
                self.normalize(raw, &context)
                    .map_err(|err| CatalogIssue::new(file, Some(&identity), err.to_string())),
            );
        }

        out
    }

    fn normalize(&self, raw: RawQuestion, ctx: &EntryContext<'_>) -> Result<Question> {
        let kind = match raw.kind.as_ref().filter(|v| !v.is_null()) {
            Some(value) => Some(QuestionKind::parse(&require_scalar(value, "type", ctx.identity)?)),
            None => None,
        };
        let mut prompt_text = match raw.message.as_ref().filter(|v| !v.is_null()) {
            Some(value) => require_scalar(value, "message", ctx.identity)?,
            None => String::new(),
        };

        let choices = match (&kind, raw.choices.as_ref()) {
            (Some(kind), Some(value)) if kind.uses_choices() => {
                scalar_list(value, "choices", ctx.identity)?
            }
            _ => Vec::new(),
        };

        let expected = resolve_expected(kind.as_ref(), raw.answer.as_ref(), &choices, ctx.identity)?;

        let mut default = match raw.default.as_ref().filter(|v| !v.is_null()) {
            Some(value) => Some(require_scalar(value, "default", ctx.identity)?),
            None => None,
        };

        let mut source_files = Vec::new();
        if kind == Some(QuestionKind::File) {
            let target = default.as_deref().unwrap_or("");
            default = Some(ctx.working_directory.join(target).display().to_string());

            source_files = match raw.source.as_ref().filter(|v| !v.is_null()) {
                Some(value) => scalar_list(value, "source", ctx.identity)?
                    .into_iter()
                    .map(|file| ctx.working_directory.join(file))
                    .collect(),
                None => Vec::new(),
            };

            if !prompt_text.is_empty() {
                prompt_text.push_str(&divider());
                prompt_text.push_str("Work out the following source:\n");
                for file in &source_files {
                    prompt_text.push_str(&format!("- {}\n", file.display()));
                }
                prompt_text.push_str("\n\nReady to verify against the following test?");
            }
        }

        // Supplementary text goes last so dividers are not duplicated.
        if let Some(value) = raw.message_file.as_ref().filter(|v| !v.is_null()) {
            let relative = require_scalar(value, "messageFile", ctx.identity)?;
            if !prompt_text.is_empty() {
                let content = self.loader.read_raw(&ctx.working_directory.join(relative))?;
                prompt_text = format!("{prompt_text}\n\n{content}{}", divider());
            }
        }

        Ok(Question {
            identity: ctx.identity.to_string(),
            kind,
            prompt_text,
            choices,
            expected,
            default,
            source_files,
            working_directory: ctx.working_directory.to_path_buf(),
            base_group: ctx.base_group.to_string(),
            definition: ctx.definition.to_path_buf(),
        })
    }
}

struct EntryContext<'a> {
    identity: &'a str,
    base_group: &'a str,
    working_directory: &'a Path,
    definition: &'a Path,
}

/// Directory of `file` relative to the workshop root, separators collapsed to `-`.
///
/// Falls back to the challenges directory when the file is outside the root,
/// and to the file stem when the file sits directly in it.
#[must_use]
pub fn derive_base_group(workshop_root: &Path, challenges_dir: &Path, file: &Path) -> String {
    let relative = file
        .strip_prefix(workshop_root)
        .or_else(|_| file.strip_prefix(challenges_dir))
        .unwrap_or(file);

    let parts: Vec<String> = relative
        .parent()
        .map(|dir| {
            dir.components()
                .filter_map(|component| match component {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    // Only when the challenges dir was given with literal `..`
                    // segments, e.g. `--challenges ../shared`.
                    Component::ParentDir => Some("..".to_string()),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    if parts.is_empty() {
        return file
            .file_stem()
            .map_or_else(|| "root".to_string(), |stem| stem.to_string_lossy().into_owned());
    }
    parts.join("-")
}

/// Identity for an unnamed entry: the group, numbered when the file has several.
#[must_use]
pub fn derive_identity(base_group: &str, index: usize, total: usize) -> String {
    if total > 1 {
        format!("{base_group}-{}", index + 1)
    } else {
        base_group.to_string()
    }
}

fn resolve_expected(
    kind: Option<&QuestionKind>,
    answer: Option<&Value>,
    choices: &[String],
    identity: &str,
) -> Result<Option<Answer>> {
    let Some(answer) = answer.filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    let resolved = match (kind, answer) {
        (Some(QuestionKind::List), Value::Number(n)) => {
            Answer::Text(choice_at(n, choices, identity)?)
        }
        (Some(QuestionKind::Checkbox), Value::Number(n)) => {
            Answer::Many(vec![choice_at(n, choices, identity)?])
        }
        (Some(QuestionKind::Checkbox), Value::Sequence(items)) => Answer::Many(
            items
                .iter()
                .map(|item| match item {
                    Value::Number(n) => choice_at(n, choices, identity),
                    other => require_scalar(other, "answer", identity),
                })
                .collect::<Result<_>>()?,
        ),
        (_, Value::Sequence(_)) => Answer::Many(scalar_list(answer, "answer", identity)?),
        (_, other) => Answer::Text(require_scalar(other, "answer", identity)?),
    };
    Ok(Some(resolved))
}

/// 1-based lookup into `choices`.
fn choice_at(index: &Number, choices: &[String], identity: &str) -> Result<String> {
    index
        .as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .filter(|&n| n >= 1)
        .and_then(|n| choices.get(n - 1))
        .cloned()
        .ok_or_else(|| WorkshopError::Resolution {
            identity: identity.to_string(),
            index: index.to_string(),
            available: choices.len(),
        })
}

/// Textual form of a scalar; `None` for sequences and mappings.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn require_scalar(value: &Value, field: &str, identity: &str) -> Result<String> {
    scalar_text(value).ok_or_else(|| {
        WorkshopError::InvalidQuestion(format!("{identity}: {field} must be a scalar"))
    })
}

/// A scalar or a sequence of scalars, as a list.
fn scalar_list(value: &Value, field: &str, identity: &str) -> Result<Vec<String>> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| require_scalar(item, field, identity))
            .collect(),
        other => Ok(vec![require_scalar(other, field, identity)?]),
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    value.is_none_or(Value::is_null)
}
