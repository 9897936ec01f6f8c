//! Normalized question records.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Prompt kind declared by a question's `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    Input,
    Password,
    Confirm,
    List,
    Checkbox,
    File,
    /// Any other tag; only runnable when a validator is registered for it.
    Custom(String),
}

impl QuestionKind {
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "input" => Self::Input,
            "password" => Self::Password,
            "confirm" => Self::Confirm,
            "list" => Self::List,
            "checkbox" => Self::Checkbox,
            "file" => Self::File,
            other => Self::Custom(other.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Input => "input",
            Self::Password => "password",
            Self::Confirm => "confirm",
            Self::List => "list",
            Self::Checkbox => "checkbox",
            Self::File => "file",
            Self::Custom(tag) => tag,
        }
    }

    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Whether answers for this kind are picked from `choices`.
    #[must_use]
    pub const fn uses_choices(&self) -> bool {
        matches!(self, Self::List | Self::Checkbox)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted or expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Answer {
    Text(String),
    Many(Vec<String>),
}

impl Answer {
    /// Scalar form used for strict comparison: sequences are joined with `,`.
    #[must_use]
    pub fn flatten(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Many(items) => items.join(","),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.flatten())
    }
}

/// One gradable unit, normalized from a challenge definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Durable key used for pass tracking.
    pub identity: String,
    /// `None` when the definition declares no `type`.
    pub kind: Option<QuestionKind>,
    /// Empty when the definition declares no `message`.
    pub prompt_text: String,
    pub choices: Vec<String>,
    pub expected: Option<Answer>,
    /// Pre-filled answer; for `file` questions an absolute path.
    pub default: Option<String>,
    /// Source files listed in a `file` question's prompt, resolved.
    pub source_files: Vec<PathBuf>,
    pub working_directory: PathBuf,
    pub base_group: String,
    /// Definition file this question was read from.
    pub definition: PathBuf,
}

impl Question {
    /// Non-empty prompt and a declared type.
    #[must_use]
    pub fn has_prompt_and_type(&self) -> bool {
        !self.prompt_text.is_empty() && self.kind.is_some()
    }

    #[must_use]
    pub fn kind_tag(&self) -> &str {
        self.kind.as_ref().map_or("", QuestionKind::as_str)
    }
}
