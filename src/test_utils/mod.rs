//! Shared test utilities for workshop.

pub mod fixtures;

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_yaml::Value;

use crate::catalog::{DocumentLoader, Question, YamlLoader};
use crate::error::{Result, WorkshopError};
use crate::session::{PromptOutcome, Prompter};

pub use fixtures::WorkshopFixture;

/// Prompter that replays a fixed script of outcomes and records what it saw.
///
/// Running past the end of the script behaves like Ctrl-C.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    script: VecDeque<PromptOutcome>,
    /// Identities in the order they were prompted.
    pub asked: Vec<String>,
    /// `(identity, message)` for each rejection shown.
    pub rejections: Vec<(String, String)>,
    pub notices: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new(script: Vec<PromptOutcome>) -> Self {
        Self {
            script: script.into(),
            ..Self::default()
        }
    }

    /// Outcomes not consumed yet.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, question: &Question) -> Result<PromptOutcome> {
        self.asked.push(question.identity.clone());
        self.script.pop_front().ok_or(WorkshopError::Interrupted)
    }

    fn reject(&mut self, question: &Question, message: &str) -> Result<()> {
        self.rejections
            .push((question.identity.clone(), message.to_string()));
        Ok(())
    }

    fn notice(&mut self, line: &str) -> Result<()> {
        self.notices.push(line.to_string());
        Ok(())
    }
}

/// Filesystem YAML loader that counts how many definition files it parsed.
#[derive(Debug, Default)]
pub struct CountingLoader {
    documents: AtomicUsize,
}

impl CountingLoader {
    pub fn documents_read(&self) -> usize {
        self.documents.load(Ordering::SeqCst)
    }
}

impl DocumentLoader for CountingLoader {
    fn read_document(&self, path: &Path) -> Result<Value> {
        self.documents.fetch_add(1, Ordering::SeqCst);
        YamlLoader.read_document(path)
    }

    fn read_raw(&self, path: &Path) -> Result<String> {
        YamlLoader.read_raw(path)
    }
}
