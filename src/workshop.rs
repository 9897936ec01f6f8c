//! Top-level orchestration of one workshop run.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app::AppContext;
use crate::catalog::{Catalog, CatalogBuilder, DocumentLoader, Question, YamlLoader};
use crate::error::Result;
use crate::session::{filter_runnable, Prompter, Session, SessionOutcome};
use crate::storage::ProgressStore;
use crate::validate::ValidatorRegistry;

pub const NO_MORE_CHALLENGES: &str = "No more challenges in this workshop, bye. \nTo restart the workshop, simply delete .workshop directory.";
pub const ALL_CLEARED: &str = "All questions are cleared, awesome!";
pub const BOOT_FAILED: &str = "Failed to boot workshop.";

/// A workshop rooted at one directory.
#[derive(Debug)]
pub struct Workshop<L = YamlLoader> {
    root: PathBuf,
    challenges_dir: PathBuf,
    pattern: String,
    registry: ValidatorRegistry,
    loader: L,
}

impl Workshop<YamlLoader> {
    pub fn new(root: impl Into<PathBuf>, challenges_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            challenges_dir: challenges_dir.into(),
            pattern: "**/q.yaml".to_string(),
            registry: ValidatorRegistry::new(),
            loader: YamlLoader,
        }
    }

    #[must_use]
    pub fn from_context(ctx: &AppContext) -> Self {
        Self::new(&ctx.workshop_root, &ctx.challenges_dir)
            .with_pattern(&ctx.config.challenges.pattern)
            .with_registry(ValidatorRegistry::from_config(&ctx.config.validators))
    }
}

impl<L: DocumentLoader> Workshop<L> {
    /// Read definition files through `loader` instead.
    pub fn with_loader<M: DocumentLoader>(self, loader: M) -> Workshop<M> {
        Workshop {
            root: self.root,
            challenges_dir: self.challenges_dir,
            pattern: self.pattern,
            registry: self.registry,
            loader,
        }
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ValidatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub const fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ValidatorRegistry {
        &mut self.registry
    }

    #[must_use]
    pub const fn loader(&self) -> &L {
        &self.loader
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn open_store(&self) -> Result<ProgressStore> {
        ProgressStore::open(&self.root)
    }

    /// Discover and normalize the full catalog, passed questions included.
    pub fn catalog(&self) -> Result<Catalog> {
        CatalogBuilder::with_loader(&self.loader, &self.root, &self.challenges_dir)
            .with_pattern(&self.pattern)
            .build()
    }

    /// Questions that would be prompted given the passes already in `store`.
    pub fn pending(&self, store: &ProgressStore) -> Result<Vec<Question>> {
        let passed = store.passed_identities()?;
        Ok(filter_runnable(self.catalog()?.questions, &passed, &self.registry))
    }

    /// Run a session with an existing prompter.
    pub fn run<P: Prompter + ?Sized>(&self, prompter: &mut P) -> Result<SessionOutcome> {
        self.run_lazy(|| Ok(prompter))
    }

    /// Open the store once, read it once, and close it again whatever the
    /// session's result. `make_prompter` is only called when something is
    /// pending, while the store is held.
    ///
    /// # Errors
    ///
    /// [`crate::WorkshopError::StoreOpen`] when the store cannot be opened;
    /// [`crate::WorkshopError::Interrupted`] when the user aborts.
    pub fn run_lazy<P, F>(&self, make_prompter: F) -> Result<SessionOutcome>
    where
        P: Prompter,
        F: FnOnce() -> Result<P>,
    {
        let store = self.open_store()?;
        let result = self.run_pending(&store, make_prompter);
        if let Err(err) = store.close() {
            warn!("closing progress store: {err}");
        }
        result
    }

    /// Filter against `store` and run the session on what is left.
    pub fn run_pending<P, F>(&self, store: &ProgressStore, make_prompter: F) -> Result<SessionOutcome>
    where
        P: Prompter,
        F: FnOnce() -> Result<P>,
    {
        let runnable = self.pending(store)?;
        info!("{} pending questions", runnable.len());
        if runnable.is_empty() {
            return Ok(SessionOutcome::Empty);
        }
        let mut prompter = make_prompter()?;
        Session::new(runnable, &self.registry, store, &mut prompter).run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Answer;
    use crate::error::WorkshopError;
    use crate::session::PromptOutcome;
    use crate::test_utils::{CountingLoader, ScriptedPrompter, WorkshopFixture};

    fn answer(text: &str) -> PromptOutcome {
        PromptOutcome::Answer(Answer::Text(text.to_string()))
    }

    fn workshop(fixture: &WorkshopFixture) -> Workshop {
        Workshop::new(fixture.path(), fixture.path())
    }

    #[test]
    fn empty_workshop_is_empty_outcome() {
        let fixture = WorkshopFixture::new();
        let mut prompter = ScriptedPrompter::new(vec![]);
        let outcome = workshop(&fixture).run(&mut prompter).unwrap();
        assert_eq!(outcome, SessionOutcome::Empty);
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn passes_are_not_prompted_again() {
        let fixture = WorkshopFixture::new();
        fixture.create_question("basics", "message: One plus one?\ntype: input\nanswer: \"2\"\n");
        let ws = workshop(&fixture);

        let mut first = ScriptedPrompter::new(vec![answer("2")]);
        assert!(matches!(ws.run(&mut first).unwrap(), SessionOutcome::Complete(_)));

        let mut second = ScriptedPrompter::new(vec![]);
        assert_eq!(ws.run(&mut second).unwrap(), SessionOutcome::Empty);
        assert!(second.asked.is_empty());
    }

    #[test]
    fn store_is_released_after_interrupt() {
        let fixture = WorkshopFixture::new();
        fixture.create_question("basics", "message: One plus one?\ntype: input\nanswer: \"2\"\n");
        let ws = workshop(&fixture);

        let mut prompter = ScriptedPrompter::new(vec![]);
        assert!(matches!(
            ws.run(&mut prompter),
            Err(WorkshopError::Interrupted)
        ));
        assert!(ws.open_store().is_ok());
    }

    #[test]
    fn pending_excludes_passed() {
        let fixture = WorkshopFixture::new();
        fixture.create_question(
            "basics",
            "- message: A?\n  type: input\n  answer: a\n- message: B?\n  type: input\n  answer: b\n",
        );
        let ws = workshop(&fixture);
        let store = ws.open_store().unwrap();
        store.mark_passed("basics-1").unwrap();
        let pending: Vec<_> = ws
            .pending(&store)
            .unwrap()
            .into_iter()
            .map(|q| q.identity)
            .collect();
        assert_eq!(pending, vec!["basics-2".to_string()]);
    }

    #[test]
    fn nothing_pending_never_builds_a_prompter() {
        let fixture = WorkshopFixture::new();
        let mut built = false;
        let outcome = workshop(&fixture)
            .run_lazy(|| {
                built = true;
                Ok(ScriptedPrompter::new(vec![]))
            })
            .unwrap();
        assert_eq!(outcome, SessionOutcome::Empty);
        assert!(!built);
    }

    #[test]
    fn store_stays_held_from_filtering_to_session() {
        let fixture = WorkshopFixture::new();
        fixture.create_question("basics", "message: One plus one?\ntype: input\nanswer: \"2\"\n");
        let ws = workshop(&fixture);

        let outcome = ws
            .run_lazy(|| {
                // Another process opening now must be refused.
                assert!(matches!(
                    ProgressStore::open(fixture.path()),
                    Err(WorkshopError::StoreOpen(_))
                ));
                Ok(ScriptedPrompter::new(vec![answer("2")]))
            })
            .unwrap();
        assert!(matches!(outcome, SessionOutcome::Complete(_)));
        assert!(ws.open_store().is_ok());
    }

    #[test]
    fn catalog_is_read_once_per_run() {
        let fixture = WorkshopFixture::new();
        fixture.create_question("a", "message: A?\ntype: input\nanswer: a\n");
        fixture.create_question("b", "message: B?\ntype: input\nanswer: b\n");
        let ws = workshop(&fixture).with_loader(CountingLoader::default());

        let mut prompter = ScriptedPrompter::new(vec![answer("a"), answer("b")]);
        ws.run(&mut prompter).unwrap();
        assert_eq!(ws.loader().documents_read(), 2);

        let mut idle = ScriptedPrompter::new(vec![]);
        assert_eq!(ws.run(&mut idle).unwrap(), SessionOutcome::Empty);
        assert_eq!(ws.loader().documents_read(), 4);
    }
}
