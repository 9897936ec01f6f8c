use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkshopError};

/// Project-level config file, looked up in the workshop root.
pub const PROJECT_CONFIG_FILE: &str = "workshop.toml";

/// Default timeout for external validator commands.
pub const DEFAULT_VALIDATOR_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub challenges: ChallengesConfig,
    /// External validators keyed by question type.
    #[serde(default)]
    pub validators: BTreeMap<String, ValidatorConfig>,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>, workshop_root: &Path) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("WORKSHOP_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                WorkshopError::Config(format!("config file not found: {}", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&workshop_root.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("workshop/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| WorkshopError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw).map_err(|err| {
            WorkshopError::Config(format!("parse config {}: {err}", path.display()))
        })?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.challenges {
            self.challenges.merge(patch);
        }
        if let Some(validators) = patch.validators {
            for (kind, patch) in validators {
                self.validators.entry(kind).or_default().merge(patch);
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        let vars: Vec<(String, String)> = std::env::vars().collect();
        self.apply_overrides(&vars)
    }

    /// Apply `WORKSHOP_*` overrides from the given variable list.
    fn apply_overrides(&mut self, vars: &[(String, String)]) -> Result<()> {
        for (key, value) in vars {
            match key.as_str() {
                "WORKSHOP_CHALLENGES_DIR" => self.challenges.dir = value.clone(),
                "WORKSHOP_CHALLENGES_PATTERN" => {
                    validate_pattern(value)?;
                    self.challenges.pattern = value.clone();
                }
                _ => {
                    if let Some(kind) = key.strip_prefix("WORKSHOP_VALIDATOR_") {
                        if kind.is_empty() {
                            continue;
                        }
                        self.validators
                            .entry(kind.to_lowercase())
                            .or_default()
                            .command = value.clone();
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate the merged config before use.
    pub fn validate(&self) -> Result<()> {
        validate_pattern(&self.challenges.pattern)?;
        for (kind, validator) in &self.validators {
            if validator.command.trim().is_empty() {
                return Err(WorkshopError::Config(format!(
                    "validator for type '{kind}' has an empty command"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengesConfig {
    /// Root search directory, relative to the workshop root.
    #[serde(default)]
    pub dir: String,
    /// Glob matched against paths relative to `dir`.
    #[serde(default)]
    pub pattern: String,
}

impl Default for ChallengesConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            pattern: "**/q.yaml".to_string(),
        }
    }
}

impl ChallengesConfig {
    fn merge(&mut self, patch: ChallengesPatch) {
        if let Some(value) = patch.dir {
            self.dir = value;
        }
        if let Some(value) = patch.pattern {
            self.pattern = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// Shell command; exit status 0 accepts the answer.
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            command: String::new(),
            timeout_seconds: DEFAULT_VALIDATOR_TIMEOUT_SECS,
            env: BTreeMap::new(),
        }
    }
}

impl ValidatorConfig {
    fn merge(&mut self, patch: ValidatorPatch) {
        if let Some(value) = patch.command {
            self.command = value;
        }
        if let Some(value) = patch.timeout_seconds {
            self.timeout_seconds = value;
        }
        if let Some(values) = patch.env {
            self.env.extend(values);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub challenges: Option<ChallengesPatch>,
    pub validators: Option<BTreeMap<String, ValidatorPatch>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChallengesPatch {
    pub dir: Option<String>,
    pub pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ValidatorPatch {
    pub command: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub env: Option<BTreeMap<String, String>>,
}

fn validate_pattern(pattern: &str) -> Result<()> {
    glob::Pattern::new(pattern)
        .map(|_| ())
        .map_err(|err| WorkshopError::Config(format!("invalid challenge pattern {pattern}: {err}")))
}
