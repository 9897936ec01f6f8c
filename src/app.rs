//! Resolved runtime context shared by every command.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::{Result, WorkshopError};

#[derive(Debug, Clone)]
pub struct AppContext {
    /// Directory identities are derived from and `.workshop` lives in.
    pub workshop_root: PathBuf,
    /// Directory searched for definition files.
    pub challenges_dir: PathBuf,
    pub config: Config,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let workshop_root = match &cli.cwd {
            Some(dir) => absolutize(dir)?,
            None => std::env::current_dir()?,
        };
        if !workshop_root.is_dir() {
            return Err(WorkshopError::Config(format!(
                "workshop root is not a directory: {}",
                workshop_root.display()
            )));
        }

        let config = Config::load(cli.config.as_deref(), &workshop_root)?;
        config.validate()?;

        let challenges_dir = match &cli.challenges {
            Some(dir) => absolutize(dir)?,
            None => resolve_under(&workshop_root, Path::new(&config.challenges.dir)),
        };

        debug!(
            "workshop root {}, challenges in {}",
            workshop_root.display(),
            challenges_dir.display()
        );

        Ok(Self {
            workshop_root,
            challenges_dir,
            config,
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    Ok(resolve_under(&std::env::current_dir()?, path))
}

/// Join a possibly relative `path` under `base`, dropping `.` components.
fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn resolve_under_drops_cur_dir() {
        assert_eq!(
            resolve_under(Path::new("/w"), Path::new(".")),
            PathBuf::from("/w")
        );
        assert_eq!(
            resolve_under(Path::new("/w"), Path::new("./lessons")),
            PathBuf::from("/w/lessons")
        );
        assert_eq!(
            resolve_under(Path::new("/w"), Path::new("/elsewhere")),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn context_from_flags() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("custom.toml");
        std::fs::write(&config, "[challenges]\ndir = \"lessons\"\n").unwrap();

        let root = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "workshop",
            "--cwd",
            root,
            "--config",
            config.to_str().unwrap(),
            "--robot",
        ])
        .unwrap();
        let ctx = AppContext::from_cli(&cli).unwrap();
        assert_eq!(ctx.workshop_root, dir.path());
        assert_eq!(ctx.challenges_dir, dir.path().join("lessons"));
        assert!(ctx.robot_mode);
    }

    #[test]
    fn missing_root_is_config_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let cli = Cli::try_parse_from(["workshop", "--cwd", missing.to_str().unwrap()]).unwrap();
        assert!(matches!(
            AppContext::from_cli(&cli),
            Err(WorkshopError::Config(_))
        ));
    }
}
