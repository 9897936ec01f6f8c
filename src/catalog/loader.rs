//! Document loading for challenge definitions.

use std::path::Path;

use serde_yaml::Value;

use crate::error::{Result, WorkshopError};

/// Reads definition files into generic structured values.
pub trait DocumentLoader {
    /// Parse a file into a scalar, sequence or mapping.
    fn read_document(&self, path: &Path) -> Result<Value>;

    /// Read a file verbatim.
    fn read_raw(&self, path: &Path) -> Result<String>;
}

impl<L: DocumentLoader + ?Sized> DocumentLoader for &L {
    fn read_document(&self, path: &Path) -> Result<Value> {
        (**self).read_document(path)
    }

    fn read_raw(&self, path: &Path) -> Result<String> {
        (**self).read_raw(path)
    }
}

/// YAML loader backed by the filesystem. No caching.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlLoader;

impl DocumentLoader for YamlLoader {
    fn read_document(&self, path: &Path) -> Result<Value> {
        let raw = self.read_raw(path)?;
        serde_yaml::from_str(&raw).map_err(|err| {
            WorkshopError::InvalidQuestion(format!("parse {}: {err}", path.display()))
        })
    }

    fn read_raw(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|err| {
            WorkshopError::Io(std::io::Error::new(
                err.kind(),
                format!("read {}: {err}", path.display()),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_mapping_and_sequence_documents() {
        let dir = tempdir().unwrap();
        let single = dir.path().join("single.yaml");
        let many = dir.path().join("many.yaml");
        std::fs::write(&single, "message: hi\ntype: input\n").unwrap();
        std::fs::write(&many, "- message: a\n- message: b\n").unwrap();

        let loader = YamlLoader;
        assert!(loader.read_document(&single).unwrap().is_mapping());
        let seq = loader.read_document(&many).unwrap();
        assert_eq!(seq.as_sequence().map(Vec::len), Some(2));
    }

    #[test]
    fn parse_failure_names_the_file() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("q.yaml");
        std::fs::write(&bad, "message: [unclosed\n").unwrap();

        let err = YamlLoader.read_document(&bad).unwrap_err();
        assert!(matches!(err, WorkshopError::InvalidQuestion(_)));
        assert!(err.to_string().contains("q.yaml"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = YamlLoader.read_raw(&dir.path().join("absent.md")).unwrap_err();
        assert!(matches!(err, WorkshopError::Io(_)));
    }
}
