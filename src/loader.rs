//! This module provides the `DefinitionLoader` struct, responsible for loading device
//! definitions from files, directories and strings.

use crate::definition::Definition;
use crate::types::{AutomatonError, MAX_DEFINITION_SIZE};
use std::fs;
use std::path::{Path, PathBuf};

/// `DefinitionLoader` is a utility struct for loading self-describing definition documents,
/// i.e. JSON objects carrying a `"kind"` field next to the definition fields.
pub struct DefinitionLoader;

impl DefinitionLoader {
    /// Loads a single definition from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Definition)` if the file is read and decoded.
    /// * `Err(AutomatonError::File)` if the file cannot be read or is too large.
    /// * `Err(AutomatonError::Parse)` if the content is not a valid definition document.
    pub fn load(path: &Path) -> Result<Definition, AutomatonError> {
        let content = fs::read_to_string(path).map_err(|e| {
            AutomatonError::File(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::load_from_string(&content)
    }

    /// Loads a single definition from the provided string content.
    pub fn load_from_string(content: &str) -> Result<Definition, AutomatonError> {
        if content.len() > MAX_DEFINITION_SIZE {
            return Err(AutomatonError::File(format!(
                "Definition is {} bytes, larger than the {} byte limit",
                content.len(),
                MAX_DEFINITION_SIZE
            )));
        }

        Definition::from_document(content)
    }

    /// Loads every `.json` definition in `directory`.
    ///
    /// Directories and other files are skipped. Each element of the result is either the
    /// path and decoded definition, or the error that file produced.
    pub fn load_dir(directory: &Path) -> Vec<Result<(PathBuf, Definition), AutomatonError>> {
        if !directory.exists() {
            return vec![Err(AutomatonError::File(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(AutomatonError::File(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        let mut results: Vec<_> = entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(AutomatonError::File(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                if path.is_dir() || path.extension().is_none_or(|ext| ext != "json") {
                    return None;
                }

                match Self::load(&path) {
                    Ok(definition) => Some(Ok((path, definition))),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping definition");
                        Some(Err(e))
                    }
                }
            })
            .collect();

        // read_dir order is platform dependent
        results.sort_by_key(|result| match result {
            Ok((path, _)) => Some(path.clone()),
            Err(_) => None,
        });
        results
    }
}
