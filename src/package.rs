//! Scenario packages: the document tree a scenario is compiled from.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::PackageError;

/// The subdirectories referenced documents are loaded from.
const DOCUMENT_DIRS: [&str; 4] = ["teams", "players", "ships", "abilities"];

/// A set of named JSON documents describing one scenario.
///
/// Documents are keyed by their package-relative path, e.g. `scenario.json`
/// or `ships/cruiser.json`. A package is just text: nothing is parsed until
/// [`crate::scenario::compile`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioPackage {
    documents: BTreeMap<String, String>,
}

impl ScenarioPackage {
    /// An empty package.
    #[must_use]
    pub fn new() -> Self {
        ScenarioPackage::default()
    }

    /// Add or replace a document.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(name.into(), text.into());
    }

    /// Look up a document's text by name.
    #[must_use]
    pub fn document(&self, name: &str) -> Option<&str> {
        self.documents.get(name).map(String::as_str)
    }

    /// Look up a document, returning the package's own key for it.
    pub(crate) fn entry(&self, name: &str) -> Option<(&str, &str)> {
        self.documents
            .get_key_value(name)
            .map(|(key, text)| (key.as_str(), text.as_str()))
    }

    /// Every document, sorted by name.
    pub fn documents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents
            .iter()
            .map(|(name, text)| (name.as_str(), text.as_str()))
    }

    /// How many documents the package holds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the package holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Load a package from a directory on disk.
    ///
    /// Reads `scenario.json`, `board.json`, `foreign-attributes.json` (if
    /// present) and every `*.json` file under the `teams/`, `players/`,
    /// `ships/` and `abilities/` subdirectories that exist.
    ///
    /// # Errors
    ///
    /// Returns a [`PackageError`] naming the first path that could not be
    /// read.
    pub fn from_dir(root: &Path) -> Result<Self, PackageError> {
        let mut package = ScenarioPackage::new();
        for name in ["scenario.json", "board.json"] {
            package.read_document(root, name)?;
        }
        if root.join("foreign-attributes.json").is_file() {
            package.read_document(root, "foreign-attributes.json")?;
        }
        for dir in DOCUMENT_DIRS {
            let path = root.join(dir);
            if !path.is_dir() {
                continue;
            }
            let entries =
                fs::read_dir(&path).map_err(|err| PackageError::new(path.clone(), err))?;
            for entry in entries {
                let entry = entry.map_err(|err| PackageError::new(path.clone(), err))?;
                let file = entry.path();
                if file.extension().is_some_and(|ext| ext == "json")
                    && let Some(stem) = file.file_stem().and_then(|s| s.to_str())
                {
                    package.read_document(root, &format!("{dir}/{stem}.json"))?;
                }
            }
        }
        Ok(package)
    }

    fn read_document(&mut self, root: &Path, name: &str) -> Result<(), PackageError> {
        let path = root.join(name);
        let text = fs::read_to_string(&path).map_err(|err| PackageError::new(path, err))?;
        self.insert(name, text);
        Ok(())
    }
}
