//! The ordered list of known locations.
//!
//! Index order encodes adjacency along the traversal route, so an entry's
//! position is as meaningful as its name.

use crate::errors::PilotError;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    names: Vec<String>,
}

impl Catalog {
    /// Read a catalog with one name per line. Blank lines are skipped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PilotError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PilotError::Config(format!("Failed to read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::parse(&contents)
            .map_err(|e| PilotError::Config(format!("{}: {e}", path.display())))?;
        debug!(entries = catalog.len(), "Loaded catalog from {}", path.display());
        Ok(catalog)
    }

    /// Build a catalog from names already in memory, with the same validation
    /// as [`Catalog::load`].
    pub fn from_names<I, S>(names: I) -> Result<Self, PilotError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let joined = names
            .into_iter()
            .map(Into::into)
            .collect::<Vec<String>>()
            .join("\n");
        Self::parse(&joined).map_err(PilotError::Config)
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let mut names = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();

        for (line_no, line) in contents.lines().enumerate() {
            let name = line.trim();
            if name.is_empty() {
                continue;
            }
            if let Some(first) = seen.insert(name, line_no + 1) {
                return Err(format!(
                    "duplicate catalog entry '{name}' on lines {first} and {}",
                    line_no + 1
                ));
            }
            names.push(name.to_string());
        }

        if names.is_empty() {
            return Err("catalog is empty".to_string());
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a successfully loaded catalog.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
