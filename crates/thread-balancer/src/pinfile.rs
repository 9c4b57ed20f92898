//! Thread-to-CPU mapping file.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading a mapping file.
#[derive(Debug, thiserror::Error)]
pub enum PinMapError {
    #[error("Failed to read pin file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid pin file: {0}")]
    Json(#[from] serde_json::Error),
}

/// `{app: {thread: [cpu, ...]}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinMap {
    apps: BTreeMap<String, BTreeMap<String, BTreeSet<usize>>>,
}

impl PinMap {
    pub fn from_file(path: &Path) -> Result<Self, PinMapError> {
        let content = fs::read_to_string(path).map_err(|source| PinMapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, PinMapError> {
        Ok(serde_json::from_str(content)?)
    }

    /// CPU set for `thread` of application `app`.
    pub fn lookup(&self, app: &str, thread: &str) -> Option<&BTreeSet<usize>> {
        self.apps.get(app)?.get(thread)
    }

    pub fn has_app(&self, app: &str) -> bool {
        self.apps.contains_key(app)
    }

    pub fn apps(&self) -> impl Iterator<Item = &str> {
        self.apps.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let pins = PinMap::from_json(r#"{"appA": {"threadX": [1, 0, 1]}, "appB": {}}"#).unwrap();
        assert_eq!(
            pins.lookup("appA", "threadX"),
            Some(&BTreeSet::from([0, 1]))
        );
        assert_eq!(pins.lookup("appA", "threadY"), None);
        assert_eq!(pins.lookup("appC", "threadX"), None);
        assert!(pins.has_app("appB"));
        assert_eq!(pins.apps().collect::<Vec<_>>(), vec!["appA", "appB"]);
    }

    #[test]
    fn test_rejects_negative_cpu() {
        assert!(matches!(
            PinMap::from_json(r#"{"appA": {"threadX": [-1]}}"#),
            Err(PinMapError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(PinMap::from_json(r#"["appA"]"#).is_err());
        assert!(PinMap::from_json(r#"{"appA": [0, 1]}"#).is_err());
    }
}
