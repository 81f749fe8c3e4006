//! JSON-backed revision source.
//!
//! The corpus file is a single JSON document:
//!
//! ```json
//! {
//!   "files": [
//!     {
//!       "path": "lib/parser.c",
//!       "binary": false,
//!       "revisions": [
//!         {"id": "1.1", "timestamp": "2001-03-04T10:00:00Z",
//!          "author": "jrandom", "log": "initial import"}
//!       ],
//!       "symbols": [
//!         {"name": "REL_1", "kind": "tag", "sprout_revision": "1.1"}
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{FileHistory, RevisionSource};
use crate::errors::{ConversionError, Result};

#[derive(Debug, Deserialize)]
struct CorpusDocument {
    files: Vec<FileHistory>,
}

/// Reads a whole corpus from one JSON file, yielding files sorted by path.
#[derive(Debug, Clone)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RevisionSource for JsonSource {
    fn file_histories(&self) -> Result<Vec<FileHistory>> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|e| ConversionError::source(&self.path, e))?;
        let document: CorpusDocument = serde_json::from_str(&contents)
            .map_err(|e| ConversionError::source(&self.path, e))?;
        let mut histories = document.files;
        histories.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(histories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn loads_and_sorts_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("corpus.json");
        fs::write(
            &corpus,
            indoc! {r#"
                {
                  "files": [
                    {
                      "path": "z.c",
                      "revisions": [
                        {"id": "1.1", "timestamp": "2001-03-04T10:00:00Z",
                         "author": "jrandom", "log": "import"}
                      ]
                    },
                    {
                      "path": "a.c",
                      "revisions": [
                        {"id": "1.1", "timestamp": "2001-03-04T10:05:00Z",
                         "author": "jrandom", "log": "import"}
                      ],
                      "symbols": [
                        {"name": "REL_1", "kind": "tag", "sprout_revision": "1.1"}
                      ]
                    }
                  ]
                }
            "#},
        )
        .unwrap();

        let histories = JsonSource::new(&corpus).file_histories().unwrap();
        assert_eq!(histories.len(), 2);
        assert_eq!(histories[0].path, PathBuf::from("a.c"));
        assert_eq!(histories[0].symbols[0].name, "REL_1");
    }

    #[test]
    fn missing_corpus_is_a_source_error() {
        let err = JsonSource::new("/nonexistent/corpus.json")
            .file_histories()
            .unwrap_err();
        assert!(err.to_string().contains("corpus"));
    }
}
