//! File-backed, key-addressed artifact store.
//!
//! Each artifact is one JSON file under the working directory, keyed by
//! artifact name. Writes go through a temp file and an atomic rename so
//! a consumer in a later invocation never observes a half-written
//! artifact. The value schema is whatever type the producer wrote;
//! deserialization is validated at read time and a mismatch is reported
//! against the artifact name.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::{ConversionError, Result};

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| ConversionError::artifact(root.display().to_string(), e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.json", name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).is_file()
    }

    /// Serialize `value` under `name`, replacing any previous version.
    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let target = self.path_for(name);
        let temp = target.with_extension("json.tmp");

        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| ConversionError::artifact(name, e))?;
        fs::write(&temp, body).map_err(|e| ConversionError::artifact(name, e))?;
        fs::rename(&temp, &target).map_err(|e| ConversionError::artifact(name, e))?;
        log::debug!("artifact '{}' written ({})", name, target.display());
        Ok(())
    }

    /// Read and validate the artifact under `name`.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.path_for(name);
        let body = fs::read_to_string(&path).map_err(|e| {
            ConversionError::artifact(
                name,
                format!("not readable ({}); was its producing pass run?", e),
            )
        })?;
        serde_json::from_str(&body).map_err(|e| {
            ConversionError::artifact(name, format!("schema mismatch at read time: {}", e))
        })
    }

    /// Remove the backing file. Removing an absent artifact is not an
    /// error; release after a retained run must be idempotent.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("artifact '{}' released", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ConversionError::artifact(name, e)),
        }
    }
}
