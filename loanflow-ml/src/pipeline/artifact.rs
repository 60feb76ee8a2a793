//! Typed outputs passed from one stage to the next.
//!
//! An artifact is only constructed once every file its stage writes exists.

use crate::error::ErrorKind;
use crate::model::metrics::ClassificationMetrics;
use crate::persistence::hash_file;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionArtifact {
    pub feature_store_path: PathBuf,
    pub training_path: PathBuf,
    pub testing_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationArtifact {
    pub passed: bool,
    /// Concatenated failure messages; empty when the data passed.
    pub message: String,
    pub report_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationArtifact {
    pub transformed_object_path: PathBuf,
    pub transformed_train_path: PathBuf,
    pub transformed_test_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    pub trained_model_path: PathBuf,
    pub metrics: ClassificationMetrics,
}

/// Content written to the validation report file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_status: bool,
    pub message: String,
}

/// One file recorded in the run manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: u64,
}

impl ManifestEntry {
    pub fn for_file(name: &str, path: &Path) -> Result<Self, ErrorKind> {
        let size_bytes = std::fs::metadata(path)
            .map_err(|e| ErrorKind::io(path, e))?
            .len();
        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            sha256: hash_file(path)?,
            size_bytes,
        })
    }
}

/// Summary of a completed run with checksums of everything it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub metrics: ClassificationMetrics,
    pub files: Vec<ManifestEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_entry_hashes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"abc").unwrap();
        let entry = ManifestEntry::for_file("a", &path).unwrap();
        assert_eq!(entry.size_bytes, 3);
        assert_eq!(
            entry.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_manifest_entry_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = ManifestEntry::for_file("x", &dir.path().join("none")).unwrap_err();
        assert!(matches!(err, ErrorKind::Io { .. }));
    }
}
