//! Artifact persistence: atomic writes, JSON objects, YAML documents and file hashes.
//!
//! Every artifact file is written to a `.tmp` sibling and renamed into place,
//! so a reader never observes a half-written artifact.

use crate::error::ErrorKind;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Create the parent directory of `path` if needed.
pub fn ensure_parent(path: &Path) -> Result<(), ErrorKind> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| ErrorKind::io(parent, e))?;
        }
    }
    Ok(())
}

/// Atomically write raw bytes to a file, creating parent directories.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ErrorKind> {
    ensure_parent(path)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, data).map_err(|e| ErrorKind::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| ErrorKind::io(path, e))?;
    Ok(())
}

/// Serialize `obj` as pretty JSON and write it atomically.
pub fn save_object<T: Serialize>(path: &Path, obj: &T) -> Result<(), ErrorKind> {
    let json = serde_json::to_vec_pretty(obj)?;
    atomic_write(path, &json)
}

/// Load a JSON-serialized object written by [`save_object`].
pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T, ErrorKind> {
    let data = std::fs::read(path).map_err(|e| ErrorKind::io(path, e))?;
    Ok(serde_json::from_slice(&data)?)
}

/// Serialize `doc` as YAML and write it atomically.
pub fn save_yaml<T: Serialize>(path: &Path, doc: &T) -> Result<(), ErrorKind> {
    let yaml = serde_yaml::to_string(doc)?;
    atomic_write(path, yaml.as_bytes())
}

/// Load a YAML document.
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ErrorKind> {
    let content = std::fs::read_to_string(path).map_err(|e| ErrorKind::io(path, e))?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Compute SHA-256 hash of file contents.
pub fn hash_file(path: &Path) -> Result<String, ErrorKind> {
    let content = std::fs::read(path).map_err(|e| ErrorKind::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Report {
        validation_status: bool,
        message: String,
    }

    #[test]
    fn test_save_object_roundtrip_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("obj.json");
        let report = Report {
            validation_status: true,
            message: String::new(),
        };
        save_object(&path, &report).unwrap();
        let loaded: Report = load_object(&path).unwrap();
        assert_eq!(loaded, report);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_yaml_document_is_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.yaml");
        let report = Report {
            validation_status: false,
            message: "Missing categorical columns: [loan_intent]".into(),
        };
        save_yaml(&path, &report).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("validation_status: false"));
        let loaded: Report = load_yaml(&path).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_object::<Report>(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ErrorKind::Io { .. }));
    }

    #[test]
    fn test_hash_file_is_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        atomic_write(&path, b"a,b\n1,2\n").unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_file(&path).unwrap());
        assert_eq!(hash_file(&path).unwrap().len(), 64);
    }
}
