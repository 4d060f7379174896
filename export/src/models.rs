// models holds the field document schema & a directory-backed store for it

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use noisefield_core::{NoiseConfig, NoiseError, ScalarField2D};
use serde::{Deserialize, Serialize};

use crate::{ExportError, Result};

const EXTENSION: &str = "json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    pub noise: NoiseConfig,
    pub width: usize,
    pub height: usize,
    // Flattened row-major: length = width×height
    pub data: Vec<f32>,
}

impl FieldDoc {
    pub fn new(name: impl Into<String>, noise: NoiseConfig, field: &ScalarField2D) -> Self {
        Self {
            name: name.into(),
            noise,
            width: field.width(),
            height: field.height(),
            data: field.as_slice().to_vec(),
        }
    }

    pub fn to_field(&self) -> std::result::Result<ScalarField2D, NoiseError> {
        ScalarField2D::from_vec(self.width, self.height, self.data.clone())
    }
}

// One `<name>.json` file per document
pub struct FieldStore {
    dir: PathBuf,
}

impl FieldStore {
    // Open the store, creating its directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| ExportError::io(&dir, e))?;
        tracing::debug!(dir = %dir.display(), "field store opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // Names become file names, so keep them to a safe alphabet
    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(ExportError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.{EXTENSION}")))
    }

    pub fn list_names(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| ExportError::io(&self.dir, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ExportError::io(&self.dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn read_by_name(&self, name: &str) -> Result<Option<FieldDoc>> {
        let path = self.path_for(name)?;
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ExportError::io(&path, e)),
        };
        let doc = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ExportError::Json { path, source })?;
        Ok(Some(doc))
    }

    // Write a document, replacing any existing one with the same name
    pub fn create(&self, doc: &FieldDoc) -> Result<PathBuf> {
        if doc.width.checked_mul(doc.height) != Some(doc.data.len()) {
            return Err(NoiseError::LengthMismatch {
                width: doc.width,
                height: doc.height,
                expected: doc.width.saturating_mul(doc.height),
                actual: doc.data.len(),
            }
            .into());
        }
        let path = self.path_for(&doc.name)?;
        let file = File::create(&path).map_err(|e| ExportError::io(&path, e))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, doc).map_err(|source| ExportError::Json {
            path: path.clone(),
            source,
        })?;
        out.flush().map_err(|e| ExportError::io(&path, e))?;
        tracing::info!(name = %doc.name, path = %path.display(), "field document stored");
        Ok(path)
    }

    // Returns whether a document was removed
    pub fn delete_by_name(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ExportError::io(&path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("noisefield-models-{}-{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn names_are_checked() {
        let store = FieldStore::open(scratch("names")).unwrap();
        for bad in ["", "../up", "a/b", ".hidden", "sp ace"] {
            assert!(matches!(store.path_for(bad), Err(ExportError::InvalidName(_))), "{bad}");
        }
        assert!(store.path_for("hills_01.v2").is_ok());
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn missing_documents_are_none() {
        let store = FieldStore::open(scratch("missing")).unwrap();
        assert!(store.read_by_name("nothing").unwrap().is_none());
        assert!(!store.delete_by_name("nothing").unwrap());
        assert!(store.list_names().unwrap().is_empty());
        let _ = fs::remove_dir_all(store.dir());
    }

    #[test]
    fn inconsistent_documents_are_refused() {
        let store = FieldStore::open(scratch("shape")).unwrap();
        let doc = FieldDoc {
            name: "bad".into(),
            noise: NoiseConfig::default(),
            width: 3,
            height: 3,
            data: vec![0.0; 4],
        };
        assert!(matches!(
            store.create(&doc),
            Err(ExportError::Noise(NoiseError::LengthMismatch { expected: 9, actual: 4, .. }))
        ));
        let _ = fs::remove_dir_all(store.dir());
    }
}
