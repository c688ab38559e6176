//! Dashboard prompts loaded from a JSON file.
//!
//! The file is parsed once per path and kept for the life of the process.
//! Its schema belongs to the dashboard, so the document stays an untyped
//! `serde_json::Value`. Failed loads are not cached.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Default prompts file, relative to the working directory
pub const DEFAULT_PROMPTS_PATH: &str = "prompts/prompts.json";

/// Process-wide loader used by `load_prompts`
static PROMPTS: OnceLock<PromptsLoader> = OnceLock::new();

#[derive(Error, Debug)]
pub enum PromptsError {
    #[error("Prompts file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read prompts file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error decoding JSON from {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default)]
pub struct PromptsLoader {
    cache: Mutex<HashMap<PathBuf, Arc<Value>>>,
}

impl PromptsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse `path`, returning the cached document on repeat calls.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Arc<Value>, PromptsError> {
        let path = path.as_ref();
        if let Some(cached) = self.cached(path) {
            debug!(path = %path.display(), "Prompts cache hit");
            return Ok(cached);
        }

        let document = Arc::new(read_prompts(path)?);
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Another caller may have loaded the same path meanwhile; keep the first
        let entry = cache
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::clone(&document));
        Ok(Arc::clone(entry))
    }

    fn cached(&self, path: &Path) -> Option<Arc<Value>> {
        let cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.get(path).cloned()
    }

    pub fn is_cached(&self, path: impl AsRef<Path>) -> bool {
        self.cached(path.as_ref()).is_some()
    }
}

fn read_prompts(path: &Path) -> Result<Value, PromptsError> {
    if !path.exists() {
        return Err(PromptsError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(path).map_err(|source| PromptsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&contents).map_err(|source| PromptsError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "Loaded prompts from disk");
    Ok(value)
}

/// Load prompts through the process-wide cache.
pub fn load_prompts(path: impl AsRef<Path>) -> Result<Arc<Value>, PromptsError> {
    PROMPTS.get_or_init(PromptsLoader::new).load(path)
}

/// Top-level entry names of a prompts document
pub fn entry_names(document: &Value) -> Vec<String> {
    match document {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.get("name")
                    .or_else(|| item.get("title"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("#{}", i + 1))
            })
            .collect(),
        _ => Vec::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
