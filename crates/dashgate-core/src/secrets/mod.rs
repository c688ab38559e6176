//! Secret store access for credentials and cookie settings.
//!
//! This module provides:
//! - `SecretStore`: section-based read access to sensitive configuration
//! - `FileSecretStore`: a JSON secrets file, read once on first access
//! - `MemorySecretStore`: an in-memory document for embedding and tests
//! - `CookieKeyFallback`: fills a missing cookie key from another source
//! - `CookieKeyring`: OS keychain storage for the cookie signing key
//!
//! An absent section is an empty mapping, never an error.

pub mod keychain;

use std::path::PathBuf;
use std::sync::OnceLock;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

pub use keychain::CookieKeyring;

/// A named section of the secrets document.
pub type Section = Map<String, Value>;

pub const CREDENTIALS_SECTION: &str = "credentials";
pub const COOKIE_SECTION: &str = "cookie";

#[derive(Error, Debug, Clone)]
pub enum SecretsError {
    #[error("Secrets file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read secrets file {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Failed to parse secrets file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Secrets document must be a JSON object")]
    NotAnObject,

    #[error("Secrets section '{0}' must be a mapping")]
    SectionNotAnObject(String),
}

pub trait SecretStore {
    /// Fetch a top-level section. Missing sections come back empty.
    fn section(&self, name: &str) -> Result<Section, SecretsError>;

    /// Human-readable origin of the secrets, for diagnostics.
    fn describe(&self) -> String;
}

fn extract_section(document: &Section, name: &str) -> Result<Section, SecretsError> {
    match document.get(name) {
        None | Some(Value::Null) => Ok(Section::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(SecretsError::SectionNotAnObject(name.to_string())),
    }
}

fn into_document(value: Value) -> Result<Section, SecretsError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SecretsError::NotAnObject),
    }
}

/// Secrets backed by a JSON file on disk.
pub struct FileSecretStore {
    path: PathBuf,
    document: OnceLock<Result<Section, SecretsError>>,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document: OnceLock::new(),
        }
    }

    fn read(&self) -> Result<Section, SecretsError> {
        if !self.path.exists() {
            return Err(SecretsError::NotFound(self.path.clone()));
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| SecretsError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        let value: Value = serde_json::from_str(&contents).map_err(|e| SecretsError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        debug!(path = %self.path.display(), "Secrets file loaded");
        into_document(value)
    }
}

impl SecretStore for FileSecretStore {
    fn section(&self, name: &str) -> Result<Section, SecretsError> {
        let document = self.document.get_or_init(|| self.read());
        match document {
            Ok(doc) => extract_section(doc, name),
            Err(e) => Err(e.clone()),
        }
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Secrets held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    document: Section,
}

impl MemorySecretStore {
    pub fn new(document: Section) -> Self {
        Self { document }
    }

    pub fn from_value(value: Value) -> Result<Self, SecretsError> {
        Ok(Self::new(into_document(value)?))
    }
}

impl SecretStore for MemorySecretStore {
    fn section(&self, name: &str) -> Result<Section, SecretsError> {
        extract_section(&self.document, name)
    }

    fn describe(&self) -> String {
        "in-memory secrets".to_string()
    }
}

/// Supplies `cookie.key` when the wrapped store leaves it absent or empty.
pub struct CookieKeyFallback<S> {
    inner: S,
    key: Option<String>,
}

impl<S: SecretStore> CookieKeyFallback<S> {
    pub fn new(inner: S, key: Option<String>) -> Self {
        Self { inner, key }
    }
}

impl<S: SecretStore> SecretStore for CookieKeyFallback<S> {
    fn section(&self, name: &str) -> Result<Section, SecretsError> {
        let mut section = self.inner.section(name)?;
        if name != COOKIE_SECTION {
            return Ok(section);
        }

        let has_key = matches!(section.get("key"), Some(Value::String(k)) if !k.is_empty());
        if !has_key {
            if let Some(ref key) = self.key {
                debug!("Using cookie key from fallback source");
                section.insert("key".to_string(), Value::String(key.clone()));
            }
        }
        Ok(section)
    }

    fn describe(&self) -> String {
        match self.key {
            Some(_) => format!("{} (cookie key from keychain)", self.inner.describe()),
            None => self.inner.describe(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
