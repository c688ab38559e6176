use thiserror::Error;

use crate::secrets::SecretsError;

/// Required configuration is missing from the secret store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Credentials configuration is missing or has no 'usernames' entries")]
    MissingCredentials,

    #[error("Cookie configuration is incomplete - missing: {}", .0.join(", "))]
    MissingCookieFields(Vec<&'static str>),
}

/// Any other failure while building the authenticator.
#[derive(Error, Debug)]
pub enum CriticalError {
    #[error("Failed to read secrets: {0}")]
    Secrets(#[from] SecretsError),

    #[error("cookie.expiry_days is not an integer: {0}")]
    InvalidExpiry(String),

    #[error("cookie.{field} must be a string")]
    InvalidCookieField { field: &'static str },

    #[error("Invalid credentials: {0}")]
    Credentials(#[from] CredentialError),

    #[error("Invalid cookie settings: {0}")]
    Cookie(#[from] CookieError),
}

#[derive(Error, Debug)]
pub enum InitError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Critical error initializing authenticator: {0}")]
    Critical(#[from] CriticalError),
}

impl InitError {
    pub fn is_config(&self) -> bool {
        matches!(self, InitError::Config(_))
    }
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("record for '{username}' is malformed: {message}")]
    MalformedRecord { username: String, message: String },

    #[error("failed to hash password for '{username}': {message}")]
    Hash { username: String, message: String },
}

#[derive(Error, Debug)]
pub enum CookieError {
    #[error("failed to derive cookie key: {0}")]
    KeyDerivation(String),

    #[error("cookie expiry of {0} days is out of range")]
    ExpiryOutOfRange(i64),

    #[error("failed to seal cookie")]
    Seal,

    #[error("cookie is invalid or was signed with another key")]
    Unseal,

    #[error("cookie I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cookie payload error: {0}")]
    Payload(#[from] serde_json::Error),
}
