// Sealed re-authentication cookie persisted between runs.

use std::path::PathBuf;

use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::CookieError;

/// Cookie file extension in the cookie directory
const COOKIE_EXTENSION: &str = "cookie";

/// Salt prefix for deriving the sealing key from the configured cookie key.
/// Argon2 requires at least 8 bytes of salt; the prefix alone guarantees that.
const SALT_PREFIX: &str = "dashgate-cookie:";

const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSettings {
    pub name: String,
    pub key: String,
    pub expiry_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CookiePayload {
    username: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SealedCookie {
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

pub struct CookieJar {
    dir: PathBuf,
    name: String,
    // None when cookies are not persisted
    ttl: Option<Duration>,
    cipher: ChaCha20Poly1305,
}

impl CookieJar {
    pub fn new(dir: impl Into<PathBuf>, settings: &CookieSettings) -> Result<Self, CookieError> {
        let salt = format!("{}{}", SALT_PREFIX, settings.name);
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(settings.key.as_bytes(), salt.as_bytes(), &mut key)
            .map_err(|e| CookieError::KeyDerivation(e.to_string()))?;

        let ttl = if settings.expiry_days > 0 {
            let ttl = Duration::try_days(settings.expiry_days)
                .ok_or(CookieError::ExpiryOutOfRange(settings.expiry_days))?;
            // Every issued cookie must have a representable expiry timestamp
            Utc::now()
                .checked_add_signed(ttl)
                .ok_or(CookieError::ExpiryOutOfRange(settings.expiry_days))?;
            Some(ttl)
        } else {
            None
        };

        Ok(Self {
            dir: dir.into(),
            name: settings.name.clone(),
            ttl,
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        })
    }

    pub fn path(&self) -> PathBuf {
        // Cookie names come from secrets; keep them inside the jar directory
        let file_stem: String = self
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.{}", file_stem, COOKIE_EXTENSION))
    }

    /// Write a cookie for `username`. Does nothing when expiry is not positive.
    pub fn issue(&self, username: &str) -> Result<(), CookieError> {
        let Some(ttl) = self.ttl else {
            debug!(cookie = %self.name, "Cookie expiry is not positive, skipping persistence");
            return Ok(());
        };
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or(CookieError::ExpiryOutOfRange(ttl.num_days()))?;
        let payload = CookiePayload {
            username: username.to_string(),
            expires_at,
        };
        self.write(&payload)
    }

    fn write(&self, payload: &CookiePayload) -> Result<(), CookieError> {
        let plaintext = serde_json::to_vec(payload)?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_slice())
            .map_err(|_| CookieError::Seal)?;

        let sealed = SealedCookie {
            nonce: nonce.to_vec(),
            ciphertext,
        };

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(), serde_json::to_string(&sealed)?)?;
        Ok(())
    }

    /// Username from a valid, unexpired cookie
    pub fn read(&self) -> Result<Option<String>, CookieError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        let sealed: SealedCookie = serde_json::from_str(&contents)?;
        if sealed.nonce.len() != NONCE_LEN {
            return Err(CookieError::Unseal);
        }

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_slice())
            .map_err(|_| CookieError::Unseal)?;
        let payload: CookiePayload = serde_json::from_slice(&plaintext)?;

        if Utc::now() > payload.expires_at {
            debug!(cookie = %self.name, "Cookie expired");
            return Ok(None);
        }
        Ok(Some(payload.username))
    }

    /// Remove the cookie file
    pub fn clear(&self) -> Result<(), CookieError> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
