//! User records from the `credentials.usernames` secrets section.

use std::collections::BTreeMap;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use serde::Deserialize;
use serde_json::Value;

use super::error::CredentialError;
use crate::secrets::Section;

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    name: Option<String>,
    password: String,
}

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub name: String,
    password_hash: String,
}

impl UserRecord {
    pub fn verify(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash)
    }
}

/// Hash a password into an Argon2 PHC string
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

const DECOY_PASSWORD: &str = "dashgate-decoy";

fn is_password_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}

/// Hashed user records keyed by username.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    users: BTreeMap<String, UserRecord>,
    // Verified against for unknown usernames so every attempt costs one Argon2 run
    decoy_hash: String,
}

impl UserDirectory {
    /// Build the directory from the raw credentials section.
    ///
    /// Plaintext passwords are hashed here so they never outlive construction.
    pub fn from_credentials(credentials: &Section) -> Result<Self, CredentialError> {
        let decoy_hash = hash_password(DECOY_PASSWORD).map_err(|e| CredentialError::Hash {
            username: "(decoy)".to_string(),
            message: e.to_string(),
        })?;

        let mut users = BTreeMap::new();
        let Some(Value::Object(usernames)) = credentials.get("usernames") else {
            return Ok(Self { users, decoy_hash });
        };

        for (username, raw) in usernames {
            let record: RawRecord =
                serde_json::from_value(raw.clone()).map_err(|e| CredentialError::MalformedRecord {
                    username: username.clone(),
                    message: e.to_string(),
                })?;

            let password_hash = if is_password_hash(&record.password) {
                record.password
            } else {
                hash_password(&record.password).map_err(|e| CredentialError::Hash {
                    username: username.clone(),
                    message: e.to_string(),
                })?
            };

            users.insert(
                username.clone(),
                UserRecord {
                    username: username.clone(),
                    name: record.name.unwrap_or_else(|| username.clone()),
                    password_hash,
                },
            );
        }

        Ok(Self { users, decoy_hash })
    }

    /// The user matching `username` and `password`, if any.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&UserRecord> {
        match self.users.get(username) {
            Some(user) => user.verify(password).then_some(user),
            None => {
                verify_password(password, &self.decoy_hash);
                None
            }
        }
    }

    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.users.get(username)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section(value: Value) -> Section {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_plaintext_password_is_hashed() {
        let creds = section(json!({"usernames": {"alice": {"name": "Alice", "password": "hunter2"}}}));
        let users = UserDirectory::from_credentials(&creds).unwrap();

        let alice = users.get("alice").unwrap();
        assert_ne!(alice.password_hash, "hunter2");
        assert!(alice.password_hash.starts_with("$argon2"));
        assert!(alice.verify("hunter2"));
        assert!(!alice.verify("hunter3"));
    }

    #[test]
    fn test_hashed_password_is_kept() {
        let hash = hash_password("s3cret").unwrap();
        let creds = section(json!({"usernames": {"bob": {"password": hash}}}));
        let users = UserDirectory::from_credentials(&creds).unwrap();

        let bob = users.get("bob").unwrap();
        assert_eq!(bob.password_hash, hash);
        assert!(bob.verify("s3cret"));
    }

    #[test]
    fn test_name_defaults_to_username() {
        let creds = section(json!({"usernames": {"carol": {"password": "pw", "email": "c@example.com"}}}));
        let users = UserDirectory::from_credentials(&creds).unwrap();

        let carol = users.get("carol").unwrap();
        assert_eq!(carol.name, "carol");
    }

    #[test]
    fn test_authenticate() {
        let creds = section(json!({"usernames": {"alice": {"password": "hunter2"}}}));
        let users = UserDirectory::from_credentials(&creds).unwrap();

        assert_eq!(users.authenticate("alice", "hunter2").map(|u| u.username.as_str()), Some("alice"));
        assert!(users.authenticate("alice", "hunter3").is_none());
        assert!(users.authenticate("mallory", "hunter2").is_none());
    }

    #[test]
    fn test_unknown_user_is_checked_against_decoy_hash() {
        let users = UserDirectory::from_credentials(&Section::new()).unwrap();
        assert!(users.decoy_hash.starts_with("$argon2"));
        // The decoy password itself never authenticates anyone
        assert!(users.authenticate("nobody", DECOY_PASSWORD).is_none());
    }

    #[test]
    fn test_record_without_password_is_malformed() {
        let creds = section(json!({"usernames": {"dave": {"name": "Dave"}}}));
        let err = UserDirectory::from_credentials(&creds).unwrap_err();
        assert!(matches!(err, CredentialError::MalformedRecord { ref username, .. } if username == "dave"));
    }

    #[test]
    fn test_verify_password_rejects_garbage_hash() {
        assert!(!verify_password("pw", "not-a-hash"));
    }
}
