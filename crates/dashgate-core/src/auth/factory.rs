//! Secrets validation and authenticator construction.
//!
//! `initialize_authenticator` never halts on its own: it returns a tagged
//! result and the render entry point decides whether to stop.

use std::fmt;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::authenticator::Authenticator;
use super::error::{ConfigError, CriticalError, InitError};
use crate::secrets::{SecretStore, Section};

pub use crate::secrets::{COOKIE_SECTION, CREDENTIALS_SECTION};

/// Sample cookie keys from documentation and templates. Never valid in production.
pub const PLACEHOLDER_COOKIE_KEYS: [&str; 5] = [
    "some_signature_key",
    "random_signature_key",
    "your_signature_key",
    "secret_key",
    "changeme",
];

/// Non-fatal finding reported alongside a successful initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    PlaceholderCookieKey,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::PlaceholderCookieKey => write!(
                f,
                "The cookie key is a well-known placeholder. Use a unique, strong secret in production."
            ),
        }
    }
}

/// Credentials and cookie settings that passed validation
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub credentials: Section,
    pub cookie_name: String,
    pub cookie_key: String,
    pub expiry_days: i64,
    pub advisories: Vec<Advisory>,
}

pub struct Bootstrap {
    pub authenticator: Authenticator,
    pub advisories: Vec<Advisory>,
}

pub fn is_placeholder_key(key: &str) -> bool {
    PLACEHOLDER_COOKIE_KEYS.contains(&key)
}

/// A cookie field is missing when absent or falsy: null, false, zero,
/// or an empty string, array or object.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
    }
}

fn cookie_string(cookie: &Section, field: &'static str) -> Result<String, CriticalError> {
    match cookie.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(CriticalError::InvalidCookieField { field }),
    }
}

/// Integer conversion for `expiry_days`: integers, booleans, finite floats
/// (truncated) and strings holding an integer.
pub fn parse_expiry_days(value: &Value) -> Result<i64, CriticalError> {
    let invalid = || CriticalError::InvalidExpiry(value.to_string());
    match value {
        Value::Number(n) => {
            if let Some(days) = n.as_i64() {
                Ok(days)
            } else if let Some(days) = n.as_f64().filter(|f| f.is_finite()) {
                let truncated = days.trunc();
                if truncated < i64::MIN as f64 || truncated > i64::MAX as f64 {
                    return Err(invalid());
                }
                Ok(truncated as i64)
            } else {
                Err(invalid())
            }
        }
        Value::Bool(b) => Ok(i64::from(*b)),
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Read and validate the `credentials` and `cookie` sections.
pub fn validate_secrets(store: &dyn SecretStore) -> Result<AuthSettings, InitError> {
    let credentials = store
        .section(CREDENTIALS_SECTION)
        .map_err(CriticalError::from)?;
    let cookie = store.section(COOKIE_SECTION).map_err(CriticalError::from)?;
    debug!(source = %store.describe(), "Validating auth secrets");

    let has_users = matches!(credentials.get("usernames"), Some(Value::Object(users)) if !users.is_empty());
    if credentials.is_empty() || !has_users {
        return Err(ConfigError::MissingCredentials.into());
    }

    let missing: Vec<&'static str> = ["name", "key", "expiry_days"]
        .into_iter()
        .filter(|field| is_missing(cookie.get(*field)))
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::MissingCookieFields(missing).into());
    }

    let cookie_name = cookie_string(&cookie, "name")?;
    let cookie_key = cookie_string(&cookie, "key")?;

    let mut advisories = Vec::new();
    if is_placeholder_key(&cookie_key) {
        debug!(cookie = %cookie_name, "Cookie key is a known placeholder value");
        advisories.push(Advisory::PlaceholderCookieKey);
    }

    let expiry_days = match cookie.get("expiry_days") {
        Some(value) => parse_expiry_days(value)?,
        None => return Err(ConfigError::MissingCookieFields(vec!["expiry_days"]).into()),
    };

    Ok(AuthSettings {
        credentials,
        cookie_name,
        cookie_key,
        expiry_days,
        advisories,
    })
}

/// Validate secrets and build the authenticator.
pub fn initialize_authenticator(
    store: &dyn SecretStore,
    cookie_dir: &Path,
) -> Result<Bootstrap, InitError> {
    let settings = validate_secrets(store)?;
    let authenticator = Authenticator::new(
        &settings.credentials,
        &settings.cookie_name,
        &settings.cookie_key,
        settings.expiry_days,
        cookie_dir,
    )?;

    Ok(Bootstrap {
        authenticator,
        advisories: settings.advisories,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::error::CookieError;
    use crate::secrets::MemorySecretStore;
    use serde_json::json;

    fn store(value: Value) -> MemorySecretStore {
        MemorySecretStore::from_value(value).unwrap()
    }

    fn valid_secrets(key: &str) -> Value {
        json!({
            "credentials": {"usernames": {"alice": {"name": "Alice", "password": "wonderland"}}},
            "cookie": {"name": "dash_auth", "key": key, "expiry_days": 30}
        })
    }

    fn init(value: Value) -> Result<Bootstrap, InitError> {
        let dir = tempfile::tempdir().unwrap();
        initialize_authenticator(&store(value), dir.path())
    }

    #[test]
    fn test_missing_credentials_section() {
        let result = init(json!({"cookie": {"name": "c", "key": "k", "expiry_days": 30}}));
        assert!(matches!(
            result,
            Err(InitError::Config(ConfigError::MissingCredentials))
        ));
    }

    #[test]
    fn test_empty_usernames() {
        let result = init(json!({
            "credentials": {"usernames": {}},
            "cookie": {"name": "c", "key": "k", "expiry_days": 30}
        }));
        assert!(matches!(
            result,
            Err(InitError::Config(ConfigError::MissingCredentials))
        ));
    }

    #[test]
    fn test_credentials_without_usernames() {
        let result = init(json!({
            "credentials": {"preauthorized": ["bob@example.com"]},
            "cookie": {"name": "c", "key": "k", "expiry_days": 30}
        }));
        assert!(matches!(
            result,
            Err(InitError::Config(ConfigError::MissingCredentials))
        ));
    }

    #[test]
    fn test_each_missing_cookie_field() {
        for field in ["name", "key", "expiry_days"] {
            let mut secrets = valid_secrets("a-strong-key");
            secrets["cookie"].as_object_mut().unwrap().remove(field);

            match init(secrets) {
                Err(InitError::Config(ConfigError::MissingCookieFields(missing))) => {
                    assert_eq!(missing, vec![field]);
                }
                Err(other) => panic!("unexpected error for {field}: {other}"),
                Ok(_) => panic!("initialization succeeded without cookie.{field}"),
            }
        }
    }

    #[test]
    fn test_null_and_empty_cookie_fields_are_missing() {
        let result = init(json!({
            "credentials": {"usernames": {"alice": {"password": "pw"}}},
            "cookie": {"name": null, "key": "", "expiry_days": 30}
        }));
        match result {
            Err(InitError::Config(ConfigError::MissingCookieFields(missing))) => {
                assert_eq!(missing, vec!["name", "key"]);
            }
            _ => panic!("expected missing cookie fields"),
        }
    }

    #[test]
    fn test_missing_cookie_section() {
        let result = init(json!({
            "credentials": {"usernames": {"alice": {"password": "pw"}}}
        }));
        assert!(result.as_ref().is_err_and(InitError::is_config));
    }

    #[test]
    fn test_placeholder_keys_warn_but_succeed() {
        for key in PLACEHOLDER_COOKIE_KEYS {
            let bootstrap = init(valid_secrets(key)).unwrap();
            assert_eq!(bootstrap.advisories, vec![Advisory::PlaceholderCookieKey], "key {key}");
            assert_eq!(bootstrap.authenticator.user_count(), 1);
        }
    }

    #[test]
    fn test_strong_key_has_no_advisory() {
        let bootstrap = init(valid_secrets("k9$Vq!2rT#x8pLm")).unwrap();
        assert!(bootstrap.advisories.is_empty());
        assert_eq!(bootstrap.authenticator.cookie_name(), "dash_auth");
    }

    #[test]
    fn test_placeholder_match_is_exact() {
        assert!(is_placeholder_key("changeme"));
        assert!(!is_placeholder_key("changeme2"));
        assert!(!is_placeholder_key("CHANGEME"));
    }

    #[test]
    fn test_expiry_conversion() {
        assert_eq!(parse_expiry_days(&json!(30)).unwrap(), 30);
        assert_eq!(parse_expiry_days(&json!("14")).unwrap(), 14);
        assert_eq!(parse_expiry_days(&json!(7.9)).unwrap(), 7);
        assert_eq!(parse_expiry_days(&json!(true)).unwrap(), 1);
        assert!(parse_expiry_days(&json!("thirty")).is_err());
        assert!(parse_expiry_days(&json!([30])).is_err());
    }

    #[test]
    fn test_falsy_cookie_fields_are_missing() {
        let result = init(json!({
            "credentials": {"usernames": {"alice": {"password": "pw"}}},
            "cookie": {"name": "dash_auth", "key": false, "expiry_days": 0}
        }));
        match result {
            Err(InitError::Config(ConfigError::MissingCookieFields(missing))) => {
                assert_eq!(missing, vec!["key", "expiry_days"]);
            }
            _ => panic!("expected missing cookie fields"),
        }
    }

    #[test]
    fn test_negative_expiry_is_accepted() {
        let mut secrets = valid_secrets("a-strong-key");
        secrets["cookie"]["expiry_days"] = json!(-1);
        assert!(init(secrets).is_ok());
    }

    #[test]
    fn test_unrepresentable_expiry_is_critical() {
        let mut secrets = valid_secrets("a-strong-key");
        secrets["cookie"]["expiry_days"] = json!(200_000_000);
        assert!(matches!(
            init(secrets),
            Err(InitError::Critical(CriticalError::Cookie(CookieError::ExpiryOutOfRange(
                200_000_000
            ))))
        ));
    }

    #[test]
    fn test_bad_expiry_is_critical() {
        let mut secrets = valid_secrets("a-strong-key");
        secrets["cookie"]["expiry_days"] = json!("soon");

        match init(secrets) {
            Err(InitError::Critical(CriticalError::InvalidExpiry(value))) => {
                assert_eq!(value, "\"soon\"");
            }
            _ => panic!("expected invalid expiry"),
        }
    }

    #[test]
    fn test_malformed_user_record_is_critical() {
        let result = init(json!({
            "credentials": {"usernames": {"alice": {"name": "Alice"}}},
            "cookie": {"name": "dash_auth", "key": "a-strong-key", "expiry_days": 30}
        }));
        assert!(matches!(
            result,
            Err(InitError::Critical(CriticalError::Credentials(_)))
        ));
    }

    #[test]
    fn test_non_string_cookie_name_is_critical() {
        let mut secrets = valid_secrets("a-strong-key");
        secrets["cookie"]["name"] = json!(42);
        assert!(matches!(
            init(secrets),
            Err(InitError::Critical(CriticalError::InvalidCookieField { field: "name" }))
        ));
    }

    #[test]
    fn test_unreadable_store_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let store = crate::secrets::FileSecretStore::new(dir.path().join("absent.json"));
        let result = initialize_authenticator(&store, dir.path());
        assert!(matches!(
            result,
            Err(InitError::Critical(CriticalError::Secrets(_)))
        ));
    }
}
