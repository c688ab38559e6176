use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::cookie::{CookieJar, CookieSettings};
use super::credentials::UserDirectory;
use super::error::CriticalError;
use crate::secrets::Section;

/// Message shown when a submitted username/password pair does not match
pub const INCORRECT_CREDENTIALS: &str = "Username/password is incorrect";

/// Where the login form should be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginLocation {
    #[default]
    Main,
    Sidebar,
}

impl fmt::Display for LoginLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginLocation::Main => write!(f, "main"),
            LoginLocation::Sidebar => write!(f, "sidebar"),
        }
    }
}

/// Tri-state authentication result. Serializes as `null`, `false`, `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum AuthStatus {
    #[default]
    Unknown,
    Failed,
    Succeeded,
}

impl From<AuthStatus> for Option<bool> {
    fn from(status: AuthStatus) -> Self {
        match status {
            AuthStatus::Unknown => None,
            AuthStatus::Failed => Some(false),
            AuthStatus::Succeeded => Some(true),
        }
    }
}

impl From<Option<bool>> for AuthStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => AuthStatus::Unknown,
            Some(false) => AuthStatus::Failed,
            Some(true) => AuthStatus::Succeeded,
        }
    }
}

/// Username/password pair submitted through a login form
#[derive(Clone)]
pub struct LoginAttempt {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginAttempt")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The surface that renders the login form and shows its errors.
pub trait LoginForm {
    /// Render the form and return the submission, or `None` if nothing was submitted.
    fn prompt(&mut self, location: LoginLocation) -> Result<Option<LoginAttempt>>;

    /// Show an error next to the form.
    fn error(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginOutcome {
    pub name: Option<String>,
    pub status: AuthStatus,
    pub username: Option<String>,
}

impl LoginOutcome {
    fn failed() -> Self {
        Self {
            name: None,
            status: AuthStatus::Failed,
            username: None,
        }
    }
}

pub struct Authenticator {
    users: UserDirectory,
    cookie_name: String,
    jar: CookieJar,
}

impl Authenticator {
    pub fn new(
        credentials: &Section,
        cookie_name: &str,
        cookie_key: &str,
        expiry_days: i64,
        cookie_dir: impl Into<PathBuf>,
    ) -> Result<Self, CriticalError> {
        let users = UserDirectory::from_credentials(credentials)?;
        let settings = CookieSettings {
            name: cookie_name.to_string(),
            key: cookie_key.to_string(),
            expiry_days,
        };
        let jar = CookieJar::new(cookie_dir, &settings)?;
        debug!(users = users.len(), cookie = cookie_name, expiry_days, "Authenticator created");

        Ok(Self {
            users,
            cookie_name: cookie_name.to_string(),
            jar,
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Run one login interaction: cookie first, then the form.
    pub fn login(&self, location: LoginLocation, form: &mut dyn LoginForm) -> LoginOutcome {
        if let Some(outcome) = self.login_from_cookie() {
            return outcome;
        }

        let attempt = match form.prompt(location) {
            Ok(Some(attempt)) => attempt,
            Ok(None) => return LoginOutcome::default(),
            Err(e) => {
                debug!(error = %e, "Failed to read login form");
                form.error(&format!("Could not read login form: {}", e));
                return LoginOutcome::failed();
            }
        };

        let Some(user) = self.users.authenticate(&attempt.username, &attempt.password) else {
            info!(username = %attempt.username, "Login rejected");
            form.error(INCORRECT_CREDENTIALS);
            return LoginOutcome::failed();
        };

        if let Err(e) = self.jar.issue(&user.username) {
            warn!(error = %e, "Failed to persist auth cookie");
        }

        info!(username = %user.username, "Login successful");
        LoginOutcome {
            name: Some(user.name.clone()),
            status: AuthStatus::Succeeded,
            username: Some(user.username.clone()),
        }
    }

    fn login_from_cookie(&self) -> Option<LoginOutcome> {
        let username = match self.jar.read() {
            Ok(Some(username)) => username,
            Ok(None) => return None,
            Err(e) => {
                debug!(error = %e, "Ignoring unreadable auth cookie");
                return None;
            }
        };

        // A cookie for a user that no longer exists is stale
        let user = self.users.get(&username)?;
        debug!(username = %username, "Re-authenticated from cookie");
        Some(LoginOutcome {
            name: Some(user.name.clone()),
            status: AuthStatus::Succeeded,
            username: Some(user.username.clone()),
        })
    }

    /// Forget the persisted login
    pub fn logout(&self) -> Result<()> {
        self.jar.clear()?;
        info!(cookie = %self.cookie_name, "Logged out");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
