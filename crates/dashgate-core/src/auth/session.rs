use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::authenticator::{AuthStatus, Authenticator, LoginForm, LoginLocation};

/// Message shown when the login flow runs without an authenticator
pub const AUTHENTICATOR_UNAVAILABLE: &str =
    "Authentication is unavailable: the authenticator was not initialized";

/// Per-session login state, overwritten by every `authentication_flow` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub name: Option<String>,
    pub authentication_status: AuthStatus,
    pub username: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication_status == AuthStatus::Succeeded
    }

    /// Reset to the unauthenticated state
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Run the login interaction and mirror its result into `state`.
///
/// A missing `handle` marks the session as failed instead of panicking.
pub fn authentication_flow(
    handle: Option<&Authenticator>,
    location: LoginLocation,
    form: &mut dyn LoginForm,
    state: &mut SessionState,
) {
    let Some(authenticator) = handle else {
        error!("Login flow invoked without an authenticator");
        form.error(AUTHENTICATOR_UNAVAILABLE);
        state.authentication_status = AuthStatus::Failed;
        return;
    };

    let outcome = authenticator.login(location, form);
    debug!(status = ?outcome.status, %location, "Login flow finished");

    state.name = outcome.name;
    state.authentication_status = outcome.status;
    state.username = outcome.username;
}

// ============================================================================
// Tests
// ============================================================================
