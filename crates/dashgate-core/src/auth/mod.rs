//! Authentication bootstrap and login flow.
//!
//! This module provides:
//! - `initialize_authenticator`: validates secrets and builds an `Authenticator`
//! - `Authenticator`: password login plus a sealed re-authentication cookie
//! - `authentication_flow`: runs a login and mirrors it into `SessionState`
//!
//! Passwords are stored as Argon2 hashes. Cookies are sealed with
//! ChaCha20-Poly1305 under a key derived from the configured cookie key.

pub mod authenticator;
pub mod cookie;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod session;

pub use authenticator::{AuthStatus, Authenticator, LoginAttempt, LoginForm, LoginLocation, LoginOutcome};
pub use error::{ConfigError, CookieError, CredentialError, CriticalError, InitError};
pub use factory::{initialize_authenticator, validate_secrets, Advisory, AuthSettings, Bootstrap};
pub use session::{authentication_flow, SessionState};
