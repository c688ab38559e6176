//! dashgate core - login bootstrap for the dashboard.
//!
//! Reads credentials and cookie settings from a secret store, validates
//! them, builds the authenticator, runs the login flow into an explicit
//! session state, and loads the dashboard prompts file.

pub mod auth;
pub mod config;
pub mod doctor;
pub mod prompts;
pub mod secrets;

pub use auth::{
    authentication_flow, initialize_authenticator, Advisory, AuthStatus, Authenticator, Bootstrap,
    InitError, LoginAttempt, LoginForm, LoginLocation, SessionState,
};
pub use config::Config;
pub use prompts::{load_prompts, PromptsError, PromptsLoader, DEFAULT_PROMPTS_PATH};
pub use secrets::{CookieKeyFallback, CookieKeyring, FileSecretStore, MemorySecretStore, SecretStore};
