//! Terminal surface: the login form and user-visible messages.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use dashgate_core::{LoginAttempt, LoginForm, LoginLocation};

pub fn report_error(message: &str) {
    eprintln!("Error: {}", message);
}

pub fn report_warning(message: &str) {
    eprintln!("Warning: {}", message);
}

/// Print an error and its cause chain
pub fn report_failure(err: &(dyn std::error::Error + 'static)) {
    report_error(&err.to_string());
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

/// Login form read from stdin, with the password read without echo.
pub struct TerminalLoginForm {
    default_username: Option<String>,
}

impl TerminalLoginForm {
    pub fn new(default_username: Option<String>) -> Self {
        Self { default_username }
    }

    fn prompt_username(&self) -> Result<String> {
        match self.default_username {
            Some(ref last_user) => print!("Username [{}]: ", last_user),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            Ok(self.default_username.clone().unwrap_or_default())
        } else {
            Ok(input.to_string())
        }
    }
}

impl LoginForm for TerminalLoginForm {
    fn prompt(&mut self, location: LoginLocation) -> Result<Option<LoginAttempt>> {
        match location {
            LoginLocation::Main => println!("\n=== Dashboard Login ===\n"),
            LoginLocation::Sidebar => println!("-- login --"),
        }

        let username = self.prompt_username()?;
        if username.is_empty() {
            return Ok(None);
        }
        let password = rpassword::prompt_password("Password: ")?;
        if password.is_empty() {
            return Ok(None);
        }

        Ok(Some(LoginAttempt { username, password }))
    }

    fn error(&mut self, message: &str) {
        report_error(message);
    }
}
