//! Environment diagnostics.
//!
//! Each probe checks one thing the login bootstrap depends on and reports
//! pass/fail with a short detail line. Probes never stop each other.

use std::fmt;
use std::path::Path;

use crate::auth::factory::{validate_secrets, COOKIE_SECTION, CREDENTIALS_SECTION};
use crate::prompts::{entry_names, PromptsLoader};
use crate::secrets::SecretStore;

/// File written and removed to prove the cookie directory is writable
const PROBE_FILE: &str = ".dashgate-probe";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Pass(String),
    Fail(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub name: &'static str,
    pub outcome: ProbeOutcome,
}

impl ProbeReport {
    pub fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            outcome: ProbeOutcome::Pass(detail.into()),
        }
    }

    pub fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            outcome: ProbeOutcome::Fail(detail.into()),
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self.outcome, ProbeOutcome::Pass(_))
    }
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            ProbeOutcome::Pass(detail) => write!(f, "✓ {}: {}", self.name, detail),
            ProbeOutcome::Fail(detail) => write!(f, "✗ {}: {}", self.name, detail),
        }
    }
}

pub fn probe_secrets(store: &dyn SecretStore) -> ProbeReport {
    const NAME: &str = "secrets";
    let sections = [CREDENTIALS_SECTION, COOKIE_SECTION];
    let mut present = Vec::new();
    for section in sections {
        match store.section(section) {
            Ok(map) if !map.is_empty() => present.push(section),
            Ok(_) => {}
            Err(e) => return ProbeReport::fail(NAME, e.to_string()),
        }
    }
    ProbeReport::pass(
        NAME,
        format!("{} ({} of {} sections present)", store.describe(), present.len(), sections.len()),
    )
}

pub fn probe_auth_config(store: &dyn SecretStore) -> ProbeReport {
    const NAME: &str = "auth config";
    match validate_secrets(store) {
        Ok(settings) if settings.advisories.is_empty() => ProbeReport::pass(
            NAME,
            format!("cookie '{}', expires in {} days", settings.cookie_name, settings.expiry_days),
        ),
        Ok(settings) => {
            let advisories: Vec<String> = settings.advisories.iter().map(ToString::to_string).collect();
            ProbeReport::pass(NAME, format!("valid with warnings: {}", advisories.join("; ")))
        }
        Err(e) => ProbeReport::fail(NAME, e.to_string()),
    }
}

pub fn probe_cookie_dir(cookie_dir: &Path) -> ProbeReport {
    const NAME: &str = "cookie directory";
    let probe = cookie_dir.join(PROBE_FILE);
    let result = std::fs::create_dir_all(cookie_dir)
        .and_then(|()| std::fs::write(&probe, b"ok"))
        .and_then(|()| std::fs::remove_file(&probe));
    match result {
        Ok(()) => ProbeReport::pass(NAME, format!("{} is writable", cookie_dir.display())),
        Err(e) => ProbeReport::fail(NAME, format!("{}: {}", cookie_dir.display(), e)),
    }
}

pub fn probe_prompts(loader: &PromptsLoader, prompts_path: &Path) -> ProbeReport {
    const NAME: &str = "prompts";
    match loader.load(prompts_path) {
        Ok(document) => ProbeReport::pass(
            NAME,
            format!("{} ({} entries)", prompts_path.display(), entry_names(&document).len()),
        ),
        Err(e) => ProbeReport::fail(NAME, e.to_string()),
    }
}

/// Run every core probe in order.
pub fn run_probes(store: &dyn SecretStore, prompts_path: &Path, cookie_dir: &Path) -> Vec<ProbeReport> {
    let loader = PromptsLoader::new();
    vec![
        probe_secrets(store),
        probe_auth_config(store),
        probe_cookie_dir(cookie_dir),
        probe_prompts(&loader, prompts_path),
    ]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;
    use serde_json::json;

    #[test]
    fn test_healthy_environment() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = dir.path().join("prompts.json");
        std::fs::write(&prompts, r#"{"summary": "Summarize", "qa": "Answer"}"#).unwrap();
        let store = MemorySecretStore::from_value(json!({
            "credentials": {"usernames": {"alice": {"password": "pw"}}},
            "cookie": {"name": "dash_auth", "key": "k9$Vq!2rT#x8pLm", "expiry_days": 30}
        }))
        .unwrap();

        let reports = run_probes(&store, &prompts, &dir.path().join("cookies"));
        assert_eq!(reports.len(), 4);
        assert!(reports.iter().all(ProbeReport::passed), "{reports:?}");
        assert_eq!(
            reports[3].outcome,
            ProbeOutcome::Pass(format!("{} (2 entries)", prompts.display()))
        );
    }

    #[test]
    fn test_failures_do_not_stop_other_probes() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemorySecretStore::default();

        let reports = run_probes(&store, &dir.path().join("missing.json"), dir.path());
        let names: Vec<_> = reports.iter().filter(|r| !r.passed()).map(|r| r.name).collect();
        assert_eq!(names, vec!["auth config", "prompts"]);
    }

    #[test]
    fn test_placeholder_key_passes_with_warning() {
        let store = MemorySecretStore::from_value(json!({
            "credentials": {"usernames": {"alice": {"password": "pw"}}},
            "cookie": {"name": "dash_auth", "key": "changeme", "expiry_days": 30}
        }))
        .unwrap();

        let report = probe_auth_config(&store);
        assert!(report.passed());
        assert!(report.to_string().contains("valid with warnings"));
    }
}
