use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "dashgate";

/// Keychain entry holding the cookie signing key
const COOKIE_KEY_ENTRY: &str = "cookie-key";

pub struct CookieKeyring;

impl CookieKeyring {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, COOKIE_KEY_ENTRY).context("Failed to create keyring entry")
    }

    /// Store the cookie signing key in the OS keychain
    pub fn store(key: &str) -> Result<()> {
        Self::entry()?
            .set_password(key)
            .context("Failed to store cookie key in keychain")?;
        Ok(())
    }

    /// Retrieve the cookie signing key from the OS keychain
    pub fn get() -> Result<String> {
        Self::entry()?
            .get_password()
            .context("Failed to retrieve cookie key from keychain")
    }

    /// Delete the stored cookie signing key
    pub fn delete() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .context("Failed to delete cookie key from keychain")?;
        Ok(())
    }
}
