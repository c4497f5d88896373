use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "perkcache";

/// OS keychain storage for the shared application secret, one entry per
/// app id. Used when the secret is not provided via the environment.
pub struct SecretStore;

impl SecretStore {
    /// Store the application secret in the OS keychain
    pub fn store(app_id: &str, secret: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, app_id)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(secret)
            .context("Failed to store secret in keychain")?;
        Ok(())
    }

    /// Retrieve the application secret for an app id from the OS keychain
    pub fn get(app_id: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, app_id)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve secret from keychain")
    }

    /// Delete the stored secret for an app id
    pub fn delete(app_id: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, app_id)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete secret from keychain")?;
        Ok(())
    }

    /// Check if a secret is stored for an app id
    pub fn exists(app_id: &str) -> bool {
        if let Ok(entry) = Entry::new(SERVICE_NAME, app_id) {
            entry.get_password().is_ok()
        } else {
            false
        }
    }
}
