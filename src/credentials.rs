//! Credential loading from an optional `.env` file and the process env.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

/// Runtime credentials keyed by env var name.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self { vars }
    }

    /// Returns a credential value for a key, if present and not blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Returns a required credential or an error when missing.
    ///
    /// # Errors
    ///
    /// Returns an error when the key is absent or blank.
    pub fn require(&self, key: &str) -> anyhow::Result<String> {
        self.get(key)
            .map(str::to_owned)
            .ok_or_else(|| anyhow::anyhow!("missing required credential: {key}"))
    }
}

/// Load the `keys` credentials.
///
/// Values come from the `.env` file at `env_file` when it exists; a variable
/// already set in the process environment takes precedence, matching
/// `dotenv` semantics.
///
/// # Errors
///
/// Returns an error if the `.env` file exists but cannot be parsed.
pub fn load_credentials(env_file: &Path, keys: &[&str]) -> anyhow::Result<Credentials> {
    let mut file_vars = BTreeMap::new();
    if env_file.exists() {
        let iter = dotenvy::from_path_iter(env_file)
            .with_context(|| format!("failed to read credentials at {}", env_file.display()))?;
        for item in iter {
            let (key, value) = item.with_context(|| {
                format!(
                    "failed to parse key-value entry in credentials file {}",
                    env_file.display()
                )
            })?;
            file_vars.insert(key, value);
        }
    } else {
        debug!(path = %env_file.display(), "no .env file, using process environment only");
    }

    Ok(merge_credentials(file_vars, keys, |key| {
        std::env::var(key).ok()
    }))
}

/// Keep only `keys`, preferring `env` over `file_vars`.
pub fn merge_credentials(
    mut file_vars: BTreeMap<String, String>,
    keys: &[&str],
    env: impl Fn(&str) -> Option<String>,
) -> Credentials {
    let mut vars = BTreeMap::new();
    for &key in keys {
        if let Some(value) = env(key).or_else(|| file_vars.remove(key)) {
            vars.insert(key.to_owned(), value);
        }
    }
    Credentials { vars }
}
