use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// API used when nothing else is configured
pub const DEFAULT_API_URL: &str = "https://fabroku-api.fabricadesoftware.ifc.edu.br";

const CONFIG_FILE: &str = "config.json";

/// Persisted CLI session (`~/.fabroku/config.json`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Base URL of the platform API
    #[serde(default = "default_api_url", deserialize_with = "api_url_or_default")]
    pub api_url: String,

    /// CLI token issued by the login flow
    #[serde(default)]
    pub token: Option<String>,

    /// Login of the authenticated user
    #[serde(default)]
    pub user: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

// Null and empty both mean "use the default".
fn api_url_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|url| !url.is_empty())
        .unwrap_or_else(default_api_url))
}

impl Default for Session {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            user: None,
        }
    }
}

impl Session {
    /// Whether a token is stored
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Reads and writes the session file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
    api_url_override: Option<String>,
}

impl ConfigStore {
    /// Resolve the config location from the environment
    ///
    /// `FABROKU_HOME` replaces `~/.fabroku`, `FABROKU_API_URL` overrides the stored API URL.
    pub fn from_env() -> Result<Self> {
        let dir = match std::env::var_os("FABROKU_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::home_dir()
                .context("Cannot determine home directory")?
                .join(".fabroku"),
        };

        Ok(Self {
            dir,
            api_url_override: std::env::var("FABROKU_API_URL")
                .ok()
                .filter(|url| !url.is_empty()),
        })
    }

    /// Store rooted at an explicit directory
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            api_url_override: None,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Load the session, writing defaults on first use
    pub fn load(&self) -> Result<Session> {
        let path = self.path();
        let mut session = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config at {}", path.display()))?
        } else {
            let session = Session::default();
            self.save(&session)?;
            session
        };

        if let Some(url) = &self.api_url_override {
            session.api_url = url.clone();
        }

        Ok(session)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        ensure_dir(&self.dir)?;
        let path = self.path();
        let content = serde_json::to_string_pretty(session).context("Failed to serialize config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    /// Persist a freshly issued token
    pub fn set_credentials(&self, token: &str, user: &str, api_url: Option<&str>) -> Result<Session> {
        let mut session = self.load_stored()?;
        session.token = Some(token.to_string());
        session.user = Some(user.to_string());
        if let Some(url) = api_url {
            session.api_url = url.to_string();
        }
        self.save(&session)?;
        Ok(session)
    }

    /// Forget the token and user, and reset the API URL
    pub fn clear_credentials(&self) -> Result<()> {
        let mut session = self.load_stored()?;
        session.token = None;
        session.user = None;
        session.api_url = default_api_url();
        self.save(&session)
    }

    // Writes must not persist the env override.
    fn load_stored(&self) -> Result<Session> {
        Self::with_dir(self.dir.clone()).load()
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::with_dir(dir.path().join("home"));

        let session = store.load().unwrap();
        assert_eq!(session, Session::default());
        assert!(!session.is_authenticated());
        assert!(store.path().exists());
    }

    #[test]
    fn test_set_and_clear_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::with_dir(dir.path());

        store
            .set_credentials("tok", "octocat", Some("http://localhost:8000"))
            .unwrap();
        let session = store.load().unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.user.as_deref(), Some("octocat"));
        assert_eq!(session.api_url, "http://localhost:8000");

        store.clear_credentials().unwrap();
        let session = store.load().unwrap();
        assert_eq!(session, Session::default());
    }

    #[test]
    fn test_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::with_dir(dir.path());
        store.set_credentials("tok", "octocat", None).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["token"], "tok");
        assert_eq!(raw["user"], "octocat");
        assert_eq!(raw["api_url"], DEFAULT_API_URL);
    }

    #[test]
    fn test_null_api_url_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"api_url": null, "token": null, "user": null}"#,
        )
        .unwrap();

        let session = ConfigStore::with_dir(dir.path()).load().unwrap();
        assert_eq!(session.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_empty_api_url_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"api_url": "", "token": "tok"}"#,
        )
        .unwrap();

        let session = ConfigStore::with_dir(dir.path()).load().unwrap();
        assert_eq!(session.api_url, DEFAULT_API_URL);
        assert!(session.is_authenticated());
    }
}
