use crate::common::{EnrollError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Overrides the stored token when set.
pub const TOKEN_ENV_VAR: &str = "FACE_ENROLL_TOKEN";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub email: Option<String>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Bearer credential persisted between runs.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&data)
            .map_err(|e| EnrollError::Session(format!("Failed to read {}: {}", self.path.display(), e)))?;

        if session.access_token.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Token to send: the environment override first, then the stored session.
    pub fn require_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                tracing::debug!("Using token from {}", TOKEN_ENV_VAR);
                return Ok(token);
            }
        }

        self.load()?
            .map(|s| s.access_token)
            .ok_or(EnrollError::NotLoggedIn)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string_pretty(session)
            .map_err(|e| EnrollError::Session(format!("Failed to serialize: {}", e)))?;
        write_private(&self.path, encoded.as_bytes())?;
        Ok(())
    }

    /// Forgets the stored session. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            return Ok(true);
        }
        Ok(false)
    }
}

/// Writes the file readable by the owner only. The mode is fixed before any
/// bytes land, including when an older file with wider permissions exists.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.to_string(),
            token_type: "bearer".to_string(),
            email: Some("ana@example.com".to_string()),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));
        assert_eq!(store.load().unwrap(), None);

        store.save(&session("tok-1")).unwrap();
        assert_eq!(store.load().unwrap(), Some(session("tok-1")));
    }

    #[test]
    fn clear_removes_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&session("tok-2")).unwrap();

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone());

        store.save(&session("tok-3")).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);

        // A file left behind with wider permissions is tightened on save.
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        store.save(&session("tok-4")).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().permissions().mode() & 0o777, 0o600);
        assert_eq!(store.load().unwrap(), Some(session("tok-4")));
    }

    #[test]
    fn blank_token_counts_as_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, r#"{"access_token":"  "}"#).unwrap();
        assert_eq!(SessionStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_a_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(SessionStore::new(path).load(), Err(EnrollError::Session(_))));
    }
}
