//! Local persistence of session artifacts.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::IdentityResult;
use crate::state::PendingLogin;
use crate::types::TokenSet;

/// Everything the console keeps locally between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub tokens: Option<TokenSet>,
    pub pending_login: Option<PendingLogin>,
}

/// Storage for [`StoredSession`]. Implementations must treat a missing
/// session as `StoredSession::default()`, not as an error.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> IdentityResult<StoredSession>;

    fn save(&self, session: &StoredSession) -> IdentityResult<()>;

    fn clear(&self) -> IdentityResult<()>;
}

/// JSON file store.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> IdentityResult<StoredSession> {
        if !self.path.exists() {
            return Ok(StoredSession::default());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let session: StoredSession = serde_json::from_str(&contents)?;
        Ok(session)
    }

    fn save(&self, session: &StoredSession) -> IdentityResult<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let contents = serde_json::to_string_pretty(session)?;
        write_private(&self.path, contents.as_bytes())?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> IdentityResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
            debug!(path = %self.path.display(), "Session file removed");
        }
        Ok(())
    }
}

/// Writes `contents` readable by the owner only, since the file holds tokens.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten files left by older runs.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)
}

/// In-process store.
#[derive(Default)]
pub struct MemorySessionStore {
    session: Mutex<StoredSession>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> IdentityResult<StoredSession> {
        let session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        Ok(session.clone())
    }

    fn save(&self, session: &StoredSession) -> IdentityResult<()> {
        let mut stored = self.session.lock().unwrap_or_else(|e| e.into_inner());
        *stored = session.clone();
        Ok(())
    }

    fn clear(&self) -> IdentityResult<()> {
        let mut stored = self.session.lock().unwrap_or_else(|e| e.into_inner());
        *stored = StoredSession::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample() -> StoredSession {
        StoredSession {
            tokens: Some(TokenSet {
                access_token: "access".to_string(),
                refresh_token: Some("refresh".to_string()),
                id_token: None,
                expires_at: Utc::now(),
                refresh_expires_at: None,
            }),
            pending_login: None,
        }
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().unwrap(), StoredSession::default());

        let session = sample();
        store.save(&session).unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().unwrap(), session);

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.load().unwrap(), StoredSession::default());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_session_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        FileSessionStore::new(&path).save(&sample()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(FileSessionStore::new(path).load().is_err());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        store.save(&sample()).unwrap();
        assert!(store.load().unwrap().tokens.is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().tokens.is_none());
    }
}
