//! Durable storage for the partial session.
//!
//! The session file holds only what is safe to keep across restarts
//! (user, authenticated flag, remember-me preference). Access tokens are
//! never written; see `PersistedSession`.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::PersistedSession;

/// Session file name in the cache directory
const SESSION_FILE: &str = "session.json";

/// Persistence seam for the partial session. The manager treats failures
/// here as non-fatal; implementations should not panic.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>>;
    fn save(&self, session: &PersistedSession) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// JSON-file-backed store at a fixed name under the app cache directory.
pub struct FileSessionStore {
    cache_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        let session = serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(Some(session))
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(path, contents).context("Failed to write session file")?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// In-memory store for tests and embedders that manage persistence
/// themselves.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<PersistedSession>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>> {
        Ok(self.inner.lock().expect("session store poisoned").clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<()> {
        *self.inner.lock().expect("session store poisoned") = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.inner.lock().expect("session store poisoned") = None;
        Ok(())
    }
}
