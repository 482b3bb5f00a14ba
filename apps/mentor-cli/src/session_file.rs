// session_file.rs — Keeps the signed-in session between CLI runs.
//
// The session is stored as JSON at `<config dir>/mentor/session.json`. On
// Unix the file is readable by the owner only. Signing out removes it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use mentor_gateway::Session;

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mentor").join("session.json"))
    }

    /// The saved session, if any. A corrupt file is ignored with a warning.
    pub fn load(&self) -> anyhow::Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        match serde_json::from_str(&json) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    /// Write `session`, or remove the file when signed out.
    pub fn save(&self, session: Option<&Session>) -> anyhow::Result<()> {
        let Some(session) = session else {
            if self.path.exists() {
                fs::remove_file(&self.path)
                    .with_context(|| format!("failed to remove {}", self.path.display()))?;
            }
            return Ok(());
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentor_gateway::MemoryGateway;
    use tempfile::TempDir;
    use uuid::Uuid;

    #[test]
    fn save_load_and_sign_out() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));
        assert!(file.load().unwrap().is_none());

        let session = MemoryGateway::session_for(Uuid::new_v4());
        file.save(Some(&session)).unwrap();
        assert_eq!(file.load().unwrap(), Some(session));

        file.save(None).unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert!(SessionFile::new(&path).load().unwrap().is_none());
    }
}
