// Token persistence: one plaintext file holding the raw access token,
// no metadata or versioning. The file lives at a fixed path under the
// user's configuration directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "pocketdump";
const TOKEN_FILE: &str = "access_token";

#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// No token has been persisted yet. Expected on the first run; the
    /// caller reacts by starting the authorization flow.
    #[error("no persisted token at {0}")]
    NotFound(PathBuf),

    /// The token file exists but could not be read or written.
    #[error("token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Store rooted at a fixed file path. `new` resolves the platform
/// location; tests point it at a temporary directory with `at`.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new() -> Self {
        let base = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join(APP_DIR).join(TOKEN_FILE))
    }

    pub fn at(path: PathBuf) -> Self {
        TokenStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted token, trimming any trailing newline. Absence
    /// of the file is reported distinctly from an unreadable file.
    pub fn load(&self) -> Result<String, TokenStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(raw.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(TokenStoreError::NotFound(self.path.clone()))
            }
            Err(e) => Err(TokenStoreError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    /// Persist the token, creating parent directories as needed and
    /// overwriting any previous token.
    pub fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        let io_err = |e| TokenStoreError::Io {
            path: self.path.clone(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&self.path, token).map_err(io_err)
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_reports_not_found_when_no_token_was_saved() {
        let dir = tempdir().expect("tempdir");
        let store = TokenStore::at(dir.path().join("access_token"));
        match store.load() {
            Err(TokenStoreError::NotFound(path)) => assert_eq!(path, store.path()),
            other => panic!("expected NotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn save_creates_parent_directories_and_load_round_trips() {
        let dir = tempdir().expect("tempdir");
        let store = TokenStore::at(dir.path().join("nested").join("deeper").join("access_token"));
        store.save("tok-abc").expect("save");
        assert_eq!(store.load().expect("load"), "tok-abc");
    }

    #[test]
    fn save_overwrites_an_existing_token() {
        let dir = tempdir().expect("tempdir");
        let store = TokenStore::at(dir.path().join("access_token"));
        store.save("old").expect("save old");
        store.save("new").expect("save new");
        assert_eq!(store.load().expect("load"), "new");
    }

    #[test]
    fn load_trims_a_trailing_newline() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("access_token");
        std::fs::write(&path, "tok-xyz\n").expect("write");
        assert_eq!(TokenStore::at(path).load().expect("load"), "tok-xyz");
    }
}
