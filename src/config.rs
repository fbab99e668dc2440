//! Storage root resolution and the small credential files kept under it
//!
//! Everything wise-cli persists lives under one directory: cached API
//! responses, the transfer ledger, the saved API token and the selected
//! profile. The root is resolved once per run and passed explicitly to every
//! component that touches disk.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory name used under the user's cache home
const APP_DIR_NAME: &str = "wise-cli";

/// Environment variable that overrides the cache home
pub const CACHE_HOME_ENV: &str = "XDG_CACHE_HOME";

/// Environment variable that overrides the API base URL
pub const API_URL_ENV: &str = "WISE_API_URL";

/// Default base URL for the Wise API
pub const DEFAULT_API_URL: &str = "https://api.wise.com";

const TOKEN_FILE_NAME: &str = "token";
const PROFILE_FILE_NAME: &str = "selected-profile";

/// Errors that can occur while resolving the storage root or reading credentials
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No cache home override and no home directory to derive one from
    #[error("Could not determine a cache directory: set {CACHE_HOME_ENV} or HOME")]
    NoCacheDir,

    /// A file or directory under the root could not be read or written
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The selected-profile file exists but is not valid JSON
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The selected profile could not be serialized
    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The directory every on-disk artifact is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    path: PathBuf,
}

impl StorageRoot {
    /// Works out where the storage root lives without creating it
    ///
    /// Uses `$XDG_CACHE_HOME/wise-cli` when the variable is set and non-empty,
    /// otherwise the platform cache directory (`~/.cache/wise-cli` on Linux).
    pub fn locate() -> Result<Self, ConfigError> {
        let cache_home = std::env::var_os(CACHE_HOME_ENV).filter(|v| !v.is_empty());
        let path = match cache_home {
            Some(home) => PathBuf::from(home).join(APP_DIR_NAME),
            None => ProjectDirs::from("", "", APP_DIR_NAME)
                .ok_or(ConfigError::NoCacheDir)?
                .cache_dir()
                .to_path_buf(),
        };
        Ok(Self { path })
    }

    /// Uses an explicit directory as the root without touching the filesystem
    ///
    /// Useful for testing or when a specific location is needed.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates the root directory (and parents) if it does not exist
    pub fn ensure(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of a named subdirectory of the root
    pub fn subdir(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// Resolves the API base URL, honouring the `WISE_API_URL` override
pub fn api_base_url() -> String {
    std::env::var(API_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Profile chosen with `select-profile`, used as the default for later commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedProfile {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub profile_type: String,
}

/// Reads and writes the API token and selected profile under the storage root
#[derive(Debug, Clone)]
pub struct CredentialStore {
    root: StorageRoot,
}

impl CredentialStore {
    pub fn new(root: StorageRoot) -> Self {
        Self { root }
    }

    fn io_error(path: &Path) -> impl FnOnce(io::Error) -> ConfigError + '_ {
        move |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Saves the API token, readable only by the current user on Unix
    ///
    /// A new file is created with mode 0600; an existing one is narrowed to
    /// 0600 before the token is written into it.
    pub fn save_token(&self, token: &str) -> Result<PathBuf, ConfigError> {
        self.root.ensure()?;
        let path = self.root.path().join(TOKEN_FILE_NAME);

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&path).map_err(Self::io_error(&path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(Self::io_error(&path))?;
        }

        file.write_all(token.as_bytes())
            .map_err(Self::io_error(&path))?;
        Ok(path)
    }

    /// Loads the saved API token, or `None` if none has been saved
    pub fn load_token(&self) -> Result<Option<String>, ConfigError> {
        let path = self.root.path().join(TOKEN_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(token) => {
                let token = token.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&path)(e)),
        }
    }

    pub fn save_selected_profile(&self, profile: &SelectedProfile) -> Result<(), ConfigError> {
        self.root.ensure()?;
        let path = self.root.path().join(PROFILE_FILE_NAME);
        let json = serde_json::to_string(profile).map_err(|source| ConfigError::Encode {
            path: path.clone(),
            source,
        })?;
        fs::write(&path, json).map_err(Self::io_error(&path))
    }

    /// Loads the selected profile, or `None` if none has been selected
    pub fn load_selected_profile(&self) -> Result<Option<SelectedProfile>, ConfigError> {
        let path = self.root.path().join(PROFILE_FILE_NAME);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Self::io_error(&path)(e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (CredentialStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = CredentialStore::new(StorageRoot::at(temp_dir.path()));
        (store, temp_dir)
    }

    #[test]
    fn test_load_token_returns_none_when_missing() {
        let (store, _temp_dir) = create_test_store();
        assert_eq!(store.load_token().unwrap(), None);
    }

    #[test]
    fn test_token_roundtrip_trims_whitespace() {
        let (store, temp_dir) = create_test_store();

        let path = store.save_token("secret-token\n").expect("Save should succeed");

        assert_eq!(path, temp_dir.path().join("token"));
        assert_eq!(store.load_token().unwrap().as_deref(), Some("secret-token"));
    }

    #[cfg(unix)]
    #[test]
    fn test_token_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let (store, _temp_dir) = create_test_store();

        let path = store.save_token("secret").unwrap();
        let mode = fs::metadata(path).unwrap().permissions().mode();

        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_token_overwrite_narrows_existing_file() {
        use std::os::unix::fs::PermissionsExt;
        let (store, temp_dir) = create_test_store();
        let path = temp_dir.path().join("token");
        fs::write(&path, "old-token-with-a-longer-value").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        store.save_token("new").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_selected_profile_roundtrip() {
        let (store, _temp_dir) = create_test_store();
        let profile = SelectedProfile {
            id: 12345,
            name: "Jane Doe".to_string(),
            profile_type: "PERSONAL".to_string(),
        };

        store.save_selected_profile(&profile).unwrap();

        assert_eq!(store.load_selected_profile().unwrap(), Some(profile));
    }

    #[test]
    fn test_selected_profile_missing_is_none() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.load_selected_profile().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_selected_profile_is_an_error() {
        let (store, temp_dir) = create_test_store();
        fs::write(temp_dir.path().join("selected-profile"), "{not json").unwrap();

        let result = store.load_selected_profile();

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_save_creates_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = CredentialStore::new(StorageRoot::at(&nested));

        store.save_token("t").unwrap();

        assert!(nested.join("token").exists());
    }

    #[test]
    fn test_subdir_is_under_root() {
        let root = StorageRoot::at("/tmp/wise-root");
        assert_eq!(root.subdir("transfers"), PathBuf::from("/tmp/wise-root/transfers"));
    }
}
