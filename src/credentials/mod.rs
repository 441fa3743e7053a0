//! CouchDB admin credentials persisted in the data directory.
//!
//! The store is keyed by the data path. `FileStore` keeps the pair under the
//! `couchdb` key of `<data_path>/config.json`, next to whatever else the
//! application keeps in that file.
//!
//! Access is read-then-write without locking: concurrent runs against the same
//! data directory race and the last writer wins.

use crate::error::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

pub const CONFIG_FILE: &str = "config.json";

/// A username/password pair for CouchDB basic auth.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

pub trait CredentialStore: Send + Sync {
    /// Stored credentials, or `None` when the username or password is missing.
    /// # Errors
    /// Returns an error if the store exists but cannot be read or parsed.
    fn get(&self, data_path: &Path) -> Result<Option<Credentials>>;

    /// # Errors
    /// Returns an error if the store cannot be written.
    fn set(&self, data_path: &Path, username: &str, password: &SecretString) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileStore;

impl FileStore {
    #[must_use]
    pub fn config_path(data_path: &Path) -> PathBuf {
        data_path.join(CONFIG_FILE)
    }

    fn read(path: &Path) -> Result<Map<String, Value>> {
        if !path.exists() {
            return Ok(Map::new());
        }

        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        let value = serde_json::from_str::<Value>(&raw)
            .map_err(|e| Error::Store(format!("{} is not valid JSON: {e}", path.display())))?;

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(Error::Store(format!(
                "{} does not contain a JSON object",
                path.display()
            ))),
        }
    }
}

impl CredentialStore for FileStore {
    #[instrument(skip(self))]
    fn get(&self, data_path: &Path) -> Result<Option<Credentials>> {
        let config = Self::read(&Self::config_path(data_path))?;

        let field = |name: &str| {
            config
                .get("couchdb")
                .and_then(|v| v.get(name))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
        };

        match (field("username"), field("password")) {
            (Some(username), Some(password)) => Ok(Some(Credentials::new(username, password))),
            _ => {
                debug!("no complete credential pair in {}", data_path.display());
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, password))]
    fn set(&self, data_path: &Path, username: &str, password: &SecretString) -> Result<()> {
        fs::create_dir_all(data_path)?;

        let path = Self::config_path(data_path);
        let mut config = Self::read(&path)?;
        config.insert(
            "couchdb".to_string(),
            json!({
                "username": username,
                "password": password.expose_secret(),
            }),
        );

        // Readers only ever see the old or the new file, never a partial one.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&Value::Object(config))?)?;
        restrict_permissions(&tmp)?;
        fs::rename(&tmp, &path)?;

        debug!("stored credentials for {} in {}", username, path.display());

        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn get_returns_none_without_config_file() {
        let dir = TempDir::new().unwrap();
        assert!(FileStore.get(dir.path()).unwrap().is_none());
    }

    #[test]
    fn get_returns_none_when_password_missing() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"couchdb":{"username":"admin","password":""}}"#,
        )
        .unwrap();

        assert!(FileStore.get(dir.path()).unwrap().is_none());
    }

    #[test]
    fn set_then_get() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("nested").join("data");

        FileStore
            .set(&data_path, "_couchboot", &SecretString::from("s3cret".to_string()))
            .unwrap();

        let creds = FileStore.get(&data_path).unwrap().unwrap();
        assert_eq!(creds.username, "_couchboot");
        assert_eq!(creds.password.expose_secret(), "s3cret");
        assert!(!data_path.join("config.json.tmp").exists());
    }

    #[test]
    fn set_preserves_unrelated_keys() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"app":{"name":"demo"},"couchdb":{"username":"old","password":"old"}}"#,
        )
        .unwrap();

        FileStore
            .set(dir.path(), "admin", &SecretString::from("new".to_string()))
            .unwrap();

        let raw: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap())
                .unwrap();
        assert_eq!(raw["app"]["name"], "demo");
        assert_eq!(raw["couchdb"]["username"], "admin");
        assert_eq!(raw["couchdb"]["password"], "new");
    }

    #[test]
    fn get_rejects_non_object_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "[1, 2, 3]").unwrap();

        assert!(matches!(FileStore.get(dir.path()), Err(Error::Store(_))));
    }

    #[test]
    fn get_reports_corrupt_config_as_store_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{\"couchdb\": {").unwrap();

        let err = FileStore.get(dir.path()).unwrap_err();
        assert!(matches!(&err, Error::Store(msg) if msg.contains(CONFIG_FILE)));
    }

    #[cfg(unix)]
    #[test]
    fn set_restricts_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        FileStore
            .set(dir.path(), "admin", &SecretString::from("pw".to_string()))
            .unwrap();

        let mode = fs::metadata(dir.path().join(CONFIG_FILE))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("admin", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
