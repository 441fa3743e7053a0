//! Settings for one provisioning run.
//!
//! `GlobalArgs` is built once by the dispatcher from the command line and
//! handed by reference to every provisioning step. Nothing mutates it after
//! that.

use crate::couch::CouchClient;
use secrecy::SecretString;
use std::path::PathBuf;

pub const DEFAULT_SYSTEM_USER: &str = "_couchboot";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct GlobalArgs {
    /// Base URL of the CouchDB server, without trailing slash.
    pub couch_url: String,
    pub couch: CouchClient,
    /// Directory whose `config.json` holds the stored CouchDB credentials.
    pub data_path: PathBuf,
    /// Written into the app config document.
    pub app_name: String,
    /// Admin password supplied out-of-band; skips the prompt.
    pub admin_password: Option<SecretString>,
    /// Server admin account created while CouchDB is in admin party.
    pub system_user: String,
    /// How many times stale credentials are prompted for before giving up.
    pub max_attempts: u32,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(couch_url: String, couch: CouchClient, data_path: PathBuf) -> Self {
        Self {
            couch_url,
            couch,
            data_path,
            app_name: String::new(),
            admin_password: None,
            system_user: DEFAULT_SYSTEM_USER.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn set_admin_password(&mut self, password: SecretString) {
        self.admin_password = Some(password);
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("couch_url", &self.couch_url)
            .field("data_path", &self.data_path)
            .field("app_name", &self.app_name)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "***"),
            )
            .field("system_user", &self.system_user)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::couch::DEFAULT_TIMEOUT;
    use secrecy::ExposeSecret;

    fn globals() -> GlobalArgs {
        let url = "http://127.0.0.1:5984".to_string();
        let couch = CouchClient::new("test", &url, DEFAULT_TIMEOUT).unwrap();
        GlobalArgs::new(url, couch, PathBuf::from("data"))
    }

    #[test]
    fn test_global_args() {
        let args = globals();
        assert_eq!(args.couch_url, "http://127.0.0.1:5984");
        assert_eq!(args.system_user, DEFAULT_SYSTEM_USER);
        assert_eq!(args.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert!(args.admin_password.is_none());
    }

    #[test]
    fn test_debug_redacts_admin_password() {
        let mut args = globals();
        args.set_admin_password(SecretString::from("hunter2".to_string()));

        assert_eq!(
            args.admin_password.as_ref().map(|p| p.expose_secret()),
            Some("hunter2")
        );
        assert!(!format!("{args:?}").contains("hunter2"));
    }
}
