//! Test helpers shared by the unit tests.

#![allow(clippy::unwrap_used)]

use crate::cli::globals::GlobalArgs;
use crate::couch::{CouchClient, DEFAULT_TIMEOUT};
use crate::credentials::{CredentialStore, Credentials, FileStore};
use crate::error::{Error, Result};
use crate::prompt::{AdminUser, Prompter};
use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::VecDeque;
use std::net::TcpListener;
use std::path::Path;
use std::sync::Mutex;
use wiremock::MockServer;

pub fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

/// URL of a localhost port nothing listens on.
pub fn closed_port_uri() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn globals(server: &MockServer, data_path: &Path) -> GlobalArgs {
    globals_for(&server.uri(), data_path)
}

pub fn globals_for(uri: &str, data_path: &Path) -> GlobalArgs {
    let couch = CouchClient::new("test", uri, DEFAULT_TIMEOUT).unwrap();
    let mut globals = GlobalArgs::new(uri.to_string(), couch, data_path.to_path_buf());
    globals.app_name = "my-app".to_string();
    globals
}

pub fn store_credentials(data_path: &Path, username: &str, password: &str) {
    FileStore
        .set(data_path, username, &SecretString::from(password.to_string()))
        .unwrap();
}

/// Answers prompts from a fixed script and counts how often it was asked.
#[derive(Default)]
pub struct ScriptedPrompter {
    credentials: Mutex<VecDeque<Credentials>>,
    admin_password: Option<String>,
    asked: Mutex<u32>,
}

impl ScriptedPrompter {
    pub fn with_credentials(answers: Vec<Credentials>) -> Self {
        Self {
            credentials: Mutex::new(answers.into()),
            ..Self::default()
        }
    }

    pub fn with_admin_password(password: &str) -> Self {
        Self {
            admin_password: Some(password.to_string()),
            ..Self::default()
        }
    }

    pub fn asked(&self) -> u32 {
        *self.asked.lock().unwrap()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn admin_user(&self) -> Result<AdminUser> {
        *self.asked.lock().unwrap() += 1;
        self.admin_password
            .clone()
            .map(|p| AdminUser::new(SecretString::from(p)))
            .ok_or_else(|| Error::Input("no scripted admin password".to_string()))
    }

    async fn couch_credentials(&self) -> Result<Credentials> {
        *self.asked.lock().unwrap() += 1;
        self.credentials
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Input("no scripted credentials left".to_string()))
    }
}
