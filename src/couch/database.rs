//! Database provisioning: the `plugins` and `app` databases, their security
//! documents, the app config document and single CouchDB config keys.
//!
//! Steps run in order and stop at the first failure. Nothing is rolled back: a
//! database whose security document could not be written stays in place and
//! the error says which request failed.

use crate::cli::globals::GlobalArgs;
use crate::couch::admin::stored_credentials;
use crate::credentials::{CredentialStore, Credentials};
use crate::error::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Method, StatusCode};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{info, instrument};

pub const PLUGINS_DB: &str = "plugins";
pub const APP_DB: &str = "app";
pub const APP_CONFIG_ID: &str = "config";

const ADMIN_ROLE: &str = "_admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Roles {
    pub roles: Vec<String>,
}

/// Security document restricting both admins and members to `_admin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityDocument {
    pub admins: Roles,
    pub members: Roles,
}

impl Default for SecurityDocument {
    fn default() -> Self {
        let admin_only = || Roles {
            roles: vec![ADMIN_ROLE.to_string()],
        };

        Self {
            admins: admin_only(),
            members: admin_only(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppConfigDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub config: Map<String, Value>,
    pub name: String,
    #[serde(rename = "createdAt", serialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", serialize_with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl AppConfigDocument {
    #[must_use]
    pub fn new(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: APP_CONFIG_ID.to_string(),
            config: Map::new(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

// ISO 8601 in UTC with milliseconds, e.g. 2024-05-01T12:00:00.000Z
fn timestamp<S: Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Creates database `name` and writes its security document, in that order.
/// A database that already exists (412) still gets the security document.
/// # Errors
/// Returns an error if either request fails or is rejected; the security
/// document is not written when creating the database failed.
#[instrument(skip_all, fields(couch_url = %globals.couch_url, db = %name))]
pub async fn create_database(globals: &GlobalArgs, name: &str, creds: &Credentials) -> Result<()> {
    let response = globals
        .couch
        .request(Method::PUT, &[name], Some(creds), None)
        .await?;

    if response.status == StatusCode::PRECONDITION_FAILED {
        info!("database {} already exists", name);
    } else {
        response.error_for_status()?;
        info!("created database {}", name);
    }

    let security = serde_json::to_value(SecurityDocument::default())?;
    globals
        .couch
        .request(Method::PUT, &[name, "_security"], Some(creds), Some(&security))
        .await?
        .error_for_status()?;

    Ok(())
}

/// Creates the `plugins` database with the stored credentials.
/// # Errors
/// Returns an error if no credentials are stored or creating the database fails.
#[instrument(skip_all)]
pub async fn setup_plugins(globals: &GlobalArgs, store: &dyn CredentialStore) -> Result<()> {
    let creds = stored_credentials(globals, store)?;

    create_database(globals, PLUGINS_DB, &creds).await
}

/// Creates the `app` database, then its config document.
/// # Errors
/// Returns an error if no credentials are stored or either step fails.
#[instrument(skip_all)]
pub async fn setup_app(globals: &GlobalArgs, store: &dyn CredentialStore) -> Result<()> {
    let creds = stored_credentials(globals, store)?;

    create_database(globals, APP_DB, &creds).await?;
    create_app_config(globals, &creds).await
}

/// Writes the app config document. An existing document (409) is left untouched.
/// # Errors
/// Returns an error if the request fails or is rejected.
#[instrument(skip_all, fields(couch_url = %globals.couch_url, app = %globals.app_name))]
pub async fn create_app_config(globals: &GlobalArgs, creds: &Credentials) -> Result<()> {
    let doc = serde_json::to_value(AppConfigDocument::new(&globals.app_name, Utc::now()))?;

    let response = globals
        .couch
        .request(Method::PUT, &[APP_DB, APP_CONFIG_ID], Some(creds), Some(&doc))
        .await?;

    if response.status == StatusCode::CONFLICT {
        info!("app config document already exists");
        return Ok(());
    }

    response.error_for_status()?;
    info!("created app config document for {}", globals.app_name);

    Ok(())
}

/// Sets `section`/`key` in the CouchDB server configuration, returning the
/// previous value CouchDB reports.
/// # Errors
/// Returns an error if no credentials are stored or the request fails or is rejected.
#[instrument(skip(globals, store, value), fields(couch_url = %globals.couch_url))]
pub async fn set_config(
    globals: &GlobalArgs,
    store: &dyn CredentialStore,
    section: &str,
    key: &str,
    value: &Value,
) -> Result<Value> {
    let creds = stored_credentials(globals, store)?;

    let response = globals
        .couch
        .request(
            Method::PUT,
            &["_config", section, key],
            Some(&creds),
            Some(value),
        )
        .await?
        .error_for_status()?;

    info!("set config {}/{}", section, key);

    Ok(response.body)
}
