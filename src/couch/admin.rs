//! Admin verification and credential provisioning.

use crate::cli::globals::GlobalArgs;
use crate::credentials::{CredentialStore, Credentials};
use crate::error::{Error, Result};
use crate::prompt::{AdminUser, Prompter};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

/// Protected endpoint used to probe for admin rights.
const PROBE: [&str; 2] = ["_users", "_all_docs"];

const PASSWORD_LENGTH: usize = 32;

/// Generate a random alphanumeric password.
#[must_use]
pub fn generate_password() -> SecretString {
    let password: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect();

    SecretString::from(password)
}

/// Checks whether CouchDB is in admin party mode, i.e. the protected
/// endpoint answers without any credentials.
/// # Errors
/// Returns an error if the request fails.
#[instrument(skip_all, fields(couch_url = %globals.couch_url))]
pub async fn is_admin_party(globals: &GlobalArgs) -> Result<bool> {
    let response = globals.couch.request(Method::GET, &PROBE, None, None).await?;

    debug!("admin party probe: {}", response.status);

    Ok(response.status.is_success())
}

/// Checks that the stored credentials still work. Missing credentials are
/// reported as `false` without contacting the server.
/// # Errors
/// Returns an error if the store cannot be read or the request fails.
#[instrument(skip_all, fields(couch_url = %globals.couch_url))]
pub async fn check_credentials(
    globals: &GlobalArgs,
    store: &dyn CredentialStore,
) -> Result<bool> {
    let Some(creds) = store.get(&globals.data_path)? else {
        debug!("no stored credentials");
        return Ok(false);
    };

    let response = globals
        .couch
        .request(Method::GET, &PROBE, Some(&creds), None)
        .await?;

    debug!("credential probe for {}: {}", creds.username, response.status);

    Ok(response.status.is_success())
}

/// Installs a freshly generated server admin while CouchDB is in admin party
/// and stores it. The store is only written after CouchDB accepted the account.
///
/// If the store write fails after the remote write succeeded, CouchDB and the
/// store are out of sync; the error is returned as is.
/// # Errors
/// Returns an error if the request fails, CouchDB rejects it, or the store cannot be written.
#[instrument(skip_all, fields(couch_url = %globals.couch_url, user = %globals.system_user))]
pub async fn create_credentials(
    globals: &GlobalArgs,
    store: &dyn CredentialStore,
) -> Result<()> {
    let password = generate_password();

    // No credentials exist yet: in admin party every request is an admin request.
    globals
        .couch
        .request(
            Method::PUT,
            &["_config", "admins", globals.system_user.as_str()],
            None,
            Some(&Value::String(password.expose_secret().to_string())),
        )
        .await?
        .error_for_status()?;

    store.set(&globals.data_path, &globals.system_user, &password)?;

    info!("created CouchDB admin {}", globals.system_user);

    Ok(())
}

/// Makes sure the stored credentials work, prompting for new ones until they
/// do or `globals.max_attempts` prompts were answered with rejected pairs.
/// # Errors
/// Returns an error if a request fails, the prompt fails, the store cannot be
/// written, or the attempts are exhausted.
#[instrument(skip_all, fields(couch_url = %globals.couch_url))]
pub async fn update_credentials(
    globals: &GlobalArgs,
    store: &dyn CredentialStore,
    prompter: &dyn Prompter,
) -> Result<()> {
    let mut attempts = 0;

    loop {
        if check_credentials(globals, store).await? {
            debug!("stored credentials accepted");
            return Ok(());
        }

        if attempts == globals.max_attempts {
            return Err(Error::RetriesExhausted(attempts));
        }
        attempts += 1;

        warn!(
            "stored CouchDB credentials rejected, asking for new ones ({}/{})",
            attempts, globals.max_attempts
        );

        let creds = prompter.couch_credentials().await?;
        store.set(&globals.data_path, &creds.username, &creds.password)?;
    }
}

/// Installs `user` as a CouchDB server admin, authenticated as `creds`.
/// # Errors
/// Returns an error if the request fails or CouchDB rejects it.
#[instrument(skip_all, fields(couch_url = %globals.couch_url, user = %user.name))]
pub async fn save_admin_user(
    globals: &GlobalArgs,
    creds: &Credentials,
    user: &AdminUser,
) -> Result<()> {
    globals
        .couch
        .request(
            Method::PUT,
            &["_config", "admins", user.name.as_str()],
            Some(creds),
            Some(&Value::String(user.password.expose_secret().to_string())),
        )
        .await?
        .error_for_status()?;

    info!("saved admin user {}", user.name);

    Ok(())
}

/// Creates the application's `admin` account with the out-of-band password,
/// or with one asked from `prompter` when none was given.
/// # Errors
/// Returns an error if no credentials are stored, the prompt fails, or saving fails.
#[instrument(skip_all, fields(couch_url = %globals.couch_url))]
pub async fn create_admin_user(
    globals: &GlobalArgs,
    store: &dyn CredentialStore,
    prompter: &dyn Prompter,
) -> Result<()> {
    let creds = stored_credentials(globals, store)?;

    let user = match &globals.admin_password {
        Some(password) => AdminUser::new(password.clone()),
        None => prompter.admin_user().await?,
    };

    save_admin_user(globals, &creds, &user).await
}

/// Stored credentials, required for every authenticated provisioning step.
pub(crate) fn stored_credentials(
    globals: &GlobalArgs,
    store: &dyn CredentialStore,
) -> Result<Credentials> {
    store
        .get(&globals.data_path)?
        .ok_or_else(|| Error::MissingCredentials(globals.data_path.display().to_string()))
}
