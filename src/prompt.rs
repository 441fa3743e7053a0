//! Prompt strategies.
//!
//! The provisioning code never looks at the terminal or the environment
//! itself; it asks a [`Prompter`]. The CLI picks [`Interactive`] or
//! [`NonInteractive`] from its `--non-interactive` flag.
//!
//! Terminal reads block, so [`Interactive`] runs them on the blocking pool.
//! The runtime stays free to notice Ctrl-C while a prompt is waiting.

use crate::credentials::Credentials;
use crate::error::{Error, Result};
use async_trait::async_trait;
use dialoguer::{Input, Password};
use secrecy::SecretString;

/// Name of the application admin account.
pub const ADMIN_USER: &str = "admin";

/// Password used for the admin account when nobody can be asked.
pub const FALLBACK_ADMIN_PASSWORD: &str = "travis-ci";

/// The application's admin account, installed as a CouchDB server admin.
#[derive(Clone)]
pub struct AdminUser {
    pub name: String,
    pub password: SecretString,
}

impl AdminUser {
    #[must_use]
    pub fn new(password: SecretString) -> Self {
        Self {
            name: ADMIN_USER.to_string(),
            password,
        }
    }
}

impl std::fmt::Debug for AdminUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminUser")
            .field("name", &self.name)
            .field("password", &"***")
            .finish()
    }
}

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask for the application admin password.
    /// # Errors
    /// Returns an error if no password can be obtained.
    async fn admin_user(&self) -> Result<AdminUser>;

    /// Ask for working CouchDB `_admin` credentials.
    /// # Errors
    /// Returns an error if no credentials can be obtained.
    async fn couch_credentials(&self) -> Result<Credentials>;
}

/// Runs a blocking terminal read on the blocking pool.
/// # Errors
/// Returns the read's own error, or `Error::Input` if the task died.
pub async fn blocking<T, F>(read: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .map_err(|e| Error::Input(format!("prompt task failed: {e}")))?
}

/// Terminal prompts. Passwords are masked and empty answers are asked again.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interactive;

#[async_trait]
impl Prompter for Interactive {
    async fn admin_user(&self) -> Result<AdminUser> {
        blocking(|| {
            let password = Password::new()
                .with_prompt("Please set an admin password")
                .interact()?;

            Ok(AdminUser::new(SecretString::from(password)))
        })
        .await
    }

    async fn couch_credentials(&self) -> Result<Credentials> {
        blocking(|| {
            println!("Please enter your CouchDB _admin credentials:");

            let username: String = Input::new().with_prompt("Username").interact_text()?;
            let password = Password::new().with_prompt("Password").interact()?;

            let username = username.trim().to_string();
            if username.is_empty() {
                return Err(Error::Input("username cannot be empty".to_string()));
            }

            Ok(Credentials::new(username, password))
        })
        .await
    }
}

/// Fixed answers for unattended runs (CI, containers).
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

#[async_trait]
impl Prompter for NonInteractive {
    async fn admin_user(&self) -> Result<AdminUser> {
        Ok(AdminUser::new(SecretString::from(
            FALLBACK_ADMIN_PASSWORD.to_string(),
        )))
    }

    async fn couch_credentials(&self) -> Result<Credentials> {
        Err(Error::Input(
            "stored CouchDB credentials were rejected and cannot be prompted for in non-interactive mode"
                .to_string(),
        ))
    }
}

#[must_use]
pub fn select(non_interactive: bool) -> Box<dyn Prompter> {
    if non_interactive {
        Box::new(NonInteractive)
    } else {
        Box::new(Interactive)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn non_interactive_admin_user_is_fixed() {
        let user = NonInteractive.admin_user().await.unwrap();
        assert_eq!(user.name, "admin");
        assert_eq!(user.password.expose_secret(), FALLBACK_ADMIN_PASSWORD);
    }

    #[tokio::test]
    async fn non_interactive_refuses_credential_prompt() {
        let result = NonInteractive.couch_credentials().await;
        assert!(matches!(result, Err(Error::Input(_))));
    }

    #[tokio::test]
    async fn select_non_interactive() {
        let prompter = select(true);
        assert_eq!(prompter.admin_user().await.unwrap().name, ADMIN_USER);
    }

    #[tokio::test]
    async fn blocking_read_leaves_runtime_free() {
        let started = Instant::now();
        let read = blocking(|| {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        });

        let raced = tokio::time::timeout(Duration::from_millis(50), read).await;

        assert!(raced.is_err());
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn blocking_returns_the_read_result() {
        let answer = blocking(|| Ok(42)).await.unwrap();
        assert_eq!(answer, 42);

        let err = blocking::<(), _>(|| Err(Error::Input("empty".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Input(_)));
    }

    #[test]
    fn admin_user_debug_redacts_password() {
        let user = AdminUser::new(SecretString::from("topsecret".to_string()));
        assert!(!format!("{user:?}").contains("topsecret"));
    }
}
