use crate::cli::globals::GlobalArgs;
use crate::couch::{admin, database};
use crate::credentials::{CredentialStore, FileStore};
use crate::prompt::{self, Prompter};
use anyhow::{anyhow, Context, Result};
use std::future::Future;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub non_interactive: bool,
}

/// Execute the setup action.
/// # Errors
/// Returns an error if any provisioning step fails or the run is interrupted.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let prompter = prompt::select(args.non_interactive);

    until_interrupted(
        provision(&args.globals, &FileStore, prompter.as_ref()),
        tokio::signal::ctrl_c(),
    )
    .await?;

    println!(
        "CouchDB at {} is ready for {}",
        args.globals.couch_url, args.globals.app_name
    );

    Ok(())
}

/// The full provisioning sequence. Steps run in order; the first failure stops
/// the run and leaves whatever was already created in place.
/// # Errors
/// Returns an error naming the step that failed.
pub async fn provision(
    globals: &GlobalArgs,
    store: &dyn CredentialStore,
    prompter: &dyn Prompter,
) -> Result<()> {
    if admin::is_admin_party(globals)
        .await
        .context("Could not reach CouchDB")?
    {
        info!("CouchDB is in admin party, creating {}", globals.system_user);
        admin::create_credentials(globals, store)
            .await
            .context("Could not create CouchDB admin credentials")?;
    } else {
        admin::update_credentials(globals, store, prompter)
            .await
            .context("Could not verify CouchDB admin credentials")?;
    }

    database::setup_plugins(globals, store)
        .await
        .context("Could not set up the plugins database")?;

    database::setup_app(globals, store)
        .await
        .context("Could not set up the app database")?;

    admin::create_admin_user(globals, store, prompter)
        .await
        .context("Could not create the admin user")?;

    Ok(())
}

/// Drives `work` unless `interrupt` resolves first, which drops it mid-step.
async fn until_interrupted<W, I>(work: W, interrupt: I) -> Result<()>
where
    W: Future<Output = Result<()>>,
    I: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        result = work => result,
        _ = interrupt => Err(anyhow!("setup interrupted")),
    }
}

fn log_startup_args(args: &Args) {
    let globals = &args.globals;
    let entries = [
        ("couch_url", globals.couch_url.clone()),
        ("data_path", globals.data_path.display().to_string()),
        ("app_name", globals.app_name.clone()),
        ("system_user", globals.system_user.clone()),
        ("max_attempts", globals.max_attempts.to_string()),
        (
            "admin_password_set",
            globals.admin_password.is_some().to_string(),
        ),
        ("non_interactive", args.non_interactive.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "couchboot {} - {}\n\nSetup configuration:",
        env!("CARGO_PKG_VERSION"),
        crate::git_commit_hash()
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}
