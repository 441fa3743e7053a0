use crate::cli::globals::GlobalArgs;
use crate::couch::admin;
use crate::credentials::{CredentialStore, FileStore};
use anyhow::{Context, Result};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub admin_party: bool,
    pub credentials_stored: bool,
    pub credentials_valid: bool,
}

/// Execute the status action.
/// # Errors
/// Returns an error if CouchDB cannot be reached or the store cannot be read.
pub async fn execute(args: Args) -> Result<()> {
    let status = check(&args.globals, &FileStore).await?;

    println!("CouchDB:            {}", args.globals.couch_url);
    println!("Data path:          {}", args.globals.data_path.display());
    println!("Admin party:        {}", yes_no(status.admin_party));
    println!("Credentials stored: {}", yes_no(status.credentials_stored));
    println!("Credentials valid:  {}", yes_no(status.credentials_valid));

    Ok(())
}

/// # Errors
/// Returns an error if CouchDB cannot be reached or the store cannot be read.
pub async fn check(globals: &GlobalArgs, store: &dyn CredentialStore) -> Result<Status> {
    let admin_party = admin::is_admin_party(globals)
        .await
        .context("Could not reach CouchDB")?;
    let credentials_stored = store.get(&globals.data_path)?.is_some();
    let credentials_valid = admin::check_credentials(globals, store).await?;

    Ok(Status {
        admin_party,
        credentials_stored,
        credentials_valid,
    })
}

const fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
