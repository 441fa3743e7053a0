use crate::cli::globals::GlobalArgs;
use crate::couch::database;
use crate::credentials::FileStore;
use anyhow::{Context, Result};
use serde_json::Value;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub section: String,
    pub key: String,
    pub value: Value,
}

/// Execute the config action.
/// # Errors
/// Returns an error if no credentials are stored or CouchDB rejects the change.
pub async fn execute(args: Args) -> Result<()> {
    let previous = database::set_config(
        &args.globals,
        &FileStore,
        &args.section,
        &args.key,
        &args.value,
    )
    .await
    .with_context(|| format!("Could not set {}/{}", args.section, args.key))?;

    match previous {
        Value::String(previous) if !previous.is_empty() => {
            println!("{}/{}: {previous} -> {}", args.section, args.key, args.value);
        }
        _ => println!("{}/{}: {}", args.section, args.key, args.value),
    }

    Ok(())
}
