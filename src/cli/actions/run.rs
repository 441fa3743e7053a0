use crate::cli::actions::{config, setup, status, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Setup(args) => setup::execute(args).await,
        Action::Status(args) => status::execute(args).await,
        Action::Config(args) => config::execute(args).await,
    }
}
