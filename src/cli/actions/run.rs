use crate::cli::actions::{Action, server};
use anyhow::Result;

/// Route an action to its implementation. A new `Action` variant needs a new
/// arm here and nowhere else.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
    }
}
