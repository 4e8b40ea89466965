use crate::cli::actions::{Action, server};
use anyhow::Result;

/// Execute the action
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
    }
}
