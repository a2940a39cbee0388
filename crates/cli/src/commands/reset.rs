//! Reset command handler.

use clap::Args;
use docseek_core::{AppError, AppResult};
use docseek_retrieval::SearchService;

/// Delete the index, extracted texts and stored documents
#[derive(Args, Debug)]
pub struct ResetCommand {
    /// Confirm the reset
    #[arg(short, long)]
    pub yes: bool,
}

impl ResetCommand {
    pub async fn execute(&self, service: &SearchService) -> AppResult<()> {
        if !self.yes {
            return Err(AppError::Other(
                "Reset deletes every indexed document; re-run with --yes to confirm".to_string(),
            ));
        }

        tracing::info!("Executing reset command");
        service.reset().await?;
        println!("Store at {} reset", service.paths().root().display());

        Ok(())
    }
}
