//! List command handler.

use clap::Args;
use docseek_core::AppResult;
use docseek_retrieval::SearchService;

/// List indexed documents
#[derive(Args, Debug)]
pub struct ListCommand {
    /// List documents whose raw files are stored instead of indexed ids
    #[arg(long)]
    pub files: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListCommand {
    pub async fn execute(&self, service: &SearchService) -> AppResult<()> {
        let ids = if self.files {
            service.stored_files().await?
        } else {
            service.list_documents().await?
        };

        if self.json {
            println!("{}", serde_json::to_string_pretty(&ids)?);
        } else {
            for id in &ids {
                println!("{}", id);
            }
        }

        Ok(())
    }
}
