//! Stats command handler.

use clap::Args;
use docseek_core::AppResult;
use docseek_retrieval::SearchService;

/// Show store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, service: &SearchService) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let stats = service.stats().await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else if !stats.is_initialized() {
            println!("Store is empty. Run 'docseek ingest <paths>' first.");
        } else {
            println!("Documents: {}", stats.documents);
            println!("Dimensions: {}", stats.dimensions);
            println!(
                "Provider: {} ({})",
                stats.provider.as_deref().unwrap_or("-"),
                stats.model.as_deref().unwrap_or("-")
            );
            println!("Generation: {}", stats.generation);
            if let Some(committed_at) = stats.committed_at {
                println!("Last commit: {}", committed_at);
            }
        }

        Ok(())
    }
}
