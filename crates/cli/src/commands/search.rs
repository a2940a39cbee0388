//! Search command handler.

use clap::Args;
use docseek_core::AppResult;
use docseek_retrieval::SearchService;

/// Search indexed documents
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text; wrap it in double quotes for an exact phrase match
    pub query: String,

    /// Number of results to return (default: search.topK)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, service: &SearchService) -> AppResult<()> {
        tracing::info!("Executing search command");

        let hits = service.query(&self.query, self.top_k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&hits)?);
            return Ok(());
        }

        if hits.is_empty() {
            println!("No results.");
            return Ok(());
        }

        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "{}. {} (distance {:.4}, {} occurrences)",
                rank + 1,
                hit.id,
                hit.distance,
                hit.occurrences
            );
            println!("   {}", hit.snippet);
            println!();
        }

        Ok(())
    }
}
