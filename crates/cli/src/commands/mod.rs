//! Command handlers for the docseek CLI.

pub mod ingest;
pub mod list;
pub mod reset;
pub mod search;
pub mod stats;

pub use ingest::IngestCommand;
pub use list::ListCommand;
pub use reset::ResetCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;
