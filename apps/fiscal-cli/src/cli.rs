use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fiscal", version, about = "Multi-channel hybrid retrieval for tax questions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search one or more channels
    Search(SearchArgs),

    /// Load JSONL documents into a local collection
    Load(LoadArgs),

    /// Report backend and embedding availability
    Health {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Question text
    pub query: String,

    /// Channel to search (repeatable); every channel when omitted
    #[arg(long = "source", short = 's')]
    pub sources: Vec<String>,

    /// Hits per channel
    #[arg(long, short = 'k', default_value_t = 3)]
    pub top_k: usize,

    /// Skip the cross-channel aggregate
    #[arg(long)]
    pub no_aggregate: bool,

    /// Keep only these tax types (repeatable)
    #[arg(long = "tax-type")]
    pub tax_types: Vec<String>,

    /// Keep only these regions (repeatable)
    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Earliest date, RFC 3339 or YYYY-MM-DD
    #[arg(long)]
    pub from: Option<String>,

    /// Latest date, RFC 3339 or YYYY-MM-DD
    #[arg(long)]
    pub to: Option<String>,

    /// Minimum quality score
    #[arg(long)]
    pub min_quality: Option<f64>,

    /// Keep hits flagged as not tax related
    #[arg(long)]
    pub include_unrelated: bool,

    /// POST the response here when done
    #[arg(long)]
    pub callback_url: Option<String>,

    /// Echoed back in the response
    #[arg(long)]
    pub request_id: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Channel name (uses its configured collection) or a raw collection name
    pub target: String,

    /// A .jsonl file or a directory searched recursively for them
    pub path: PathBuf,

    /// Indexed text field (repeatable); defaults to the channel's searched fields
    #[arg(long = "text-field")]
    pub text_fields: Vec<String>,

    /// Source field to embed into the vector store
    #[arg(long)]
    pub embed_field: Option<String>,

    /// Vector column name; defaults to the channel's embedding field
    #[arg(long)]
    pub vector_field: Option<String>,
}
