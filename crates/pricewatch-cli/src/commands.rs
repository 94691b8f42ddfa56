use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pricewatch")]
#[command(about = "Product listing ETL: scrape, stage, star-schema", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline: extract then transform
    Run,
    /// Run the extract stage only
    Extract,
    /// Run the transform stage only (skips unless raw data is complete)
    Transform,
    /// Print the file and process status collections
    Status,
    /// Drop old process status records, keeping the newest per process
    CompactStatus {
        /// Records to keep per process name
        #[arg(long, default_value_t = 5)]
        keep: usize,
    },
    /// Print configuration values
    PrintConfig,
}
