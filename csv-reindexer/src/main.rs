use std::env;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use csv_reindexer_pipeline::TriggerEvent;

#[derive(Parser)]
#[command(name = "csv-reindexer")]
#[command(about = "Rebuild a search index from a delimited data file and swap its alias", long_about = None)]
struct Cli {
    /// Bucket holding the data file and its config.json
    #[arg(long)]
    bucket: String,

    /// Object key of the data file, e.g. data/prod/products/20210101000000.create.csv
    #[arg(long)]
    key: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    info!(bucket = %cli.bucket, key = %cli.key, "Starting reindex run");

    let report = csv_reindexer::run(TriggerEvent::new(cli.bucket, cli.key))
        .await
        .inspect_err(|e| error!(error = %e, "Reindex run failed"))?;

    info!(
        real_index = %report.real_index,
        batches = report.batches_sent,
        previous_index = ?report.previous_index,
        archived_key = ?report.archived_key,
        "Done"
    );
    Ok(())
}
