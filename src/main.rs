use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use rentradar::aggregator::Aggregator;
use rentradar::api::{self, AppState};
use rentradar::config::CONFIG;
use rentradar::data_models::SearchQuery;
use rentradar::export;

/// Rental-listing aggregation service over five scraped sources.
#[derive(Parser, Debug)]
#[command(name = "rentradar", version, about = "Rental listing aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server (the default)
    Serve {
        /// Bind address, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one search through the full pipeline and write it as CSV
    Export {
        #[arg(long, default_value = "")]
        zone: String,
        /// Bedroom count, 0 for unconstrained
        #[arg(long, default_value = "0")]
        bedrooms: String,
        /// Bathroom count, 0 for unconstrained
        #[arg(long, default_value = "0")]
        bathrooms: String,
        /// Minimum price in soles
        #[arg(long)]
        price_min: Option<i64>,
        /// Maximum price in soles
        #[arg(long)]
        price_max: Option<i64>,
        /// Space-separated keywords, e.g. "piscina mascotas"
        #[arg(long, default_value = "")]
        keywords: String,
        /// Output file
        #[arg(long, default_value = "listings.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Export {
            zone,
            bedrooms,
            bathrooms,
            price_min,
            price_max,
            keywords,
            out,
        }) => {
            let query = SearchQuery {
                zone,
                bedrooms,
                bathrooms,
                price_min,
                price_max,
                keywords,
            };
            export_csv(query, &out).await?;
        }
        Some(Command::Serve { bind }) => serve(bind).await?,
        None => serve(None).await?,
    }
    Ok(())
}

async fn serve(bind: Option<String>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or_else(|| CONFIG.bind_addr.clone());
    let state = Arc::new(AppState::new());
    let router = api::create_router(state);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("listening on {bind}");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn export_csv(query: SearchQuery, out: &PathBuf) -> anyhow::Result<()> {
    let aggregator = Aggregator::with_default_sources();
    let outcome = aggregator.run(&query).await;
    for result in &outcome.outcomes {
        match &result.error {
            Some(error) => tracing::warn!("{}: failed ({error})", result.source),
            None => tracing::info!(
                "{}: {} raw, {} kept",
                result.source,
                result.raw_count,
                result.kept_count
            ),
        }
    }
    export::write_csv(out, &outcome.listings)?;
    tracing::info!(
        "wrote {} listings to {}",
        outcome.listings.len(),
        out.display()
    );
    Ok(())
}
