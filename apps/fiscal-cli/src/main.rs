mod cli;
mod load;
mod output;
mod wiring;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fiscal_core::config::Config;
use fiscal_core::types::{Filters, SearchRequest};

use crate::cli::{Cli, Commands, SearchArgs};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn,fiscal=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Config::load()?.settings()?;
    match cli.command {
        Commands::Search(args) => {
            let engine = wiring::engine(&settings).await;
            let json = args.json;
            let response = engine.respond(&search_request(args)?).await?;
            if json {
                output::print_json(&response)
            } else {
                output::print_response(&response);
                Ok(())
            }
        }
        Commands::Load(args) => load::run(&settings, args).await,
        Commands::Health { json } => {
            let report = wiring::engine(&settings).await.health().await;
            if json {
                output::print_json(&report)?;
            } else {
                output::print_health(&report);
            }
            if !report.is_serving() {
                anyhow::bail!("search backend is not serving");
            }
            Ok(())
        }
    }
}

fn search_request(args: SearchArgs) -> Result<SearchRequest> {
    let date = |value: Option<String>| -> Result<_> {
        value
            .map(|s| fiscal_retrieval::filters::parse_date(&s).ok_or_else(|| anyhow::anyhow!("unrecognised date: {s}")))
            .transpose()
    };
    let mut filters = Filters {
        date_from: date(args.from)?,
        date_to: date(args.to)?,
        tax_types: (!args.tax_types.is_empty()).then_some(args.tax_types),
        regions: (!args.regions.is_empty()).then_some(args.regions),
        only_tax_related: !args.include_unrelated,
        ..Filters::default()
    };
    if args.min_quality.is_some() {
        filters.min_quality_score = args.min_quality;
    }

    Ok(SearchRequest {
        sources: (!args.sources.is_empty()).then_some(args.sources),
        top_k_per_source: args.top_k,
        aggregate_results: !args.no_aggregate,
        callback_url: args.callback_url,
        request_id: args.request_id,
        filters: Some(filters),
        ..SearchRequest::new(args.query)
    })
}
