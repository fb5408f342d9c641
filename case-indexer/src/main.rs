use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use case_indexer::{connect_index, logging, Dependencies, IndexSettings, IndexingError};
use case_indexer_pipeline::{run_preflight, BatchReport, OutcomeStatus};

#[derive(Parser)]
#[command(name = "case-indexer")]
#[command(about = "Ingest closed incident cases into the case search index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest every closed case, or a single case with --case
    Ingest {
        /// Case id to ingest instead of the whole store
        #[arg(long = "case")]
        case_id: Option<String>,
    },
    /// Create the case index if it does not exist
    EnsureIndex,
    /// Check configuration, index presence and embedding dimension
    Preflight,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    let result = tokio::select! {
        result = run(cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Received shutdown signal, cases in flight are abandoned");
            return ExitCode::from(130);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.is_configuration() {
                error!(error = %e, "Aborted: configuration error");
            } else {
                error!(error = %e, "Aborted");
            }
            eprintln!("\nError: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), IndexingError> {
    match command {
        Commands::EnsureIndex => {
            let index = connect_index(&IndexSettings::from_env()?).await?;
            let created = index.ensure_index().await?;
            println!(
                "Index {} {}",
                index.index_name(),
                if created { "created" } else { "already exists" }
            );
        }
        Commands::Preflight => {
            let deps = Dependencies::new().await?;
            preflight(&deps).await?;
            println!("Preflight checks passed");
        }
        Commands::Ingest { case_id: Some(case_id) } => {
            let deps = Dependencies::new().await?;
            preflight(&deps).await?;
            let outcome = deps.orchestrator.ingest_case(&case_id).await?;
            println!(
                "{}: {}{}",
                outcome.case_id,
                outcome.status,
                outcome
                    .reason
                    .map(|r| format!(" ({})", r))
                    .unwrap_or_default()
            );
        }
        Commands::Ingest { case_id: None } => {
            let deps = Dependencies::new().await?;
            preflight(&deps).await?;
            let report = deps.orchestrator.ingest_all_closed_cases().await?;
            print_summary(&report);
        }
    }

    Ok(())
}

async fn preflight(deps: &Dependencies) -> Result<(), IndexingError> {
    run_preflight(
        &deps.index,
        deps.embedder.as_ref(),
        deps.config.index.vector_dimensions,
    )
    .await?;
    info!("Preflight complete");
    Ok(())
}

fn print_summary(report: &BatchReport) {
    println!();
    println!("=== Ingestion Summary ===");
    println!("Total:     {}", report.total);
    println!("Succeeded: {}", report.succeeded);
    println!("Skipped:   {}", report.skipped);
    println!("Failed:    {}", report.failed);

    let failures: Vec<_> = report
        .outcomes
        .iter()
        .filter(|o| o.status == OutcomeStatus::Failed)
        .collect();
    if !failures.is_empty() {
        println!();
        println!("Failed cases:");
        for outcome in failures {
            println!(
                "  {} [{}] {}",
                outcome.case_id,
                outcome.reason.map(|r| r.as_str()).unwrap_or(""),
                outcome.detail.as_deref().unwrap_or("")
            );
        }
    }
}
