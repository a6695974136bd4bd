use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use domain_prospector::app::lead_manager_use_case::LeadManager;
use domain_prospector::config::Config;
use domain_prospector::constants;
use domain_prospector::domain::UnifiedLead;
use domain_prospector::infra::http_client::ReqwestHttp;
use domain_prospector::infra::notification_channels::build_notification_service;
use domain_prospector::logging;
use domain_prospector::observability::metrics;
use domain_prospector::pipeline::processing::scoring::{LeadScorer, ScorerConfig};
use domain_prospector::pipeline::{CancellationFlag, LeadGenerationPipeline, SourceInput};
use domain_prospector::storage::{InMemoryLeadStore, LeadStore};

#[derive(Parser)]
#[command(name = "domain_prospector")]
#[command(about = "Lead generation pipeline for domain-name portfolio holders")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline over scraped listings
    Run {
        /// JSON file mapping source name to an array of raw listings
        #[arg(long)]
        input: PathBuf,
        /// Sources to run (comma-separated), overriding the configuration.
        /// Available: sedo, opensea, godaddy
        #[arg(long)]
        sources: Option<String>,
    },
    /// Score a single unified lead and print the breakdown
    Score {
        /// JSON file holding one unified lead
        #[arg(long)]
        lead: PathBuf,
    },
    /// List supported sources
    Sources,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load_or_default(&cli.config)?;
    config.apply_env_overrides()?;

    // Keep the guard alive so file logs are flushed on exit
    let _guard = logging::init_logging(&config.logging)?;

    if let Some(port) = config.metrics.port {
        if let Err(e) = metrics::init(port) {
            warn!("Metrics exporter disabled: {}", e);
        }
    }

    match cli.command {
        Commands::Run { input, sources } => run_pipeline(config, input, sources).await,
        Commands::Score { lead } => score_lead(&config, lead).await,
        Commands::Sources => {
            println!("📋 Supported sources:");
            for source in constants::get_supported_sources() {
                println!("   - {}", source);
            }
            Ok(())
        }
    }
}

async fn run_pipeline(
    config: Config,
    input: PathBuf,
    sources: Option<String>,
) -> anyhow::Result<()> {
    println!("🔄 Running lead pipeline...");

    let raw = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("Failed to read input file '{}'", input.display()))?;
    let input: SourceInput =
        serde_json::from_str(&raw).context("Input must map source names to arrays")?;

    let mut pipeline_config = config.pipeline_config();
    if let Some(list) = sources {
        pipeline_config =
            pipeline_config.with_sources(list.split(',').map(|s| s.trim().to_string()));
    }

    let http = Arc::new(ReqwestHttp::new(Duration::from_secs(config.http.timeout_seconds))?);
    let notifier = build_notification_service(&config.notifications, http);
    let store: Arc<dyn LeadStore> = Arc::new(InMemoryLeadStore::new());
    let manager = Arc::new(LeadManager::new(
        store.clone(),
        notifier,
        pipeline_config.manager.clone(),
    ));
    let pipeline = LeadGenerationPipeline::new(pipeline_config, manager)?;

    let cancel = CancellationFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; stopping after the current source");
            on_interrupt.cancel();
        }
    });

    let report = pipeline.run(&input, &cancel).await;
    info!("Pipeline run {} finished", report.run_id);

    println!("\n📊 Pipeline Results (run {}):", report.run_id);
    println!("   Records processed: {}", report.total_processed);
    println!("   Leads normalized: {}", report.total_normalized);
    println!("   Filtered out: {}", report.total_filtered);
    println!("   Persisted: {}", report.persisted);
    println!(
        "   Notifications: {} attempted, {} failed",
        report.notifications_attempted, report.notifications_failed
    );
    if report.cancelled {
        println!("   ⏹️  Run was cancelled before all sources completed");
    }
    for skipped in &report.skipped_sources {
        println!("   ⚠️  Unknown source skipped: {}", skipped);
    }

    for source in &report.sources {
        println!("\n   {} ({} received):", source.source, source.received);
        for lead in &source.persisted {
            match lead.score {
                Some(score) => println!(
                    "     ✅ #{} {} [{}] score {:.2}",
                    lead.id, lead.name, lead.status, score
                ),
                None => println!("     ✅ #{} {} [{}]", lead.id, lead.name, lead.status),
            }
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        error!("{} unit(s) failed during the run", failures.len());
        println!("\n⚠️  Failures:");
        for failure in failures {
            println!(
                "   - [{}] {}: {}",
                failure.stage.as_str(),
                failure.lead.as_deref().unwrap_or("<unnamed>"),
                failure.error
            );
        }
    }

    Ok(())
}

async fn score_lead(config: &Config, path: PathBuf) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read lead file '{}'", path.display()))?;
    let lead: UnifiedLead = serde_json::from_str(&raw).context("Lead file is not a unified lead")?;

    let scorer_config = config.scoring.scorer_config().unwrap_or_else(|| ScorerConfig {
        criteria: config.scoring.criteria.clone(),
        auto_qualify: config.scoring.auto_qualify.clone(),
    });
    scorer_config.criteria.validate()?;
    let score = LeadScorer::new(scorer_config).score(&lead);

    println!("📊 Score for {}: {:.3}", lead.name, score.total_score);
    println!("   Domain:   {:.3}", score.category_scores.domain);
    println!("   Price:    {:.3}", score.category_scores.price);
    println!("   Traffic:  {:.3}", score.category_scores.traffic);
    println!("   Seller:   {:.3}", score.category_scores.seller);
    println!("   Category: {:.3}", score.category_scores.category);
    println!("   Market:   {:.3}", score.category_scores.market);
    for detail in &score.details {
        let mark = if detail.earned { "✅" } else { "❌" };
        println!("   {} {} (weight {})", mark, detail.criterion, detail.weight);
    }
    if score.auto_qualified {
        println!("   🎯 Auto-qualified as {}", score.lead.status.unwrap_or_default());
    }
    if !score.recommendations.is_empty() {
        println!("\n💡 Recommendations:");
        for recommendation in &score.recommendations {
            println!("   - {}", recommendation);
        }
    }
    Ok(())
}
