mod backfill;
mod report;

use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "adrelay-cli")]
#[command(about = "adrelay operational command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute and store embeddings for ads that have none yet.
    BackfillEmbeddings {
        /// Maximum number of ads to process in this run.
        #[arg(long, default_value_t = 500)]
        limit: i64,
        /// Print what would be embedded without writing anything.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a budget utilization report across all campaigns.
    BudgetReport {
        /// Trailing window: 24h, 7d, or 30d.
        #[arg(long, default_value = "7d")]
        window: String,
    },
    /// Print budget status and pacing for one campaign.
    CampaignStatus {
        campaign_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = adrelay_core::load_app_config()?;
    let pool_config = adrelay_db::PoolConfig::from_app_config(&config);
    let pool = adrelay_db::connect_pool(&config.database_url, pool_config).await?;

    match cli.command {
        Commands::BackfillEmbeddings { limit, dry_run } => {
            backfill::run_backfill_embeddings(&pool, &config, limit, dry_run).await
        }
        Commands::BudgetReport { window } => report::run_budget_report(&pool, &window).await,
        Commands::CampaignStatus { campaign_id } => {
            report::run_campaign_status(&pool, campaign_id).await
        }
    }
}
