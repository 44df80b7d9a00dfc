use clap::{Parser, Subcommand};
use rust_lead_enrichment::{
    aturiya_client::AturiyaClient,
    config::Config,
    enrichment::enrich_leads,
    handlers::{self, AppState},
    ingest::fetch_leads,
    output::{self, EnrichmentSummary, OutputFormat},
    pipe0_client::Pipe0Client,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about = "Lead enrichment pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest, enrich and export the leads of one campaign
    Run {
        /// Aturiya campaign ID (default: first campaign)
        #[arg(long, env = "ATURIYA_CAMPAIGN_ID")]
        campaign_id: Option<String>,

        /// Max leads to process
        #[arg(long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Both)]
        format: OutputFormat,

        /// Output directory (default: OUTPUT_DIR or ./output)
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Start the API server
    Serve {
        /// Port to listen on (default: PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_lead_enrichment=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    // One client per external service, shared by everything below
    let aturiya = AturiyaClient::new(
        config.aturiya_base_url.clone(),
        config.aturiya_token.clone(),
        config.aturiya_user_id.clone(),
        config.aturiya_agent_id.clone(),
    )?;
    let pipe0 = Pipe0Client::new(config.pipe0_base_url.clone(), config.pipe0_api_key.clone())?;

    match cli.command {
        Commands::Run {
            campaign_id,
            limit,
            format,
            output_dir,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| PathBuf::from(&config.output_dir));
            run_pipeline(
                &config,
                &aturiya,
                &pipe0,
                campaign_id.as_deref(),
                limit,
                format,
                &output_dir,
            )
            .await
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            serve(AppState::new(config, aturiya, pipe0), port).await
        }
    }
}

async fn run_pipeline(
    config: &Config,
    aturiya: &AturiyaClient,
    pipe0: &Pipe0Client,
    campaign_id: Option<&str>,
    limit: Option<usize>,
    format: OutputFormat,
    output_dir: &std::path::Path,
) -> anyhow::Result<()> {
    tracing::info!("=== STAGE 1: INGEST ===");
    let mut raw_leads = fetch_leads(aturiya, campaign_id).await?;

    if let Some(limit) = limit {
        raw_leads.truncate(limit);
        tracing::info!("Limited to {} leads", raw_leads.len());
    }

    tracing::info!("=== STAGE 2: ENRICH ===");
    let enriched = enrich_leads(pipe0, &config.enrichment, &raw_leads).await;

    tracing::info!("=== STAGE 3: OUTPUT ===");
    if format.wants_json() {
        output::save_json(&enriched, output_dir)?;
    }
    if format.wants_csv() {
        output::save_csv(&enriched, output_dir)?;
    }

    println!("\n{}\n", EnrichmentSummary::from_leads(&enriched));
    tracing::info!("Pipeline complete.");
    Ok(())
}

async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    // 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let app = handlers::router(Arc::new(state)).layer(GovernorLayer {
        config: governor_conf,
    });

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
