use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Datelike;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pitwall_client::{FlightBlobExtractor, ReqwestFetcher};
use pitwall_core::config::FANTASY_STATS_URL;
use pitwall_core::official::write_schedule;
use pitwall_core::{
    EmitSummary, ErgastApi, FantasyPipeline, MirrorConfig, MirrorFetcher, Mode, OfficialPipeline,
    OutputLayout,
};

#[derive(Parser)]
#[command(name = "pitwall", version, about = "F1 results, standings and fantasy stats to CSV")]
struct Cli {
    /// Root of the output tree (tables land in <out-dir>/seasons/<season>/raw)
    #[arg(long, global = true, env = "PITWALL_OUT_DIR", default_value = "data")]
    out_dir: PathBuf,

    /// Comma-separated API mirrors, in priority order (overrides PITWALL_MIRRORS)
    #[arg(long, global = true)]
    mirrors: Option<String>,

    /// Per-attempt timeout in seconds (overrides PITWALL_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Per-round requests kept in flight
    #[arg(long, global = true, env = "PITWALL_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Per-race points and per-round standings from the racing-data API
    Official {
        /// Season to fetch (defaults to the current year)
        #[arg(short, long, conflicts_with = "seasons")]
        season: Option<u32>,

        /// Several seasons, comma separated (e.g. 2023,2024)
        #[arg(long, value_delimiter = ',')]
        seasons: Vec<u32>,

        /// Tables to produce: race, standings or both
        #[arg(short, long, default_value = "both")]
        mode: Mode,

        /// Also write the round dates table
        #[arg(long, default_value_t = false)]
        schedule: bool,
    },

    /// Round dates, circuits and locations for a season
    Schedule {
        /// Season to fetch (defaults to the current year)
        #[arg(short, long)]
        season: Option<u32>,
    },

    /// Fantasy points and prices scraped from the statistics page
    Fantasy {
        /// Season to file the tables under when the page does not say
        #[arg(short, long)]
        season: Option<u32>,

        /// Statistics page URL
        #[arg(short, long, default_value = FANTASY_STATS_URL)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Setup tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pitwall=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let layout = OutputLayout::new(&cli.out_dir);

    match &cli.command {
        Commands::Official {
            season,
            seasons,
            mode,
            schedule,
        } => {
            let seasons = resolve_seasons(*season, seasons)?;
            let pipeline = official_pipeline(&cli)?;
            cmd_official(&pipeline, &seasons, *mode, *schedule, &layout).await?;
        }
        Commands::Schedule { season } => {
            let season = season.map_or_else(current_season, Ok)?;
            let pipeline = official_pipeline(&cli)?;
            cmd_schedule(&pipeline, season, &layout).await?;
        }
        Commands::Fantasy { season, url } => {
            let season = season.map_or_else(current_season, Ok)?;
            cmd_fantasy(url, season, &layout).await?;
        }
    }

    Ok(())
}

fn current_season() -> Result<u32> {
    u32::try_from(chrono::Utc::now().year()).context("System clock is before year 0")
}

/// `--seasons` wins; otherwise the single `--season`, defaulting to this year.
fn resolve_seasons(season: Option<u32>, seasons: &[u32]) -> Result<Vec<u32>> {
    if !seasons.is_empty() {
        return Ok(seasons.to_vec());
    }
    Ok(vec![season.map_or_else(current_season, Ok)?])
}

/// Environment configuration, with command-line flags taking precedence.
fn mirror_config(mirrors: Option<&str>, timeout_secs: Option<u64>) -> Result<MirrorConfig> {
    let env = MirrorConfig::from_env().context("Invalid mirror configuration in environment")?;
    let base_urls = mirrors.map_or(env.base_urls, MirrorConfig::parse_mirrors);
    let timeout = timeout_secs.map_or(env.timeout, Duration::from_secs);
    MirrorConfig::new(base_urls, timeout).context("Invalid mirror configuration")
}

fn official_pipeline(cli: &Cli) -> Result<OfficialPipeline<ReqwestFetcher>> {
    let config = mirror_config(cli.mirrors.as_deref(), cli.timeout_secs)?;
    tracing::info!(mirrors = ?config.base_urls, timeout = ?config.timeout, "API mirrors");

    let transport =
        ReqwestFetcher::with_timeout(config.timeout).context("Failed to create HTTP client")?;
    let api = ErgastApi::new(MirrorFetcher::new(transport, config));
    Ok(OfficialPipeline::new(api).with_concurrency(cli.concurrency))
}

async fn cmd_official(
    pipeline: &OfficialPipeline<ReqwestFetcher>,
    seasons: &[u32],
    mode: Mode,
    schedule: bool,
    layout: &OutputLayout,
) -> Result<()> {
    for &season in seasons {
        tracing::info!(season, ?mode, "Fetching official results");
        match pipeline.run_season(season, mode, schedule, layout).await {
            Ok(written) => report(&written),
            Err(e) if e.is_empty_result() => {
                tracing::warn!(season, "Skipping season: {e}");
            }
            Err(e) => return Err(e).with_context(|| format!("Season {season} failed")),
        }
    }
    Ok(())
}

async fn cmd_schedule(
    pipeline: &OfficialPipeline<ReqwestFetcher>,
    season: u32,
    layout: &OutputLayout,
) -> Result<()> {
    let calendar = match pipeline.calendar(season).await {
        Ok(calendar) => calendar,
        Err(e) if e.is_empty_result() => {
            tracing::warn!(season, "Nothing to write: {e}");
            return Ok(());
        }
        Err(e) => return Err(e).with_context(|| format!("Season {season} failed")),
    };
    let summary = write_schedule(&calendar, layout)?;
    report(std::slice::from_ref(&summary));
    Ok(())
}

async fn cmd_fantasy(url: &str, season: u32, layout: &OutputLayout) -> Result<()> {
    let fetcher = ReqwestFetcher::for_pages().context("Failed to create HTTP client")?;
    let pipeline = FantasyPipeline::new(fetcher, FlightBlobExtractor::new(), url);

    let written = pipeline
        .run(season, layout)
        .await
        .with_context(|| format!("Failed to extract fantasy stats from {url}"))?;
    report(&written);
    Ok(())
}

fn report(written: &[EmitSummary]) {
    for summary in written {
        let status = if summary.changed { "written" } else { "unchanged" };
        println!(
            "  [{}] {} ({} rows, hash: {}...)",
            status,
            summary.path.display(),
            summary.rows,
            &summary.content_hash[..8],
        );
    }
}
