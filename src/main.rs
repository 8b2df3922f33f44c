use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nflverse_etl::config::{
    self, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_RELEASE_BASE_URL, DEFAULT_STORAGE_ROOT,
    PARTICIPATION_CUTOFF, PipelineConfig,
};
use nflverse_etl::runner::{self, SeasonReport};

#[derive(Parser, Debug)]
#[command(about = "Load nflverse season releases into normalized parquet tables")]
struct Args {
    /// Seasons to load, e.g. `2023` or `2016-2023,2010`.
    #[arg(long, env = "NFLVERSE_SEASONS", default_value = "2023")]
    seasons: String,

    /// Tables to build, in order. Accepts table or storage names.
    #[arg(
        long,
        env = "NFLVERSE_TABLES",
        default_value = "games,plays,participation,players,stats"
    )]
    tables: String,

    /// `gs://bucket/prefix`, `file:///dir`, or a bare directory.
    #[arg(long, env = "NFLVERSE_STORAGE_ROOT", default_value = DEFAULT_STORAGE_ROOT)]
    storage_root: String,

    /// Google service account key used for `gs://` roots.
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_PATH")]
    credentials: Option<PathBuf>,

    #[arg(long, env = "NFLVERSE_RELEASE_BASE_URL", default_value = DEFAULT_RELEASE_BASE_URL)]
    release_base_url: String,

    #[arg(long, env = "NFLVERSE_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_HTTP_TIMEOUT_SECS)]
    http_timeout_secs: u64,

    /// First season with published participation data.
    #[arg(long, env = "NFLVERSE_PARTICIPATION_CUTOFF", default_value_t = PARTICIPATION_CUTOFF)]
    participation_cutoff: u16,

    /// Run seasons concurrently.
    #[arg(long)]
    parallel: bool,

    /// Extract and transform only; write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let json = args.json;
    let config = build_config(args)?;

    let reports = runner::run(&config).context("pipeline run failed")?;

    if json {
        let raw = serde_json::to_string_pretty(&reports).context("serialize run summary")?;
        println!("{raw}");
    } else {
        print_summary(&config, &reports);
    }
    Ok(())
}

fn build_config(args: Args) -> Result<PipelineConfig> {
    let seasons = config::parse_seasons(&args.seasons).context("invalid --seasons")?;
    let mut out = PipelineConfig::new(seasons);
    out.tables = config::parse_tables(&args.tables).context("invalid --tables")?;
    out.storage_root = args.storage_root;
    out.credentials_path = args.credentials;
    out.release_base_url = args.release_base_url;
    out.http_timeout_secs = args.http_timeout_secs;
    out.participation_cutoff = args.participation_cutoff;
    out.parallel_seasons = args.parallel;
    out.dry_run = args.dry_run;
    out.validate().context("invalid configuration")?;
    Ok(out)
}

fn print_summary(config: &PipelineConfig, reports: &[SeasonReport]) {
    println!("nflverse load complete");
    if config.dry_run {
        println!("Storage: dry run, nothing written");
    } else {
        println!("Storage: {}", config.storage_root);
    }
    for report in reports {
        let era = if report.has_participation_data {
            "modern"
        } else {
            "legacy"
        };
        println!("season {} ({era}):", report.season);
        for table in &report.tables {
            match table.receipt.as_ref() {
                Some(receipt) => println!(
                    "  {:<14} rows={:<8} {} ({} bytes, sha256 {})",
                    table.table.name(),
                    table.rows,
                    receipt.path,
                    receipt.bytes,
                    &receipt.sha256[..12]
                ),
                None => println!("  {:<14} rows={}", table.table.name(), table.rows),
            }
        }
        for table in &report.skipped {
            println!("  {:<14} skipped", table.name());
        }
    }
}
