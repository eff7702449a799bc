//! Consolidator CLI - imports agent spreadsheets and inspects the result
//!
//! Usage:
//!   # Merge a month of exports and store the latest-period snapshot:
//!   cargo run --bin consolidator -- import KPI_2025_12.xlsx "Control usuarios W52.xlsx"
//!
//!   # Inspect what is stored:
//!   cargo run --bin consolidator -- list --tm "TEAM A"
//!   cargo run --bin consolidator -- show 41H198

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use consolidator::kpi::{
    default_kpi_config, identify_top_kpis, kpi_status, load_kpi_config, performance_tier,
    success_rate, KpiDefinition,
};
use consolidator::merger::latest_period;
use consolidator::{
    demo, latest_snapshot, merge, read_batch, Agent, AgentStore, BlobStore, FilterKey, Settings,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "consolidator",
    about = "Consolidates call-center agent spreadsheets into one record per agent"
)]
struct Args {
    /// Snapshot file (overrides STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read, merge and store a batch of spreadsheets
    Import {
        /// Files to read, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Keep agents of every period, not only the latest one
        #[arg(long, default_value = "false")]
        all_periods: bool,

        /// Dry run - merge and report, don't save
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
    /// List stored agents
    List {
        /// Only agents of this supervisor / team manager
        #[arg(long)]
        tm: Option<String>,

        /// Only agents of this segment (JURIDICO, ESTANDAR)
        #[arg(long)]
        segment: Option<String>,
    },
    /// Show one agent with KPI status and priorities
    Show {
        /// Agent ID or full name
        agent: String,
    },
    /// Store the built-in demo data
    Demo,
    /// Remove the stored snapshot
    Clear,
}

fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = if log_level.contains('=') {
        log_level
    } else {
        format!("warn,consolidator={log_level}")
    };
    let env_filter = EnvFilter::try_new(filter_string).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(env_filter),
        )
        .init();
}

async fn load_config(settings: &Settings) -> Result<Vec<KpiDefinition>> {
    match &settings.kpi_config_path {
        Some(path) => load_kpi_config(path)
            .await
            .with_context(|| format!("Failed to load KPI config from {}", path.display())),
        None => Ok(default_kpi_config()),
    }
}

fn print_agent_line(agent: &Agent) {
    let segment = agent
        .admin
        .segment()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {:<10} {:<28} {:<14} {:<9} {:<8} {} period(s)",
        agent.id.as_deref().unwrap_or("-"),
        agent.agent,
        agent.supervisor,
        segment,
        agent.period.to_string(),
        agent.history.len()
    );
}

async fn run_import(
    blob: &BlobStore,
    files: &[PathBuf],
    all_periods: bool,
    dry_run: bool,
) -> Result<()> {
    println!("=== Consolidator Import ===");
    println!("Files: {}", files.len());
    println!("Mode: {}", if dry_run { "dry-run" } else { "live" });

    let (sheets, report) = read_batch(files).await;
    let fragments = consolidator::flatten(&sheets);
    let merged = consolidator::cluster(&fragments);
    let latest = latest_period(&merged).map(ToString::to_string);

    let agents = if all_periods {
        merged
    } else {
        latest_snapshot(&merged)
    };

    println!("\n=== Import Summary ===");
    println!("Files read: {}", report.read.len());
    println!("Duplicates skipped: {}", report.duplicates.len());
    println!("Sheets: {}", report.sheet_count());
    println!("Rows: {}", report.row_count());
    println!("Fragments: {}", fragments.len());
    println!("Agents: {}", agents.len());
    println!("Latest period: {}", latest.as_deref().unwrap_or("-"));
    for failure in &report.failures {
        eprintln!("  ✗ Failed: {} ({})", failure.path.display(), failure.error);
    }

    if agents.is_empty() {
        anyhow::bail!("No agents could be consolidated from {} file(s)", files.len());
    }

    if dry_run {
        println!("\nDry run - nothing saved");
        return Ok(());
    }

    let snapshot = blob
        .save(&agents)
        .await
        .context("Failed to save snapshot")?;
    println!("\nSaved snapshot {} to {}", snapshot.snapshot_id, blob.path().display());
    Ok(())
}

async fn run_list(blob: &BlobStore, tm: Option<String>, segment: Option<String>) -> Result<()> {
    let mut store = AgentStore::new();
    store.set_data(blob.load().await.context("Failed to load snapshot")?);
    store.set_filter(FilterKey::Supervisor, tm);
    store.set_filter(FilterKey::Segment, segment);

    let agents = store.data();
    println!("{} of {} agent(s)", agents.len(), store.all_data().len());
    println!("{:-<60}", "");
    for agent in agents {
        print_agent_line(agent);
    }
    Ok(())
}

async fn run_show(blob: &BlobStore, settings: &Settings, needle: &str) -> Result<()> {
    let mut store = AgentStore::new();
    store.set_data(blob.load().await.context("Failed to load snapshot")?);
    let agent = store
        .find(needle)
        .with_context(|| format!("Agent not found: {needle}"))?;
    let config = load_config(settings).await?;

    println!("{}", serde_json::to_string_pretty(agent)?);

    println!("\n=== KPI Status ===");
    for def in &config {
        let value = agent.kpis.get(def.key);
        println!(
            "  {:<10} {:>10} target {:>7} {}",
            def.label,
            value
                .map(|v| format!("{:.*}", def.decimals as usize, v))
                .unwrap_or_else(|| "-".to_string()),
            def.target,
            kpi_status(value, def)
        );
    }

    let rate = success_rate(&agent.kpis, &config);
    println!(
        "\nSuccess rate: {:.0}% ({})",
        rate * 100.0,
        performance_tier(&agent.kpis, &config)
    );

    let priorities = identify_top_kpis(&agent.kpis, &config, 3);
    if priorities.is_empty() {
        println!("No missed targets");
    } else {
        println!("Priorities:");
        for (i, gap) in priorities.iter().enumerate() {
            println!(
                "  [{}] {} actual {} target {} (gap {:.2}, score {:.3})",
                i + 1,
                gap.label,
                gap.actual,
                gap.target,
                gap.gap,
                gap.weighted_score
            );
        }
    }
    Ok(())
}

async fn run_demo(blob: &BlobStore) -> Result<()> {
    let agents = merge(&demo::demo_sheets());
    let snapshot = blob.save(&agents).await.context("Failed to save demo data")?;
    println!(
        "Stored {} demo agent(s) as snapshot {}",
        agents.len(),
        snapshot.snapshot_id
    );
    Ok(())
}

fn store_path(args: &Args, settings: &Settings) -> PathBuf {
    args.store
        .clone()
        .unwrap_or_else(|| settings.store_path.clone())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    let settings = Settings::from_env();
    let blob = BlobStore::new(store_path(&args, &settings));
    tracing::debug!(store = %blob.path().display(), "using snapshot store");

    match &args.command {
        Command::Import {
            files,
            all_periods,
            dry_run,
        } => run_import(&blob, files, *all_periods, *dry_run).await?,
        Command::List { tm, segment } => run_list(&blob, tm.clone(), segment.clone()).await?,
        Command::Show { agent } => run_show(&blob, &settings, agent).await?,
        Command::Demo => run_demo(&blob).await?,
        Command::Clear => {
            blob.clear().await.context("Failed to clear snapshot")?;
            println!("Store cleared: {}", blob.path().display());
        }
    }

    Ok(())
}
