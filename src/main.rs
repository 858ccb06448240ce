use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use cascade_batch::batch::{self, BatchError, BatchSummary};
use cascade_batch::cms::{CmsClient, CmsService, DryRunCms};
use cascade_batch::config::{self, Workflow, WorkflowSettings};
use cascade_batch::rows::{self, Row};
use cascade_batch::runlog::{EventSink, RunLog};
use cascade_batch::workflow::RunContext;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Run a batch workflow against the Cascade CMS API"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml", global = true)]
    config: PathBuf,

    /// Input CSV; defaults to the workflow's `csv_path`
    #[arg(long, global = true)]
    csv: Option<PathBuf>,

    /// Read from the CMS but only print edit/move/publish payloads
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rename images (display name + move) and republish their subscribers
    Rename,
    /// Set the `sitemap` metadata field to "Yes" on publishable assets
    Sitemap,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let workflow = match args.command {
        Command::Rename => Workflow::ImageRename,
        Command::Sitemap => Workflow::Sitemap,
    };

    let cfg = config::load(Some(&args.config)).context("configuration error")?;
    let settings = cfg
        .workflow(workflow)
        .context("configuration error")?
        .clone();
    cfg.ensure_dirs()?;
    info!("Using {}", cfg.global.platform.as_str());

    let client = CmsClient::from_config(&cfg).context("failed to set up the CMS client")?;
    let mut log = RunLog::create(&cfg.log_dir(), workflow.section(), Local::now())
        .context("failed to create run log")?;
    info!(log = %log.path().display(), "Program running. This may take a few minutes...");

    let csv_path = args
        .csv
        .unwrap_or_else(|| PathBuf::from(&settings.csv_path));
    let rows = match rows::read_csv(&csv_path) {
        Ok(rows) => rows,
        Err(err) => {
            log.error(&format!("failed to read {}: {}", csv_path.display(), err));
            return Err(err).with_context(|| format!("failed to read {}", csv_path.display()));
        }
    };

    let result = if args.dry_run {
        run(&DryRunCms::new(client), &mut log, &settings, workflow, &rows).await
    } else {
        run(&client, &mut log, &settings, workflow, &rows).await
    };
    drop(log);
    info!("Cleanup");

    match result {
        Ok(summary) => {
            info!(
                completed = summary.completed,
                skipped = summary.skipped,
                failed = summary.failed,
                "run complete"
            );
            Ok(())
        }
        Err(err) => {
            error!("** OPERATION UNSUCCESSFUL ** refer to the log file for details");
            Err(err.into())
        }
    }
}

async fn run(
    cms: &dyn CmsService,
    log: &mut RunLog,
    settings: &WorkflowSettings,
    workflow: Workflow,
    rows: &[Row],
) -> Result<BatchSummary, BatchError> {
    let mut ctx = RunContext {
        cms,
        log,
        site: &settings.cascade_site,
        asset_type: &settings.asset_type,
    };
    batch::run_rows(&mut ctx, workflow, rows).await
}
