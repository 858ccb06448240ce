use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::cms::CmsError;
use crate::config::Workflow;
use crate::rows::Row;
use crate::workflow::{rename, sitemap, RowOutcome, RunContext, WorkflowError};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("batch aborted at row {line}: {source}")]
    Aborted {
        line: u64,
        #[source]
        source: WorkflowError,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub completed: usize,
    pub skipped: usize,
    /// Rows abandoned after a transport or decoding failure.
    pub failed: usize,
    pub headers: usize,
}

/// Drive `workflow` over `rows`, one row and one remote call at a time.
///
/// Row-scoped failures are logged and the loop moves on. Anything
/// [`WorkflowError::is_batch_fatal`] stops the loop and is returned.
#[instrument(skip_all, fields(workflow = workflow.section(), rows = rows.len()))]
pub async fn run_rows(
    ctx: &mut RunContext<'_>,
    workflow: Workflow,
    rows: &[Row],
) -> Result<BatchSummary, BatchError> {
    let mut summary = BatchSummary::default();
    for row in rows {
        let result = match workflow {
            Workflow::ImageRename => rename::process_row(ctx, row).await,
            Workflow::Sitemap => sitemap::process_row(ctx, row).await,
        };
        match result {
            Ok(RowOutcome::Header) => summary.headers += 1,
            Ok(RowOutcome::Completed) => summary.completed += 1,
            Ok(RowOutcome::Skipped) => summary.skipped += 1,
            Err(err) if !err.is_batch_fatal() => {
                warn!(?err, line = row.line, "row failed; continuing");
                log_row_failure(ctx, workflow, row, &err);
                summary.failed += 1;
            }
            Err(err) => {
                ctx.log
                    .error(&format!("Batch aborted at row {}: {}", row.line, err));
                return Err(BatchError::Aborted {
                    line: row.line,
                    source: err,
                });
            }
        }
    }
    info!(?summary, "batch finished");
    ctx.log.info(&format!(
        "Finished: {} completed, {} skipped, {} failed",
        summary.completed, summary.skipped, summary.failed
    ));
    Ok(summary)
}

fn log_row_failure(ctx: &mut RunContext<'_>, workflow: Workflow, row: &Row, err: &WorkflowError) {
    // Sitemap rows lead with an id; the path is the readable column.
    let column = match workflow {
        Workflow::ImageRename => 0,
        Workflow::Sitemap => 1,
    };
    let label = row.fields.get(column).map(String::as_str).unwrap_or_default();
    let message = match err {
        WorkflowError::Cms(CmsError::Transport(e)) => {
            format!("Network issue occurred while processing {}: {}", label, e)
        }
        WorkflowError::Cms(CmsError::InvalidJson { .. }) => format!(
            "Request did not return valid JSON for {} (most likely an HTML response)",
            label
        ),
        other => format!("{}: {}", label, other),
    };
    ctx.log.error(&message);
}
