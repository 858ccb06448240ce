//! Per-row orchestration for the image-rename and sitemap workflows.
//!
//! Each workflow turns one input row into a short, ordered series of CMS
//! calls. Errors come back typed so the batch loop can tell a row-scoped
//! problem (log it, move on) from one that must stop the whole run.
use std::fmt;
use thiserror::Error;

use crate::cms::{CmsError, CmsService};
use crate::model::{AssetRecord, AssetReference, Decoded, OperationOutcome};
use crate::rows::RowShapeError;
use crate::runlog::EventSink;

pub mod fanout;
pub mod rename;
pub mod sitemap;

/// Resources owned by the run and lent to each row.
pub struct RunContext<'a> {
    pub cms: &'a dyn CmsService,
    pub log: &'a mut dyn EventSink,
    pub site: &'a str,
    pub asset_type: &'a str,
}

/// Terminal state of one row that did not abort the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Header,
    Completed,
    Skipped,
}

/// Remote calls whose failure stops the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Move,
    Publish,
    ListSubscribers,
    PublishSubscriber,
}

impl Operation {
    fn failure_text(&self) -> &'static str {
        match self {
            Operation::Move => "unsuccessful at moving",
            Operation::Publish => "unsuccessful publish",
            Operation::ListSubscribers => "unsuccessful getting relationships for",
            Operation::PublishSubscriber => "unsuccessful at publishing",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Move => "move",
            Operation::Publish => "publish",
            Operation::ListSubscribers => "listSubscribers",
            Operation::PublishSubscriber => "subscriber publish",
        })
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("malformed row: {0}")]
    RowShape(#[from] RowShapeError),
    #[error("{operation} failed for {path}: {message}")]
    Operation {
        operation: Operation,
        path: String,
        message: String,
    },
    #[error(transparent)]
    Cms(#[from] CmsError),
}

impl WorkflowError {
    /// Malformed rows and escalated remote failures end the run; transport
    /// and decoding problems only end the current row.
    pub fn is_batch_fatal(&self) -> bool {
        !matches!(self, WorkflowError::Cms(_))
    }
}

/// Read `asset`, logging and returning `None` when the response has no
/// recognizable asset envelope.
pub(crate) async fn read_recognized(
    ctx: &mut RunContext<'_>,
    asset: &AssetReference,
    label: &str,
) -> Result<Option<AssetRecord>, CmsError> {
    match ctx.cms.read(asset).await? {
        Decoded::Recognized(record) => Ok(Some(record)),
        Decoded::Unrecognized(raw) => {
            ctx.log.error(&format!(
                "unable to parse the asset:{} - cascade returned:{}",
                label, raw
            ));
            Ok(None)
        }
    }
}

/// Log and escalate an explicit `success: false`.
pub(crate) fn require_success(
    log: &mut dyn EventSink,
    outcome: &OperationOutcome,
    operation: Operation,
    path: &str,
) -> Result<(), WorkflowError> {
    if let Some(message) = outcome.failure_message() {
        log.error(&format!(
            "{} {}. Return message:{}",
            operation.failure_text(),
            path,
            message
        ));
        return Err(WorkflowError::Operation {
            operation,
            path: path.to_string(),
            message: message.to_string(),
        });
    }
    Ok(())
}
