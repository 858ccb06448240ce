use tracing::{info, instrument};

use super::fanout::publish_subscribers;
use super::{read_recognized, require_success, Operation, RowOutcome, RunContext, WorkflowError};
use crate::model::{AssetReference, Decoded};
use crate::rows::{RenameTask, Row, RENAME_HEADER};

/// Rename one image: display name, move+rename, publish, then republish
/// whatever subscribes to it.
#[instrument(skip_all, fields(line = row.line))]
pub async fn process_row(
    ctx: &mut RunContext<'_>,
    row: &Row,
) -> Result<RowOutcome, WorkflowError> {
    if row.is_header(&RENAME_HEADER) {
        return Ok(RowOutcome::Header);
    }
    let task = RenameTask::from_row(row)?;
    info!("Getting {}", task.source_path);

    let source = AssetReference::by_path(ctx.asset_type, ctx.site, &task.source_path);
    let Some(mut record) = read_recognized(ctx, &source, &task.source_path).await? else {
        return Ok(RowOutcome::Skipped);
    };

    // Display-name edit failures are logged but never stop the rename.
    if record.set_display_name(&task.new_name) {
        let outcome = ctx.cms.edit(ctx.asset_type, &record).await?;
        match outcome.failure_message() {
            Some(message) => ctx.log.error(&format!(
                "{} unsuccessful at updating. Return message:{}",
                task.source_path, message
            )),
            None => ctx.log.info(&format!(
                "{} renamed display name to {}",
                task.source_path, task.new_name
            )),
        }
    } else {
        ctx.log.warn(&format!(
            "Skip renaming {} DisplayName, displayName metadata does not exist",
            task.source_path
        ));
    }

    let outcome = ctx
        .cms
        .move_asset(&source, &task.parent_folder, &task.new_name)
        .await?;
    require_success(ctx.log, &outcome, Operation::Move, &task.source_path)?;
    ctx.log.info(&format!(
        "Moved {} and renamed to {}",
        task.source_path, task.new_name
    ));

    let destination = AssetReference::by_path(ctx.asset_type, ctx.site, &task.destination_path);
    let outcome = ctx.cms.publish(&destination).await?;
    require_success(ctx.log, &outcome, Operation::Publish, &task.destination_path)?;
    ctx.log.info(&format!("Published {}", task.destination_path));

    let listing = match ctx.cms.list_subscribers(&destination).await? {
        Decoded::Recognized(listing) => listing,
        Decoded::Unrecognized(raw) => {
            ctx.log.error(&format!(
                "unable to parse the relationships of {} - cascade returned:{}",
                task.destination_path, raw
            ));
            return Ok(RowOutcome::Skipped);
        }
    };
    require_success(
        ctx.log,
        &listing.outcome,
        Operation::ListSubscribers,
        &task.destination_path,
    )?;

    if listing.subscribers.is_empty() {
        ctx.log.info(">> No other assets associated");
        return Ok(RowOutcome::Completed);
    }

    ctx.log.info(&format!(
        "Publishing related assets to {}",
        task.destination_path
    ));
    let report = publish_subscribers(ctx, &listing.subscribers).await?;
    info!(
        published = report.published.len(),
        ineligible = report.ineligible.len(),
        "fan-out finished"
    );
    Ok(match report.unreadable {
        Some(_) => RowOutcome::Skipped,
        None => RowOutcome::Completed,
    })
}
