use tracing::{debug, info, instrument};

use super::{read_recognized, RowOutcome, RunContext, WorkflowError};
use crate::model::{AssetReference, SitemapChange};
use crate::rows::{Row, SitemapRow, SITEMAP_HEADER};

/// Include one asset in the sitemap when it is eligible for publishing.
///
/// The edit is submitted whenever the asset has dynamic fields, even if the
/// flag was already "Yes" or the asset is not marked for publishing.
#[instrument(skip_all, fields(line = row.line))]
pub async fn process_row(
    ctx: &mut RunContext<'_>,
    row: &Row,
) -> Result<RowOutcome, WorkflowError> {
    if row.is_header(&SITEMAP_HEADER) {
        return Ok(RowOutcome::Header);
    }
    let parsed = SitemapRow::from_row(row)?;
    info!("Getting {}", parsed.path);

    let reference = AssetReference::by_id(ctx.asset_type, &parsed.id);
    let Some(mut record) = read_recognized(ctx, &reference, &parsed.path).await? else {
        return Ok(RowOutcome::Skipped);
    };
    if !record.has_dynamic_fields() {
        debug!(path = %parsed.path, "no dynamic metadata fields");
        return Ok(RowOutcome::Skipped);
    }

    if record.is_eligible() {
        match record.flip_sitemap() {
            SitemapChange::Flipped => debug!(path = %parsed.path, "sitemap set to Yes"),
            SitemapChange::Unchanged(value) => {
                debug!(path = %parsed.path, ?value, "sitemap left unchanged")
            }
            SitemapChange::Missing => debug!(path = %parsed.path, "no sitemap field"),
        }
    } else {
        let path = record.path().unwrap_or(&parsed.path);
        ctx.log.warn(&format!("{} not set to publish", path));
    }

    let outcome = ctx.cms.edit(ctx.asset_type, &record).await?;
    match outcome.failure_message() {
        Some(message) => ctx.log.error(&format!(
            "{} unsuccessful at updating. Return message:{}",
            parsed.path, message
        )),
        None => ctx.log.info(&format!("Successfully updated {}", parsed.path)),
    }
    Ok(RowOutcome::Completed)
}
