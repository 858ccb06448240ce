use tracing::{info, instrument};

use super::{read_recognized, require_success, Operation, RunContext, WorkflowError};
use crate::model::{AssetReference, SubscriberEdge};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FanoutReport {
    pub published: Vec<String>,
    pub ineligible: Vec<String>,
    /// Subscriber whose read came back unrecognized; later siblings were not
    /// visited.
    pub unreadable: Option<String>,
}

/// Publish every eligible subscriber in list order.
///
/// Ineligible subscribers are logged and passed over. A failed publish
/// escalates and leaves the remaining siblings untouched.
#[instrument(skip_all, fields(count = subscribers.len()))]
pub async fn publish_subscribers(
    ctx: &mut RunContext<'_>,
    subscribers: &[SubscriberEdge],
) -> Result<FanoutReport, WorkflowError> {
    let mut report = FanoutReport::default();
    for edge in subscribers {
        let reference = AssetReference::by_path(&edge.asset_type, ctx.site, &edge.path);
        let Some(record) = read_recognized(ctx, &reference, &edge.path).await? else {
            report.unreadable = Some(edge.path.clone());
            break;
        };
        if !record.is_eligible() {
            ctx.log
                .info(&format!("*{} Skipped: shouldBePublished to False", edge.path));
            report.ineligible.push(edge.path.clone());
            continue;
        }

        info!(path = %edge.path, asset_type = %edge.asset_type, "publishing subscriber");
        let outcome = ctx.cms.publish(&reference).await?;
        require_success(ctx.log, &outcome, Operation::PublishSubscriber, &edge.path)?;
        ctx.log.info(&format!(">> Published {}", edge.path));
        report.published.push(edge.path.clone());
    }
    Ok(report)
}
