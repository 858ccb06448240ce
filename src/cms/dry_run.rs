use async_trait::async_trait;
use tracing::info;

use super::{edit_payload, move_parameters, CmsError, CmsService};
use crate::model::{
    AssetRecord, AssetReference, Decoded, OperationOutcome, SubscriberList,
};

/// Forwards reads to `inner` and prints mutating payloads instead of sending
/// them. Every mutation reports `Unreported`, which callers treat as success.
///
/// Subscriber listings are not forwarded: after a skipped move the new path
/// does not exist remotely, so the listing is reported empty.
#[derive(Debug)]
pub struct DryRunCms<S> {
    inner: S,
}

impl<S> DryRunCms<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[async_trait]
impl<S: CmsService> CmsService for DryRunCms<S> {
    async fn read(&self, asset: &AssetReference) -> Result<Decoded<AssetRecord>, CmsError> {
        self.inner.read(asset).await
    }

    async fn edit(
        &self,
        asset_type: &str,
        record: &AssetRecord,
    ) -> Result<OperationOutcome, CmsError> {
        let payload = edit_payload(asset_type, record)?;
        info!("[dry-run] POST edit\n{}", pretty(&payload));
        Ok(OperationOutcome::Unreported)
    }

    async fn move_asset(
        &self,
        asset: &AssetReference,
        destination_folder: &str,
        new_name: &str,
    ) -> Result<OperationOutcome, CmsError> {
        let payload =
            move_parameters(asset.site().unwrap_or_default(), destination_folder, new_name);
        info!(
            "[dry-run] POST move/{}\n{}",
            asset.url_suffix(),
            pretty(&payload)
        );
        Ok(OperationOutcome::Unreported)
    }

    async fn publish(&self, asset: &AssetReference) -> Result<OperationOutcome, CmsError> {
        info!("[dry-run] POST publish/{}", asset.url_suffix());
        Ok(OperationOutcome::Unreported)
    }

    async fn list_subscribers(
        &self,
        asset: &AssetReference,
    ) -> Result<Decoded<SubscriberList>, CmsError> {
        info!("[dry-run] GET listSubscribers/{}", asset.url_suffix());
        Ok(Decoded::Recognized(SubscriberList {
            outcome: OperationOutcome::Unreported,
            subscribers: Vec::new(),
        }))
    }
}
