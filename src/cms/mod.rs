use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::cms::model::SubscribersEnvelope;
use crate::config::Config;
use crate::model::{
    AssetRecord, AssetReference, Decoded, OperationOutcome, SubscriberList,
};

pub mod dry_run;
pub mod model;

pub use dry_run::DryRunCms;

#[derive(Debug, Error)]
pub enum CmsError {
    #[error("invalid CMS URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("failed to reach the CMS: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("CMS response was not valid JSON ({source}): {body}")]
    InvalidJson {
        body: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode asset payload: {0}")]
    Encode(#[source] serde_json::Error),
}

impl CmsError {
    pub fn is_transport(&self) -> bool {
        matches!(self, CmsError::Transport(_))
    }
}

/// The remote operations the workflows depend on.
#[async_trait]
pub trait CmsService: Send + Sync {
    async fn read(&self, asset: &AssetReference) -> Result<Decoded<AssetRecord>, CmsError>;

    async fn edit(
        &self,
        asset_type: &str,
        record: &AssetRecord,
    ) -> Result<OperationOutcome, CmsError>;

    /// Relocate `asset` into `destination_folder` on the same site, renaming it
    /// to `new_name`.
    async fn move_asset(
        &self,
        asset: &AssetReference,
        destination_folder: &str,
        new_name: &str,
    ) -> Result<OperationOutcome, CmsError>;

    async fn publish(&self, asset: &AssetReference) -> Result<OperationOutcome, CmsError>;

    async fn list_subscribers(
        &self,
        asset: &AssetReference,
    ) -> Result<Decoded<SubscriberList>, CmsError>;
}

#[derive(Clone)]
pub struct CmsClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for CmsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CmsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CmsClient {
    /// `use_system_proxy` honours `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY`.
    pub fn new(
        base_url: &str,
        api_key: String,
        timeout: Duration,
        use_system_proxy: bool,
    ) -> Result<Self, CmsError> {
        // `Url::join` drops the last segment unless the base ends with '/'.
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized).map_err(|err| CmsError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        let mut builder = Client::builder()
            .user_agent("cascade-batch/0.1")
            .timeout(timeout);
        if !use_system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, CmsError> {
        Self::new(
            cfg.base_url(),
            cfg.global.api_key.clone(),
            cfg.request_timeout(),
            cfg.global.use_system_proxy,
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, relative: &str) -> Result<Url, CmsError> {
        self.base_url
            .join(relative)
            .map_err(|err| CmsError::InvalidUrl {
                url: relative.to_string(),
                reason: err.to_string(),
            })
    }

    pub fn build_request(
        &self,
        method: Method,
        relative: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Request, CmsError> {
        let mut builder = self
            .http
            .request(method, self.endpoint(relative)?)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Ok(builder.build()?)
    }

    async fn execute(
        &self,
        method: Method,
        relative: &str,
        body: Option<&Value>,
    ) -> Result<Value, CmsError> {
        let request = self.build_request(method, relative, body)?;
        debug!(method=%request.method(), url=%request.url(), "sending cms request");
        let res = self.http.execute(request).await?;
        let status = res.status();
        let text = res.text().await?;
        debug!(%status, body=%text, "cms response");
        serde_json::from_str(&text).map_err(|source| CmsError::InvalidJson { body: text, source })
    }
}

#[async_trait]
impl CmsService for CmsClient {
    async fn read(&self, asset: &AssetReference) -> Result<Decoded<AssetRecord>, CmsError> {
        let body = self
            .execute(Method::GET, &format!("read/{}", asset.url_suffix()), None)
            .await?;
        Ok(decode_asset(body, &asset.asset_type))
    }

    async fn edit(
        &self,
        asset_type: &str,
        record: &AssetRecord,
    ) -> Result<OperationOutcome, CmsError> {
        let payload = edit_payload(asset_type, record)?;
        let body = self.execute(Method::POST, "edit", Some(&payload)).await?;
        Ok(OperationOutcome::from_envelope(&body))
    }

    async fn move_asset(
        &self,
        asset: &AssetReference,
        destination_folder: &str,
        new_name: &str,
    ) -> Result<OperationOutcome, CmsError> {
        let payload =
            move_parameters(asset.site().unwrap_or_default(), destination_folder, new_name);
        let body = self
            .execute(
                Method::POST,
                &format!("move/{}", asset.url_suffix()),
                Some(&payload),
            )
            .await?;
        Ok(OperationOutcome::from_envelope(&body))
    }

    async fn publish(&self, asset: &AssetReference) -> Result<OperationOutcome, CmsError> {
        let body = self
            .execute(Method::POST, &format!("publish/{}", asset.url_suffix()), None)
            .await?;
        Ok(OperationOutcome::from_envelope(&body))
    }

    async fn list_subscribers(
        &self,
        asset: &AssetReference,
    ) -> Result<Decoded<SubscriberList>, CmsError> {
        let body = self
            .execute(
                Method::GET,
                &format!("listSubscribers/{}", asset.url_suffix()),
                None,
            )
            .await?;
        Ok(decode_subscribers(body))
    }
}

/// Pull `asset.<asset_type>` out of a read response.
pub fn decode_asset(body: Value, asset_type: &str) -> Decoded<AssetRecord> {
    let record = body
        .get("asset")
        .and_then(|a| a.get(asset_type))
        .and_then(|fields| serde_json::from_value::<AssetRecord>(fields.clone()).ok());
    match record {
        Some(record) => Decoded::Recognized(record),
        None => Decoded::Unrecognized(body),
    }
}

/// A failed envelope is recognized even without a subscriber array; a
/// non-failed one must carry it.
pub fn decode_subscribers(body: Value) -> Decoded<SubscriberList> {
    let outcome = OperationOutcome::from_envelope(&body);
    if !outcome.is_success() {
        return Decoded::Recognized(SubscriberList {
            outcome,
            subscribers: Vec::new(),
        });
    }
    match serde_json::from_value::<SubscribersEnvelope>(body.clone()) {
        Ok(envelope) => Decoded::Recognized(SubscriberList {
            outcome,
            subscribers: envelope.subscribers.into_iter().map(Into::into).collect(),
        }),
        Err(_) => Decoded::Unrecognized(body),
    }
}

pub fn edit_payload(asset_type: &str, record: &AssetRecord) -> Result<Value, CmsError> {
    let fields = serde_json::to_value(record).map_err(CmsError::Encode)?;
    Ok(json!({ "asset": { asset_type: fields } }))
}

/// Move body: relocation into a folder, renaming, unpublishing first and
/// skipping workflow triggers.
pub fn move_parameters(site: &str, destination_folder: &str, new_name: &str) -> Value {
    json!({
        "moveParameters": {
            "destinationContainerIdentifier": {
                "path": {
                    "path": destination_folder,
                    "siteName": site,
                },
                "type": "folder",
            },
            "doWorkflow": false,
            "newName": new_name,
            "unpublish": true,
        }
    })
}
