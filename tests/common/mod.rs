#![allow(dead_code)]

use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

use cascade_batch::batch::{self, BatchError, BatchSummary};
use cascade_batch::cms::{CmsError, CmsService};
use cascade_batch::config::Workflow;
use cascade_batch::model::{
    AssetRecord, AssetReference, Decoded, OperationOutcome, SubscriberEdge, SubscriberList,
};
use cascade_batch::rows::Row;
use cascade_batch::runlog::MemoryLog;
use cascade_batch::workflow::RunContext;

pub const SITE: &str = "www";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Read(String),
    Edit(Value),
    Move {
        asset: String,
        folder: String,
        new_name: String,
    },
    Publish(String),
    ListSubscribers(String),
}

type Queue<T> = Arc<Mutex<VecDeque<Result<T, CmsError>>>>;

/// Scripted CMS double. Each operation pops its next scripted response;
/// once a queue runs dry reads come back unrecognized and everything else
/// succeeds.
#[derive(Clone, Default)]
pub struct RecordingCms {
    reads: Queue<Decoded<AssetRecord>>,
    edits: Queue<OperationOutcome>,
    moves: Queue<OperationOutcome>,
    publishes: Queue<OperationOutcome>,
    listings: Queue<Decoded<SubscriberList>>,
    calls: Arc<Mutex<Vec<Call>>>,
}

fn queue<T>(items: Vec<Result<T, CmsError>>) -> Queue<T> {
    Arc::new(Mutex::new(VecDeque::from(items)))
}

impl RecordingCms {
    pub fn with_reads(mut self, reads: Vec<Result<Decoded<AssetRecord>, CmsError>>) -> Self {
        self.reads = queue(reads);
        self
    }

    pub fn with_edits(mut self, edits: Vec<OperationOutcome>) -> Self {
        self.edits = queue(edits.into_iter().map(Ok).collect());
        self
    }

    pub fn with_moves(mut self, moves: Vec<OperationOutcome>) -> Self {
        self.moves = queue(moves.into_iter().map(Ok).collect());
        self
    }

    pub fn with_publishes(mut self, publishes: Vec<OperationOutcome>) -> Self {
        self.publishes = queue(publishes.into_iter().map(Ok).collect());
        self
    }

    pub fn with_listings(mut self, listings: Vec<Decoded<SubscriberList>>) -> Self {
        self.listings = queue(listings.into_iter().map(Ok).collect());
        self
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub async fn publishes(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::Publish(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    pub async fn edits(&self) -> Vec<Value> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::Edit(body) => Some(body),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

async fn pop<T>(q: &Queue<T>, fallback: impl FnOnce() -> T) -> Result<T, CmsError> {
    q.lock().await.pop_front().unwrap_or_else(|| Ok(fallback()))
}

#[async_trait::async_trait]
impl CmsService for RecordingCms {
    async fn read(&self, asset: &AssetReference) -> Result<Decoded<AssetRecord>, CmsError> {
        self.record(Call::Read(asset.url_suffix())).await;
        pop(&self.reads, || Decoded::Unrecognized(json!({}))).await
    }

    async fn edit(
        &self,
        asset_type: &str,
        record: &AssetRecord,
    ) -> Result<OperationOutcome, CmsError> {
        let body = json!({ "asset": { asset_type: record } });
        self.record(Call::Edit(body)).await;
        pop(&self.edits, || OperationOutcome::Succeeded).await
    }

    async fn move_asset(
        &self,
        asset: &AssetReference,
        destination_folder: &str,
        new_name: &str,
    ) -> Result<OperationOutcome, CmsError> {
        self.record(Call::Move {
            asset: asset.url_suffix(),
            folder: destination_folder.to_string(),
            new_name: new_name.to_string(),
        })
        .await;
        pop(&self.moves, || OperationOutcome::Succeeded).await
    }

    async fn publish(&self, asset: &AssetReference) -> Result<OperationOutcome, CmsError> {
        self.record(Call::Publish(asset.url_suffix())).await;
        pop(&self.publishes, || OperationOutcome::Succeeded).await
    }

    async fn list_subscribers(
        &self,
        asset: &AssetReference,
    ) -> Result<Decoded<SubscriberList>, CmsError> {
        self.record(Call::ListSubscribers(asset.url_suffix())).await;
        pop(&self.listings, || listing(&[])).await
    }
}

pub fn asset(fields: Value) -> Decoded<AssetRecord> {
    Decoded::Recognized(serde_json::from_value(fields).expect("test asset"))
}

pub fn image(path: &str, display_name: Option<&str>) -> Decoded<AssetRecord> {
    let mut fields = json!({
        "id": "img-1",
        "path": path,
        "siteName": SITE,
        "shouldBePublished": true,
    });
    if let Some(name) = display_name {
        fields["metadata"] = json!({ "displayName": name, "title": "kept" });
    }
    asset(fields)
}

pub fn eligible(path: &str, eligible: bool) -> Decoded<AssetRecord> {
    asset(json!({ "path": path, "shouldBePublished": eligible }))
}

pub fn listing(edges: &[(&str, &str)]) -> Decoded<SubscriberList> {
    Decoded::Recognized(SubscriberList {
        outcome: OperationOutcome::Succeeded,
        subscribers: edges
            .iter()
            .map(|(path, asset_type)| SubscriberEdge {
                path: path.to_string(),
                asset_type: asset_type.to_string(),
            })
            .collect(),
    })
}

pub fn failed(message: &str) -> OperationOutcome {
    OperationOutcome::Failed {
        message: message.into(),
    }
}

pub fn invalid_json() -> CmsError {
    CmsError::InvalidJson {
        body: "<html>maintenance</html>".into(),
        source: serde_json::from_str::<Value>("<html>").unwrap_err(),
    }
}

pub async fn run_batch(
    cms: &RecordingCms,
    workflow: Workflow,
    asset_type: &str,
    rows: &[Row],
) -> (Result<BatchSummary, BatchError>, MemoryLog) {
    let mut log = MemoryLog::default();
    let result = {
        let mut ctx = RunContext {
            cms,
            log: &mut log,
            site: SITE,
            asset_type,
        };
        batch::run_rows(&mut ctx, workflow, rows).await
    };
    (result, log)
}
