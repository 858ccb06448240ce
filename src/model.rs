use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Name of the dynamic metadata field toggled by the sitemap workflow.
pub const SITEMAP_FIELD: &str = "sitemap";

/// How an asset is addressed in CMS URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Path { site: String, path: String },
    Id(String),
}

/// Identifies a CMS asset: type tag plus a site/path pair or an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub asset_type: String,
    pub locator: Locator,
}

impl AssetReference {
    pub fn by_path(
        asset_type: impl Into<String>,
        site: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            asset_type: asset_type.into(),
            locator: Locator::Path {
                site: site.into(),
                path: path.into(),
            },
        }
    }

    pub fn by_id(asset_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            asset_type: asset_type.into(),
            locator: Locator::Id(id.into()),
        }
    }

    pub fn site(&self) -> Option<&str> {
        match &self.locator {
            Locator::Path { site, .. } => Some(site),
            Locator::Id(_) => None,
        }
    }

    /// `{type}/{site}/{path}` or `{type}/{id}`, appended to an operation name.
    pub fn url_suffix(&self) -> String {
        match &self.locator {
            Locator::Path { site, path } => format!("{}/{}/{}", self.asset_type, site, path),
            Locator::Id(id) => format!("{}/{}", self.asset_type, id),
        }
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.locator {
            Locator::Path { path, .. } => f.write_str(path),
            Locator::Id(id) => write!(f, "{}#{}", self.asset_type, id),
        }
    }
}

/// Remote state of an asset as returned by `read`.
///
/// The raw JSON object is the source of truth. Accessors look into it and
/// mutations touch only the keys they name, so an edit submits back exactly
/// what was read, nulls and absent keys included.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct AssetRecord(Map<String, Value>);

/// JSON truthiness as the CMS tooling has always applied it: `null`, `false`,
/// zero, and empty strings/arrays/objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Result of applying the sitemap rule to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapChange {
    /// "No" became "Yes".
    Flipped,
    /// Field present but holding something other than "No".
    Unchanged(Option<String>),
    /// No field named `sitemap`, or it has no values.
    Missing,
}

impl AssetRecord {
    pub fn path(&self) -> Option<&str> {
        self.0.get("path").and_then(Value::as_str)
    }

    /// Server-computed eligibility; a missing or falsy flag is not eligible.
    pub fn is_eligible(&self) -> bool {
        self.0.get("shouldBePublished").is_some_and(is_truthy)
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.0.get("metadata").and_then(Value::as_object)
    }

    fn metadata_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.0.get_mut("metadata").and_then(Value::as_object_mut)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.metadata()?.get("displayName").and_then(Value::as_str)
    }

    /// True when the metadata carries a `displayName` key, whatever its value.
    pub fn has_display_name(&self) -> bool {
        self.metadata()
            .is_some_and(|m| m.contains_key("displayName"))
    }

    /// Replace the display name. Returns false (and changes nothing) when the
    /// metadata has no `displayName` key.
    pub fn set_display_name(&mut self, name: &str) -> bool {
        match self
            .metadata_mut()
            .and_then(|m| m.get_mut("displayName"))
        {
            Some(current) => {
                *current = Value::String(name.to_string());
                true
            }
            None => false,
        }
    }

    /// True when the metadata carries a `dynamicFields` key.
    pub fn has_dynamic_fields(&self) -> bool {
        self.metadata()
            .is_some_and(|m| m.contains_key("dynamicFields"))
    }

    /// First dynamic field named `name`; later duplicates are ignored.
    pub fn dynamic_field(&self, name: &str) -> Option<&Map<String, Value>> {
        self.metadata()?
            .get("dynamicFields")?
            .as_array()?
            .iter()
            .filter_map(Value::as_object)
            .find(|f| f.get("name").and_then(Value::as_str) == Some(name))
    }

    fn dynamic_field_mut(&mut self, name: &str) -> Option<&mut Map<String, Value>> {
        self.metadata_mut()?
            .get_mut("dynamicFields")?
            .as_array_mut()?
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .find(|f| f.get("name").and_then(Value::as_str) == Some(name))
    }

    /// Set the first `sitemap` value from "No" to "Yes". Any other value is
    /// left as it is.
    pub fn flip_sitemap(&mut self) -> SitemapChange {
        let Some(value) = self
            .dynamic_field_mut(SITEMAP_FIELD)
            .and_then(|f| f.get_mut("fieldValues"))
            .and_then(Value::as_array_mut)
            .and_then(|values| values.first_mut())
            .and_then(Value::as_object_mut)
        else {
            return SitemapChange::Missing;
        };
        let current = value.get("value").and_then(Value::as_str).map(str::to_string);
        if current.as_deref() == Some("No") {
            value.insert("value".into(), Value::String("Yes".into()));
            return SitemapChange::Flipped;
        }
        SitemapChange::Unchanged(current)
    }
}

/// Outcome of a mutating CMS call, read from the `success`/`message` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationOutcome {
    /// `success: true`.
    Succeeded,
    /// A falsy `success` (`false`, `null`, `0`, `""`), with the server's message.
    Failed { message: String },
    /// No `success` key at all; callers treat this as success.
    Unreported,
}

impl OperationOutcome {
    pub fn from_envelope(body: &Value) -> Self {
        match body.get("success") {
            Some(flag) if !is_truthy(flag) => OperationOutcome::Failed {
                message: body
                    .get("message")
                    .map(|m| match m {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_default(),
            },
            Some(_) => OperationOutcome::Succeeded,
            None => OperationOutcome::Unreported,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, OperationOutcome::Failed { .. })
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            OperationOutcome::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// A response decoded once at the client boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Recognized(T),
    /// Valid JSON without the expected envelope; carries the raw body.
    Unrecognized(Value),
}

impl<T> Decoded<T> {
    pub fn recognized(self) -> Option<T> {
        match self {
            Decoded::Recognized(v) => Some(v),
            Decoded::Unrecognized(_) => None,
        }
    }
}

/// One asset that subscribes to (depends on) a published asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberEdge {
    pub path: String,
    pub asset_type: String,
}

/// Parsed `listSubscribers` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberList {
    pub outcome: OperationOutcome,
    pub subscribers: Vec<SubscriberEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image_record() -> AssetRecord {
        serde_json::from_value(json!({
            "id": "abc123",
            "path": "img/old.png",
            "shouldBePublished": true,
            "siteName": "www",
            "metadata": {
                "displayName": "old.png",
                "title": "Old title"
            }
        }))
        .unwrap()
    }

    fn page_record(sitemap_values: &[&str]) -> AssetRecord {
        let values: Vec<Value> = sitemap_values
            .iter()
            .map(|v| json!({ "value": v }))
            .collect();
        serde_json::from_value(json!({
            "path": "about/index",
            "shouldBePublished": true,
            "metadata": {
                "dynamicFields": [
                    { "name": "audience", "fieldValues": [{ "value": "All" }] },
                    { "name": "sitemap", "fieldValues": values },
                    { "name": "sitemap", "fieldValues": [{ "value": "No" }] }
                ]
            },
            "pageConfigurations": [{ "name": "Default" }]
        }))
        .unwrap()
    }

    #[test]
    fn reference_url_suffix() {
        let by_path = AssetReference::by_path("file", "www", "images/a b.png");
        assert_eq!(by_path.url_suffix(), "file/www/images/a b.png");
        assert_eq!(by_path.to_string(), "images/a b.png");

        let by_id = AssetReference::by_id("page", "0a1b2c");
        assert_eq!(by_id.url_suffix(), "page/0a1b2c");
    }

    #[test]
    fn record_round_trips_untouched_fields() {
        let mut record = image_record();
        assert!(record.set_display_name("newpic.png"));
        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["metadata"]["displayName"], "newpic.png");
        assert_eq!(out["metadata"]["title"], "Old title");
        assert_eq!(out["id"], "abc123");
        assert_eq!(out["siteName"], "www");
        assert_eq!(out["shouldBePublished"], true);
    }

    #[test]
    fn set_display_name_without_metadata_is_a_no_op() {
        let mut record: AssetRecord =
            serde_json::from_value(json!({ "path": "img/a.png" })).unwrap();
        assert!(!record.set_display_name("b.png"));
        assert!(!record.has_display_name());
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({ "path": "img/a.png" }));
        assert!(!record.is_eligible());
    }

    #[test]
    fn null_display_name_counts_as_present() {
        let mut record: AssetRecord = serde_json::from_value(json!({
            "metadata": { "displayName": null, "summary": null }
        }))
        .unwrap();
        assert!(record.has_display_name());
        assert_eq!(record.display_name(), None);
        assert!(record.set_display_name("b.png"));
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({ "metadata": { "displayName": "b.png", "summary": null } })
        );
    }

    #[test]
    fn nulls_and_absent_keys_survive_a_round_trip() {
        let read = json!({
            "id": "p-1",
            "path": null,
            "shouldBePublished": null,
            "metadata": {
                "displayName": null,
                "summary": null,
                "dynamicFields": [
                    { "name": "tags" },
                    { "name": "alt", "fieldValues": null },
                    { "name": "sitemap", "fieldValues": [{ "value": "Yes" }] }
                ]
            }
        });
        let mut record: AssetRecord = serde_json::from_value(read.clone()).unwrap();
        assert!(!record.is_eligible());
        assert!(record.has_dynamic_fields());
        assert_eq!(
            record.flip_sitemap(),
            SitemapChange::Unchanged(Some("Yes".into()))
        );
        assert_eq!(serde_json::to_value(&record).unwrap(), read);
    }

    #[test]
    fn eligibility_follows_truthiness() {
        for (flag, expected) in [
            (json!(true), true),
            (json!(1), true),
            (json!("yes"), true),
            (json!(false), false),
            (json!(null), false),
            (json!(0), false),
            (json!(""), false),
        ] {
            let record: AssetRecord =
                serde_json::from_value(json!({ "shouldBePublished": flag })).unwrap();
            assert_eq!(record.is_eligible(), expected, "flag {flag}");
        }
    }

    #[test]
    fn sitemap_no_becomes_yes_on_first_field_only() {
        let mut record = page_record(&["No"]);
        assert_eq!(record.flip_sitemap(), SitemapChange::Flipped);
        let out = serde_json::to_value(&record).unwrap();
        let fields = &out["metadata"]["dynamicFields"];
        assert_eq!(fields[1]["fieldValues"][0]["value"], "Yes");
        assert_eq!(fields[2]["fieldValues"][0]["value"], "No");
        assert_eq!(fields[0]["fieldValues"][0]["value"], "All");
        assert_eq!(out["pageConfigurations"][0]["name"], "Default");
    }

    #[test]
    fn sitemap_other_values_are_left_alone() {
        let mut record = page_record(&["Yes"]);
        assert_eq!(
            record.flip_sitemap(),
            SitemapChange::Unchanged(Some("Yes".into()))
        );
        assert_eq!(
            record.dynamic_field(SITEMAP_FIELD).unwrap()["fieldValues"][0]["value"],
            "Yes"
        );
    }

    #[test]
    fn sitemap_missing_field_or_values() {
        let mut record = page_record(&[]);
        assert_eq!(record.flip_sitemap(), SitemapChange::Missing);

        let mut record: AssetRecord = serde_json::from_value(json!({
            "metadata": { "dynamicFields": [{ "name": "audience", "fieldValues": [] }] }
        }))
        .unwrap();
        assert!(record.has_dynamic_fields());
        assert_eq!(record.flip_sitemap(), SitemapChange::Missing);

        let mut record: AssetRecord = serde_json::from_value(json!({
            "metadata": { "dynamicFields": [{ "name": "sitemap", "fieldValues": null }] }
        }))
        .unwrap();
        assert_eq!(record.flip_sitemap(), SitemapChange::Missing);
    }

    #[test]
    fn outcome_three_way() {
        assert_eq!(
            OperationOutcome::from_envelope(&json!({ "success": true })),
            OperationOutcome::Succeeded
        );
        assert_eq!(
            OperationOutcome::from_envelope(&json!({ "success": false, "message": "locked" })),
            OperationOutcome::Failed {
                message: "locked".into()
            }
        );
        let unreported = OperationOutcome::from_envelope(&json!({ "anything": 1 }));
        assert_eq!(unreported, OperationOutcome::Unreported);
        assert!(unreported.is_success());
        assert_eq!(
            OperationOutcome::from_envelope(&json!({ "success": false })).failure_message(),
            Some("")
        );
        for falsy in [json!(null), json!(0), json!("")] {
            let outcome = OperationOutcome::from_envelope(&json!({ "success": falsy, "message": "m" }));
            assert_eq!(outcome.failure_message(), Some("m"));
        }
        assert_eq!(
            OperationOutcome::from_envelope(&json!({ "success": 1 })),
            OperationOutcome::Succeeded
        );
    }
}
