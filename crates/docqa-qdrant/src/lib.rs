//! Qdrant REST implementation of the index store.
//!
//! Two read paths: `points/search` for ranked nearest-neighbor hits
//! and `points/scroll` with a full-text `should` filter for unranked
//! keyword matches. Write paths (`recreate_collection`, `upsert`)
//! exist for the ingest tooling.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use docqa_core::config::QdrantSettings;
use docqa_core::traits::IndexStore;
use docqa_core::types::{Candidate, Payload};

pub struct QdrantStore {
    http: reqwest::Client,
    settings: QdrantSettings,
}

/// One point for upsert. Qdrant point ids must be unsigned integers
/// or UUIDs; ingest hands out sequential integers.
#[derive(Debug, Serialize)]
pub struct UpsertPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

impl QdrantStore {
    pub fn new(settings: QdrantSettings) -> Self {
        Self { http: reqwest::Client::new(), settings }
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}{}",
            self.settings.url.trim_end_matches('/'),
            self.settings.collection,
            suffix
        )
    }

    /// Drop and re-create the collection with a cosine vector index.
    pub async fn recreate_collection(&self) -> Result<()> {
        // Delete is best-effort: a missing collection is fine.
        let _ = self.http.delete(self.collection_url("")).send().await;
        let body = json!({ "vectors": { "size": self.settings.dim, "distance": "Cosine" } });
        self.http
            .put(self.collection_url(""))
            .json(&body)
            .send()
            .await
            .context("collection create request failed")?
            .error_for_status()
            .context("collection create returned an error status")?;
        debug!(collection = %self.settings.collection, dim = self.settings.dim, "collection created");
        Ok(())
    }

    pub async fn upsert(&self, points: &[UpsertPoint]) -> Result<()> {
        let body = json!({ "points": points });
        self.http
            .put(self.collection_url("/points?wait=true"))
            .json(&body)
            .send()
            .await
            .context("upsert request failed")?
            .error_for_status()
            .context("upsert returned an error status")?;
        debug!(count = points.len(), "points upserted");
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct SearchResponse {
    pub result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
pub struct ScoredPoint {
    pub id: Value,
    pub score: f32,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Deserialize)]
pub struct ScrollResponse {
    pub result: ScrollResult,
}

#[derive(Deserialize)]
pub struct ScrollResult {
    pub points: Vec<ScrolledPoint>,
}

#[derive(Deserialize)]
pub struct ScrolledPoint {
    pub id: Value,
    #[serde(default)]
    pub payload: Option<Value>,
}

/// Point ids come back as either integers or UUID strings; both
/// render to the opaque candidate id.
pub fn id_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Payloads are free-form JSON; only `text`, `source` and `page` are
/// meaningful here, everything else is ignored.
pub fn decode_payload(payload: Option<Value>) -> Payload {
    let map = payload.unwrap_or(Value::Null);
    Payload {
        text: map.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
        source: map.get("source").and_then(Value::as_str).map(str::to_string),
        page: map.get("page").and_then(Value::as_u64),
    }
}

/// `should` filter: a point matches if any keyword full-text-matches
/// its `text` payload field.
pub fn keyword_filter(keywords: &[String]) -> Value {
    let conditions: Vec<Value> = keywords
        .iter()
        .map(|kw| json!({ "key": "text", "match": { "text": kw } }))
        .collect();
    json!({ "should": conditions })
}

#[async_trait]
impl IndexStore for QdrantStore {
    async fn vector_search(&self, vector: &[f32], limit: usize) -> Result<Vec<Candidate>> {
        let body = json!({ "vector": vector, "limit": limit, "with_payload": true });
        let response: SearchResponse = self
            .http
            .post(self.collection_url("/points/search"))
            .json(&body)
            .send()
            .await
            .context("vector search request failed")?
            .error_for_status()
            .context("vector search returned an error status")?
            .json()
            .await
            .context("vector search response did not decode")?;
        if response.result.is_empty() {
            debug!("vector search returned no points");
        }
        Ok(response
            .result
            .into_iter()
            .map(|p| Candidate::from_vector(id_string(&p.id), decode_payload(p.payload), p.score))
            .collect())
    }

    async fn keyword_scan(&self, keywords: &[String], limit: usize) -> Result<Vec<Candidate>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({
            "filter": keyword_filter(keywords),
            "limit": limit,
            "with_payload": true,
        });
        let response: ScrollResponse = self
            .http
            .post(self.collection_url("/points/scroll"))
            .json(&body)
            .send()
            .await
            .context("keyword scan request failed")?
            .error_for_status()
            .context("keyword scan returned an error status")?
            .json()
            .await
            .context("keyword scan response did not decode")?;
        Ok(response
            .result
            .points
            .into_iter()
            .map(|p| Candidate::from_keyword(id_string(&p.id), decode_payload(p.payload)))
            .collect())
    }
}

// Smoke-check the settings at construction time so a bad URL fails
// loudly before the first pipeline run.
pub fn validate_settings(settings: &QdrantSettings) -> Result<()> {
    if !settings.url.starts_with("http://") && !settings.url.starts_with("https://") {
        return Err(anyhow!("qdrant url must be http(s): {}", settings.url));
    }
    if settings.collection.is_empty() {
        return Err(anyhow!("qdrant collection name is empty"));
    }
    Ok(())
}
