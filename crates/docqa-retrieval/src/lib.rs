//! Hybrid retrieval: dense vector search fused with sparse keyword
//! matching into one ranked, deduplicated candidate list.

use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use docqa_core::error::{Error, Result};
use docqa_core::traits::{EmbeddingClient, IndexStore};
use docqa_core::types::{Candidate, ChunkId};

/// Fixed score for a keyword match: the scan reports membership, not
/// graded relevance.
pub const KEYWORD_BASE_SCORE: f32 = 0.8;

pub struct HybridRetriever {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn IndexStore>,
}

impl HybridRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn IndexStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed the question and run a ranked nearest-neighbor search.
    pub async fn vector_retrieve(&self, question: &str, limit: usize) -> Result<Vec<Candidate>> {
        let query_vector = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;
        self.store
            .vector_search(&query_vector, limit)
            .await
            .map_err(|e| Error::IndexUnavailable(e.to_string()))
    }

    /// Unranked keyword scan; every hit carries `keyword_matched`.
    pub async fn keyword_retrieve(&self, keywords: &[String], limit: usize) -> Result<Vec<Candidate>> {
        self.store
            .keyword_scan(keywords, limit)
            .await
            .map_err(|e| Error::IndexUnavailable(e.to_string()))
    }

    /// Run both search paths concurrently and fuse the results.
    ///
    /// Each path is asked for `2 * limit` candidates so that fusion
    /// has enough overlap to work with before truncating. An empty
    /// `keywords` list skips the keyword path entirely. Both paths
    /// must finish before fusion; a failure in either aborts the call.
    pub async fn hybrid_retrieve(
        &self,
        question: &str,
        keywords: &[String],
        limit: usize,
        vector_weight: f32,
    ) -> Result<Vec<Candidate>> {
        if !(0.0..=1.0).contains(&vector_weight) {
            return Err(Error::InvalidWeight(vector_weight));
        }

        let fetch = limit.saturating_mul(2);
        let keyword_path = async {
            if keywords.is_empty() {
                Ok(Vec::new())
            } else {
                self.keyword_retrieve(keywords, fetch).await
            }
        };
        let (vector_hits, keyword_hits) =
            tokio::try_join!(self.vector_retrieve(question, fetch), keyword_path)?;

        debug!(
            vector_hits = vector_hits.len(),
            keyword_hits = keyword_hits.len(),
            "fusing retrieval results"
        );
        Ok(fuse(vector_hits, keyword_hits, limit, vector_weight))
    }
}

/// Merge the two result sets into one ranked list.
///
/// Vector candidates contribute `vector_score * vector_weight`;
/// keyword candidates contribute `KEYWORD_BASE_SCORE * (1 - vector_weight)`.
/// A chunk present in both sets sums both contributions, rewarding
/// agreement between the signals. The sort is stable over a
/// vector-first insertion order, so ties resolve toward vector rank.
pub fn fuse(
    vector_hits: Vec<Candidate>,
    keyword_hits: Vec<Candidate>,
    limit: usize,
    vector_weight: f32,
) -> Vec<Candidate> {
    let keyword_weight = 1.0 - vector_weight;
    let mut fused: Vec<Candidate> = Vec::with_capacity(vector_hits.len() + keyword_hits.len());
    let mut slot_by_id: HashMap<ChunkId, usize> = HashMap::new();

    for mut hit in vector_hits {
        hit.fused_score = hit.vector_score.unwrap_or(0.0) * vector_weight;
        slot_by_id.insert(hit.id.clone(), fused.len());
        fused.push(hit);
    }

    let keyword_contribution = KEYWORD_BASE_SCORE * keyword_weight;
    for mut hit in keyword_hits {
        match slot_by_id.entry(hit.id.clone()) {
            Entry::Occupied(slot) => {
                // Same chunk from both paths: one record, summed score.
                let merged = &mut fused[*slot.get()];
                merged.fused_score += keyword_contribution;
                merged.keyword_matched = true;
            }
            Entry::Vacant(slot) => {
                hit.fused_score = keyword_contribution;
                hit.keyword_matched = true;
                slot.insert(fused.len());
                fused.push(hit);
            }
        }
    }

    fused.sort_by(|a, b| b.fused_score.partial_cmp(&a.fused_score).unwrap_or(Ordering::Equal));
    fused.truncate(limit);
    fused
}

/// Render ranked candidates into the context string handed to answer
/// synthesis. Pure and deterministic; order follows the input list.
pub fn format_context(candidates: &[Candidate]) -> String {
    let blocks: Vec<String> = candidates
        .iter()
        .map(|c| {
            let page = match c.payload.page {
                Some(p) => (p + 1).to_string(),
                None => "N/A".to_string(),
            };
            format!(
                "<document><content>{}</content><metadata>, page: {}, source: {}</metadata></document>",
                c.payload.text,
                page,
                c.payload.source_label()
            )
        })
        .collect();
    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::types::Payload;

    fn vector_hit(id: &str, score: f32) -> Candidate {
        Candidate::from_vector(id.to_string(), Payload::new(format!("text {}", id)), score)
    }

    fn keyword_hit(id: &str) -> Candidate {
        Candidate::from_keyword(id.to_string(), Payload::new(format!("text {}", id)))
    }

    #[test]
    fn fuse_sums_contributions_for_shared_ids() {
        let fused = fuse(vec![vector_hit("a", 0.9)], vec![keyword_hit("a")], 10, 0.7);
        assert_eq!(fused.len(), 1);
        let expected = 0.9 * 0.7 + KEYWORD_BASE_SCORE * 0.3;
        assert!((fused[0].fused_score - expected).abs() < 1e-6);
        assert!(fused[0].keyword_matched);
        assert_eq!(fused[0].vector_score, Some(0.9));
    }

    #[test]
    fn fuse_preserves_vector_order_on_ties() {
        // Equal vector scores tie on fused score; stable sort keeps
        // the store's ranking.
        let fused = fuse(vec![vector_hit("a", 0.5), vector_hit("b", 0.5)], vec![], 10, 1.0);
        let ids: Vec<&str> = fused.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn fuse_truncates_to_limit() {
        let hits = (0..8).map(|i| vector_hit(&format!("c{}", i), 0.9 - i as f32 * 0.1)).collect();
        let fused = fuse(hits, vec![], 3, 1.0);
        assert_eq!(fused.len(), 3);
    }

    #[test]
    fn format_context_renders_one_based_pages() {
        let mut hit = vector_hit("a", 0.9);
        hit.payload = Payload { text: "body".into(), source: Some("law.pdf".into()), page: Some(0) };
        let rendered = format_context(&[hit]);
        assert_eq!(
            rendered,
            "<document><content>body</content><metadata>, page: 1, source: law.pdf</metadata></document>"
        );
    }

    #[test]
    fn format_context_defaults_missing_metadata() {
        let rendered = format_context(&[vector_hit("a", 0.9)]);
        assert!(rendered.contains("page: N/A"));
        assert!(rendered.contains("source: N/A"));
    }

    #[test]
    fn format_context_joins_with_blank_line() {
        let rendered = format_context(&[vector_hit("a", 0.9), vector_hit("b", 0.8)]);
        assert_eq!(rendered.matches("\n\n").count(), 1);
    }
}
