//! Collaborator seams: everything network-bound sits behind one of
//! these traits so the pipeline can be exercised against mocks.

use async_trait::async_trait;

use crate::types::Candidate;

/// Converts text into a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// The two primitive search operations of the backing index.
///
/// `vector_search` returns candidates ranked by similarity, each
/// carrying a vector score. `keyword_scan` returns unranked
/// candidates that matched at least one keyword.
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn vector_search(&self, vector: &[f32], limit: usize) -> anyhow::Result<Vec<Candidate>>;
    async fn keyword_scan(&self, keywords: &[String], limit: usize) -> anyhow::Result<Vec<Candidate>>;
}

/// Opaque text-completion model, used for both classification and
/// answer synthesis with different prompts. Callers map failures
/// into the typed taxonomy for the step that issued the call.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> anyhow::Result<String>;
}
