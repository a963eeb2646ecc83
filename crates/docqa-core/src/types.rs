//! Domain types shared by the retriever and the pipeline.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;

/// Stored payload of one indexed document chunk.
///
/// - `text`: the chunk content handed to answer synthesis
/// - `source`: origin document name; rendered as "N/A" when absent
/// - `page`: zero-based page number; rendered one-based when present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub text: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub page: Option<u64>,
}

impl Payload {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), source: None, page: None }
    }

    /// Source label for rendering, "N/A" when none was stored.
    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or("N/A")
    }
}

/// One document chunk returned by a search path.
///
/// `id` matches the stored chunk identifier and is the deduplication
/// key: the same chunk surfaced by both search paths merges into a
/// single candidate. `vector_score` is present only for candidates
/// that came out of the vector search; `keyword_matched` marks
/// candidates the keyword scan returned. `fused_score` is filled in
/// by the fusion step, higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: ChunkId,
    pub payload: Payload,
    pub vector_score: Option<f32>,
    pub keyword_matched: bool,
    pub fused_score: f32,
}

impl Candidate {
    pub fn from_vector(id: ChunkId, payload: Payload, score: f32) -> Self {
        Self { id, payload, vector_score: Some(score), keyword_matched: false, fused_score: 0.0 }
    }

    pub fn from_keyword(id: ChunkId, payload: Payload) -> Self {
        Self { id, payload, vector_score: None, keyword_matched: true, fused_score: 0.0 }
    }
}

/// Role tag on a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Mutable state threaded through one pipeline run.
///
/// Owned by exactly one run; each step consumes and returns it.
/// `context` stays empty unless the retrieval branch executed, and the
/// terminal step appends `answer` to `history` as an assistant turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub history: Vec<Message>,
    pub question: String,
    pub context: String,
    pub answer: String,
}

impl SessionState {
    /// Build run state from prior history plus the new user turn.
    pub fn from_history(history: Vec<Message>) -> Self {
        Self { history, question: String::new(), context: String::new(), answer: String::new() }
    }

    /// The newest user message, if any.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}
