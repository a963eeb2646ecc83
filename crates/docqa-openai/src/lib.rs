//! OpenAI-compatible HTTP collaborator: chat completions for the
//! classification and synthesis calls, embeddings for the dense
//! search query. Works against any endpoint speaking the same wire
//! format (configurable base URL).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use docqa_core::config::OpenAiSettings;
use docqa_core::traits::{CompletionClient, EmbeddingClient};

pub struct OpenAiClient {
    http: reqwest::Client,
    settings: OpenAiSettings,
}

impl OpenAiClient {
    pub fn new(settings: OpenAiSettings) -> Self {
        Self { http: reqwest::Client::new(), settings }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path);
        let mut builder = self.http.post(url);
        if let Some(key) = &self.settings.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Deserialize)]
pub struct ChatChoiceMessage {
    pub content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
pub struct EmbeddingRow {
    pub embedding: Vec<f32>,
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        let body = ChatRequest {
            model: &self.settings.chat_model,
            temperature: 0.0,
            messages: vec![
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_text },
            ],
        };
        debug!(model = %self.settings.chat_model, "chat completion request");
        let response: ChatResponse = self
            .post("chat/completions")
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion returned an error status")?
            .json()
            .await
            .context("chat completion response did not decode")?;
        response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("chat completion returned no choices"))
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest { model: &self.settings.embedding_model, input: text };
        debug!(model = %self.settings.embedding_model, "embedding request");
        let response: EmbeddingResponse = self
            .post("embeddings")
            .json(&body)
            .send()
            .await
            .context("embedding request failed")?
            .error_for_status()
            .context("embedding returned an error status")?
            .json()
            .await
            .context("embedding response did not decode")?;
        response
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| anyhow!("embedding response carried no rows"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_response_decodes_first_choice() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"<answer>yes</answer>"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).expect("decode");
        assert_eq!(parsed.choices[0].message.content, "<answer>yes</answer>");
    }

    #[test]
    fn embedding_response_decodes_vector() {
        let raw = r#"{"data":[{"index":0,"embedding":[0.25,-0.5]}],"model":"text-embedding-3-small"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(raw).expect("decode");
        assert_eq!(parsed.data[0].embedding, vec![0.25, -0.5]);
    }

    #[test]
    fn chat_request_serializes_both_roles() {
        let body = ChatRequest {
            model: "gpt-4.1-mini",
            temperature: 0.0,
            messages: vec![
                ChatMessage { role: "system", content: "instruction" },
                ChatMessage { role: "user", content: "# Question: q" },
            ],
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "# Question: q");
        assert_eq!(json["temperature"], 0.0);
    }
}
