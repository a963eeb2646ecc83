//! Lightweight configuration loader.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*`
//! env vars, and exposes typed sections for the pipeline and the
//! remote collaborators.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::env;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_"));

        Ok(Self { figment })
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn pipeline(&self) -> PipelineSettings {
        self.figment.extract_inner("pipeline").unwrap_or_default()
    }

    pub fn openai(&self) -> OpenAiSettings {
        self.figment.extract_inner("openai").unwrap_or_default()
    }

    pub fn qdrant(&self) -> QdrantSettings {
        self.figment.extract_inner("qdrant").unwrap_or_default()
    }
}

/// Tunables for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Weight of the vector signal in hybrid fusion, within [0, 1].
    pub vector_weight: f32,
    /// Number of fused candidates fed to answer synthesis.
    pub retrieve_limit: usize,
    /// Whole-run deadline in seconds; 0 disables the deadline.
    pub timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self { vector_weight: 0.7, retrieve_limit: 20, timeout_secs: 60 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            chat_model: "gpt-4.1-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QdrantSettings {
    pub url: String,
    pub collection: String,
    /// Embedding dimension used when the collection is first created.
    pub dim: usize,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self { url: "http://localhost:6333".to_string(), collection: "documents".to_string(), dim: 1536 }
    }
}
