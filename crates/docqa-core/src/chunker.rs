//! Splits source documents into indexable chunks for ingest.
//!
//! Paragraph-first: blank-line separated paragraphs become chunks
//! directly, oversized paragraphs are split by word windows with a
//! fixed overlap so no boundary sentence is lost.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::Payload;

/// One ingestable chunk with the payload that ends up in the index.
#[derive(Debug, Clone)]
pub struct SourceChunk {
    pub id: String,
    pub payload: Payload,
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_tokens: usize,
    pub overlap_percent: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: 500, overlap_percent: 0.2 }
    }
}

#[derive(Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chunk every `.txt` file under `data_dir`, sorted by path.
    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<SourceChunk>> {
        let files = list_txt_files(data_dir);
        let mut all_chunks = Vec::new();
        for file_path in &files {
            all_chunks.extend(self.process_file(file_path)?);
        }
        Ok(all_chunks)
    }

    /// Chunk a single UTF-8 text file.
    pub fn process_file(&self, file_path: &Path) -> Result<Vec<SourceChunk>> {
        let content = read_file_content(file_path)?;
        let source = file_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string_lossy().to_string());
        let doc_id = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| source.clone());
        Ok(self.chunk_content(&content, &doc_id, &source))
    }

    fn chunk_content(&self, content: &str, doc_id: &str, source: &str) -> Vec<SourceChunk> {
        let mut chunks = Vec::new();
        let mut chunk_index = 0usize;
        for paragraph in content.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            if self.count_tokens(paragraph) <= self.config.max_tokens {
                chunks.push(self.make_chunk(doc_id, source, chunk_index, paragraph.to_string()));
                chunk_index += 1;
            } else {
                for sub_chunk in self.split_paragraph_with_overlap(paragraph) {
                    chunks.push(self.make_chunk(doc_id, source, chunk_index, sub_chunk));
                    chunk_index += 1;
                }
            }
        }
        chunks
    }

    fn make_chunk(&self, doc_id: &str, source: &str, index: usize, text: String) -> SourceChunk {
        SourceChunk {
            id: format!("{}:{}", doc_id, index),
            payload: Payload { text, source: Some(source.to_string()), page: None },
        }
    }

    // Rough token estimate: ~0.75 words per token.
    fn count_tokens(&self, text: &str) -> usize {
        let word_count = text.split_whitespace().count();
        (word_count as f32 / 0.75) as usize
    }

    fn split_paragraph_with_overlap(&self, paragraph: &str) -> Vec<String> {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        let words_per_chunk = 300;
        let overlap_words = (words_per_chunk as f32 * self.config.overlap_percent) as usize;
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + words_per_chunk).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end >= words.len() {
                break;
            }
            start = end - overlap_words;
        }
        chunks
    }
}

fn read_file_content(file_path: &Path) -> Result<String> {
    match fs::read_to_string(file_path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("txt"))
        .map(|e| e.path().to_path_buf())
        .collect();
    txt_files.sort();
    txt_files
}
