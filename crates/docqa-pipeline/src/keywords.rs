//! Keyword extraction for the sparse half of hybrid retrieval.
//!
//! Deliberately simple: the index's full-text matcher does the heavy
//! lifting, this only strips tokens that would match everything.

const MIN_TOKEN_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "was", "what", "when", "where", "which", "who", "how", "why",
    "does", "did", "can", "could", "should", "would", "about", "with", "from", "that", "this",
    "have", "has", "had", "not", "you", "your", "their", "there",
];

/// Lowercased alphanumeric tokens of the question, stopwords and
/// short tokens dropped, first occurrence order kept. May be empty;
/// the retriever treats that as "skip the keyword path".
pub fn extract(question: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    question
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.len() >= MIN_TOKEN_LEN)
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}
