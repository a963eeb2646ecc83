//! Final answer generation from question plus retrieved context.

use std::sync::Arc;

use docqa_core::error::{Error, Result};
use docqa_core::traits::CompletionClient;

use crate::prompts;

pub struct AnswerSynthesizer {
    llm: Arc<dyn CompletionClient>,
}

impl AnswerSynthesizer {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// One completion call with the grounded-answer prompt. An empty
    /// completion counts as a failure: the pipeline guarantees a
    /// non-empty answer at the end of a successful run.
    pub async fn synthesize(&self, question: &str, context: &str) -> Result<String> {
        let answer = self
            .llm
            .complete(&prompts::rag_answer(context), &prompts::question_turn(question))
            .await
            .map_err(|e| Error::SynthesisUnavailable(e.to_string()))?;
        if answer.trim().is_empty() {
            return Err(Error::SynthesisUnavailable("empty completion".to_string()));
        }
        Ok(answer)
    }
}
