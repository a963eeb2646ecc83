//! Binary routing decision: does this question need retrieval?

use std::sync::Arc;

use tracing::debug;

use docqa_core::error::{Error, Result};
use docqa_core::traits::CompletionClient;

use crate::prompts;

/// The affirmative sentinel, matched strictly after trimming.
pub const AFFIRMATIVE_SENTINEL: &str = "<answer>yes</answer>";

/// The negative sentinel. Not matched for routing (anything except
/// the affirmative marker already routes to the no-retrieval branch);
/// the pass-through step uses it to tell "model declined" apart from
/// "model answered directly".
pub const NEGATIVE_SENTINEL: &str = "<answer>no</answer>";

/// Outcome of classification. `raw` keeps the model's full output so
/// the pass-through branch can reuse it without a second call.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub needs_retrieval: bool,
    pub raw: String,
}

pub struct ClassifierStep {
    llm: Arc<dyn CompletionClient>,
}

impl ClassifierStep {
    pub fn new(llm: Arc<dyn CompletionClient>) -> Self {
        Self { llm }
    }

    /// Ask the model for the routing sentinel.
    ///
    /// Only an exact affirmative sentinel selects the retrieval
    /// branch. Malformed-but-present output is normalized to "no
    /// retrieval", never an error; a failed collaborator call is
    /// fatal for the turn.
    pub async fn classify(&self, question: &str) -> Result<Verdict> {
        let raw = self
            .llm
            .complete(prompts::CHECK_QUESTION, &prompts::question_turn(question))
            .await
            .map_err(|e| Error::ClassificationUnavailable(e.to_string()))?;
        let needs_retrieval = raw.trim() == AFFIRMATIVE_SENTINEL;
        debug!(needs_retrieval, "question classified");
        Ok(Verdict { needs_retrieval, raw })
    }
}
