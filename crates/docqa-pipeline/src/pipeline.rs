//! Orchestrator: a strict DAG with one branch point.
//!
//! `Start → Classify → { Retrieve → Synthesize | PassThrough } → End`
//!
//! Each transition consumes the owned session state; a failure at any
//! step aborts the run without touching the conversation history.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use docqa_core::config::PipelineSettings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{CompletionClient, EmbeddingClient, IndexStore};
use docqa_core::types::{Message, SessionState};
use docqa_retrieval::{format_context, HybridRetriever};

use crate::classify::ClassifierStep;
use crate::keywords;
use crate::prompts;
use crate::synthesize::AnswerSynthesizer;

/// Pipeline position. `PassThrough` carries the classifier's raw
/// output so no second model call is needed on the no-retrieval
/// branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Start,
    Classify,
    Retrieve,
    Synthesize,
    PassThrough { raw: String },
    End,
}

/// Result of a completed run: the input history plus one appended
/// assistant turn, and the answer on its own.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub history: Vec<Message>,
    pub answer: String,
}

pub struct Pipeline {
    classifier: ClassifierStep,
    synthesizer: AnswerSynthesizer,
    retriever: HybridRetriever,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn CompletionClient>,
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn IndexStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            classifier: ClassifierStep::new(llm.clone()),
            synthesizer: AnswerSynthesizer::new(llm),
            retriever: HybridRetriever::new(embedder, store),
            settings,
        }
    }

    /// Run one turn over the given history (prior conversation plus
    /// the new user message).
    pub async fn run(&self, history: Vec<Message>) -> Result<RunOutcome> {
        let mut state = SessionState::from_history(history);
        let mut step = Step::Start;
        loop {
            step = self.advance(&mut state, step).await?;
            if step == Step::End {
                break;
            }
        }
        let answer = state.answer.clone();
        state.history.push(Message::assistant(answer.clone()));
        Ok(RunOutcome { history: state.history, answer })
    }

    /// Race the run against a caller-supplied cancellation future.
    /// Losing the race drops any in-flight collaborator call and
    /// yields `Cancelled`; the history is untouched.
    pub async fn run_until_cancelled<F>(&self, history: Vec<Message>, cancel: F) -> Result<RunOutcome>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::select! {
            outcome = self.run(history) => outcome,
            () = cancel => Err(Error::Cancelled),
        }
    }

    /// Cancellation on a deadline; zero disables the deadline.
    pub async fn run_with_timeout(&self, history: Vec<Message>, timeout: Duration) -> Result<RunOutcome> {
        if timeout.is_zero() {
            return self.run(history).await;
        }
        self.run_until_cancelled(history, tokio::time::sleep(timeout)).await
    }

    /// One state transition. Exposed so tests can drive the machine
    /// step by step.
    pub async fn advance(&self, state: &mut SessionState, step: Step) -> Result<Step> {
        match step {
            Step::Start => {
                let question = state
                    .latest_user_message()
                    .ok_or_else(|| Error::BadRequest("history holds no user message".to_string()))?
                    .to_string();
                state.question = question;
                state.context.clear();
                state.answer.clear();
                Ok(Step::Classify)
            }
            Step::Classify => {
                let verdict = self.classifier.classify(&state.question).await?;
                if verdict.needs_retrieval {
                    Ok(Step::Retrieve)
                } else {
                    Ok(Step::PassThrough { raw: verdict.raw })
                }
            }
            Step::Retrieve => {
                let kws = keywords::extract(&state.question);
                let candidates = self
                    .retriever
                    .hybrid_retrieve(
                        &state.question,
                        &kws,
                        self.settings.retrieve_limit,
                        self.settings.vector_weight,
                    )
                    .await?;
                info!(candidates = candidates.len(), "retrieval complete");
                state.context = format_context(&candidates);
                Ok(Step::Synthesize)
            }
            Step::Synthesize => {
                state.answer = self.synthesizer.synthesize(&state.question, &state.context).await?;
                Ok(Step::End)
            }
            Step::PassThrough { raw } => {
                // Reuse the classifier's direct output when it gave
                // one; the bare negative sentinel or an empty string
                // falls back to a fixed reply so the answer is never
                // empty.
                debug!("pass-through branch, no retrieval");
                let raw = raw.trim();
                state.answer = if raw.is_empty() || raw == crate::classify::NEGATIVE_SENTINEL {
                    prompts::NO_CONTEXT_REPLY.to_string()
                } else {
                    raw.to_string()
                };
                Ok(Step::End)
            }
            Step::End => Ok(Step::End),
        }
    }
}
