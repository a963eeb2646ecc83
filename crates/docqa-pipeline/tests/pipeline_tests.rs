use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use docqa_core::config::PipelineSettings;
use docqa_core::error::Error;
use docqa_core::traits::{CompletionClient, EmbeddingClient, IndexStore};
use docqa_core::types::{Candidate, Message, Payload, Role};
use docqa_pipeline::prompts::NO_CONTEXT_REPLY;
use docqa_pipeline::Pipeline;

/// Scripted model: first reply answers the classification call, the
/// second (if any) answers synthesis. Synthesis echoes the context so
/// tests can check what reached the prompt.
struct ScriptedLlm {
    classification: String,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn new(classification: &str) -> Self {
        Self { classification: classification.to_string(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl CompletionClient for ScriptedLlm {
    async fn complete(&self, system_prompt: &str, user_text: &str) -> anyhow::Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            Ok(self.classification.clone())
        } else {
            Ok(format!("answer for {user_text} grounded in: {system_prompt}"))
        }
    }
}

struct FailingLlm;

#[async_trait]
impl CompletionClient for FailingLlm {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
        anyhow::bail!("connection reset")
    }
}

/// Answers classification, then hangs forever on synthesis.
struct StallingLlm;

#[async_trait]
impl CompletionClient for StallingLlm {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

struct FixedEmbedder;

#[async_trait]
impl EmbeddingClient for FixedEmbedder {
    async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }
}

struct SpyStore {
    vector_calls: AtomicUsize,
    keyword_calls: AtomicUsize,
}

impl SpyStore {
    fn new() -> Self {
        Self { vector_calls: AtomicUsize::new(0), keyword_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl IndexStore for SpyStore {
    async fn vector_search(&self, _vector: &[f32], _limit: usize) -> anyhow::Result<Vec<Candidate>> {
        self.vector_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Candidate::from_vector(
            "doc:0".to_string(),
            Payload { text: "statute text".into(), source: Some("laws.pdf".into()), page: Some(4) },
            0.9,
        )])
    }

    async fn keyword_scan(&self, _keywords: &[String], _limit: usize) -> anyhow::Result<Vec<Candidate>> {
        self.keyword_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Candidate::from_keyword(
            "doc:0".to_string(),
            Payload { text: "statute text".into(), source: Some("laws.pdf".into()), page: Some(4) },
        )])
    }
}

fn pipeline(llm: Arc<dyn CompletionClient>, store: Arc<SpyStore>) -> Pipeline {
    Pipeline::new(llm, Arc::new(FixedEmbedder), store, PipelineSettings::default())
}

fn question_history() -> Vec<Message> {
    vec![Message::user("What is the statute of limitations for fraud?")]
}

#[tokio::test]
async fn negative_sentinel_skips_retrieval_entirely() {
    let store = Arc::new(SpyStore::new());
    let llm = Arc::new(ScriptedLlm::new("<answer>no</answer>"));
    let outcome = pipeline(llm.clone(), store.clone())
        .run(question_history())
        .await
        .expect("run");

    assert_eq!(store.vector_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.keyword_calls.load(Ordering::SeqCst), 0);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1, "no synthesis call either");
    assert_eq!(outcome.answer, NO_CONTEXT_REPLY);
    assert_eq!(outcome.history.len(), 2);
    assert_eq!(outcome.history[1].role, Role::Assistant);
}

#[tokio::test]
async fn malformed_classification_reuses_the_raw_output() {
    let store = Arc::new(SpyStore::new());
    let llm = Arc::new(ScriptedLlm::new("Paris is the capital of France."));
    let outcome = pipeline(llm, store.clone()).run(question_history()).await.expect("run");

    assert_eq!(store.vector_calls.load(Ordering::SeqCst), 0);
    assert_eq!(outcome.answer, "Paris is the capital of France.");
}

#[tokio::test]
async fn affirmative_sentinel_runs_retrieval_and_synthesis() {
    let store = Arc::new(SpyStore::new());
    let llm = Arc::new(ScriptedLlm::new("<answer>yes</answer>"));
    let outcome = pipeline(llm.clone(), store.clone())
        .run(question_history())
        .await
        .expect("run");

    assert_eq!(store.vector_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.keyword_calls.load(Ordering::SeqCst), 1);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
    // Synthesis saw the formatted context, page rendered one-based.
    assert!(outcome.answer.contains("statute text"));
    assert!(outcome.answer.contains("page: 5"));
    assert!(outcome.answer.contains("source: laws.pdf"));
    assert_eq!(outcome.history.len(), 2);
    assert_eq!(outcome.history[1].content, outcome.answer);
}

#[tokio::test]
async fn classifier_failure_aborts_without_history_append() {
    let store = Arc::new(SpyStore::new());
    let p = Pipeline::new(
        Arc::new(FailingLlm),
        Arc::new(FixedEmbedder),
        store.clone(),
        PipelineSettings::default(),
    );
    let err = p.run(question_history()).await.expect_err("must fail");

    assert!(matches!(err, Error::ClassificationUnavailable(_)));
    assert_eq!(store.vector_calls.load(Ordering::SeqCst), 0, "no retrieval side effects");
}

#[tokio::test]
async fn missing_user_message_is_a_bad_request() {
    let store = Arc::new(SpyStore::new());
    let llm = Arc::new(ScriptedLlm::new("<answer>no</answer>"));
    let err = pipeline(llm, store)
        .run(vec![Message::assistant("orphan assistant turn")])
        .await
        .expect_err("must fail");
    assert!(matches!(err, Error::BadRequest(_)));
}

#[tokio::test]
async fn cancellation_wins_over_a_stalled_collaborator() {
    let store = Arc::new(SpyStore::new());
    let p = Pipeline::new(
        Arc::new(StallingLlm),
        Arc::new(FixedEmbedder),
        store,
        PipelineSettings::default(),
    );
    let err = p
        .run_until_cancelled(question_history(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        })
        .await
        .expect_err("must cancel");
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn timeout_of_zero_disables_the_deadline() {
    let store = Arc::new(SpyStore::new());
    let llm = Arc::new(ScriptedLlm::new("<answer>no</answer>"));
    let outcome = pipeline(llm, store)
        .run_with_timeout(question_history(), Duration::ZERO)
        .await
        .expect("run");
    assert!(!outcome.answer.is_empty());
}
