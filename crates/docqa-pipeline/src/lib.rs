//! The question-answering pipeline: classify whether a question needs
//! retrieval, conditionally run hybrid retrieval, then synthesize an
//! answer grounded in the retrieved context.

pub mod classify;
pub mod keywords;
pub mod pipeline;
pub mod prompts;
pub mod synthesize;

pub use classify::{ClassifierStep, Verdict};
pub use pipeline::{Pipeline, RunOutcome, Step};
pub use synthesize::AnswerSynthesizer;
