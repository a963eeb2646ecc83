//! System prompts for the two completion calls.

/// Classification instruction. The contract with the model is a
/// strict two-valued sentinel so the routing decision stays parseable.
pub const CHECK_QUESTION: &str = "\
You decide whether answering a question requires looking up supporting \
documents from an indexed document collection.

Reply with exactly one of the two markers and nothing else:
<answer>yes</answer> if the question needs document context to answer well.
<answer>no</answer> if the question can be answered directly.";

/// Grounded-answer instruction; `{context}` carries the formatted
/// document blocks.
pub fn rag_answer(context: &str) -> String {
    format!(
        "\
Answer the question using only the documents below. Cite the source \
and page of every document you rely on. If the documents do not \
contain the answer, say so.

# Context:
{context}"
    )
}

/// Fixed reply for the pass-through branch when the classifier
/// produced no usable direct answer.
pub const NO_CONTEXT_REPLY: &str =
    "I could not determine an answer for this question without document context.";

pub fn question_turn(question: &str) -> String {
    format!("# Question: {question}")
}
