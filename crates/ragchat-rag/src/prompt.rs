//! Prompt assembly

use ragchat_core::{ConversationTurn, SearchHit};

pub const CONTEXT_INSTRUCTION: &str = "Use the following context to answer the question. \
If the answer is not in the context, say that you don't know.";

pub const PLAIN_INSTRUCTION: &str = "Answer the following question concisely.";

/// Join retrieved chunk texts, closest first.
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.text.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render the prompt sent to the model.
///
/// With `context` the model is told to answer from it; without, the question
/// goes out with a plain instruction. Earlier turns appear only when given.
pub fn build_prompt(context: Option<&str>, history: &[ConversationTurn], question: &str) -> String {
    let mut prompt = String::new();

    match context {
        Some(context) => {
            prompt.push_str(CONTEXT_INSTRUCTION);
            prompt.push_str("\n\nContext:\n");
            prompt.push_str(context);
            prompt.push_str("\n\n");
        }
        None => {
            prompt.push_str(PLAIN_INSTRUCTION);
            prompt.push_str("\n\n");
        }
    }

    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in history {
            prompt.push_str(&format!("User: {}\nAssistant: {}\n", turn.question, turn.answer));
        }
        prompt.push('\n');
    }

    prompt.push_str("Question:\n");
    prompt.push_str(question.trim());
    prompt.push_str("\n\nAnswer:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use ragchat_core::Chunk;

    fn hit(text: &str, distance: f32) -> SearchHit {
        SearchHit {
            chunk: Chunk {
                id: "id".to_string(),
                text: text.to_string(),
                source: "doc.txt".to_string(),
                page: 1,
                index: 0,
            },
            distance,
        }
    }

    #[test]
    fn test_context_prompt() {
        let context = build_context(&[
            hit(" Paris is the capital of France. ", 0.1),
            hit("France is in Europe.", 0.4),
        ]);
        let prompt = build_prompt(Some(&context), &[], "What is the capital of France?");

        assert_snapshot!(prompt, @r###"
        Use the following context to answer the question. If the answer is not in the context, say that you don't know.

        Context:
        Paris is the capital of France.

        France is in Europe.

        Question:
        What is the capital of France?

        Answer:
        "###);
    }

    #[test]
    fn test_plain_prompt_with_history() {
        let history = vec![ConversationTurn {
            question: "Hi".to_string(),
            answer: "Hello!".to_string(),
            is_error: false,
        }];
        let prompt = build_prompt(None, &history, "Name a colour");

        assert_snapshot!(prompt, @r###"
        Answer the following question concisely.

        Conversation so far:
        User: Hi
        Assistant: Hello!

        Question:
        Name a colour

        Answer:
        "###);
    }
}
