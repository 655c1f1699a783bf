//! Per-user chat session state
//!
//! A [`ChatSession`] is created by the caller, passed into every ingest and
//! query call, and dropped when the user leaves. Nothing about it is global.

use serde::{Deserialize, Serialize};

/// One question and the answer shown for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
    /// The answer is an error message rather than model output
    #[serde(default)]
    pub is_error: bool,
}

/// Whether answers are grounded in the indexed document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Retrieve from the index and fail when none exists
    #[default]
    WithContext,
    /// Ask the model directly, never touching the index
    WithoutContext,
}

impl AnswerMode {
    /// Parse from string
    pub fn from_str(s: &str) -> Option<AnswerMode> {
        match s.to_lowercase().as_str() {
            "context" | "with_context" | "rag" => Some(AnswerMode::WithContext),
            "plain" | "without_context" | "no_context" => Some(AnswerMode::WithoutContext),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerMode::WithContext => write!(f, "with context"),
            AnswerMode::WithoutContext => write!(f, "without context"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexState {
    #[default]
    NoIndex,
    Indexed,
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    mode: AnswerMode,
    memory: bool,
    index_state: IndexState,
    turns: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new(mode: AnswerMode, memory: bool) -> Self {
        Self {
            mode,
            memory,
            index_state: IndexState::NoIndex,
            turns: Vec::new(),
        }
    }

    pub fn mode(&self) -> AnswerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: AnswerMode) {
        self.mode = mode;
    }

    pub fn memory_enabled(&self) -> bool {
        self.memory
    }

    pub fn set_memory(&mut self, enabled: bool) {
        self.memory = enabled;
    }

    pub fn index_state(&self) -> IndexState {
        self.index_state
    }

    pub fn mark_indexed(&mut self) {
        self.index_state = IndexState::Indexed;
    }

    pub fn mark_no_index(&mut self) {
        self.index_state = IndexState::NoIndex;
    }

    /// Drop the conversation and the index marker ahead of a new ingest.
    pub fn begin_ingest(&mut self) {
        self.turns.clear();
        self.index_state = IndexState::NoIndex;
    }

    /// Full transcript, including turns whose answer was an error message
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Turns to feed back into the prompt; empty unless memory is on.
    /// Error turns stay in the transcript but never reach the model.
    pub fn prompt_history(&self) -> Vec<ConversationTurn> {
        if !self.memory {
            return Vec::new();
        }
        self.turns.iter().filter(|t| !t.is_error).cloned().collect()
    }

    pub fn record_turn(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.push_turn(question.into(), answer.into(), false);
    }

    pub fn record_error_turn(&mut self, question: impl Into<String>, message: impl Into<String>) {
        self.push_turn(question.into(), message.into(), true);
    }

    fn push_turn(&mut self, question: String, answer: String, is_error: bool) {
        self.turns.push(ConversationTurn {
            question,
            answer,
            is_error,
        });
    }

    pub fn clear_history(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_only_in_prompt_with_memory() {
        let mut session = ChatSession::new(AnswerMode::WithContext, false);
        session.record_turn("q1", "a1");
        assert_eq!(session.turns().len(), 1);
        assert!(session.prompt_history().is_empty());

        session.set_memory(true);
        assert_eq!(session.prompt_history().len(), 1);
    }

    #[test]
    fn test_error_turns_kept_out_of_prompt() {
        let mut session = ChatSession::new(AnswerMode::WithContext, true);
        session.record_error_turn("q1", "⚠️ No document has been indexed yet.");
        session.record_turn("q2", "a2");

        assert_eq!(session.turns().len(), 2);
        assert!(session.turns()[0].is_error);
        let history = session.prompt_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "q2");
    }

    #[test]
    fn test_begin_ingest_resets_state() {
        let mut session = ChatSession::new(AnswerMode::WithContext, true);
        session.mark_indexed();
        session.record_turn("q1", "a1");

        session.begin_ingest();
        assert_eq!(session.index_state(), IndexState::NoIndex);
        assert!(session.turns().is_empty());
        assert_eq!(session.mode(), AnswerMode::WithContext);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(AnswerMode::from_str("plain"), Some(AnswerMode::WithoutContext));
        assert_eq!(AnswerMode::from_str("Context"), Some(AnswerMode::WithContext));
        assert_eq!(AnswerMode::from_str("maybe"), None);
    }
}
