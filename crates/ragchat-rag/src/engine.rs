//! Question answering over the stored index

use std::sync::Arc;
use tracing::{debug, info, warn};

use ragchat_core::{
    AnswerMode, ChatSession, ConversationTurn, EmbeddingProvider, Error, GenerationConfig,
    LLMProvider, Result, SearchHit, TokenSink, strip_prompt_echo,
};

use crate::config::RagConfig;
use crate::prompt::{build_context, build_prompt};
use crate::store::IndexStore;

/// Generated answer and the chunks it was grounded on
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<SearchHit>,
}

/// What a chat front end shows for one question. Failures become text.
#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    pub sources: Vec<SearchHit>,
    pub is_error: bool,
}

pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LLMProvider>,
    store: IndexStore,
    top_k: usize,
    generation: GenerationConfig,
}

impl QueryEngine {
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LLMProvider>,
    ) -> Self {
        let generation = GenerationConfig {
            model_id: llm.model_id().to_string(),
            ..Default::default()
        };
        Self {
            embedder,
            llm,
            store: IndexStore::new(config.index_dir.clone()),
            top_k: config.top_k,
            generation,
        }
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Nearest chunks to `question` in the stored index.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>> {
        let index = self.store.load()?;

        let indexed = &index.manifest().embedding_model;
        let active = self.embedder.model_id();
        if indexed != active {
            return Err(Error::EmbeddingModelMismatch {
                indexed: indexed.clone(),
                active: active.to_string(),
            });
        }

        let query = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| passthrough_or(e, Error::RetrievalFailure))?;
        let hits = index.search(&query, self.top_k)?;
        debug!(hits = hits.len(), "retrieved context");

        Ok(hits)
    }

    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
        mode: AnswerMode,
    ) -> Result<Answer> {
        self.run(question, history, mode, None).await
    }

    /// Like [`answer`](Self::answer), handing tokens to `on_token` as they arrive.
    pub async fn answer_streaming(
        &self,
        question: &str,
        history: &[ConversationTurn],
        mode: AnswerMode,
        on_token: TokenSink<'_>,
    ) -> Result<Answer> {
        self.run(question, history, mode, Some(on_token)).await
    }

    /// Answer inside a chat session and record the turn.
    ///
    /// Errors never escape: they are rendered as the reply text and stored in
    /// the transcript as error turns, which memory mode leaves out of later
    /// prompts.
    pub async fn respond(
        &self,
        session: &mut ChatSession,
        question: &str,
        on_token: Option<TokenSink<'_>>,
    ) -> Reply {
        let history = session.prompt_history();
        let result = self.run(question, &history, session.mode(), on_token).await;

        let reply = match result {
            Ok(answer) => Reply {
                text: answer.text,
                sources: answer.sources,
                is_error: false,
            },
            Err(e) => {
                warn!(error = %e, "question failed");
                Reply {
                    text: e.user_message(),
                    sources: Vec::new(),
                    is_error: true,
                }
            }
        };

        if reply.is_error {
            session.record_error_turn(question, reply.text.clone());
        } else {
            session.record_turn(question, reply.text.clone());
        }
        reply
    }

    async fn run(
        &self,
        question: &str,
        history: &[ConversationTurn],
        mode: AnswerMode,
        on_token: Option<TokenSink<'_>>,
    ) -> Result<Answer> {
        let (prompt, sources) = match mode {
            AnswerMode::WithContext => {
                let hits = self.retrieve(question).await?;
                let context = build_context(&hits);
                (build_prompt(Some(&context), history, question), hits)
            }
            AnswerMode::WithoutContext => (build_prompt(None, history, question), Vec::new()),
        };

        info!(mode = %mode, chunks = sources.len(), history = history.len(), "generating answer");

        let result = match on_token {
            Some(sink) => self.llm.generate_stream(&prompt, &self.generation, sink).await,
            None => self.llm.generate_with_config(&prompt, &self.generation).await,
        }
        .map_err(|e| passthrough_or(e, Error::GenerationFailure))?;

        let text = strip_prompt_echo(&prompt, &result.text);
        if text.is_empty() {
            return Err(Error::GenerationFailure("model returned an empty answer".to_string()));
        }

        Ok(Answer { text, sources })
    }
}

/// Keep remote and credential errors as they are; wrap anything else.
fn passthrough_or(e: Error, wrap: fn(String) -> Error) -> Error {
    match e {
        Error::RemoteApi { .. } | Error::MissingCredentials(_) | Error::Timeout(_) => e,
        Error::GenerationFailure(_) | Error::RetrievalFailure(_) => e,
        other => wrap(other.to_string()),
    }
}
