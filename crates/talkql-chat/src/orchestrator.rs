//! Query orchestrator: drives one conversation turn end to end.
//!
//! Validates the inbound message, locks the session, builds the prompt pair,
//! makes exactly one LLM call, applies the parsed decision to the state, and
//! either returns the model's follow-up question or executes the final SQL
//! batch and clears the session.

use std::sync::Arc;

use uuid::Uuid;

use talkql_core::config::ChatConfig;
use talkql_db::SqlExecutor;
use talkql_llm::LlmClient;

use crate::error::ChatError;
use crate::parser;
use crate::prompt::PromptBuilder;
use crate::session::SessionStore;
use crate::types::{ParsedResponse, SessionSnapshot, TurnReply};

/// Central coordinator wiring prompt builder, LLM, parser, and executor.
pub struct QueryOrchestrator {
    llm: Arc<dyn LlmClient>,
    executor: Arc<dyn SqlExecutor>,
    prompts: PromptBuilder,
    sessions: SessionStore,
    max_message_len: usize,
}

impl QueryOrchestrator {
    /// Create a new orchestrator around the injected capabilities.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        executor: Arc<dyn SqlExecutor>,
        config: &ChatConfig,
        schema_ddl: &str,
    ) -> Self {
        Self {
            llm,
            executor,
            prompts: PromptBuilder::new(schema_ddl),
            sessions: SessionStore::new(config.session_timeout_minutes),
            max_message_len: config.max_message_len,
        }
    }

    /// Handle one inbound message.
    ///
    /// `session_id = None` starts a new query; `Some(id)` continues an
    /// existing one and fails with [`ChatError::SessionNotFound`] when the
    /// session is unknown or has expired.
    ///
    /// Exactly one LLM call happens per turn. On an LLM or parse failure the
    /// session survives so the user can retry the turn; on a SQL failure the
    /// session is cleared (earlier statements of the batch stay committed
    /// and must not be re-driven).
    pub async fn handle_turn(
        &self,
        session_id: Option<Uuid>,
        user_text: &str,
    ) -> Result<TurnReply, ChatError> {
        let text = user_text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.len() > self.max_message_len {
            return Err(ChatError::MessageTooLong(self.max_message_len));
        }

        let (sid, handle) = self.sessions.get_or_create(session_id, text)?;
        // Held for the whole turn: serializes turns within this session.
        let mut state = handle.lock().await;
        state.touch();

        let system_prompt = self.prompts.system_prompt(&state);
        let user_prompt = self.prompts.user_prompt(text);

        let raw_reply = self
            .llm
            .generate(&system_prompt, &user_prompt)
            .await
            .map_err(ChatError::from)?;

        match parser::parse(&raw_reply)? {
            ParsedResponse::NeedsMoreInfo { followup_text } => {
                state.record_followup(text, &followup_text);
                tracing::info!(session_id = %sid, "model asked for more information");
                Ok(TurnReply {
                    session_id: sid,
                    message: followup_text,
                    completed: false,
                })
            }
            ParsedResponse::SqlReady { sql_statements } => {
                state.resolve(sql_statements.clone());
                tracing::info!(
                    session_id = %sid,
                    statements = sql_statements.len(),
                    "model produced final SQL"
                );

                let mut lines = Vec::with_capacity(sql_statements.len());
                for statement in &sql_statements {
                    match self.executor.execute(statement).await {
                        Ok(line) => lines.push(line),
                        Err(e) => {
                            drop(state);
                            self.sessions.reset(sid)?;
                            return Err(e.into());
                        }
                    }
                }

                drop(state);
                self.sessions.reset(sid)?;
                Ok(TurnReply {
                    session_id: sid,
                    message: lines.join("\n"),
                    completed: true,
                })
            }
        }
    }

    /// Read-only snapshot of a live session.
    pub async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, ChatError> {
        let handle = self.sessions.get(session_id)?;
        let state = handle.lock().await;
        Ok(SessionSnapshot {
            session_id,
            phase: state.phase().as_str().to_string(),
            followup_rounds: state.assistant_followups.len(),
            started_at: state.started_at,
            last_message_at: state.last_message_at,
        })
    }

    /// Explicitly cancel a session, discarding its state.
    pub fn cancel(&self, session_id: Uuid) -> Result<(), ChatError> {
        if self.sessions.reset(session_id)? {
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session_id))
        }
    }

    /// Number of in-progress sessions.
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
