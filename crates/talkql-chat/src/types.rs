//! Core conversation types.

use chrono::Local;
use serde::Serialize;
use uuid::Uuid;

// =============================================================================
// ConversationState
// =============================================================================

/// Which stage a conversation is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Still collecting information from the user.
    Gathering,
    /// The model has produced final SQL, pending execution.
    Resolved,
}

impl Phase {
    /// Stable lowercase name for API responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Gathering => "gathering",
            Phase::Resolved => "resolved",
        }
    }
}

/// Per-session accumulator of the conversation so far.
///
/// After each completed turn the state is in exactly one phase: gathering
/// (`pending_sql` absent) or resolved (`pending_sql` present). The follow-up
/// vectors grow in lockstep: `user_followups[i]` is the user message that
/// prompted `assistant_followups[i]`.
#[derive(Debug, Clone)]
pub struct ConversationState {
    /// First user utterance of the session.
    pub original_query: String,
    /// Later clarifications from the user.
    pub user_followups: Vec<String>,
    /// Prior "need more info" prompts from the assistant.
    pub assistant_followups: Vec<String>,
    /// Final SQL payload, set once the model signals completion.
    pub pending_sql: Option<Vec<String>>,
    /// Session creation time, epoch seconds.
    pub started_at: i64,
    /// Last inbound message time, epoch seconds.
    pub last_message_at: i64,
}

impl ConversationState {
    /// Create a fresh gathering-phase state for a session's first message.
    pub fn new(original_query: &str) -> Self {
        let now = Local::now().timestamp();
        Self {
            original_query: original_query.to_string(),
            user_followups: Vec::new(),
            assistant_followups: Vec::new(),
            pending_sql: None,
            started_at: now,
            last_message_at: now,
        }
    }

    /// Current phase, derived from the pending payload.
    pub fn phase(&self) -> Phase {
        if self.pending_sql.is_some() {
            Phase::Resolved
        } else {
            Phase::Gathering
        }
    }

    /// Record one ask-for-more exchange; the state stays in gathering phase.
    pub fn record_followup(&mut self, user_text: &str, assistant_text: &str) {
        self.user_followups.push(user_text.to_string());
        self.assistant_followups.push(assistant_text.to_string());
    }

    /// Attach the final SQL payload, moving the state to resolved phase.
    pub fn resolve(&mut self, sql_statements: Vec<String>) {
        self.pending_sql = Some(sql_statements);
    }

    /// Refresh the last-activity timestamp.
    pub fn touch(&mut self) {
        self.last_message_at = Local::now().timestamp();
    }
}

// =============================================================================
// ParsedResponse
// =============================================================================

/// Structured decision extracted from one raw LLM reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedResponse {
    /// The model needs another round of clarification from the user.
    NeedsMoreInfo { followup_text: String },
    /// The model produced final SQL, ready to execute in list order.
    SqlReady { sql_statements: Vec<String> },
}

// =============================================================================
// Turn output
// =============================================================================

/// Outcome of one inbound-message → outbound-message cycle.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    /// Session the turn belongs to (new or existing).
    pub session_id: Uuid,
    /// Text to send back to the user.
    pub message: String,
    /// True when SQL was executed and the session was cleared.
    pub completed: bool,
}

/// Read-only view of a session for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    /// "gathering" or "resolved".
    pub phase: String,
    /// Number of clarification rounds so far.
    pub followup_rounds: usize,
    pub started_at: i64,
    pub last_message_at: i64,
}

// =============================================================================
// Tests
// =============================================================================
