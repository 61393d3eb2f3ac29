//! Prompt construction.
//!
//! The system prompt grounds the model in the literal database schema and
//! the conversation so far, and pins down the JSON reply contract the
//! response parser expects. The user prompt carries the latest inbound text.

use crate::types::ConversationState;

/// Builds the system/user prompt pair for one turn.
pub struct PromptBuilder {
    schema_ddl: String,
}

impl PromptBuilder {
    /// Create a builder around a fixed schema description.
    pub fn new(schema_ddl: impl Into<String>) -> Self {
        Self {
            schema_ddl: schema_ddl.into(),
        }
    }

    /// Schema description embedded in every system prompt.
    pub fn schema_ddl(&self) -> &str {
        &self.schema_ddl
    }

    /// Build the system prompt from the schema and the session history.
    pub fn system_prompt(&self, state: &ConversationState) -> String {
        let mut prompt = String::with_capacity(1024);

        prompt.push_str(
            "You are an expert database engineer. You write SQL for the following schema:\n\n",
        );
        prompt.push_str(&self.schema_ddl);
        prompt.push_str("\n\n");

        if !state.user_followups.is_empty() {
            prompt.push_str("Your conversation with the client so far:\n");
            for (user, assistant) in state
                .user_followups
                .iter()
                .zip(state.assistant_followups.iter())
            {
                prompt.push_str("client: ");
                prompt.push_str(user);
                prompt.push('\n');
                prompt.push_str("you: ");
                prompt.push_str(assistant);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt.push_str(
            "If you need more information you MUST ask the client for it. \
             If the client asks to insert data they MUST provide a value for every column; \
             the same applies to creating tables and to filtering reads. \
             Once you have sufficient information, produce the SQL.\n\n",
        );
        prompt.push_str(
            "Respond with a single JSON object and nothing else, in this format:\n\
             {\"response_type\": \"more_info\" or \"sql_queries\",\n \
             \"more_info_text\": \"your question for the client, when response_type is more_info\",\n \
             \"sql_queries\": [\"one SQL statement per entry, when response_type is sql_queries\"]}\n",
        );

        prompt
    }

    /// Build the user prompt from the latest inbound message.
    pub fn user_prompt(&self, user_text: &str) -> String {
        format!(
            "The client has communicated the following:\n\n{}\n\n\
             Check the rules above and make sure no additional information is \
             required from the client before generating SQL. Respond with the \
             JSON object now.",
            user_text
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
