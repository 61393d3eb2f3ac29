//! Response parser: raw model text → structured decision.
//!
//! The wire format is a JSON object with a `response_type` discriminator
//! (`"more_info"` | `"sql_queries"`) and a kind-specific payload field.
//! Model output is adversarial: the object may arrive wrapped in prose or
//! Markdown fences, so the parser isolates the outermost JSON object first
//! and then decodes strictly. Field extraction is structured decoding only;
//! regex scraping breaks on nested quotes and escapes.

use serde::Deserialize;

use crate::error::ChatError;
use crate::types::ParsedResponse;

/// Raw shape of the model reply before validation.
///
/// Every field is optional here so that missing-field errors are reported
/// precisely instead of as a generic deserialization failure.
#[derive(Debug, Deserialize)]
struct RawResponse {
    response_type: Option<String>,
    more_info_text: Option<String>,
    sql_queries: Option<Vec<String>>,
}

/// Parse one raw LLM reply into a [`ParsedResponse`].
///
/// Fails with [`ChatError::MalformedResponse`] when the discriminator is
/// missing or unrecognized, or when the field its kind requires is missing,
/// empty, or wrongly shaped.
pub fn parse(raw_text: &str) -> Result<ParsedResponse, ChatError> {
    let json = isolate_json_object(raw_text)?;
    let raw: RawResponse = serde_json::from_str(json)
        .map_err(|e| ChatError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    match raw.response_type.as_deref() {
        Some("more_info") => {
            let followup_text = raw
                .more_info_text
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    ChatError::MalformedResponse(
                        "more_info response without more_info_text".to_string(),
                    )
                })?;
            Ok(ParsedResponse::NeedsMoreInfo { followup_text })
        }
        Some("sql_queries") => {
            let sql_statements: Vec<String> = raw
                .sql_queries
                .ok_or_else(|| {
                    ChatError::MalformedResponse(
                        "sql_queries response without sql_queries list".to_string(),
                    )
                })?
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            if sql_statements.is_empty() {
                return Err(ChatError::MalformedResponse(
                    "sql_queries list is empty".to_string(),
                ));
            }
            Ok(ParsedResponse::SqlReady { sql_statements })
        }
        Some(other) => Err(ChatError::MalformedResponse(format!(
            "unknown response_type: {}",
            other
        ))),
        None => Err(ChatError::MalformedResponse(
            "missing response_type field".to_string(),
        )),
    }
}

/// Slice out the outermost `{ ... }` of the reply.
///
/// Tolerates prose and code fences around the object; the content between
/// the first `{` and the last `}` must still be valid JSON.
fn isolate_json_object(raw_text: &str) -> Result<&str, ChatError> {
    let start = raw_text
        .find('{')
        .ok_or_else(|| ChatError::MalformedResponse("no JSON object in response".to_string()))?;
    let end = raw_text
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| ChatError::MalformedResponse("no JSON object in response".to_string()))?;
    Ok(&raw_text[start..=end])
}

// =============================================================================
// Tests
// =============================================================================
