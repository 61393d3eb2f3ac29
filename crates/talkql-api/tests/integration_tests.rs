//! Integration tests for the TalkQL API.
//!
//! Each test builds its own router around a scripted LLM and a real
//! in-memory SQLite executor, then drives it with `tower::ServiceExt`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use talkql_api::{create_router, AppState};
use talkql_chat::QueryOrchestrator;
use talkql_core::config::ChatConfig;
use talkql_db::{Database, SqlExecutor, SqliteExecutor};
use talkql_llm::{LlmClient, LlmError};

// =============================================================================
// Helpers
// =============================================================================

const TEST_TOKEN: &str = "test-token-12345";

const SCHEMA: &str = "CREATE TABLE student (roll_no INTEGER PRIMARY KEY, s_name VARCHAR(30));";

/// LLM that replays scripted replies.
struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        })
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, _system_prompt: &str, _user_text: &str) -> Result<String, LlmError> {
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(msg)) => Err(LlmError::Unavailable(msg)),
            None => Err(LlmError::Unavailable("script exhausted".to_string())),
        }
    }
}

/// Build an app around scripted LLM replies and a seeded in-memory database.
async fn make_app(replies: Vec<Result<&str, &str>>) -> axum::Router {
    let executor = Arc::new(SqliteExecutor::new(Arc::new(Database::in_memory().unwrap())));

    // Seed the student table the schema describes.
    executor
        .execute("CREATE TABLE student (roll_no INTEGER PRIMARY KEY, s_name VARCHAR(30))")
        .await
        .unwrap();
    executor
        .execute("INSERT INTO student (roll_no, s_name) VALUES (1, 'Alice'), (2, 'Bob')")
        .await
        .unwrap();

    let orchestrator = Arc::new(QueryOrchestrator::new(
        ScriptedLlm::new(replies),
        executor,
        &ChatConfig::default(),
        SCHEMA,
    ));

    create_router(AppState::new(orchestrator, TEST_TOKEN))
}

fn authed_post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn authed_get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap()
}

fn authed_delete(uri: &str) -> Request<Body> {
    Request::delete(uri)
        .header("authorization", format!("Bearer {}", TEST_TOKEN))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_health_requires_no_auth() {
    let app = make_app(vec![]).await;
    let resp = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["active_sessions"], 0);
}

#[tokio::test]
async fn test_query_without_auth_is_rejected() {
    let app = make_app(vec![]).await;
    let resp = app
        .oneshot(
            Request::post("/query")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text": "show all students"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_query_with_wrong_token_is_rejected() {
    let app = make_app(vec![]).await;
    let resp = app
        .oneshot(
            Request::post("/query")
                .header("authorization", "Bearer wrong-token")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"text": "show all students"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// End-to-end: direct resolution
// =============================================================================

#[tokio::test]
async fn test_query_resolves_and_returns_formatted_rows() {
    let app = make_app(vec![Ok(
        r#"{"response_type":"sql_queries","sql_queries":["SELECT roll_no, s_name FROM student ORDER BY roll_no"]}"#,
    )])
    .await;

    let resp = app
        .oneshot(authed_post_json("/query", r#"{"text": "Show all students"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["reply"], "roll_no s_name\n1 Alice\n2 Bob");
    assert_eq!(json["completed"], true);
}

#[tokio::test]
async fn test_completed_session_is_gone() {
    let app = make_app(vec![Ok(
        r#"{"response_type":"sql_queries","sql_queries":["SELECT roll_no FROM student"]}"#,
    )])
    .await;

    let resp = app
        .clone()
        .oneshot(authed_post_json("/query", r#"{"text": "Show all students"}"#))
        .await
        .unwrap();
    let json = body_json(resp).await;
    let session_id = json["session_id"].as_str().unwrap().to_string();

    let resp = app
        .oneshot(authed_get(&format!("/sessions/{}", session_id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_select_reports_no_rows() {
    let app = make_app(vec![Ok(
        r#"{"response_type":"sql_queries","sql_queries":["SELECT roll_no FROM student WHERE roll_no > 99"]}"#,
    )])
    .await;

    let resp = app
        .oneshot(authed_post_json("/query", r#"{"text": "any seniors?"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = body_json(resp).await;
    assert_eq!(json["reply"], "no rows returned");
}

// =============================================================================
// End-to-end: clarification flow
// =============================================================================

#[tokio::test]
async fn test_followup_round_trip() {
    let app = make_app(vec![
        Ok(r#"{"response_type":"more_info","more_info_text":"Please provide roll_no, name, address, contact number"}"#),
        Ok(r#"{"response_type":"sql_queries","sql_queries":["INSERT INTO student (roll_no, s_name) VALUES (3, 'Cara')"]}"#),
    ])
    .await;

    // Turn 1: the model wants more information.
    let resp = app
        .clone()
        .oneshot(authed_post_json("/query", r#"{"text": "Add a student"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(
        json["reply"],
        "Please provide roll_no, name, address, contact number"
    );
    assert_eq!(json["completed"], false);
    let session_id = json["session_id"].as_str().unwrap().to_string();

    // The session is visible and gathering.
    let resp = app
        .clone()
        .oneshot(authed_get(&format!("/sessions/{}", session_id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["phase"], "gathering");
    assert_eq!(json["followup_rounds"], 1);

    // Turn 2: details provided, SQL executes.
    let resp = app
        .oneshot(authed_post_json(
            &format!("/sessions/{}/messages", session_id),
            r#"{"text": "roll 3, name Cara"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["reply"], "successfully inserted 1 row(s)");
    assert_eq!(json["completed"], true);
}

#[tokio::test]
async fn test_continue_unknown_session_is_not_found() {
    let app = make_app(vec![]).await;
    let resp = app
        .oneshot(authed_post_json(
            &format!("/sessions/{}/messages", Uuid::new_v4()),
            r#"{"text": "hello"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cancel_session() {
    let app = make_app(vec![Ok(
        r#"{"response_type":"more_info","more_info_text":"Which table?"}"#,
    )])
    .await;

    let resp = app
        .clone()
        .oneshot(authed_post_json("/query", r#"{"text": "delete stuff"}"#))
        .await
        .unwrap();
    let json = body_json(resp).await;
    let session_id = json["session_id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(authed_delete(&format!("/sessions/{}", session_id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["cancelled"], true);

    // Cancelled session no longer exists.
    let resp = app
        .oneshot(authed_get(&format!("/sessions/{}", session_id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Failure mapping
// =============================================================================

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let app = make_app(vec![]).await;
    let resp = app
        .oneshot(authed_post_json("/query", r#"{"text": "   "}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let json = body_json(resp).await;
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_llm_outage_is_service_unavailable() {
    let app = make_app(vec![Err("connection refused")]).await;
    let resp = app
        .oneshot(authed_post_json("/query", r#"{"text": "Show all students"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(resp).await;
    assert_eq!(json["error"], "service_unavailable");
    assert!(json["message"].as_str().unwrap().contains("unchanged"));
}

#[tokio::test]
async fn test_malformed_model_reply_prompts_retry() {
    let app = make_app(vec![Ok("I would rather chat about the weather.")]).await;
    let resp = app
        .oneshot(authed_post_json("/query", r#"{"text": "Show all students"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(resp).await;
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("send your request again"));
}

#[tokio::test]
async fn test_bad_sql_is_unprocessable_and_names_statement() {
    let app = make_app(vec![Ok(
        r#"{"response_type":"sql_queries","sql_queries":["SELECT * FROM no_such_table"]}"#,
    )])
    .await;

    let resp = app
        .oneshot(authed_post_json("/query", r#"{"text": "Show the void"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(resp).await;
    let message = json["message"].as_str().unwrap();
    assert!(message.contains("no_such_table"));
    assert!(message.contains("start a new query"));
}

#[tokio::test]
async fn test_partial_batch_commits_before_failure() {
    // First statement commits, second fails: documented non-transactional
    // batch behavior. The insert must be visible afterwards.
    let app = make_app(vec![
        Ok(r#"{"response_type":"sql_queries","sql_queries":["INSERT INTO student (roll_no, s_name) VALUES (9, 'Zed')","SELECT * FROM no_such_table"]}"#),
        Ok(r#"{"response_type":"sql_queries","sql_queries":["SELECT roll_no, s_name FROM student WHERE roll_no = 9"]}"#),
    ])
    .await;

    let resp = app
        .clone()
        .oneshot(authed_post_json("/query", r#"{"text": "add Zed and explode"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = app
        .oneshot(authed_post_json("/query", r#"{"text": "is Zed there?"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["reply"], "roll_no s_name\n9 Zed");
}
