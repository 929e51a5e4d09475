//! HTTP request handlers

use super::assets::{serve_spa, serve_static};
use super::types::{ErrorResponse, HistoryResponse, PagesResponse};
use super::AppState;
use crate::composer::{self, ComposeError, RawInput};
use crate::engine::{EngineError, Exchange};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the SPA
        .route("/", get(serve_spa))
        // Static assets (embedded or filesystem fallback)
        .route("/assets/*path", get(serve_static))
        // Configured page list
        .route("/api/pages", get(list_pages))
        // Thread history and message send
        .route(
            "/api/pages/:id/messages",
            get(get_history).post(send_message),
        )
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Pages
// ============================================================

async fn list_pages(State(state): State<AppState>) -> Json<PagesResponse> {
    Json(PagesResponse {
        pages: state.pages.all().to_vec(),
    })
}

// ============================================================
// Thread history
// ============================================================

async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    if state.pages.get(&id).is_none() {
        return Err(AppError::NotFound(format!("Unknown page: {id}")));
    }

    // Fail-soft: a store error comes back as an empty thread
    let messages = state.engine.load_history(&id).await;
    Ok(Json(HistoryResponse { messages }))
}

// ============================================================
// Message send
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<RawInput>,
) -> Result<Json<Exchange>, AppError> {
    let page = state
        .pages
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("Unknown page: {id}")))?
        .clone();

    let draft = composer::normalize(input).map_err(|e| match e {
        ComposeError::Empty => AppError::BadRequest("Empty message".to_string()),
        other => AppError::BadRequest(other.to_string()),
    })?;

    let exchange = state
        .engine
        .send(&page, draft)
        .await
        .map_err(|e| match e {
            EngineError::Busy => AppError::Conflict(e.to_string()),
        })?;

    Ok(Json(exchange))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("pagechat ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PageConfig, Pages};
    use crate::db::Database;
    use crate::engine::{ConversationEngine, DatabaseStore, RELAY_FAILURE_REPLY};
    use crate::relay::WebhookClient;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    fn router_for(webhook_url: &str) -> Router {
        let db = Database::open_in_memory().unwrap();
        let engine = ConversationEngine::new(DatabaseStore::new(db), WebhookClient::new());
        let pages = Pages::new(vec![PageConfig {
            id: "page1".to_string(),
            name: "الصفحة الأولى".to_string(),
            webhook_url: webhook_url.to_string(),
        }]);
        create_router(AppState::new(engine, pages))
    }

    /// Webhook endpoint answering one request with a fixed JSON body
    async fn webhook_replying(reply: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;

                let response = format!(
                    "HTTP/1.1 200 OK\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\
                     \r\n\
                     {}",
                    reply.len(),
                    reply
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{addr}/hook")
    }

    /// Webhook address that refuses connections
    async fn webhook_refusing() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/hook")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_page_listing() {
        let router = router_for("http://127.0.0.1:1/unused");
        let response = router.oneshot(get_request("/api/pages")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["pages"][0]["id"], "page1");
        assert_eq!(body["pages"][0]["name"], "الصفحة الأولى");
    }

    #[tokio::test]
    async fn test_history_starts_empty() {
        let router = router_for("http://127.0.0.1:1/unused");
        let response = router
            .oneshot(get_request("/api/pages/page1/messages"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["messages"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_unknown_page_is_not_found() {
        let router = router_for("http://127.0.0.1:1/unused");

        let response = router
            .clone()
            .oneshot(get_request("/api/pages/ghost/messages"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = router
            .oneshot(post_json(
                "/api/pages/ghost/messages",
                r#"{"type":"text","text":"hello"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_json(response).await["error"]
            .as_str()
            .unwrap()
            .contains("ghost"));
    }

    #[tokio::test]
    async fn test_whitespace_only_text_is_bad_request() {
        let router = router_for("http://127.0.0.1:1/unused");
        let response = router
            .oneshot(post_json(
                "/api/pages/page1/messages",
                r#"{"type":"text","text":"   \n  "}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Empty message");
    }

    #[tokio::test]
    async fn test_send_round_trip() {
        let url = webhook_replying(r#"{"type":"text","content":"hi back"}"#).await;
        let router = router_for(&url);

        let response = router
            .clone()
            .oneshot(post_json(
                "/api/pages/page1/messages",
                r#"{"type":"text","text":"hello"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let exchange = body_json(response).await;
        assert_eq!(exchange["user"]["content"], "hello");
        assert_eq!(exchange["user"]["sender"], "user");
        assert_eq!(exchange["bot"]["content"], "hi back");
        assert_eq!(exchange["bot"]["sender"], "bot");

        // Both ends of the exchange were persisted
        let response = router
            .oneshot(get_request("/api/pages/page1/messages"))
            .await
            .unwrap();
        let history = body_json(response).await;
        assert_eq!(history["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_webhook_yields_canned_reply() {
        let url = webhook_refusing().await;
        let router = router_for(&url);

        let response = router
            .oneshot(post_json(
                "/api/pages/page1/messages",
                r#"{"type":"text","text":"hello"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let exchange = body_json(response).await;
        assert_eq!(exchange["user"]["content"], "hello");
        assert_eq!(exchange["bot"]["content"], RELAY_FAILURE_REPLY);
    }

    #[tokio::test]
    async fn test_send_while_busy_conflicts() {
        // A webhook that accepts the connection and never answers keeps the
        // first send in flight
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());
        let router = router_for(&url);

        let stalled = {
            let router = router.clone();
            tokio::spawn(async move {
                router
                    .oneshot(post_json(
                        "/api/pages/page1/messages",
                        r#"{"type":"text","text":"first"}"#,
                    ))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let response = router
            .oneshot(post_json(
                "/api/pages/page1/messages",
                r#"{"type":"text","text":"second"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        stalled.abort();
    }
}
