pub mod auth;
pub mod users;
pub mod state;
pub mod middleware;

pub use state::AppState;
pub use middleware::CurrentUser;

use axum::{
    Router,
    routing::{get, post},
    middleware as axum_middleware,
};
use tower_http::{
    cors::CorsLayer,
    trace::TraceLayer,
    timeout::TimeoutLayer,
};
use std::time::Duration;
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    // Everything under /users needs a valid bearer token
    let protected = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/:username", get(users::get_user))
        .route("/users/:username/from", get(users::messages_from))
        .route("/users/:username/to", get(users::messages_to))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        // Health check
        .route("/health", get(health))

        // Authentication endpoints
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))

        .merge(protected)

        // Add request timeout
        .layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::test_pool;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn test_app() -> (Router, AppState) {
        let config = Config {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: "sqlite::memory:".to_string(),
            secret_key: "test-secret".to_string(),
            hash_work_factor: 1,
            db_max_connections: 1,
            db_min_connections: 1,
            request_timeout_secs: 30,
        };
        let state = AppState::new(test_pool().await, Arc::new(config)).unwrap();
        (create_router(state.clone()), state)
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn alice() -> Value {
        json!({
            "username": "alice",
            "password": "secret1",
            "first_name": "A",
            "last_name": "B",
            "phone": "555",
        })
    }

    async fn register(app: &Router, body: Value) -> String {
        let (status, body) = call(app, post_json("/auth/register", body)).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app().await;
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (app, state) = test_app().await;
        let token = register(&app, alice()).await;
        assert_eq!(state.sessions.decode(&token).unwrap().username, "alice");

        let (status, body) = call(
            &app,
            post_json("/auth/login", json!({"username": "alice", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap();
        assert_eq!(state.sessions.decode(token).unwrap().username, "alice");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (app, _) = test_app().await;
        register(&app, alice()).await;

        let (status, body) = call(
            &app,
            post_json("/auth/login", json!({"username": "alice", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"message": "Invalid user/password", "status": 400}));
    }

    #[tokio::test]
    async fn test_login_unknown_user_looks_like_wrong_password() {
        let (app, _) = test_app().await;

        let (status, body) = call(
            &app,
            post_json("/auth/login", json!({"username": "nobody", "password": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid user/password");
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let (app, _) = test_app().await;

        let (status, body) = call(&app, post_json("/auth/login", json!({"username": "alice"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields: password");
    }

    #[tokio::test]
    async fn test_login_updates_timestamp() {
        let (app, state) = test_app().await;
        register(&app, alice()).await;
        let before = crate::db::UserRepository::get(&state.db, "alice").await.unwrap();

        call(
            &app,
            post_json("/auth/login", json!({"username": "alice", "password": "secret1"})),
        )
        .await;

        let after = crate::db::UserRepository::get(&state.db, "alice").await.unwrap();
        assert!(after.last_login_at > before.last_login_at);
        assert_eq!(after.join_at, before.join_at);
    }

    #[tokio::test]
    async fn test_register_duplicate() {
        let (app, _) = test_app().await;
        register(&app, alice()).await;

        let (status, body) = call(&app, post_json("/auth/register", alice())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_register_malformed() {
        let (app, _) = test_app().await;

        let mut extra = alice();
        extra["is_admin"] = json!(true);
        let (status, _) = call(&app, post_json("/auth/register", extra)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, post_json("/auth/register", json!({"username": "bob"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut blank = alice();
        blank["phone"] = json!("");
        let (status, body) = call(&app, post_json("/auth/register", blank)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields: phone");
    }

    #[tokio::test]
    async fn test_users_require_token() {
        let (app, _) = test_app().await;

        let request = Request::get("/users").body(Body::empty()).unwrap();
        let (status, body) = call(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);

        let (status, _) = call(&app, get_with_token("/users", "not-a-token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_and_get_users() {
        let (app, _) = test_app().await;
        let token = register(&app, alice()).await;

        let (status, body) = call(&app, get_with_token("/users", &token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["users"],
            json!([{"username": "alice", "first_name": "A", "last_name": "B", "phone": "555"}])
        );

        let (status, body) = call(&app, get_with_token("/users/alice", &token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["username"], "alice");
        assert!(body["user"]["join_at"].is_i64());
        assert!(body["user"].get("password").is_none());

        let (status, _) = call(&app, get_with_token("/users/ghost", &token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_message_routes() {
        let (app, state) = test_app().await;
        let alice_token = register(&app, alice()).await;
        let mut bob = alice();
        bob["username"] = json!("bob");
        let bob_token = register(&app, bob).await;

        sqlx::query(
            "INSERT INTO messages (from_username, to_username, body, sent_at) VALUES ('alice', 'bob', 'hi bob', 1)",
        )
        .execute(&state.db)
        .await
        .unwrap();

        let (status, body) = call(&app, get_with_token("/users/alice/from", &alice_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][0]["body"], "hi bob");
        assert_eq!(body["messages"][0]["to_user"]["username"], "bob");

        let (status, body) = call(&app, get_with_token("/users/bob/to", &bob_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][0]["from_user"]["username"], "alice");

        let (status, body) = call(&app, get_with_token("/users/bob/from", &bob_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"], json!([]));

        // Only the owner may read their mailbox
        let (status, _) = call(&app, get_with_token("/users/bob/to", &alice_token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
