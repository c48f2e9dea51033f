//! API integration tests.
//!
//! These drive the full router, auth middleware included, against an
//! in-memory database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    response::Response,
};
use serde_json::{Value, json};
use talentshow_api::{AppState, auth_middleware, router as api_router};
use talentshow_common::config::{
    AdminConfig, AdminToken, Config, DatabaseConfig, ServerConfig, ShowConfig,
};
use talentshow_core::{
    ActService, ChangeFeedService, CommentService, LiveQueryService, LocalChangeFeed, LogDelivery,
    NotificationService, RetryPolicy, SeedService, TriviaService, VotingService,
};
use talentshow_db::repositories::{
    ActRepository, CommentRepository, NotificationRepository, TriviaRepository, VoteRepository,
};
use talentshow_db::test_utils::TestDatabase;
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "test-admin-token";

/// Create a test configuration.
fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        redis: None,
        admin: AdminConfig {
            tokens: vec![AdminToken {
                email: "admin@school.example".to_string(),
                token: ADMIN_TOKEN.to_string(),
            }],
        },
        email: None,
        show: ShowConfig::default(),
    }
}

struct TestApp {
    _db: TestDatabase,
    router: Router,
}

async fn create_test_app() -> TestApp {
    let db = TestDatabase::new().await.unwrap();
    let feed: ChangeFeedService = Arc::new(LocalChangeFeed::default());

    let act_repo = ActRepository::new(db.connection());
    let comment_repo = CommentRepository::new(db.connection());
    let trivia_repo = TriviaRepository::new(db.connection());

    let notification_service = NotificationService::new(
        NotificationRepository::new(db.connection()),
        Arc::new(LogDelivery),
        feed.clone(),
    );
    let act_service = ActService::new(
        act_repo.clone(),
        notification_service.clone(),
        feed.clone(),
        RetryPolicy::none(),
    );
    let trivia_service = TriviaService::new(trivia_repo.clone(), feed.clone());

    let state = AppState {
        config: Arc::new(create_test_config()),
        voting_service: VotingService::new(
            VoteRepository::new(db.connection()),
            act_repo.clone(),
            feed.clone(),
            RetryPolicy::none(),
        ),
        comment_service: CommentService::new(comment_repo.clone(), act_repo.clone(), feed.clone()),
        seed_service: SeedService::new(act_service.clone(), trivia_service.clone()),
        live: LiveQueryService::new(act_repo, comment_repo, trivia_repo, feed, 8),
        act_service,
        trivia_service,
        notification_service,
    };

    let router = api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state);

    TestApp { _db: db, router }
}

impl TestApp {
    async fn call(&self, uri: &str, body: Value, token: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .uri(uri)
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.router
            .clone()
            .oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        into_json(self.call(uri, body, None).await).await
    }

    async fn admin(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        into_json(self.call(uri, body, Some(ADMIN_TOKEN)).await).await
    }
}

async fn into_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn live_act(app: &TestApp) -> String {
    let (status, created) = app
        .admin(
            "/acts/create",
            json!({"name": "Grade 3 Magic Show", "grade": "Grade 3"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["data"]["id"].as_str().unwrap().to_string();

    app.admin("/acts/activate", json!({"actId": id})).await;
    let (status, _) = app.admin("/acts/voting/open", json!({"actId": id})).await;
    assert_eq!(status, StatusCode::OK);
    id
}

#[tokio::test]
async fn test_list_acts_starts_empty() {
    let app = create_test_app().await;

    let (status, body) = app.post("/acts/list", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_admin_endpoint_requires_token() {
    let app = create_test_app().await;

    let (status, body) = app
        .post("/acts/create", json!({"name": "X", "grade": "Grade 1"}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let response = app
        .call(
            "/acts/create",
            json!({"name": "X", "grade": "Grade 1"}),
            Some("wrong-token"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_whoami_resolves_admin_email() {
    let app = create_test_app().await;
    let (status, body) = app.admin("/admin/whoami", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "admin@school.example");
}

#[tokio::test]
async fn test_register_then_approve() {
    let app = create_test_app().await;

    let (status, body) = app
        .post(
            "/acts/register",
            json!({
                "name": "Magic Show",
                "grade": "Grade 3",
                "submittedBy": "Jane Doe",
                "contactEmail": "jane@example.com"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["order"], 0);
    assert!(body["data"].get("contactEmail").is_none());
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (_, pending) = app
        .admin("/acts/by-status", json!({"status": "pending"}))
        .await;
    assert_eq!(pending["data"][0]["contactEmail"], "jane@example.com");

    let (status, approved) = app
        .admin("/acts/approve", json!({"actId": id, "order": 1}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(approved["data"]["status"], "approved");
    assert_eq!(approved["data"]["order"], 1);

    let (_, notifications) = app.admin("/notifications/list", json!({})).await;
    assert_eq!(notifications["data"][0]["type"], "approve");
}

#[tokio::test]
async fn test_register_validation_error() {
    let app = create_test_app().await;
    let (status, body) = app
        .post(
            "/acts/register",
            json!({"name": "", "grade": "Grade 3", "submittedBy": "Jane"}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_voting_flow() {
    let app = create_test_app().await;
    let id = live_act(&app).await;

    for (voter, rating) in [("d1", 5), ("d2", 4), ("d3", 3)] {
        let (status, _) = app
            .post(
                "/votes/cast",
                json!({"actId": id, "rating": rating, "voterId": voter}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, act) = app.post("/acts/show", json!({"actId": id})).await;
    assert_eq!(act["data"]["votesCount"], 3);
    assert_eq!(act["data"]["avgScore"], 4.0);

    let (status, duplicate) = app
        .post(
            "/votes/cast",
            json!({"actId": id, "rating": 1, "voterId": "d1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(duplicate["error"]["code"], "ALREADY_VOTED");
    assert_eq!(duplicate["error"]["details"]["rating"], 5);

    let (_, mine) = app
        .post("/votes/mine", json!({"actId": id, "voterId": "d2"}))
        .await;
    assert_eq!(mine["data"]["rating"], 4);

    app.admin("/acts/voting/close", json!({"actId": id})).await;
    let (status, closed) = app
        .post("/votes/cast", json!({"actId": id, "rating": 5}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(closed["error"]["code"], "VOTING_CLOSED");
}

#[tokio::test]
async fn test_vote_on_unknown_act() {
    let app = create_test_app().await;
    let (status, body) = app
        .post("/votes/cast", json!({"actId": "missing", "rating": 3}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_comment_moderation() {
    let app = create_test_app().await;
    let id = live_act(&app).await;

    let (status, submitted) = app
        .post("/comments/submit", json!({"actId": id, "emoji": "🎩"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["data"]["approved"], false);
    let comment_id = submitted["data"]["id"].as_str().unwrap().to_string();

    let (_, visible) = app.post("/comments/list", json!({"actId": id})).await;
    assert_eq!(visible["data"], json!([]));

    let (_, queue) = app.admin("/comments/pending", json!({})).await;
    assert_eq!(queue["data"][0]["id"], comment_id.as_str());

    app.admin("/comments/approve", json!({"commentId": comment_id}))
        .await;
    let (_, visible) = app.post("/comments/list", json!({"actId": id})).await;
    assert_eq!(visible["data"][0]["emoji"], "🎩");
}

#[tokio::test]
async fn test_trivia_flow() {
    let app = create_test_app().await;

    let (status, created) = app
        .admin(
            "/trivia/create",
            json!({
                "question": "What is the school's main color?",
                "options": ["Blue", "Green", "Red", "Purple"],
                "correctOption": 0,
                "isActive": true
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["data"]["correctOption"], 0);
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, answered) = app
        .post("/trivia/answer", json!({"triviaId": id, "optionIndex": 0}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(answered["data"]["results"]["0"], 1);

    let (status, invalid) = app
        .post("/trivia/answer", json!({"triviaId": id, "optionIndex": 7}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid["error"]["code"], "INVALID_OPTION");
    assert_eq!(invalid["error"]["details"]["options"], 4);

    let (_, summary) = app.post("/trivia/results", json!({"triviaId": id})).await;
    assert_eq!(summary["data"]["totalAnswers"], 1);
    assert_eq!(summary["data"]["options"][0]["percentage"], 100);
}

#[tokio::test]
async fn test_seed_endpoint() {
    let app = create_test_app().await;

    let (status, report) = app.admin("/admin/seed", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["data"], json!({"acts": 7, "trivia": 5}));

    let (_, acts) = app.post("/acts/list", json!({})).await;
    assert_eq!(acts["data"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn test_sse_acts_returns_stream() {
    let app = create_test_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/streaming/acts")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_app().await;
    let response = app.call("/nonexistent", json!({}), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
