//! Talentshow server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware, routing::get};
use talentshow_api::{AppState, auth_middleware, router as api_router};
use talentshow_common::Config;
use talentshow_core::{
    ActService, ChangeFeedService, CommentService, DeliveryService, LiveQueryService,
    LocalChangeFeed, LogDelivery, NotificationService, RetryPolicy, SeedService, SmtpDelivery,
    TriviaService, VotingService,
};
use talentshow_db::repositories::{
    ActRepository, CommentRepository, NotificationRepository, TriviaRepository, VoteRepository,
};
use talentshow_pubsub::RedisChangeFeed;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "talentshow=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting talentshow server...");

    // Load configuration
    let config = Arc::new(Config::load()?);
    if config.admin.tokens.is_empty() {
        warn!("No admin tokens configured; admin endpoints will reject every request");
    }

    // Connect to database
    let db = Arc::new(talentshow_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    talentshow_db::migrate(&db).await?;
    info!("Migrations completed");

    // Change feed: Redis when configured, else in-process
    let redis_feed = match &config.redis {
        Some(redis) => {
            info!(url = %redis.url, "Connecting change feed to Redis...");
            Some(Arc::new(
                RedisChangeFeed::connect(redis, config.show.live_buffer.max(256)).await?,
            ))
        }
        None => None,
    };
    let feed: ChangeFeedService = match &redis_feed {
        Some(redis) => redis.clone(),
        None => {
            info!("Redis not configured, using in-process change feed");
            Arc::new(LocalChangeFeed::default())
        }
    };

    // Notification delivery
    let delivery: DeliveryService = match &config.email {
        Some(email) => {
            info!(host = %email.smtp_host, "Email delivery enabled");
            Arc::new(SmtpDelivery::from_config(email)?)
        }
        None => {
            info!("Email not configured, notices will only be logged");
            Arc::new(LogDelivery)
        }
    };

    let retry = RetryPolicy::new(
        config.show.retry_max_attempts,
        Duration::from_millis(config.show.retry_initial_delay_ms),
    );

    // Initialize repositories
    let act_repo = ActRepository::new(Arc::clone(&db));
    let vote_repo = VoteRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let trivia_repo = TriviaRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize services
    let notification_service =
        NotificationService::new(notification_repo, delivery, feed.clone());
    let act_service = ActService::new(
        act_repo.clone(),
        notification_service.clone(),
        feed.clone(),
        retry.clone(),
    );
    let voting_service = VotingService::new(vote_repo, act_repo.clone(), feed.clone(), retry);
    let comment_service = CommentService::new(comment_repo.clone(), act_repo.clone(), feed.clone());
    let trivia_service = TriviaService::new(trivia_repo.clone(), feed.clone());
    let seed_service = SeedService::new(act_service.clone(), trivia_service.clone());
    let live = LiveQueryService::new(
        act_repo,
        comment_repo,
        trivia_repo,
        feed,
        config.show.live_buffer,
    );

    let state = AppState {
        config: Arc::clone(&config),
        act_service,
        voting_service,
        comment_service,
        trivia_service,
        notification_service,
        seed_service,
        live,
    };

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(redis) = redis_feed
        && let Err(e) = redis.shutdown().await
    {
        warn!(error = %e, "Redis change feed did not close cleanly");
    }

    info!("Server shutdown complete");
    Ok(())
}
