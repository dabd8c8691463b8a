//! SiteChat API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Chat replies (stateless and per session)
//! - Knowledge search
//! - Rate limiting
//! - Observability (logging, metrics, request ids)
//!
//! The search engine is built in the background at startup; until it is
//! ready, chat answers from keyword rules only.

mod handlers;
mod middleware;
mod sessions;

use anyhow::Context;
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use middleware::rate_limit::{rate_limit_middleware, RateLimit};
use sitechat_common::{
    config::{AppConfig, CONFIG_FILE_ENV},
    metrics,
};
use sitechat_ingestion::CorpusLoader;
use sitechat_responder::Responder;
use sitechat_search::EngineHandle;
use sessions::{SessionStore, Sessions};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: EngineHandle,
    pub responder: Arc<Responder>,
    pub sessions: SessionStore,
    pub metrics: PrometheusHandle,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config_file = std::env::var(CONFIG_FILE_ENV).ok();
    let config = AppConfig::load_from(config_file.as_deref())
        .context("failed to load configuration")?;
    init_tracing(&config);
    if let Some(path) = &config_file {
        info!(path = %path, "Configuration loaded from file");
    }

    info!(
        service = %config.observability.service_name,
        "Starting SiteChat API Gateway v{}",
        sitechat_common::VERSION
    );

    let config = Arc::new(config);

    // Initialize metrics
    let metrics_handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("request_duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("search_duration_seconds".to_string()),
            metrics::LATENCY_BUCKETS,
        )?
        .set_buckets_for_metric(
            Matcher::Suffix("engine_build_duration_seconds".to_string()),
            metrics::BUILD_BUCKETS,
        )?
        .install_recorder()
        .context("failed to install Prometheus recorder")?;
    metrics::register_metrics();

    let responder = Responder::from_config(&config.chat).await?;
    info!(rules = responder.rules().len(), "Responder ready");

    // Build the search engine without holding up startup
    let engine = EngineHandle::new();
    let loader = CorpusLoader::from_config(&config.sources)?;
    info!(
        document = %loader.document(),
        knowledge = %loader.knowledge(),
        "Loading knowledge sources"
    );
    let build = engine.spawn_build(loader);

    let state = AppState {
        config: config.clone(),
        engine,
        responder: Arc::new(responder),
        sessions: Sessions::shared(&config.chat),
        metrics: metrics_handle,
    };

    let app = create_router(state)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.server.host, config.server.port))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown = Arc::new(Notify::new());
    let server = {
        let shutdown = shutdown.clone();
        async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_signal().await;
                    shutdown.notify_one();
                })
                .await
        }
    };
    let drain_deadline = async {
        shutdown.notified().await;
        tokio::time::sleep(config.shutdown_timeout()).await;
    };

    tokio::select! {
        result = server => result?,
        _ = drain_deadline => warn!(
            timeout_secs = config.server.shutdown_timeout_secs,
            "Graceful shutdown timed out, dropping open connections"
        ),
    }

    build.abort();
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    // RUST_LOG wins over the configured level
    let mut filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.observability.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // lopdf logs every decoded string at info
    if let Ok(directive) = "lopdf=warn".parse() {
        filter = filter.add_directive(directive);
    }

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> anyhow::Result<Router> {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let mut api_routes = Router::new()
        .route("/search", post(handlers::search::search))
        .route("/chat", post(handlers::chat::chat))
        .route("/sessions", post(handlers::sessions::create_session))
        .route("/sessions/{id}", get(handlers::sessions::get_session))
        .route("/sessions/{id}/messages", post(handlers::sessions::send_message));

    if let Some(limit) = RateLimit::from_config(&state.config.rate_limit)? {
        api_routes = api_routes.layer(from_fn_with_state(limit, rate_limit_middleware));
    }

    let timeout = state.config.request_timeout();

    Ok(Router::new()
        // Probes are never rate limited
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics))
        .nest("/v1", api_routes)
        .route_layer(from_fn(middleware::track_metrics))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state))
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use sitechat_common::config::{ChatConfig, RateLimitConfig};
    use sitechat_responder::RuleSet;
    use sitechat_search::LexicalEngine;
    use tower::ServiceExt;
    use uuid::Uuid;

    const CORPUS: &str = "Our transmission line projects span 400kV and 230kV networks\n\
                          Transmission line EPC\nSubstation construction";

    fn test_state(engine: EngineHandle, config: AppConfig) -> AppState {
        AppState {
            responder: Arc::new(Responder::new(RuleSet::default(), &config.chat)),
            sessions: Sessions::shared(&config.chat),
            config: Arc::new(config),
            engine,
            metrics: PrometheusBuilder::new().build_recorder().handle(),
        }
    }

    fn unlimited_config() -> AppConfig {
        AppConfig {
            rate_limit: RateLimitConfig {
                enabled: false,
                ..RateLimitConfig::default()
            },
            ..AppConfig::default()
        }
    }

    fn app(engine: EngineHandle) -> Router {
        create_router(test_state(engine, unlimited_config())).unwrap()
    }

    fn capped_app(max_sessions: usize, max_messages_per_session: usize) -> Router {
        let config = AppConfig {
            chat: ChatConfig {
                max_sessions,
                max_messages_per_session,
                ..ChatConfig::default()
            },
            ..unlimited_config()
        };
        create_router(test_state(ready_engine(), config)).unwrap()
    }

    fn ready_engine() -> EngineHandle {
        EngineHandle::ready(LexicalEngine::from_corpus(CORPUS))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(EngineHandle::new()), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_ready_follows_engine() {
        let (status, body) = send(&app(EngineHandle::new()), "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["engine"], "uninitialized");

        let (status, body) = send(&app(ready_engine()), "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        // "line" and "transmission" tie; alphabetical order breaks it
        assert_eq!(body["index"]["top_terms"][0]["term"], "line");
        assert_eq!(body["index"]["top_terms"][1]["term"], "transmission");
    }

    #[tokio::test]
    async fn test_search_before_ready_is_unavailable() {
        let app = app(EngineHandle::new());
        let (status, body) =
            send(&app, "POST", "/v1/search", Some(json!({"query": "transmission"}))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "ENGINE_NOT_READY");
    }

    #[tokio::test]
    async fn test_search_ranks_terms() {
        let app = app(ready_engine());
        let (status, body) = send(
            &app,
            "POST",
            "/v1/search",
            Some(json!({"query": "networks about transmission"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], "transmission networks");
        assert_eq!(body["terms"][0], json!({"term": "transmission", "frequency": 2}));
    }

    #[tokio::test]
    async fn test_search_validates_query() {
        let (status, body) =
            send(&app(ready_engine()), "POST", "/v1/search", Some(json!({"query": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let long = "a".repeat(2001);
        let (status, _) =
            send(&app(ready_engine()), "POST", "/v1/search", Some(json!({"query": long}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_tiers() {
        let app = app(ready_engine());

        let (status, body) = send(&app, "POST", "/v1/chat", Some(json!({"message": "Hello!"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "rule");
        assert_eq!(body["rule"], "greeting");

        let (_, body) = send(
            &app,
            "POST",
            "/v1/chat",
            Some(json!({"message": "400kV networks and construction"})),
        )
        .await;
        assert_eq!(body["tier"], "search");
        assert_eq!(
            body["content"],
            "Here’s what I found from our records:\n400kv networks and construction"
        );
        assert_eq!(body["engine"], "ready");
    }

    #[tokio::test]
    async fn test_chat_works_before_engine_is_ready() {
        let app = app(EngineHandle::new());
        let (status, body) = send(
            &app,
            "POST",
            "/v1/chat",
            Some(json!({"message": "400kV networks and construction"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tier"], "fallback");
        assert_eq!(body["engine"], "uninitialized");
    }

    #[tokio::test]
    async fn test_session_flow() {
        let app = app(ready_engine());

        let (status, created) = send(&app, "POST", "/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["messages"][0]["role"], "bot");

        let (status, body) = send(
            &app,
            "POST",
            &format!("/v1/sessions/{}/messages", id),
            Some(json!({"message": "What is your mission?"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"]["rule"], "mission");
        assert_eq!(body["message"]["role"], "bot");

        let (status, transcript) = send(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let messages = transcript["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["content"], "What is your mission?");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let app = app(ready_engine());
        let id = Uuid::new_v4();

        let (status, body) = send(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");

        let (status, _) = send(
            &app,
            "POST",
            &format!("/v1/sessions/{}/messages", id),
            Some(json!({"message": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oldest_session_evicted_at_capacity() {
        let app = capped_app(2, 200);

        let mut ids = Vec::new();
        for _ in 0..3 {
            let (status, created) = send(&app, "POST", "/v1/sessions", None).await;
            assert_eq!(status, StatusCode::CREATED);
            ids.push(created["id"].as_str().unwrap().to_string());
        }

        let (status, body) = send(&app, "GET", &format!("/v1/sessions/{}", ids[0]), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");

        for id in &ids[1..] {
            let (status, _) = send(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
            assert_eq!(status, StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_session_history_is_capped() {
        let app = capped_app(10, 5);
        let (_, created) = send(&app, "POST", "/v1/sessions", None).await;
        let id = created["id"].as_str().unwrap().to_string();

        for question in ["What is your mission?", "What is your vision?", "Tell me your values"] {
            let (status, _) = send(
                &app,
                "POST",
                &format!("/v1/sessions/{}/messages", id),
                Some(json!({"message": question})),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, transcript) = send(&app, "GET", &format!("/v1/sessions/{}", id), None).await;
        let messages = transcript["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0]["content"], created["messages"][0]["content"]);
        assert_eq!(messages[1]["content"], "What is your vision?");
        assert_eq!(messages[3]["content"], "Tell me your values");
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let limited = AppConfig {
            rate_limit: RateLimitConfig {
                requests_per_second: 1,
                burst: 1,
                enabled: true,
            },
            ..AppConfig::default()
        };
        let app = create_router(test_state(ready_engine(), limited)).unwrap();
        let body = json!({"message": "hello"});

        let (status, _) = send(&app, "POST", "/v1/chat", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "POST", "/v1/chat", Some(body)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");

        // Probes sit outside the limiter
        let (status, _) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
    }
}
