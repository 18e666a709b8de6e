use std::sync::Arc;

use axum::http::HeaderName;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pinboard::config::AppConfig;
use pinboard::http;
use pinboard::infra::repositories::{PgCommentRepository, PgLikeRepository, PgUserRepository};
use pinboard::infra::{cache::RedisCache, db::Db, unsplash::UnsplashClient};
use pinboard::AppState;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let db = Db::connect(&config).await?;
    if config.run_migrations {
        db.migrate().await?;
        tracing::info!("database migrations applied");
    }

    let cache = match &config.redis_url {
        Some(url) => Some(RedisCache::connect(url).await?),
        None => {
            tracing::info!("REDIS_URL not set, photo responses will not be cached");
            None
        }
    };
    let photos = UnsplashClient::new(&config)?;

    let state = AppState {
        likes: Arc::new(PgLikeRepository::new(db.clone())),
        users: Arc::new(PgUserRepository::new(db.clone())),
        comments: Arc::new(PgCommentRepository::new(db)),
        photos: Arc::new(photos),
        cache,
        photo_cache_ttl_seconds: config.photo_cache_ttl_seconds,
        mirror_upstream_likes: config.mirror_upstream_likes,
        paseto_access_key: config.paseto_access_key,
        auth_token_ttl_hours: config.auth_token_ttl_hours,
    };

    let app: Router = http::router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid));

    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    tracing::info!("listening on {}", config.http_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
