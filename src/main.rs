use axum::Router;
use stridedash::{config, routes, state};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stridedash=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env();
    let session_ttl = config.session_ttl;
    let assets_dir = config.assets_dir.clone();
    let port = config.port;
    let state = state::AppState::new(config);

    // Sessions hold a full activity history each, so drop stale ones.
    let eviction_state = state.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(300)).await;
            eviction_state.evict_expired(session_ttl);
        }
    });

    let serve_dir = ServeDir::new(&assets_dir)
        .not_found_service(ServeFile::new(format!("{}/index.html", assets_dir)));

    let app = Router::new()
        .merge(routes::health::router())
        .merge(routes::sessions::router())
        .fallback_service(serve_dir)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };

    tracing::info!("StrideDash listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("New session: POST http://{}/api/sessions", addr);
    tracing::info!("Dashboard: GET http://{}/api/sessions/:id/dashboard", addr);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", err);
    }
}
