use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use backend::{
    AppState,
    cache::Cache,
    config::{Config, StoreBackend},
    metrics::Metrics,
    router,
    store::{MemoryUserStore, PgUserStore, UserStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env();

    let metrics = Arc::new(Metrics::new());

    // 按配置装配存储与缓存
    let (store, cache): (Arc<dyn UserStore>, Option<Cache>) = match config.store_backend {
        StoreBackend::Postgres => {
            let store = PgUserStore::connect(&config)
                .await
                .expect("Failed to connect to Postgres");
            tracing::info!("Database connection established");

            let redis_client = redis::Client::open(config.redis_url.clone())
                .expect("Failed to create Redis client");
            let cache = Cache::new(redis_client);
            if cache.ping().await {
                tracing::info!("Redis connection established");
            } else {
                tracing::warn!("Redis unreachable at startup, reads will fall through to database");
            }

            (Arc::new(store), Some(cache))
        }
        StoreBackend::Memory => {
            tracing::info!("Using in-memory user store, no cache layer");
            (Arc::new(MemoryUserStore::new()), None)
        }
    };

    let state = AppState {
        store,
        cache,
        config: config.clone(),
        metrics,
    };

    let app = router::create_router(state);

    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, stopping server");
}
