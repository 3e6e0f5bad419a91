use axum::http::Method;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod db;
mod error;
mod routes;
mod state;
mod store;

use crate::state::AppState;
use crate::store::PostgresBigramStore;

#[derive(Parser)]
struct Args {
    #[arg(long, env = "ASI_DATABASE_URL", default_value = "postgres://localhost/asi")]
    database_url: String,

    #[arg(long, env = "ASI_PORT", default_value_t = 3000)]
    port: u16,

    /// Label echoed in the `meta.database` field of every response.
    #[arg(long, env = "ASI_DATABASE_LABEL", default_value = "asi")]
    database_label: String,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    info!("ASI scoring service is initializing...");

    let pool = db::init_db(&args.database_url).await;
    let known_formats = db::load_known_formats(&pool).await;
    info!("loaded {} known format(s)", known_formats.len());

    let store = PostgresBigramStore::new(pool, known_formats);
    let state = Arc::new(AppState::new(
        Arc::new(store),
        args.database_label,
        "postgres".to_string(),
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = routes::system_routes()
        .merge(routes::asi_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // candidate bigram sets grow quadratically with deck size; 1MiB
        // comfortably covers even a heavily sideboarded list.
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, shutting down");
}
