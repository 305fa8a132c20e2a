use std::sync::Arc;

use log::{error, info};
use vtf_persistence_sqlite::{
    create_db_pool, create_schema, tiers::SqliteTierRepository, users::SqliteUserRepository,
    verification::SqliteCodeStore,
};
use vtf_server_api::jwt::JwtServiceImpl;
use vtf_server_domain::{app::construct_app, email::EmailServiceImpl};

mod logs;

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

    info!("Shutdown signal received. Preparing graceful exit...");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = logs::init_logger() {
        eprintln!("Failed to initialize logger: {}", e);
        std::process::exit(1);
    }

    let pool = match create_db_pool() {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = create_schema(&pool).await {
        error!("Failed to create schema: {}", e);
        std::process::exit(1);
    }

    let app = construct_app(
        Arc::new(Box::new(SqliteUserRepository::new(pool.clone()))),
        Arc::new(Box::new(SqliteTierRepository::new(pool.clone()))),
        Arc::new(Box::new(SqliteCodeStore::new(pool.clone()))),
        Arc::new(Box::new(JwtServiceImpl)),
        Arc::new(Box::new(EmailServiceImpl)),
    );
    if let Err(e) = app.start().await {
        error!("Failed to create default tiers: {}", e);
        std::process::exit(1);
    }

    info!("Starting application");

    if let Err(e) = vtf_server_api::run(app, shutdown_signal()).await {
        error!("HTTP API failed: {}", e);
    }

    pool.close().await;
    info!("Application shut down gracefully");
}
