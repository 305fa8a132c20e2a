use axum::{
    Router,
    routing::{get, post, put},
};
use log::info;
use tower_http::cors::CorsLayer;
use vtf_server_domain::app::AppState;

mod auth;
mod rankings;
mod tierlist;
mod users;

pub fn router(state: AppState) -> Router {
    let api: Router<AppState> = Router::new()
        .route("/auth/send-verification", post(auth::send_verification))
        .route("/auth/verify-code", post(auth::verify_code))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/create-admin", post(auth::create_admin))
        .route("/users", get(users::get_all))
        .route("/users/me", get(users::get_me))
        .route("/users/top", get(users::get_top))
        .route("/users/search", get(users::search))
        .route("/users/agent-stats", put(users::record_match))
        .route(
            "/users/{nickname}",
            get(users::get_by_nickname)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/users/{nickname}/agent-stats",
            get(users::get_agent_stats).put(users::correct_agent_stats),
        )
        .route("/rankings", get(rankings::get_rankings))
        .route("/tierlist", get(tierlist::get_all).put(tierlist::update));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(
    state: AppState,
    shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let port = std::env::var("VTF_HTTP_PORT")
        .expect("VTF_HTTP_PORT must be set")
        .parse::<u16>()
        .expect("VTF_HTTP_PORT must be a valid u16");

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    info!("HTTP API listening on port {}", port);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("HTTP API shut down gracefully");
    Ok(())
}
