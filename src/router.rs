use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};

use crate::AppState;
use crate::middleware::{log_errors, track_metrics};
use crate::routes::{auth, common::ApiResponse, health, user};

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(user::list_users).post(user::create_user))
        .route(
            "/users/{id}",
            get(user::get_user)
                .put(user::update_user)
                .patch(user::update_user)
                .delete(user::delete_user),
        )
}

async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Route not found".into())),
    )
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new().merge(auth_routes()).merge(user_routes());

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .nest("/api", api)
        .fallback(not_found)
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ));

    // 开发模式放开跨域
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
