use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::Serialize;

use crate::AppState;
use crate::error::Result;
use crate::routes::common::ApiResponse;

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub database: bool,
    pub cache: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub services: ServiceHealth,
}

/// 健康检查：探测存储与缓存，缓存未配置时只降级上报不拖垮整体状态
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.store.healthy().await;
    let cache = match &state.cache {
        Some(cache) => cache.ping().await,
        None => false,
    };

    let status = if database {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = HealthStatus {
        status: if database { "ok" } else { "degraded" },
        services: ServiceHealth { database, cache },
    };

    if database {
        (status, Json(ApiResponse::success(body))).into_response()
    } else {
        (
            status,
            Json(ApiResponse {
                success: false,
                ..ApiResponse::success(body)
            }),
        )
            .into_response()
    }
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let text = state.metrics.encode()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    ))
}
