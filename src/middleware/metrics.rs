use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::metrics::Metrics;

/// 按请求记录计数与耗时；路由标签优先取匹配到的模式，避免标签基数爆炸
pub async fn track_metrics(
    State(metrics): State<Arc<Metrics>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let response = next.run(req).await;

    metrics.record_request(
        &method,
        &route,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}
