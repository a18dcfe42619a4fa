// 指标模块
// Prometheus 注册表与 HTTP/业务计数器

use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::{AppError, Result};

pub struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    user_registrations_total: IntCounter,
    user_logins_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "route", "status"],
        )
        .expect("valid metric definition");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            )
            .buckets(vec![0.1, 0.3, 0.5, 0.7, 1.0, 3.0, 5.0, 7.0, 10.0]),
            &["method", "route", "status"],
        )
        .expect("valid metric definition");

        let user_registrations_total = IntCounter::new(
            "user_registrations_total",
            "Total number of user registrations",
        )
        .expect("valid metric definition");

        let user_logins_total = IntCounterVec::new(
            Opts::new("user_logins_total", "Total number of user logins"),
            &["status"],
        )
        .expect("valid metric definition");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric registers once");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric registers once");
        registry
            .register(Box::new(user_registrations_total.clone()))
            .expect("metric registers once");
        registry
            .register(Box::new(user_logins_total.clone()))
            .expect("metric registers once");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            user_registrations_total,
            user_logins_total,
        }
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16, duration: Duration) {
        let status = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, route, &status])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, route, &status])
            .observe(duration.as_secs_f64());
    }

    pub fn record_registration(&self) {
        self.user_registrations_total.inc();
    }

    pub fn record_login(&self, success: bool) {
        let status = if success { "success" } else { "failure" };
        self.user_logins_total.with_label_values(&[status]).inc();
    }

    /// 导出 Prometheus 文本格式
    pub fn encode(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| AppError::Internal(format!("failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| AppError::Internal(format!("metrics are not valid utf-8: {}", e)))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_encoded_output() {
        let metrics = Metrics::new();
        metrics.record_registration();
        metrics.record_login(true);
        metrics.record_login(false);
        metrics.record_request("GET", "/api/users", 200, Duration::from_millis(12));

        let text = metrics.encode().unwrap();
        assert!(text.contains("user_registrations_total 1"));
        assert!(text.contains("user_logins_total{status=\"success\"} 1"));
        assert!(text.contains("user_logins_total{status=\"failure\"} 1"));
        assert!(text.contains("http_requests_total"));
    }
}
