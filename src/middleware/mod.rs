mod error_handler;
mod metrics;

pub use error_handler::log_errors;
pub use metrics::track_metrics;
