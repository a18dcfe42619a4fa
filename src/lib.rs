use std::sync::Arc;

use crate::cache::Cache;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::store::UserStore;

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    /// 仅 Postgres 后端配缓存；内存后端恒为 None
    pub cache: Option<Cache>,
    pub config: Config,
    pub metrics: Arc<Metrics>,
}
