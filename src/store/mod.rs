// 用户存储模块
// 统一的存储契约，Postgres 与内存两种实现

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::Result;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub age: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub age: Option<i32>,
}

/// 更新载荷：age 为 None 时保留原值
#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub age: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: u64,
    pub total_pages: u64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// 全量列表，创建时间倒序
    async fn list_all(&self) -> Result<Vec<User>>;

    /// 分页列表，取 [(page-1)*limit, page*limit)
    async fn list_page(&self, page: u64, limit: u64) -> Result<UserPage>;

    async fn get(&self, id: i64) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn create(&self, new_user: NewUser) -> Result<User>;

    /// 部分覆盖更新，刷新 updated_at；目标不存在返回 None
    async fn update(&self, id: i64, update: UserUpdate) -> Result<Option<User>>;

    /// 删除并返回被删记录快照；不存在返回 None
    async fn delete(&self, id: i64) -> Result<Option<User>>;

    /// 连通性探测，供 /health 使用
    async fn healthy(&self) -> bool;
}

pub(crate) fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}
