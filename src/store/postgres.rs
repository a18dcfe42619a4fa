use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::error::{AppError, Result};

use super::{NewUser, User, UserPage, UserStore, UserUpdate, total_pages};

const USER_COLUMNS: &str = "id, name, email, password_hash, age, created_at, updated_at";

/// Postgres 用户存储
///
/// 期望的表结构：
/// users(id BIGSERIAL PRIMARY KEY, name TEXT NOT NULL, email TEXT NOT NULL,
///       password_hash TEXT, age INT,
///       created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///       updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW())
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按配置建立有界连接池，获取连接超时即快速失败
    pub async fn connect(config: &Config) -> std::result::Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_connect_timeout())
            .connect(&config.database_url)
            .await?;

        Ok(Self::new(pool))
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn list_page(&self, page: u64, limit: u64) -> Result<UserPage> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        let offset = page.saturating_sub(1).saturating_mul(limit);
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT $1 OFFSET $2"
        ))
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        let total = total.max(0) as u64;
        Ok(UserPage {
            users,
            total,
            total_pages: total_pages(total, limit),
        })
    }

    async fn get(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, age) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.age)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            // 表上带唯一约束时，把违反翻译成冲突
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(
                "User with this email already exists".into(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(&self, id: i64, update: UserUpdate) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $1, email = $2, age = COALESCE($3, age), \
             updated_at = NOW() WHERE id = $4 RETURNING {USER_COLUMNS}"
        ))
        .bind(&update.name)
        .bind(&update.email)
        .bind(update.age)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn healthy(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
