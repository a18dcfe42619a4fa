use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::Result;

use super::{NewUser, User, UserPage, UserStore, UserUpdate, total_pages};

/// 内存用户存储，无持久化也无缓存层
///
/// id 取毫秒级时钟读数，再单调递增去重，进程重启后不保证与历史 id 不冲突
pub struct MemoryUserStore {
    users: RwLock<BTreeMap<i64, User>>,
    last_id: AtomicI64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(BTreeMap::new()),
            last_id: AtomicI64::new(0),
        }
    }

    fn next_id(&self) -> i64 {
        let clock = Utc::now().timestamp_millis();
        let prev = self
            .last_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(clock.max(last + 1))
            });
        match prev {
            Ok(last) | Err(last) => clock.max(last + 1),
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn list_all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }

    async fn list_page(&self, page: u64, limit: u64) -> Result<UserPage> {
        let users = self.users.read().await;
        let total = users.len() as u64;
        let start = page.saturating_sub(1).saturating_mul(limit);

        let slice: Vec<User> = users
            .values()
            .skip(start as usize)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(UserPage {
            users: slice,
            total,
            total_pages: total_pages(total, limit),
        })
    }

    async fn get(&self, id: i64) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User> {
        let now = Utc::now();
        let user = User {
            id: self.next_id(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            age: new_user.age,
            created_at: now,
            updated_at: now,
        };

        let mut users = self.users.write().await;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, update: UserUpdate) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };

        user.name = update.name;
        user.email = update.email;
        if update.age.is_some() {
            user.age = update.age;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: i64) -> Result<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.remove(&id))
    }

    async fn healthy(&self) -> bool {
        true
    }
}
