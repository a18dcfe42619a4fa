use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub age: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub age: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListUsersParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl ListUsersParams {
    /// 缺省或为 0 时回落到默认值
    pub fn page(&self) -> u64 {
        match self.page {
            Some(page) if page > 0 => page,
            _ => 1,
        }
    }

    pub fn limit(&self) -> u64 {
        match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => 10,
        }
    }
}
