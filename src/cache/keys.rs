/// 用户列表缓存键
const USERS_LIST_KEY: &str = "users:all";

/// 单个用户缓存键前缀
const USER_PREFIX: &str = "user:";

/// 列表缓存 TTL（秒）
pub const USERS_LIST_TTL_SECS: u64 = 300;

/// 单条记录缓存 TTL（秒）
pub const USER_TTL_SECS: u64 = 600;

pub fn users_list_key() -> String {
    USERS_LIST_KEY.to_string()
}

pub fn user_key(id: i64) -> String {
    format!("{}{}", USER_PREFIX, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        assert_eq!(users_list_key(), "users:all");
        assert_eq!(user_key(42), "user:42");
        assert_eq!(user_key(42), user_key(42));
    }
}
