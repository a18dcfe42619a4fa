use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bcrypt::{DEFAULT_COST, hash, verify};

use crate::AppState;
use crate::cache::keys;
use crate::error::{AppError, Result};
use crate::routes::common::ApiResponse;
use crate::store::NewUser;

use super::model::{LoginRequest, SignupRequest};

#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email, and password are required".into(),
        ));
    }

    if state.store.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let password_hash = hash_password(&req.password)?;

    let user = state
        .store
        .create(NewUser {
            name: req.name,
            email: req.email,
            password_hash: Some(password_hash),
            age: req.age,
        })
        .await?;

    if let Some(cache) = &state.cache {
        cache.del(&[keys::users_list_key()]).await;
    }

    state.metrics.record_registration();
    tracing::info!("user {} signed up", user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message(user, "User created successfully")),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".into(),
        ));
    }

    let user = match state.store.find_by_email(&req.email).await? {
        Some(user) => user,
        None => {
            state.metrics.record_login(false);
            return Err(AppError::Auth("Invalid email or password".into()));
        }
    };

    // 无凭据的用户（直接经 /api/users 创建）不能登录
    let verified = match &user.password_hash {
        Some(stored) => verify_password(&req.password, stored)?,
        None => false,
    };

    if !verified {
        state.metrics.record_login(false);
        return Err(AppError::Auth("Invalid email or password".into()));
    }

    state.metrics.record_login(true);
    tracing::info!("user {} logged in", user.id);

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message(user, "Login successful")),
    ))
}

fn hash_password(password: &str) -> Result<String> {
    hash(password.as_bytes(), DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {}", e)))
}

fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    verify(password.as_bytes(), stored_hash)
        .map_err(|e| AppError::Internal(format!("failed to verify password: {}", e)))
}
