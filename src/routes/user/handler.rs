use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::AppState;
use crate::cache::{Cache, keys};
use crate::error::{AppError, Result};
use crate::routes::common::{ApiResponse, PageMeta, Source};
use crate::store::{NewUser, User, UserUpdate};

use super::model::{CreateUserRequest, ListUsersParams, UpdateUserRequest};

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .map_err(|_| AppError::Validation("Invalid user ID".into()))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersParams>,
) -> Result<Response> {
    match &state.cache {
        Some(cache) => list_users_cached(&state, cache).await,
        None => list_users_paginated(&state, &params).await,
    }
}

/// 旁路缓存读路径：命中返回 cache 来源，未命中读库后回填
async fn list_users_cached(state: &AppState, cache: &Cache) -> Result<Response> {
    let key = keys::users_list_key();

    if let Some(users) = cache.get_json::<Vec<User>>(&key).await {
        return Ok(Json(ApiResponse::sourced(
            users,
            Source::Cache,
            "Users retrieved from cache",
        ))
        .into_response());
    }

    let users = state.store.list_all().await?;
    cache
        .set_json(&key, &users, keys::USERS_LIST_TTL_SECS)
        .await;

    Ok(Json(ApiResponse::sourced(
        users,
        Source::Database,
        "Users retrieved from database",
    ))
    .into_response())
}

/// 内存后端的分页路径，不经过缓存
async fn list_users_paginated(state: &AppState, params: &ListUsersParams) -> Result<Response> {
    let page = params.page();
    let limit = params.limit();
    let result = state.store.list_page(page, limit).await?;

    Ok(Json(ApiResponse::paginated(
        result.users,
        PageMeta {
            page,
            limit,
            total: result.total,
            total_pages: result.total_pages,
        },
    ))
    .into_response())
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = parse_id(&id)?;

    match &state.cache {
        Some(cache) => get_user_cached(&state, cache, id).await,
        None => {
            let user = state
                .store
                .get(id)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".into()))?;
            Ok(Json(ApiResponse::success(user)).into_response())
        }
    }
}

async fn get_user_cached(state: &AppState, cache: &Cache, id: i64) -> Result<Response> {
    let key = keys::user_key(id);

    if let Some(user) = cache.get_json::<User>(&key).await {
        return Ok(Json(ApiResponse::sourced(
            user,
            Source::Cache,
            "User retrieved from cache",
        ))
        .into_response());
    }

    // 负结果不回填
    let user = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    cache.set_json(&key, &user, keys::USER_TTL_SECS).await;

    Ok(Json(ApiResponse::sourced(
        user,
        Source::Database,
        "User retrieved from database",
    ))
    .into_response())
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::Validation("Name and email are required".into()));
    }

    // 先查重再插入，检查与插入之间存在已知的并发窗口
    if state.store.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let user = state
        .store
        .create(NewUser {
            name: req.name,
            email: req.email,
            password_hash: None,
            age: req.age,
        })
        .await?;

    if let Some(cache) = &state.cache {
        cache.del(&[keys::users_list_key()]).await;
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message(user, "User created successfully")),
    ))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;

    if req.name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::Validation("Name and email are required".into()));
    }

    if state.store.get(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".into()));
    }

    // 新邮箱不能被其他 id 占用
    if let Some(owner) = state.store.find_by_email(&req.email).await? {
        if owner.id != id {
            return Err(AppError::Conflict(
                "Email is already taken by another user".into(),
            ));
        }
    }

    let user = state
        .store
        .update(
            id,
            UserUpdate {
                name: req.name,
                email: req.email,
                age: req.age,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if let Some(cache) = &state.cache {
        cache
            .del(&[keys::users_list_key(), keys::user_key(id)])
            .await;
    }

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message(user, "User updated successfully")),
    ))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;

    let user = state
        .store
        .delete(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if let Some(cache) = &state.cache {
        cache
            .del(&[keys::users_list_key(), keys::user_key(id)])
            .await;
    }

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message(user, "User deleted successfully")),
    ))
}
