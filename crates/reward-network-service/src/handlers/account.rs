//! 账户 API 处理器
//!
//! 账户查询、受益人分配比例维护与账户奖励记录

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::error::RewardError;
use crate::handlers::response::ApiResponse;
use crate::models::{Account, RewardConfirmation};
use crate::service::{RewardListQuery, UpdateAllocationsRequest};
use crate::state::AppState;

/// 单次查询的奖励记录上限
const MAX_REWARDS_LIMIT: i64 = 100;

/// 查询全部账户
///
/// GET /api/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Account>>>, RewardError> {
    let accounts = state.account_manager.get_all_accounts().await?;
    Ok(Json(ApiResponse::success(accounts)))
}

/// 查询账户详情
///
/// GET /api/accounts/{id}
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Account>>, RewardError> {
    let account = state.account_manager.get_account(id).await?;
    Ok(Json(ApiResponse::success(account)))
}

/// 更新受益人分配比例
///
/// PUT /api/accounts/{id}/beneficiaries
pub async fn update_beneficiaries(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateAllocationsRequest>,
) -> Result<Json<ApiResponse<Account>>, RewardError> {
    req.validate()?;

    let account = state
        .account_manager
        .update_beneficiary_allocation_percentages(id, req.into_percentages()?)
        .await?;
    Ok(Json(ApiResponse::success(account)))
}

/// 查询账户最近的奖励确认
///
/// GET /api/accounts/{id}/rewards?limit=20
pub async fn list_account_rewards(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<RewardListQuery>,
) -> Result<Json<ApiResponse<Vec<RewardConfirmation>>>, RewardError> {
    let limit = query
        .limit
        .unwrap_or(state.account_rewards_limit)
        .min(MAX_REWARDS_LIMIT);

    let account = state.account_manager.get_account(id).await?;
    let rewards = state
        .reward_network
        .list_account_rewards(&account.number, limit)
        .await?;
    Ok(Json(ApiResponse::success(rewards)))
}
