//! 奖励 API 处理器

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::error::RewardError;
use crate::handlers::response::ApiResponse;
use crate::models::RewardConfirmation;
use crate::service::RewardDiningRequest;
use crate::state::AppState;

/// 为用餐交易发放奖励
///
/// POST /api/rewards
pub async fn reward_dining(
    State(state): State<AppState>,
    Json(req): Json<RewardDiningRequest>,
) -> Result<Json<ApiResponse<RewardConfirmation>>, RewardError> {
    req.validate()?;

    let confirmation = state.reward_network.reward(&req.into_dining()).await?;
    Ok(Json(ApiResponse::success(confirmation)))
}

/// 按交易 ID 查询奖励确认
///
/// GET /api/rewards/{transaction_id}
pub async fn get_confirmation(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<ApiResponse<RewardConfirmation>>, RewardError> {
    let confirmation = state
        .reward_network
        .find_confirmation(&transaction_id)
        .await?;
    Ok(Json(ApiResponse::success(confirmation)))
}
