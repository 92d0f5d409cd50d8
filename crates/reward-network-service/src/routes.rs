//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射

use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use rewards_shared::observability::middleware as obs_middleware;
use tower_http::timeout::TimeoutLayer;

use crate::{handlers, state::AppState};

/// 构建账户相关路由
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(handlers::account::list_accounts))
        .route("/accounts/{id}", get(handlers::account::get_account))
        .route(
            "/accounts/{id}/beneficiaries",
            put(handlers::account::update_beneficiaries),
        )
        .route(
            "/accounts/{id}/rewards",
            get(handlers::account::list_account_rewards),
        )
}

/// 构建奖励相关路由
fn reward_routes() -> Router<AppState> {
    Router::new()
        .route("/rewards", post(handlers::reward::reward_dining))
        .route(
            "/rewards/{transaction_id}",
            get(handlers::reward::get_confirmation),
        )
}

/// 构建所有 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(account_routes()).merge(reward_routes())
}

/// 构建完整应用：API 路由、健康检查与可观测性中间件
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(handlers::health_check))
        .layer(TimeoutLayer::new(request_timeout))
        // 可观测性中间件：请求追踪和指标收集
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state)
}
