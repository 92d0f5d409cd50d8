//! HTTP 处理器
//!
//! 将 REST 请求转换为服务层调用

pub mod account;
pub mod response;
pub mod reward;

use axum::Json;

/// 存活探针：服务进程正常即返回 ok
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "reward-network"
    }))
}
