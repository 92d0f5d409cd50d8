//! 奖励网络错误类型
//!
//! 定义服务层的业务错误和系统错误

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rewards_shared::observability::tracing::current_trace_id;
use serde_json::json;
use thiserror::Error;

/// 错误类别
///
/// 表现层据此映射 HTTP 状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidAllocation,
    ConcurrentModification,
    Validation,
    PersistenceFailure,
}

/// 奖励网络错误类型
#[derive(Debug, Error)]
pub enum RewardError {
    // === 查找失败 ===
    #[error("餐厅不存在: merchant_number={0}")]
    RestaurantNotFound(String),

    #[error("信用卡未关联任何账户: credit_card={0}")]
    AccountNotFound(String),

    #[error("账户不存在: {0}")]
    AccountIdNotFound(i64),

    #[error("奖励确认不存在: transaction_id={0}")]
    ConfirmationNotFound(String),

    // === 业务错误 ===
    #[error("受益人分配比例无效: {0}")]
    InvalidAllocation(String),

    #[error("账户并发修改冲突，请重试: account_number={0}")]
    ConcurrentModification(String),

    #[error("交易已存在奖励确认: transaction_id={0}")]
    DuplicateTransaction(String),

    #[error("参数校验失败: {0}")]
    Validation(String),

    // === 系统错误 ===
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("持久化失败: {0}")]
    Persistence(String),
}

/// 奖励网络 Result 类型别名
pub type Result<T> = std::result::Result<T, RewardError>;

/// 信用卡号脱敏，只保留末四位
pub fn mask_card_number(card_number: &str) -> String {
    let digits: Vec<char> = card_number.chars().collect();
    if digits.len() <= 4 {
        return "*".repeat(digits.len());
    }
    let visible: String = digits[digits.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(digits.len() - 4), visible)
}

impl RewardError {
    /// 按信用卡号构造账户不存在错误（卡号脱敏）
    pub fn account_not_found_for_card(card_number: &str) -> Self {
        Self::AccountNotFound(mask_card_number(card_number))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RestaurantNotFound(_)
            | Self::AccountNotFound(_)
            | Self::AccountIdNotFound(_)
            | Self::ConfirmationNotFound(_) => ErrorKind::NotFound,
            Self::InvalidAllocation(_) => ErrorKind::InvalidAllocation,
            Self::ConcurrentModification(_) => ErrorKind::ConcurrentModification,
            Self::Validation(_) => ErrorKind::Validation,
            Self::DuplicateTransaction(_)
            | Self::Database(_)
            | Self::Serialization(_)
            | Self::Persistence(_) => ErrorKind::PersistenceFailure,
        }
    }

    /// 检查是否为可重试的错误
    ///
    /// 只有乐观锁冲突会重新加载账户后重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        self.kind() != ErrorKind::PersistenceFailure
    }

    /// 获取错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RestaurantNotFound(_) => "RESTAURANT_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountIdNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::ConfirmationNotFound(_) => "CONFIRMATION_NOT_FOUND",
            Self::InvalidAllocation(_) => "INVALID_ALLOCATION",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::DuplicateTransaction(_) => "DUPLICATE_TRANSACTION",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

impl RewardError {
    /// 映射 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::InvalidAllocation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::ConcurrentModification => StatusCode::CONFLICT,
            ErrorKind::PersistenceFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RewardError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = if self.is_business_error() {
            self.to_string()
        } else {
            tracing::error!(
                error = %self,
                error_code = self.error_code(),
                trace_id = ?current_trace_id(),
                "持久化操作失败"
            );
            "服务内部错误，请稍后重试".to_string()
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 请求参数校验错误
impl From<validator::ValidationErrors> for RewardError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
