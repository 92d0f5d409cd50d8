//! 服务请求 DTO 定义

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Result, RewardError};
use crate::models::{Dining, MonetaryAmount, Percentage};

/// 奖励请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RewardDiningRequest {
    #[validate(length(min = 1, max = 64, message = "交易 ID 长度必须在1-64个字符之间"))]
    pub transaction_id: String,
    pub amount: MonetaryAmount,
    #[validate(length(min = 12, max = 19, message = "信用卡号长度必须在12-19位之间"))]
    pub credit_card_number: String,
    #[validate(length(min = 1, max = 32, message = "商户号长度必须在1-32个字符之间"))]
    pub merchant_number: String,
    /// 缺省为当前时间
    pub dined_at: Option<DateTime<Utc>>,
}

impl RewardDiningRequest {
    pub fn into_dining(self) -> Dining {
        let dined_at = self.dined_at.unwrap_or_else(Utc::now);
        Dining::new(
            self.transaction_id,
            self.amount,
            self.credit_card_number,
            self.merchant_number,
        )
        .with_dined_at(dined_at)
    }
}

/// 单个受益人的新分配比例
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationUpdate {
    pub beneficiary: String,
    pub percentage: Percentage,
}

/// 更新受益人分配比例请求
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAllocationsRequest {
    #[validate(length(min = 1, message = "至少需要一个受益人"))]
    pub allocations: Vec<AllocationUpdate>,
}

impl UpdateAllocationsRequest {
    /// 转换为名称到比例的映射，重复的受益人名称视为参数错误
    pub fn into_percentages(self) -> Result<HashMap<String, Percentage>> {
        let mut percentages = HashMap::with_capacity(self.allocations.len());
        for update in self.allocations {
            if percentages
                .insert(update.beneficiary.clone(), update.percentage)
                .is_some()
            {
                return Err(RewardError::Validation(format!(
                    "受益人重复: {}",
                    update.beneficiary
                )));
            }
        }
        Ok(percentages)
    }
}

/// 账户奖励列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RewardListQuery {
    pub limit: Option<i64>,
}
