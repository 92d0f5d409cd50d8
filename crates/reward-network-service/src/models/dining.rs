//! 用餐交易

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::MonetaryAmount;
use crate::error::{Result, RewardError};

/// 在合作餐厅完成的一次消费，奖励计算的输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dining {
    /// 交易 ID（唯一，用于幂等）
    pub transaction_id: String,
    pub amount: MonetaryAmount,
    pub credit_card_number: String,
    pub merchant_number: String,
    pub dined_at: DateTime<Utc>,
}

impl Dining {
    pub fn new(
        transaction_id: impl Into<String>,
        amount: MonetaryAmount,
        credit_card_number: impl Into<String>,
        merchant_number: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            amount,
            credit_card_number: credit_card_number.into(),
            merchant_number: merchant_number.into(),
            dined_at: Utc::now(),
        }
    }

    pub fn with_dined_at(mut self, dined_at: DateTime<Utc>) -> Self {
        self.dined_at = dined_at;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.transaction_id.trim().is_empty() {
            return Err(RewardError::Validation("交易 ID 不能为空".to_string()));
        }
        if self.credit_card_number.trim().is_empty() {
            return Err(RewardError::Validation("信用卡号不能为空".to_string()));
        }
        if self.merchant_number.trim().is_empty() {
            return Err(RewardError::Validation("商户号不能为空".to_string()));
        }
        if !self.amount.is_positive() {
            return Err(RewardError::Validation(format!(
                "消费金额必须大于 0: {}",
                self.amount
            )));
        }
        Ok(())
    }
}
