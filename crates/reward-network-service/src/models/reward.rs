//! 奖励确认
//!
//! 每笔交易至多一条，创建后不再修改

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::{AccountContribution, Distribution};
use super::dining::Dining;
use super::money::MonetaryAmount;
use super::restaurant::Eligibility;

/// 奖励确认
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardConfirmation {
    /// 确认号（系统生成）
    pub confirmation_number: String,
    /// 交易 ID（唯一）
    pub transaction_id: String,
    pub account_number: String,
    pub merchant_number: String,
    /// 奖励总额，不满足资格策略时为 0.00
    pub amount: MonetaryAmount,
    pub eligibility: Eligibility,
    /// 各受益人分得的金额
    pub distributions: Vec<Distribution>,
    pub created_at: DateTime<Utc>,
}

impl RewardConfirmation {
    pub fn new(dining: &Dining, eligibility: Eligibility, contribution: AccountContribution) -> Self {
        Self {
            confirmation_number: generate_confirmation_number(),
            transaction_id: dining.transaction_id.clone(),
            account_number: contribution.account_number,
            merchant_number: dining.merchant_number.clone(),
            amount: contribution.amount,
            eligibility,
            distributions: contribution.distributions,
            // 与 TIMESTAMPTZ 精度一致，读回的确认与首次返回的完全相同
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn distribution(&self, beneficiary: &str) -> Option<&Distribution> {
        self.distributions.iter().find(|d| d.beneficiary == beneficiary)
    }
}

/// 生成确认号
///
/// 格式：RW + 时间戳(14位) + 随机数(6位)
pub fn generate_confirmation_number() -> String {
    let now = Utc::now();
    let random = Uuid::new_v4().as_u128() % 1_000_000;
    format!("RW{}{:06}", now.format("%Y%m%d%H%M%S"), random)
}
