//! 账户与受益人
//!
//! 账户持有有序的受益人列表，奖励按各受益人的分配比例拆分后累加到其储蓄余额

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::money::{MonetaryAmount, Percentage};
use crate::allocation::{self, BeneficiaryShare};
use crate::error::{Result, RewardError};

/// 受益人
///
/// 名称在所属账户内唯一，储蓄余额只增不减
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    pub name: String,
    /// 分配比例，取值 (0, 1]
    pub allocation_percentage: Percentage,
    /// 累计储蓄
    pub savings: MonetaryAmount,
}

impl Beneficiary {
    pub fn new(name: impl Into<String>, allocation_percentage: Percentage) -> Self {
        Self {
            name: name.into(),
            allocation_percentage,
            savings: MonetaryAmount::zero(),
        }
    }

    pub fn with_savings(mut self, savings: MonetaryAmount) -> Self {
        self.savings = savings;
        self
    }

    fn credit(&mut self, amount: MonetaryAmount) {
        self.savings += amount;
    }
}

/// 账户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// 数据库主键，未持久化时为 0
    pub id: i64,
    /// 账户号（唯一）
    pub number: String,
    /// 账户持有人名称
    pub name: String,
    /// 关联的信用卡号，不对外输出
    #[serde(default, skip_serializing)]
    pub credit_card_numbers: Vec<String>,
    /// 受益人，按存储顺序排列
    pub beneficiaries: Vec<Beneficiary>,
    /// 乐观锁版本号，每次写入递增
    pub version: i64,
}

impl Account {
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: 0,
            number: number.into(),
            name: name.into(),
            credit_card_numbers: Vec::new(),
            beneficiaries: Vec::new(),
            version: 0,
        }
    }

    pub fn with_credit_card(mut self, card_number: impl Into<String>) -> Self {
        self.credit_card_numbers.push(card_number.into());
        self
    }

    /// 追加受益人，名称唯一性在 `validate` 中统一检查
    pub fn with_beneficiary(mut self, name: impl Into<String>, percentage: Percentage) -> Self {
        self.beneficiaries.push(Beneficiary::new(name, percentage));
        self
    }

    /// 追加受益人，重名时报错
    pub fn add_beneficiary(&mut self, name: impl Into<String>, percentage: Percentage) -> Result<()> {
        let name = name.into();
        if self.beneficiary(&name).is_some() {
            return Err(RewardError::Validation(format!("受益人已存在: {}", name)));
        }
        self.beneficiaries.push(Beneficiary::new(name, percentage));
        Ok(())
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    pub fn beneficiary(&self, name: &str) -> Option<&Beneficiary> {
        self.beneficiaries.iter().find(|b| b.name == name)
    }

    pub fn total_savings(&self) -> MonetaryAmount {
        self.beneficiaries.iter().map(|b| b.savings).sum()
    }

    /// 校验分配比例不变量：非空、名称唯一、各比例在 (0, 1]、合计为 100%
    pub fn validate(&self) -> Result<()> {
        allocation::validate_beneficiaries(&self.beneficiaries).map_err(|e| match e {
            RewardError::InvalidAllocation(reason) => {
                RewardError::InvalidAllocation(format!("account_number={}, {}", self.number, reason))
            }
            other => other,
        })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// 将拆分结果计入各受益人的储蓄
    ///
    /// 份额必须与受益人一一对应且顺序一致
    pub fn make_contribution(&mut self, shares: &[BeneficiaryShare]) -> Result<AccountContribution> {
        if shares.len() != self.beneficiaries.len()
            || shares
                .iter()
                .zip(&self.beneficiaries)
                .any(|(share, beneficiary)| share.beneficiary != beneficiary.name)
        {
            return Err(RewardError::InvalidAllocation(format!(
                "拆分结果与账户受益人不匹配: account_number={}",
                self.number
            )));
        }

        let mut distributions = Vec::with_capacity(shares.len());
        for (share, beneficiary) in shares.iter().zip(self.beneficiaries.iter_mut()) {
            beneficiary.credit(share.amount);
            distributions.push(Distribution {
                beneficiary: beneficiary.name.clone(),
                amount: share.amount,
                percentage: share.percentage,
                total_savings: beneficiary.savings,
            });
        }

        Ok(AccountContribution {
            account_number: self.number.clone(),
            amount: shares.iter().map(|s| s.amount).sum(),
            distributions,
        })
    }

    /// 批量替换受益人分配比例
    ///
    /// 未知受益人返回校验错误；更新后的账户必须满足分配比例不变量，否则不做任何修改
    pub fn update_allocation_percentages(
        &mut self,
        percentages: &HashMap<String, Percentage>,
    ) -> Result<()> {
        let mut updated = self.beneficiaries.clone();
        for (name, percentage) in percentages {
            let beneficiary = updated
                .iter_mut()
                .find(|b| &b.name == name)
                .ok_or_else(|| RewardError::Validation(format!("受益人不存在: {}", name)))?;
            beneficiary.allocation_percentage = *percentage;
        }

        allocation::validate_beneficiaries(&updated)?;
        self.beneficiaries = updated;
        Ok(())
    }
}

/// 单个受益人获得的奖励
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution {
    pub beneficiary: String,
    pub amount: MonetaryAmount,
    pub percentage: Percentage,
    /// 计入本次奖励后的累计储蓄
    pub total_savings: MonetaryAmount,
}

/// 一次奖励对账户的贡献明细
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountContribution {
    pub account_number: String,
    pub amount: MonetaryAmount,
    pub distributions: Vec<Distribution>,
}

impl AccountContribution {
    /// 无奖励时的空贡献
    pub fn none(account_number: impl Into<String>) -> Self {
        Self {
            account_number: account_number.into(),
            amount: MonetaryAmount::zero(),
            distributions: Vec::new(),
        }
    }
}
