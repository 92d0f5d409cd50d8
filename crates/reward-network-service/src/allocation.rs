//! 奖励拆分
//!
//! 按受益人存储顺序逐个计算份额，每个份额 half-up 舍入到分，
//! 最后一位受益人获得总额减去之前所有份额后的余数，保证份额之和恰好等于总额。

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RewardError};
use crate::models::{Beneficiary, MonetaryAmount, Percentage};

/// 分配比例合计允许的误差
pub const ALLOCATION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// 单个受益人的拆分份额
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryShare {
    pub beneficiary: String,
    pub percentage: Percentage,
    pub amount: MonetaryAmount,
}

/// 校验受益人分配比例
pub fn validate_beneficiaries(beneficiaries: &[Beneficiary]) -> Result<()> {
    if beneficiaries.is_empty() {
        return Err(RewardError::InvalidAllocation("受益人列表为空".to_string()));
    }

    let mut names = HashSet::with_capacity(beneficiaries.len());
    let mut total = Decimal::ZERO;
    for beneficiary in beneficiaries {
        if !names.insert(beneficiary.name.as_str()) {
            return Err(RewardError::InvalidAllocation(format!(
                "受益人名称重复: {}",
                beneficiary.name
            )));
        }
        // Percentage 已保证不超过 1
        if beneficiary.allocation_percentage.is_zero() {
            return Err(RewardError::InvalidAllocation(format!(
                "受益人 {} 的分配比例必须大于 0",
                beneficiary.name
            )));
        }
        total += beneficiary.allocation_percentage.value();
    }

    if (total - Decimal::ONE).abs() > ALLOCATION_TOLERANCE {
        return Err(RewardError::InvalidAllocation(format!(
            "分配比例合计必须为 100%，实际为 {}",
            total
        )));
    }
    Ok(())
}

/// 将奖励总额拆分给受益人
///
/// 前面的份额若因舍入超出剩余未分配金额，则以剩余金额为上限，份额不会为负
pub fn allocate(total: MonetaryAmount, beneficiaries: &[Beneficiary]) -> Result<Vec<BeneficiaryShare>> {
    if total.is_negative() {
        return Err(RewardError::InvalidAllocation(format!(
            "奖励总额不能为负: {}",
            total
        )));
    }
    validate_beneficiaries(beneficiaries)?;

    let Some((last, leading)) = beneficiaries.split_last() else {
        return Err(RewardError::InvalidAllocation("受益人列表为空".to_string()));
    };

    let mut remaining = total;
    let mut shares = Vec::with_capacity(beneficiaries.len());
    for beneficiary in leading {
        let amount = total
            .multiply_by(beneficiary.allocation_percentage)
            .min(remaining);
        remaining = remaining - amount;
        shares.push(BeneficiaryShare {
            beneficiary: beneficiary.name.clone(),
            percentage: beneficiary.allocation_percentage,
            amount,
        });
    }
    shares.push(BeneficiaryShare {
        beneficiary: last.name.clone(),
        percentage: last.allocation_percentage,
        amount: remaining,
    });

    Ok(shares)
}
