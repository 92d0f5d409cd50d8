//! 奖励计算
//!
//! 奖励金额 = 消费金额 × 餐厅奖励比例，half-up 舍入到分。
//! 不满足餐厅资格策略时结果为零奖励，而不是错误。

use crate::error::{Result, RewardError};
use crate::models::{Dining, Eligibility, MonetaryAmount, Restaurant};

/// 奖励计算结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardCalculation {
    pub amount: MonetaryAmount,
    pub eligibility: Eligibility,
}

impl RewardCalculation {
    pub fn is_eligible(&self) -> bool {
        self.eligibility.is_eligible()
    }

    /// 是否需要拆分并写入账户
    pub fn has_reward(&self) -> bool {
        self.is_eligible() && self.amount.is_positive()
    }
}

pub fn calculate_reward(dining: &Dining, restaurant: &Restaurant) -> Result<RewardCalculation> {
    if !dining.amount.is_positive() {
        return Err(RewardError::Validation(format!(
            "消费金额必须大于 0: {}",
            dining.amount
        )));
    }
    if dining.merchant_number != restaurant.merchant_number {
        return Err(RewardError::Validation(format!(
            "交易商户号 {} 与餐厅 {} 不一致",
            dining.merchant_number, restaurant.merchant_number
        )));
    }

    let eligibility = restaurant.is_benefit_available_for(dining);
    let amount = if eligibility.is_eligible() {
        dining.amount.multiply_by(restaurant.benefit_percentage)
    } else {
        MonetaryAmount::zero()
    };

    Ok(RewardCalculation { amount, eligibility })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BenefitAvailabilityPolicy, Percentage};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn restaurant(rate: Decimal) -> Restaurant {
        Restaurant::new("1234567890", "AppleBees", Percentage::new(rate).unwrap())
    }

    fn dining(amount: Decimal) -> Dining {
        Dining::new(
            "tx-1",
            MonetaryAmount::new(amount),
            "1234123412341234",
            "1234567890",
        )
    }

    #[test]
    fn test_eight_percent_of_one_hundred() {
        let result = calculate_reward(&dining(dec!(100.00)), &restaurant(dec!(0.08))).unwrap();
        assert_eq!(result.amount.to_string(), "8.00");
        assert!(result.is_eligible());
        assert!(result.has_reward());
    }

    #[test]
    fn test_reward_is_rounded_half_up() {
        // 12.35 × 0.1 = 1.235
        let result = calculate_reward(&dining(dec!(12.35)), &restaurant(dec!(0.1))).unwrap();
        assert_eq!(result.amount.value(), dec!(1.24));

        // 0.05 × 0.08 = 0.004
        let result = calculate_reward(&dining(dec!(0.05)), &restaurant(dec!(0.08))).unwrap();
        assert!(result.amount.is_zero());
        assert!(result.is_eligible());
        assert!(!result.has_reward());
    }

    #[test]
    fn test_policy_violation_yields_zero() {
        let closed = restaurant(dec!(0.08)).with_policy(BenefitAvailabilityPolicy::Never);
        let result = calculate_reward(&dining(dec!(100.00)), &closed).unwrap();
        assert!(result.amount.is_zero());
        assert!(matches!(result.eligibility, Eligibility::PolicyViolation { .. }));
    }

    #[test]
    fn test_non_positive_amount_is_rejected() {
        let result = calculate_reward(&dining(dec!(0)), &restaurant(dec!(0.08)));
        assert!(matches!(result, Err(RewardError::Validation(_))));
    }

    #[test]
    fn test_merchant_mismatch_is_rejected() {
        let other = Restaurant::new("0000000000", "Other", Percentage::new(dec!(0.08)).unwrap());
        let result = calculate_reward(&dining(dec!(100.00)), &other);
        assert!(matches!(result, Err(RewardError::Validation(_))));
    }
}
