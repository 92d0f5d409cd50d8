//! 餐厅与奖励资格策略

use serde::{Deserialize, Serialize};

use super::dining::Dining;
use super::money::{MonetaryAmount, Percentage};
use crate::error::{Result, RewardError};

/// 奖励资格判定结果
///
/// 不满足策略不是错误，而是一个合法的零奖励结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Eligibility {
    Eligible,
    PolicyViolation { reason: String },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    pub fn violation_reason(&self) -> Option<&str> {
        match self {
            Self::Eligible => None,
            Self::PolicyViolation { reason } => Some(reason),
        }
    }

    /// 由持久化的违规原因还原
    pub fn from_violation(reason: Option<String>) -> Self {
        match reason {
            None => Self::Eligible,
            Some(reason) => Self::PolicyViolation { reason },
        }
    }
}

/// 餐厅奖励资格策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "threshold", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BenefitAvailabilityPolicy {
    /// 每笔消费都有奖励
    #[default]
    Always,
    /// 促销排除期，任何消费都没有奖励
    Never,
    /// 消费金额达到门槛才有奖励
    MinimumAmount(MonetaryAmount),
}

impl BenefitAvailabilityPolicy {
    /// 数据库中的策略编码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Always => "ALWAYS",
            Self::Never => "NEVER",
            Self::MinimumAmount(_) => "MINIMUM_AMOUNT",
        }
    }

    pub fn threshold(&self) -> Option<MonetaryAmount> {
        match self {
            Self::MinimumAmount(threshold) => Some(*threshold),
            _ => None,
        }
    }

    /// 由策略编码和门槛金额还原
    pub fn from_parts(code: &str, threshold: Option<MonetaryAmount>) -> Result<Self> {
        match (code, threshold) {
            ("ALWAYS", _) => Ok(Self::Always),
            ("NEVER", _) => Ok(Self::Never),
            ("MINIMUM_AMOUNT", Some(threshold)) => Ok(Self::MinimumAmount(threshold)),
            ("MINIMUM_AMOUNT", None) => Err(RewardError::Validation(
                "MINIMUM_AMOUNT 策略缺少门槛金额".to_string(),
            )),
            (other, _) => Err(RewardError::Validation(format!(
                "未知的奖励资格策略: {}",
                other
            ))),
        }
    }

    pub fn check(&self, dining: &Dining) -> Eligibility {
        match self {
            Self::Always => Eligibility::Eligible,
            Self::Never => Eligibility::PolicyViolation {
                reason: "餐厅当前不提供奖励".to_string(),
            },
            Self::MinimumAmount(threshold) if dining.amount < *threshold => {
                Eligibility::PolicyViolation {
                    reason: format!("消费金额 {} 未达到门槛 {}", dining.amount, threshold),
                }
            }
            Self::MinimumAmount(_) => Eligibility::Eligible,
        }
    }
}

/// 合作餐厅
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: i64,
    /// 商户号（唯一）
    pub merchant_number: String,
    pub name: String,
    /// 奖励比例，作用于消费金额
    pub benefit_percentage: Percentage,
    pub benefit_availability_policy: BenefitAvailabilityPolicy,
}

impl Restaurant {
    pub fn new(
        merchant_number: impl Into<String>,
        name: impl Into<String>,
        benefit_percentage: Percentage,
    ) -> Self {
        Self {
            id: 0,
            merchant_number: merchant_number.into(),
            name: name.into(),
            benefit_percentage,
            benefit_availability_policy: BenefitAvailabilityPolicy::Always,
        }
    }

    pub fn with_policy(mut self, policy: BenefitAvailabilityPolicy) -> Self {
        self.benefit_availability_policy = policy;
        self
    }

    pub fn is_benefit_available_for(&self, dining: &Dining) -> Eligibility {
        self.benefit_availability_policy.check(dining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dining(amount: rust_decimal::Decimal) -> Dining {
        Dining::new("tx", MonetaryAmount::new(amount), "1234123412341234", "1234567890")
    }

    #[test]
    fn test_always_policy() {
        assert!(BenefitAvailabilityPolicy::Always
            .check(&dining(dec!(0.01)))
            .is_eligible());
    }

    #[test]
    fn test_never_policy() {
        let result = BenefitAvailabilityPolicy::Never.check(&dining(dec!(1000.00)));
        assert!(!result.is_eligible());
        assert!(result.violation_reason().is_some());
    }

    #[test]
    fn test_minimum_amount_policy() {
        let policy = BenefitAvailabilityPolicy::MinimumAmount(MonetaryAmount::new(dec!(50.00)));
        assert!(!policy.check(&dining(dec!(49.99))).is_eligible());
        assert!(policy.check(&dining(dec!(50.00))).is_eligible());
        assert!(policy.check(&dining(dec!(120.00))).is_eligible());
    }

    #[test]
    fn test_policy_from_parts() {
        let threshold = MonetaryAmount::new(dec!(20.00));
        assert_eq!(
            BenefitAvailabilityPolicy::from_parts("MINIMUM_AMOUNT", Some(threshold)).unwrap(),
            BenefitAvailabilityPolicy::MinimumAmount(threshold)
        );
        assert_eq!(
            BenefitAvailabilityPolicy::from_parts("NEVER", None).unwrap(),
            BenefitAvailabilityPolicy::Never
        );
        assert!(BenefitAvailabilityPolicy::from_parts("MINIMUM_AMOUNT", None).is_err());
        assert!(BenefitAvailabilityPolicy::from_parts("SOMETIMES", None).is_err());
    }

    #[test]
    fn test_policy_serialization() {
        let policy = BenefitAvailabilityPolicy::MinimumAmount(MonetaryAmount::new(dec!(20)));
        let json = serde_json::to_value(policy).unwrap();
        assert_eq!(json, serde_json::json!({"type": "MINIMUM_AMOUNT", "threshold": "20.00"}));

        let json = serde_json::to_value(BenefitAvailabilityPolicy::Always).unwrap();
        assert_eq!(json, serde_json::json!({"type": "ALWAYS"}));
    }

    #[test]
    fn test_eligibility_round_trips_through_violation_reason() {
        let violation = Eligibility::PolicyViolation {
            reason: "closed".to_string(),
        };
        assert_eq!(
            Eligibility::from_violation(violation.violation_reason().map(str::to_string)),
            violation
        );
        assert_eq!(Eligibility::from_violation(None), Eligibility::Eligible);
    }
}
