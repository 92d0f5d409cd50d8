//! 金额与百分比值类型
//!
//! 金额固定保留两位小数（最小货币单位为分），计算结果一律四舍五入（half-up）。
//! 两者均以字符串形式序列化，数据库中以 NUMERIC 存储。

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::RewardError;

/// 金额小数位数
pub const CURRENCY_SCALE: u32 = 2;

/// 百分比小数位数，与数据库 NUMERIC(5, 4) 一致
pub const PERCENTAGE_SCALE: u32 = 4;

/// 将任意精度的值按 half-up 规则规整到两位小数
fn round_currency(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_SCALE);
    rounded
}

/// 金额
///
/// 内部始终保持两位小数，`Display` 输出如 `8.00`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[sqlx(transparent)]
pub struct MonetaryAmount(Decimal);

impl MonetaryAmount {
    /// 由计算结果构造金额，超出两位的小数按 half-up 舍入
    pub fn new(value: Decimal) -> Self {
        Self(round_currency(value))
    }

    /// 零金额
    pub fn zero() -> Self {
        Self(Decimal::new(0, CURRENCY_SCALE))
    }

    /// 以最小货币单位构造（例如 800 分 = 8.00）
    pub fn from_minor_units(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, CURRENCY_SCALE))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// 按百分比计算份额，结果 half-up 舍入到分
    pub fn multiply_by(&self, percentage: Percentage) -> Self {
        Self::new(self.0 * percentage.value())
    }

    /// 换算为最小货币单位，负数返回 None
    pub fn minor_units(&self) -> Option<u64> {
        (self.0 * Decimal::ONE_HUNDRED).trunc().to_u64()
    }
}

impl Default for MonetaryAmount {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for MonetaryAmount {
    type Error = RewardError;

    /// 外部输入不允许超过两位小数，避免静默舍入
    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value.normalize().scale() > CURRENCY_SCALE {
            return Err(RewardError::Validation(format!(
                "金额最多保留 {} 位小数: {}",
                CURRENCY_SCALE, value
            )));
        }
        Ok(Self::new(value))
    }
}

impl From<MonetaryAmount> for Decimal {
    fn from(amount: MonetaryAmount) -> Self {
        amount.0
    }
}

impl Add for MonetaryAmount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.0 + rhs.0)
    }
}

impl AddAssign for MonetaryAmount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for MonetaryAmount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.0 - rhs.0)
    }
}

impl Sum for MonetaryAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, amount| acc + amount)
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 百分比
///
/// 以小数形式保存（0.08 表示 8%），取值范围 [0, 1]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
#[sqlx(transparent)]
pub struct Percentage(Decimal);

impl Percentage {
    /// 由小数构造，超出 [0, 1] 或超过四位小数时返回校验错误
    pub fn new(fraction: Decimal) -> Result<Self, RewardError> {
        if fraction < Decimal::ZERO || fraction > Decimal::ONE {
            return Err(RewardError::Validation(format!(
                "百分比必须在 0 到 1 之间: {}",
                fraction
            )));
        }
        if fraction.normalize().scale() > PERCENTAGE_SCALE {
            return Err(RewardError::Validation(format!(
                "百分比最多保留 {} 位小数: {}",
                PERCENTAGE_SCALE, fraction
            )));
        }
        Ok(Self(fraction))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn one() -> Self {
        Self(Decimal::ONE)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = RewardError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(percentage: Percentage) -> Self {
        percentage.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}
