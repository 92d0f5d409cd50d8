//! 奖励网络领域模型
//!
//! 包含金额值类型、账户、餐厅、用餐交易和奖励确认

pub mod account;
pub mod dining;
pub mod money;
pub mod restaurant;
pub mod reward;

// 重新导出常用类型
pub use account::{Account, AccountContribution, Beneficiary, Distribution};
pub use dining::Dining;
pub use money::{MonetaryAmount, Percentage};
pub use restaurant::{BenefitAvailabilityPolicy, Eligibility, Restaurant};
pub use reward::{RewardConfirmation, generate_confirmation_number};
