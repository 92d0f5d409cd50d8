//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Account, Restaurant, RewardConfirmation};

/// 账户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepositoryTrait: Send + Sync {
    async fn find_by_credit_card_number(&self, credit_card_number: &str) -> Result<Option<Account>>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>>;
    async fn find_all(&self) -> Result<Vec<Account>>;

    /// 保存账户
    ///
    /// 未持久化的账户执行插入；已持久化的账户按 version 做乐观锁更新，
    /// 版本不一致时返回 `ConcurrentModification`。返回写入后的账户（含新版本号）
    async fn save(&self, account: &Account) -> Result<Account>;
}

/// 餐厅仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestaurantRepositoryTrait: Send + Sync {
    async fn find_by_merchant_number(&self, merchant_number: &str) -> Result<Option<Restaurant>>;
}

/// 奖励确认仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardRepositoryTrait: Send + Sync {
    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<RewardConfirmation>>;

    /// 交易 ID 已存在时返回 `DuplicateTransaction`
    async fn save(&self, confirmation: &RewardConfirmation) -> Result<()>;

    /// 按创建时间倒序
    async fn list_by_account(&self, account_number: &str, limit: i64) -> Result<Vec<RewardConfirmation>>;
}

/// 奖励写入单元
///
/// 账户更新与奖励确认在同一个事务边界内写入，要么都成功要么都失败
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardUnitOfWork: Send + Sync {
    /// `account` 为 None 时只写入奖励确认（零奖励）
    async fn commit(&self, account: Option<Account>, confirmation: RewardConfirmation) -> Result<()>;
}
