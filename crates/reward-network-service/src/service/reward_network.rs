//! 奖励网络服务
//!
//! 处理用餐交易奖励的核心业务逻辑，包括：
//! - 餐厅与账户查找
//! - 幂等处理（同一交易只产生一条奖励确认）
//! - 奖励计算与受益人拆分
//! - 账户与奖励确认的原子写入
//!
//! ## 奖励流程
//!
//! 1. 查找餐厅 -> 2. 查找账户并校验分配比例 -> 3. 幂等检查 -> 4. 计算奖励
//!    -> 5. 拆分 -> 6. 计入受益人储蓄 -> 7. 原子提交 -> 8. 返回确认
//!
//! 乐观锁冲突时重新加载账户并从第 2 步重做，次数受重试策略限制。

use std::sync::Arc;
use std::time::Instant;

use rewards_shared::config::RewardConfig;
use rewards_shared::observability::metrics;
use rewards_shared::retry::{RetryPolicy, retry_with_policy};
use tracing::{info, instrument, warn};

use crate::allocation;
use crate::calculator;
use crate::error::{Result, RewardError};
use crate::models::{Account, AccountContribution, Dining, Restaurant, RewardConfirmation};
use crate::repository::{
    AccountRepositoryTrait, RestaurantRepositoryTrait, RewardRepositoryTrait, RewardUnitOfWork,
};

/// 单次奖励的处理结果，用于指标统计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RewardStatus {
    Rewarded,
    NotEligible,
    Duplicate,
}

impl RewardStatus {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Rewarded => "rewarded",
            Self::NotEligible => "not_eligible",
            Self::Duplicate => "duplicate",
        }
    }
}

/// 奖励网络服务
///
/// 无内部状态，所有依赖都以 trait 对象注入，可在任意 tokio worker 上并发调用
pub struct RewardNetworkService {
    account_repo: Arc<dyn AccountRepositoryTrait>,
    restaurant_repo: Arc<dyn RestaurantRepositoryTrait>,
    reward_repo: Arc<dyn RewardRepositoryTrait>,
    unit_of_work: Arc<dyn RewardUnitOfWork>,
    retry_policy: RetryPolicy,
}

impl RewardNetworkService {
    pub fn new(
        account_repo: Arc<dyn AccountRepositoryTrait>,
        restaurant_repo: Arc<dyn RestaurantRepositoryTrait>,
        reward_repo: Arc<dyn RewardRepositoryTrait>,
        unit_of_work: Arc<dyn RewardUnitOfWork>,
    ) -> Self {
        Self {
            account_repo,
            restaurant_repo,
            reward_repo,
            unit_of_work,
            retry_policy: RewardConfig::default().commit_retry_policy(),
        }
    }

    /// 设置乐观锁冲突的重试策略
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// 为一笔用餐交易发放奖励
    ///
    /// 重复的交易 ID 直接返回已有的奖励确认，不会再次写入账户
    #[instrument(
        skip(self, dining),
        fields(
            transaction_id = %dining.transaction_id,
            merchant_number = %dining.merchant_number,
        )
    )]
    pub async fn reward(&self, dining: &Dining) -> Result<RewardConfirmation> {
        let start = Instant::now();
        let result = self.process(dining).await;
        let elapsed = start.elapsed().as_secs_f64();

        match result {
            Ok((confirmation, status)) => {
                metrics::record_reward(status.as_str(), elapsed);
                if status == RewardStatus::Rewarded {
                    if let Some(minor_units) = confirmation.amount.minor_units() {
                        metrics::record_reward_amount(minor_units);
                    }
                }
                Ok(confirmation)
            }
            Err(e) => {
                metrics::record_reward("failed", elapsed);
                warn!(error = %e, error_code = e.error_code(), "奖励处理失败");
                Err(e)
            }
        }
    }

    async fn process(&self, dining: &Dining) -> Result<(RewardConfirmation, RewardStatus)> {
        dining.validate()?;

        // 1. 查找餐厅（不随账户重试）
        let restaurant = self
            .restaurant_repo
            .find_by_merchant_number(&dining.merchant_number)
            .await?
            .ok_or_else(|| RewardError::RestaurantNotFound(dining.merchant_number.clone()))?;

        // 2-7. 冲突时重新加载账户并重做
        retry_with_policy(
            &self.retry_policy,
            "reward_commit",
            |e: &RewardError| e.is_retryable(),
            || self.attempt(dining, &restaurant),
        )
        .await
    }

    async fn attempt(
        &self,
        dining: &Dining,
        restaurant: &Restaurant,
    ) -> Result<(RewardConfirmation, RewardStatus)> {
        // 2. 查找账户并校验分配比例
        let mut account = self
            .account_repo
            .find_by_credit_card_number(&dining.credit_card_number)
            .await?
            .ok_or_else(|| RewardError::account_not_found_for_card(&dining.credit_card_number))?;
        account.validate()?;

        // 3. 幂等检查
        if let Some(existing) = self.find_existing(&dining.transaction_id).await? {
            info!(
                confirmation_number = %existing.confirmation_number,
                "重复交易，返回已存在的奖励确认"
            );
            return Ok((existing, RewardStatus::Duplicate));
        }

        // 4. 计算奖励
        let calculation = calculator::calculate_reward(dining, restaurant)?;

        // 5-6. 拆分并计入储蓄；零奖励不写账户
        let (account_update, contribution, status) = if calculation.has_reward() {
            let shares = allocation::allocate(calculation.amount, &account.beneficiaries)?;
            let contribution = account.make_contribution(&shares)?;
            (Some(account), contribution, RewardStatus::Rewarded)
        } else {
            let contribution = AccountContribution::none(&account.number);
            let status = if calculation.is_eligible() {
                RewardStatus::Rewarded
            } else {
                RewardStatus::NotEligible
            };
            (None, contribution, status)
        };
        let confirmation = RewardConfirmation::new(dining, calculation.eligibility, contribution);

        // 7. 原子提交
        match self.commit(account_update, confirmation.clone()).await {
            Ok(()) => {
                info!(
                    account_number = %confirmation.account_number,
                    confirmation_number = %confirmation.confirmation_number,
                    amount = %confirmation.amount,
                    "奖励发放成功"
                );
                Ok((confirmation, status))
            }
            Err(RewardError::DuplicateTransaction(transaction_id)) => {
                // 并发请求先一步写入了同一交易，以其结果为准
                let existing = self.find_existing(&transaction_id).await?.ok_or_else(|| {
                    RewardError::Persistence(format!(
                        "交易冲突后未找到奖励确认: transaction_id={}",
                        transaction_id
                    ))
                })?;
                Ok((existing, RewardStatus::Duplicate))
            }
            Err(e @ RewardError::ConcurrentModification(_)) => {
                metrics::record_commit_conflict();
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn find_existing(&self, transaction_id: &str) -> Result<Option<RewardConfirmation>> {
        self.reward_repo.find_by_transaction_id(transaction_id).await
    }

    /// 在独立任务中提交，调用方放弃等待不会中断写入
    async fn commit(
        &self,
        account: Option<Account>,
        confirmation: RewardConfirmation,
    ) -> Result<()> {
        let unit_of_work = Arc::clone(&self.unit_of_work);
        tokio::spawn(async move { unit_of_work.commit(account, confirmation).await })
            .await
            .map_err(|e| RewardError::Persistence(format!("提交任务异常终止: {}", e)))?
    }

    /// 按交易 ID 查询奖励确认
    pub async fn find_confirmation(&self, transaction_id: &str) -> Result<RewardConfirmation> {
        self.find_existing(transaction_id)
            .await?
            .ok_or_else(|| RewardError::ConfirmationNotFound(transaction_id.to_string()))
    }

    /// 查询账户最近的奖励确认，按时间倒序
    pub async fn list_account_rewards(
        &self,
        account_number: &str,
        limit: i64,
    ) -> Result<Vec<RewardConfirmation>> {
        if limit <= 0 {
            return Err(RewardError::Validation(format!(
                "limit 必须大于 0: {}",
                limit
            )));
        }
        self.reward_repo.list_by_account(account_number, limit).await
    }
}
