//! PostgreSQL 奖励写入单元

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::account_repo::AccountRepository;
use super::reward_repo::RewardRepository;
use super::traits::RewardUnitOfWork;
use crate::error::Result;
use crate::models::{Account, RewardConfirmation};

/// 在同一个数据库事务中写入账户和奖励确认
pub struct PgRewardUnitOfWork {
    pool: PgPool,
}

impl PgRewardUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardUnitOfWork for PgRewardUnitOfWork {
    #[instrument(
        skip(self, account, confirmation),
        fields(
            transaction_id = %confirmation.transaction_id,
            account_number = %confirmation.account_number,
        )
    )]
    async fn commit(&self, account: Option<Account>, confirmation: RewardConfirmation) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(account) = &account {
            AccountRepository::save_in_tx(&mut tx, account).await?;
        }
        RewardRepository::create_in_tx(&mut tx, &confirmation).await?;

        tx.commit().await?;
        debug!(confirmation_number = %confirmation.confirmation_number, "奖励已提交");
        Ok(())
    }
}
