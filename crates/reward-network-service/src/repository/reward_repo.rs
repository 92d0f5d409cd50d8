//! 奖励确认仓储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use super::traits::RewardRepositoryTrait;
use crate::error::{Result, RewardError};
use crate::models::{Distribution, Eligibility, MonetaryAmount, RewardConfirmation};

/// 交易 ID 唯一约束名
const TRANSACTION_ID_CONSTRAINT: &str = "uq_reward_confirmations_transaction_id";

#[derive(Debug, sqlx::FromRow)]
struct RewardConfirmationRow {
    confirmation_number: String,
    transaction_id: String,
    account_number: String,
    merchant_number: String,
    amount: MonetaryAmount,
    policy_violation: Option<String>,
    distributions: Json<Vec<Distribution>>,
    created_at: DateTime<Utc>,
}

impl From<RewardConfirmationRow> for RewardConfirmation {
    fn from(row: RewardConfirmationRow) -> Self {
        RewardConfirmation {
            confirmation_number: row.confirmation_number,
            transaction_id: row.transaction_id,
            account_number: row.account_number,
            merchant_number: row.merchant_number,
            amount: row.amount,
            eligibility: Eligibility::from_violation(row.policy_violation),
            distributions: row.distributions.0,
            created_at: row.created_at,
        }
    }
}

/// 奖励确认仓储
pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_transaction_id(
        &self,
        transaction_id: &str,
    ) -> Result<Option<RewardConfirmation>> {
        let row = sqlx::query_as::<_, RewardConfirmationRow>(
            r#"
            SELECT confirmation_number, transaction_id, account_number, merchant_number,
                   amount, policy_violation, distributions, created_at
            FROM reward_confirmations
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn save(&self, confirmation: &RewardConfirmation) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        Self::create_in_tx(&mut conn, confirmation).await
    }

    /// 在事务中写入奖励确认
    ///
    /// 交易 ID 冲突映射为 `DuplicateTransaction`
    pub async fn create_in_tx(
        tx: &mut PgConnection,
        confirmation: &RewardConfirmation,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reward_confirmations (confirmation_number, transaction_id, account_number,
                                              merchant_number, amount, policy_violation,
                                              distributions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&confirmation.confirmation_number)
        .bind(&confirmation.transaction_id)
        .bind(&confirmation.account_number)
        .bind(&confirmation.merchant_number)
        .bind(confirmation.amount)
        .bind(confirmation.eligibility.violation_reason())
        .bind(Json(&confirmation.distributions))
        .bind(confirmation.created_at)
        .execute(tx)
        .await
        .map_err(|e| map_insert_error(e, &confirmation.transaction_id))?;

        Ok(())
    }

    pub async fn list_by_account(
        &self,
        account_number: &str,
        limit: i64,
    ) -> Result<Vec<RewardConfirmation>> {
        let rows = sqlx::query_as::<_, RewardConfirmationRow>(
            r#"
            SELECT confirmation_number, transaction_id, account_number, merchant_number,
                   amount, policy_violation, distributions, created_at
            FROM reward_confirmations
            WHERE account_number = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(account_number)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

fn map_insert_error(err: sqlx::Error, transaction_id: &str) -> RewardError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(TRANSACTION_ID_CONSTRAINT) {
            return RewardError::DuplicateTransaction(transaction_id.to_string());
        }
    }
    RewardError::Database(err)
}

#[async_trait]
impl RewardRepositoryTrait for RewardRepository {
    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<RewardConfirmation>> {
        self.find_by_transaction_id(transaction_id).await
    }

    async fn save(&self, confirmation: &RewardConfirmation) -> Result<()> {
        self.save(confirmation).await
    }

    async fn list_by_account(&self, account_number: &str, limit: i64) -> Result<Vec<RewardConfirmation>> {
        self.list_by_account(account_number, limit).await
    }
}
