//! 账户仓储
//!
//! 账户、信用卡与受益人分表存储，读取时组装为完整的 `Account`

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};

use super::traits::AccountRepositoryTrait;
use crate::error::{Result, RewardError};
use crate::models::{Account, Beneficiary, MonetaryAmount, Percentage};

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    number: String,
    name: String,
    version: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct BeneficiaryRow {
    account_id: i64,
    name: String,
    allocation_percentage: Percentage,
    savings: MonetaryAmount,
}

#[derive(Debug, sqlx::FromRow)]
struct CreditCardRow {
    account_id: i64,
    number: String,
}

/// 账户仓储
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按信用卡号查找账户
    #[instrument(skip(self, credit_card_number))]
    pub async fn find_by_credit_card_number(
        &self,
        credit_card_number: &str,
    ) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT a.id, a.number, a.name, a.version
            FROM accounts a
            JOIN account_credit_cards c ON c.account_id = a.id
            WHERE c.number = $1
            "#,
        )
        .bind(credit_card_number)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Self::assemble(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// 按主键查找账户
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, number, name, version
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Self::assemble(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// 查询全部账户
    pub async fn find_all(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, number, name, version
            FROM accounts
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Self::assemble(&self.pool, rows).await
    }

    /// 保存账户（独立事务）
    #[instrument(skip(self, account), fields(account_number = %account.number))]
    pub async fn save(&self, account: &Account) -> Result<Account> {
        let mut tx = self.pool.begin().await?;
        let saved = Self::save_in_tx(&mut tx, account).await?;
        tx.commit().await?;
        Ok(saved)
    }

    /// 在事务中保存账户
    pub async fn save_in_tx(tx: &mut PgConnection, account: &Account) -> Result<Account> {
        account.validate()?;
        if account.is_persisted() {
            Self::update_in_tx(tx, account).await
        } else {
            Self::insert_in_tx(tx, account).await
        }
    }

    async fn insert_in_tx(tx: &mut PgConnection, account: &Account) -> Result<Account> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (number, name, version, created_at, updated_at)
            VALUES ($1, $2, 0, NOW(), NOW())
            RETURNING id
            "#,
        )
        .bind(&account.number)
        .bind(&account.name)
        .fetch_one(&mut *tx)
        .await?;

        for card in &account.credit_card_numbers {
            sqlx::query(
                r#"
                INSERT INTO account_credit_cards (account_id, number)
                VALUES ($1, $2)
                "#,
            )
            .bind(id)
            .bind(card)
            .execute(&mut *tx)
            .await?;
        }

        Self::write_beneficiaries_in_tx(tx, id, &account.beneficiaries).await?;
        debug!(account_id = id, "账户已创建");

        Ok(Account {
            id,
            version: 0,
            ..account.clone()
        })
    }

    /// 乐观锁更新：只有版本号与读取时一致才会写入
    async fn update_in_tx(tx: &mut PgConnection, account: &Account) -> Result<Account> {
        let updated = sqlx::query(
            r#"
            UPDATE accounts
            SET name = $3, version = version + 1, updated_at = NOW()
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(account.id)
        .bind(account.version)
        .bind(&account.name)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(RewardError::ConcurrentModification(account.number.clone()));
        }

        Self::write_beneficiaries_in_tx(tx, account.id, &account.beneficiaries).await?;

        Ok(Account {
            version: account.version + 1,
            ..account.clone()
        })
    }

    /// 按名称 upsert 受益人，并删除已不在列表中的受益人
    async fn write_beneficiaries_in_tx(
        tx: &mut PgConnection,
        account_id: i64,
        beneficiaries: &[Beneficiary],
    ) -> Result<()> {
        let names: Vec<String> = beneficiaries.iter().map(|b| b.name.clone()).collect();
        sqlx::query(
            r#"
            DELETE FROM beneficiaries
            WHERE account_id = $1 AND NOT (name = ANY($2))
            "#,
        )
        .bind(account_id)
        .bind(&names)
        .execute(&mut *tx)
        .await?;

        for (position, beneficiary) in beneficiaries.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO beneficiaries (account_id, position, name, allocation_percentage, savings)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (account_id, name) DO UPDATE
                SET position = EXCLUDED.position,
                    allocation_percentage = EXCLUDED.allocation_percentage,
                    savings = EXCLUDED.savings
                "#,
            )
            .bind(account_id)
            .bind(position as i32)
            .bind(&beneficiary.name)
            .bind(beneficiary.allocation_percentage)
            .bind(beneficiary.savings)
            .execute(&mut *tx)
            .await?;
        }

        Ok(())
    }

    /// 批量加载受益人和信用卡并组装账户，保持 rows 的顺序
    async fn assemble(pool: &PgPool, rows: Vec<AccountRow>) -> Result<Vec<Account>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let beneficiary_rows = sqlx::query_as::<_, BeneficiaryRow>(
            r#"
            SELECT account_id, name, allocation_percentage, savings
            FROM beneficiaries
            WHERE account_id = ANY($1)
            ORDER BY account_id, position
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let card_rows = sqlx::query_as::<_, CreditCardRow>(
            r#"
            SELECT account_id, number
            FROM account_credit_cards
            WHERE account_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut beneficiaries: HashMap<i64, Vec<Beneficiary>> = HashMap::new();
        for row in beneficiary_rows {
            beneficiaries.entry(row.account_id).or_default().push(
                Beneficiary::new(row.name, row.allocation_percentage).with_savings(row.savings),
            );
        }

        let mut cards: HashMap<i64, Vec<String>> = HashMap::new();
        for row in card_rows {
            cards.entry(row.account_id).or_default().push(row.number);
        }

        Ok(rows
            .into_iter()
            .map(|row| Account {
                beneficiaries: beneficiaries.remove(&row.id).unwrap_or_default(),
                credit_card_numbers: cards.remove(&row.id).unwrap_or_default(),
                id: row.id,
                number: row.number,
                name: row.name,
                version: row.version,
            })
            .collect())
    }
}

#[async_trait]
impl AccountRepositoryTrait for AccountRepository {
    async fn find_by_credit_card_number(&self, credit_card_number: &str) -> Result<Option<Account>> {
        self.find_by_credit_card_number(credit_card_number).await
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        self.find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<Account>> {
        self.find_all().await
    }

    async fn save(&self, account: &Account) -> Result<Account> {
        self.save(account).await
    }
}
