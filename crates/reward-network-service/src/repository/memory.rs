//! 内存存储
//!
//! 同时实现四个仓储接口，适用于测试和本地演示。
//! 账户与奖励确认由同一把锁保护，提交时版本检查和交易 ID 唯一性检查在同一个临界区内完成。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use super::traits::{
    AccountRepositoryTrait, RestaurantRepositoryTrait, RewardRepositoryTrait, RewardUnitOfWork,
};
use crate::error::{Result, RewardError};
use crate::models::{Account, Percentage, Restaurant, RewardConfirmation};

#[derive(Default)]
struct LedgerState {
    accounts: BTreeMap<i64, Account>,
    /// 信用卡号 -> 账户 ID
    cards: HashMap<String, i64>,
    rewards: HashMap<String, RewardConfirmation>,
    /// 按写入顺序记录的交易 ID
    reward_log: Vec<String>,
}

impl LedgerState {
    /// 校验版本并写入，返回写入后的账户
    fn write_account(&mut self, account: &Account, next_id: &AtomicI64) -> Result<Account> {
        account.validate()?;

        if !account.is_persisted() {
            if self.accounts.values().any(|a| a.number == account.number) {
                return Err(RewardError::Validation(format!(
                    "账户号已存在: {}",
                    account.number
                )));
            }
            if let Some(card) = account
                .credit_card_numbers
                .iter()
                .find(|card| self.cards.contains_key(*card))
            {
                return Err(RewardError::Validation(format!(
                    "信用卡已关联其他账户: {}",
                    crate::error::mask_card_number(card)
                )));
            }

            let id = next_id.fetch_add(1, Ordering::SeqCst);
            let saved = Account {
                id,
                version: 0,
                ..account.clone()
            };
            for card in &saved.credit_card_numbers {
                self.cards.insert(card.clone(), id);
            }
            self.accounts.insert(id, saved.clone());
            return Ok(saved);
        }

        let stored = self
            .accounts
            .get_mut(&account.id)
            .ok_or(RewardError::AccountIdNotFound(account.id))?;
        if stored.version != account.version {
            return Err(RewardError::ConcurrentModification(account.number.clone()));
        }

        let saved = Account {
            version: account.version + 1,
            credit_card_numbers: stored.credit_card_numbers.clone(),
            ..account.clone()
        };
        *stored = saved.clone();
        Ok(saved)
    }
}

/// 内存存储
pub struct InMemoryRewardStore {
    restaurants: DashMap<String, Restaurant>,
    state: Mutex<LedgerState>,
    next_account_id: AtomicI64,
    next_restaurant_id: AtomicI64,
    account_writes: AtomicU64,
}

impl Default for InMemoryRewardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRewardStore {
    pub fn new() -> Self {
        Self {
            restaurants: DashMap::new(),
            state: Mutex::new(LedgerState::default()),
            next_account_id: AtomicI64::new(1),
            next_restaurant_id: AtomicI64::new(1),
            account_writes: AtomicU64::new(0),
        }
    }

    /// 预置演示数据：一个双受益人账户和一家 8% 奖励的餐厅
    pub fn with_sample_data() -> Result<Self> {
        let store = Self::new();
        let half = Percentage::new(Decimal::new(5, 1))?;

        store.add_account(
            Account::new("123456789", "Keith and Keri Donald")
                .with_credit_card("1234123412341234")
                .with_beneficiary("Annabelle", half)
                .with_beneficiary("Corgan", half),
        )?;
        store.add_restaurant(Restaurant::new(
            "1234567890",
            "AppleBees",
            Percentage::new(Decimal::new(8, 2))?,
        ));

        Ok(store)
    }

    /// 登记餐厅，同商户号覆盖
    pub fn add_restaurant(&self, restaurant: Restaurant) -> Restaurant {
        let saved = Restaurant {
            id: self.next_restaurant_id.fetch_add(1, Ordering::SeqCst),
            ..restaurant
        };
        self.restaurants
            .insert(saved.merchant_number.clone(), saved.clone());
        saved
    }

    /// 登记新账户
    pub fn add_account(&self, account: Account) -> Result<Account> {
        self.state
            .lock()
            .write_account(&account, &self.next_account_id)
    }

    /// 账户被写入的累计次数（含创建）
    pub fn account_write_count(&self) -> u64 {
        self.account_writes.load(Ordering::SeqCst)
    }

    pub fn reward_count(&self) -> usize {
        self.state.lock().rewards.len()
    }

    fn record_account_write(&self) {
        self.account_writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountRepositoryTrait for InMemoryRewardStore {
    async fn find_by_credit_card_number(&self, credit_card_number: &str) -> Result<Option<Account>> {
        let state = self.state.lock();
        Ok(state
            .cards
            .get(credit_card_number)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>> {
        Ok(self.state.lock().accounts.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Account>> {
        Ok(self.state.lock().accounts.values().cloned().collect())
    }

    async fn save(&self, account: &Account) -> Result<Account> {
        let saved = self
            .state
            .lock()
            .write_account(account, &self.next_account_id)?;
        self.record_account_write();
        Ok(saved)
    }
}

#[async_trait]
impl RestaurantRepositoryTrait for InMemoryRewardStore {
    async fn find_by_merchant_number(&self, merchant_number: &str) -> Result<Option<Restaurant>> {
        Ok(self.restaurants.get(merchant_number).map(|r| r.clone()))
    }
}

#[async_trait]
impl RewardRepositoryTrait for InMemoryRewardStore {
    async fn find_by_transaction_id(&self, transaction_id: &str) -> Result<Option<RewardConfirmation>> {
        Ok(self.state.lock().rewards.get(transaction_id).cloned())
    }

    async fn save(&self, confirmation: &RewardConfirmation) -> Result<()> {
        let mut state = self.state.lock();
        if state.rewards.contains_key(&confirmation.transaction_id) {
            return Err(RewardError::DuplicateTransaction(
                confirmation.transaction_id.clone(),
            ));
        }
        state.reward_log.push(confirmation.transaction_id.clone());
        state
            .rewards
            .insert(confirmation.transaction_id.clone(), confirmation.clone());
        Ok(())
    }

    async fn list_by_account(&self, account_number: &str, limit: i64) -> Result<Vec<RewardConfirmation>> {
        let state = self.state.lock();
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state
            .reward_log
            .iter()
            .rev()
            .filter_map(|tx| state.rewards.get(tx))
            .filter(|r| r.account_number == account_number)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RewardUnitOfWork for InMemoryRewardStore {
    async fn commit(&self, account: Option<Account>, confirmation: RewardConfirmation) -> Result<()> {
        let mut state = self.state.lock();

        if state.rewards.contains_key(&confirmation.transaction_id) {
            return Err(RewardError::DuplicateTransaction(
                confirmation.transaction_id.clone(),
            ));
        }

        // 先写账户：版本冲突时直接返回，奖励确认尚未写入
        let account_written = match &account {
            Some(account) => {
                state.write_account(account, &self.next_account_id)?;
                true
            }
            None => false,
        };

        state.reward_log.push(confirmation.transaction_id.clone());
        state
            .rewards
            .insert(confirmation.transaction_id.clone(), confirmation);
        drop(state);

        if account_written {
            self.record_account_write();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountContribution, Dining, Eligibility, MonetaryAmount};
    use rust_decimal_macros::dec;

    fn confirmation(transaction_id: &str, account_number: &str) -> RewardConfirmation {
        let dining = Dining::new(
            transaction_id,
            MonetaryAmount::new(dec!(10.00)),
            "1234123412341234",
            "1234567890",
        );
        RewardConfirmation::new(
            &dining,
            Eligibility::Eligible,
            AccountContribution::none(account_number),
        )
    }

    #[tokio::test]
    async fn test_sample_data() {
        let store = InMemoryRewardStore::with_sample_data().unwrap();
        let account = store
            .find_by_credit_card_number("1234123412341234")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.number, "123456789");
        assert_eq!(account.beneficiaries.len(), 2);
        assert!(store
            .find_by_merchant_number("1234567890")
            .await
            .unwrap()
            .is_some());
        assert_eq!(store.account_write_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected() {
        let store = InMemoryRewardStore::with_sample_data().unwrap();
        let account = store.find_by_id(1).await.unwrap().unwrap();

        let saved = AccountRepositoryTrait::save(&store, &account).await.unwrap();
        assert_eq!(saved.version, 1);

        let result = AccountRepositoryTrait::save(&store, &account).await;
        assert!(matches!(result, Err(RewardError::ConcurrentModification(_))));
        assert_eq!(store.account_write_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_account_is_not_saved() {
        let store = InMemoryRewardStore::new();
        let account = Account::new("1", "x")
            .with_beneficiary("a", Percentage::new(dec!(0.5)).unwrap());
        let result = AccountRepositoryTrait::save(&store, &account).await;
        assert!(matches!(result, Err(RewardError::InvalidAllocation(_))));
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_card_is_rejected() {
        let store = InMemoryRewardStore::with_sample_data().unwrap();
        let other = Account::new("987654321", "Other")
            .with_credit_card("1234123412341234")
            .with_beneficiary("solo", Percentage::one());
        assert!(matches!(
            store.add_account(other),
            Err(RewardError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_is_atomic_on_conflict() {
        let store = InMemoryRewardStore::with_sample_data().unwrap();
        let mut stale = store.find_by_id(1).await.unwrap().unwrap();
        AccountRepositoryTrait::save(&store, &stale).await.unwrap();

        stale.name = "changed".to_string();
        let result = store
            .commit(Some(stale), confirmation("tx-1", "123456789"))
            .await;
        assert!(matches!(result, Err(RewardError::ConcurrentModification(_))));
        assert!(store.find_by_transaction_id("tx-1").await.unwrap().is_none());
        assert_eq!(store.reward_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_transaction_is_rejected() {
        let store = InMemoryRewardStore::with_sample_data().unwrap();
        store
            .commit(None, confirmation("tx-1", "123456789"))
            .await
            .unwrap();

        let account = store.find_by_id(1).await.unwrap().unwrap();
        let result = store
            .commit(Some(account), confirmation("tx-1", "123456789"))
            .await;
        assert!(matches!(result, Err(RewardError::DuplicateTransaction(_))));
        assert_eq!(store.find_by_id(1).await.unwrap().unwrap().version, 0);
        assert_eq!(store.account_write_count(), 0);
    }

    #[tokio::test]
    async fn test_list_by_account_is_newest_first() {
        let store = InMemoryRewardStore::new();
        for tx in ["tx-1", "tx-2", "tx-3"] {
            RewardRepositoryTrait::save(&store, &confirmation(tx, "123456789"))
                .await
                .unwrap();
        }
        RewardRepositoryTrait::save(&store, &confirmation("tx-x", "000000000"))
            .await
            .unwrap();

        let recent = store.list_by_account("123456789", 2).await.unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.transaction_id.as_str()).collect();
        assert_eq!(ids, vec!["tx-3", "tx-2"]);
    }
}
