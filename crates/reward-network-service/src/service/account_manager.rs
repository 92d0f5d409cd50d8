//! 账户管理服务
//!
//! 提供账户查询与受益人分配比例维护

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::{Result, RewardError};
use crate::models::{Account, Percentage};
use crate::repository::AccountRepositoryTrait;

pub struct AccountManager {
    account_repo: Arc<dyn AccountRepositoryTrait>,
}

impl AccountManager {
    pub fn new(account_repo: Arc<dyn AccountRepositoryTrait>) -> Self {
        Self { account_repo }
    }

    pub async fn get_all_accounts(&self) -> Result<Vec<Account>> {
        self.account_repo.find_all().await
    }

    pub async fn get_account(&self, id: i64) -> Result<Account> {
        self.account_repo
            .find_by_id(id)
            .await?
            .ok_or(RewardError::AccountIdNotFound(id))
    }

    /// 替换受益人分配比例
    ///
    /// 更新后仍需满足合计 100%，并发修改时返回 `ConcurrentModification`
    #[instrument(skip(self, percentages), fields(account_id = id))]
    pub async fn update_beneficiary_allocation_percentages(
        &self,
        id: i64,
        percentages: HashMap<String, Percentage>,
    ) -> Result<Account> {
        let mut account = self.get_account(id).await?;
        account.update_allocation_percentages(&percentages)?;

        let saved = self.account_repo.save(&account).await?;
        info!(
            account_number = %saved.number,
            version = saved.version,
            "受益人分配比例已更新"
        );
        Ok(saved)
    }
}
