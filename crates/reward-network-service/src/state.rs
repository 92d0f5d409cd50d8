//! 应用状态定义
//!
//! 包含 Axum 路由共享的应用状态

use std::sync::Arc;

use crate::service::{AccountManager, RewardNetworkService};

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub reward_network: Arc<RewardNetworkService>,
    pub account_manager: Arc<AccountManager>,
    /// 账户奖励列表默认返回条数
    pub account_rewards_limit: i64,
}

impl AppState {
    pub fn new(
        reward_network: Arc<RewardNetworkService>,
        account_manager: Arc<AccountManager>,
        account_rewards_limit: i64,
    ) -> Self {
        Self {
            reward_network,
            account_manager,
            account_rewards_limit,
        }
    }
}
