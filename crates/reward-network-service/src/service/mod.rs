//! 服务层
//!
//! 编排仓储、奖励计算与拆分，对表现层提供业务操作

pub mod account_manager;
pub mod dto;
pub mod reward_network;

pub use account_manager::AccountManager;
pub use dto::{AllocationUpdate, RewardDiningRequest, RewardListQuery, UpdateAllocationsRequest};
pub use reward_network::RewardNetworkService;
