//! 奖励网络服务
//!
//! 根据用餐交易计算奖励，按分配比例拆分给账户受益人，
//! 并原子地持久化账户与奖励确认。
//!
//! ## 模块结构
//!
//! - `models`: 金额值类型与领域实体
//! - `calculator`: 奖励计算
//! - `allocation`: 受益人拆分
//! - `repository`: 数据访问层（PostgreSQL 与内存实现）
//! - `service`: 业务逻辑层
//! - `handlers` / `routes`: REST 表现层

pub mod allocation;
pub mod calculator;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod service;
pub mod state;

pub use error::{ErrorKind, Result, RewardError};
pub use models::{
    Account, AccountContribution, Beneficiary, BenefitAvailabilityPolicy, Dining, Distribution,
    Eligibility, MonetaryAmount, Percentage, Restaurant, RewardConfirmation,
};
pub use repository::{
    AccountRepository, AccountRepositoryTrait, InMemoryRewardStore, PgRewardUnitOfWork,
    RestaurantRepository, RestaurantRepositoryTrait, RewardRepository, RewardRepositoryTrait,
    RewardUnitOfWork,
};
pub use service::{AccountManager, RewardNetworkService};
