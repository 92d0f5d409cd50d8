//! 仓储层
//!
//! 提供账户、餐厅、奖励确认的数据访问接口，以及 PostgreSQL 与内存两套实现。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 使用 SQLx 进行类型安全的数据库操作
//! - 账户与奖励确认的双写通过 `RewardUnitOfWork` 在同一事务边界内完成
//! - 定义 trait 接口以支持 mock 测试

mod account_repo;
mod memory;
mod restaurant_repo;
mod reward_repo;
mod traits;
mod unit_of_work;

pub use account_repo::AccountRepository;
pub use memory::InMemoryRewardStore;
pub use restaurant_repo::RestaurantRepository;
pub use reward_repo::RewardRepository;
pub use traits::*;
pub use unit_of_work::PgRewardUnitOfWork;
