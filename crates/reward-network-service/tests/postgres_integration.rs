//! PostgreSQL 集成测试
//!
//! 需要可用的 PostgreSQL（TEST_DATABASE_URL 或 DATABASE_URL），默认忽略：
//! `cargo test -p reward-network-service --test postgres_integration -- --ignored`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reward_network::{
    Account, AccountManager, AccountRepository, AccountRepositoryTrait, Dining, MonetaryAmount, Percentage,
    PgRewardUnitOfWork, Restaurant, RestaurantRepository, RewardError, RewardNetworkService,
    RewardRepository, RewardRepositoryTrait,
};
use rewards_shared::database::Database;
use rewards_shared::retry::RetryPolicy;
use rewards_shared::test_utils::{
    init_test_tracing, test_account_number, test_credit_card_number, test_database_config,
    test_merchant_number, test_transaction_id,
};
use rust_decimal_macros::dec;

struct Fixture {
    service: Arc<RewardNetworkService>,
    accounts: Arc<AccountRepository>,
    rewards: Arc<RewardRepository>,
    account_id: i64,
    card: String,
    merchant: String,
}

async fn setup() -> Fixture {
    init_test_tracing();

    let db = Database::connect(&test_database_config())
        .await
        .expect("无法连接数据库，请确保 PostgreSQL 正在运行");
    db.run_migrations().await.expect("执行迁移失败");
    let pool = db.pool().clone();

    let accounts = Arc::new(AccountRepository::new(pool.clone()));
    let restaurants = Arc::new(RestaurantRepository::new(pool.clone()));
    let rewards = Arc::new(RewardRepository::new(pool.clone()));

    let card = test_credit_card_number();
    let merchant = test_merchant_number();

    let account = accounts
        .save(
            &Account::new(test_account_number(), "Integration Test")
                .with_credit_card(card.clone())
                .with_beneficiary("Annabelle", Percentage::new(dec!(0.6)).unwrap())
                .with_beneficiary("Corgan", Percentage::new(dec!(0.4)).unwrap()),
        )
        .await
        .expect("创建账户失败");
    restaurants
        .create(&Restaurant::new(
            merchant.clone(),
            "AppleBees",
            Percentage::new(dec!(0.08)).unwrap(),
        ))
        .await
        .expect("创建餐厅失败");

    let service = Arc::new(
        RewardNetworkService::new(
            accounts.clone(),
            restaurants,
            rewards.clone(),
            Arc::new(PgRewardUnitOfWork::new(pool)),
        )
        .with_retry_policy(RetryPolicy {
            max_retries: 50,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            multiplier: 1.5,
        }),
    );

    Fixture {
        service,
        accounts,
        rewards,
        account_id: account.id,
        card,
        merchant,
    }
}

impl Fixture {
    fn dining(&self, transaction_id: &str) -> Dining {
        Dining::new(
            transaction_id,
            MonetaryAmount::new(dec!(100.00)),
            self.card.clone(),
            self.merchant.clone(),
        )
    }

    async fn account(&self) -> Account {
        self.accounts
            .find_by_id(self.account_id)
            .await
            .unwrap()
            .expect("账户应存在")
    }
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_reward_persists_account_and_confirmation() {
    let fixture = setup().await;
    let transaction_id = test_transaction_id();

    let confirmation = fixture
        .service
        .reward(&fixture.dining(&transaction_id))
        .await
        .unwrap();
    assert_eq!(confirmation.amount.value(), dec!(8.00));

    let stored = fixture
        .rewards
        .find_by_transaction_id(&transaction_id)
        .await
        .unwrap()
        .expect("奖励确认应已持久化");
    assert_eq!(stored.confirmation_number, confirmation.confirmation_number);
    assert_eq!(stored.distributions, confirmation.distributions);

    let account = fixture.account().await;
    assert_eq!(account.version, 1);
    assert_eq!(account.beneficiaries[0].name, "Annabelle");
    assert_eq!(account.beneficiaries[0].savings.value(), dec!(4.80));
    assert_eq!(account.beneficiaries[1].savings.value(), dec!(3.20));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_reward_is_idempotent() {
    let fixture = setup().await;
    let dining = fixture.dining(&test_transaction_id());

    let first = fixture.service.reward(&dining).await.unwrap();
    let second = fixture.service.reward(&dining).await.unwrap();

    // 第二次返回的是从数据库读回的确认，包括时间戳在内应完全一致
    assert_eq!(first, second);
    assert_eq!(fixture.account().await.version, 1);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_stale_account_write_is_rejected() {
    let fixture = setup().await;
    let stale = fixture.account().await;

    fixture.accounts.save(&stale).await.unwrap();
    let err = fixture.accounts.save(&stale).await.unwrap_err();
    assert!(matches!(err, RewardError::ConcurrentModification(_)));
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_concurrent_rewards_do_not_lose_updates() {
    let fixture = setup().await;

    let tasks = (0..10).map(|_| {
        let service = fixture.service.clone();
        let dining = fixture.dining(&test_transaction_id());
        tokio::spawn(async move { service.reward(&dining).await })
    });
    for result in join_all(tasks).await {
        assert!(result.unwrap().is_ok());
    }

    let account = fixture.account().await;
    assert_eq!(account.version, 10);
    assert_eq!(account.total_savings().value(), dec!(80.00));

    let recent = fixture
        .rewards
        .list_by_account(&account.number, 5)
        .await
        .unwrap();
    assert_eq!(recent.len(), 5);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_unknown_merchant_writes_nothing() {
    let fixture = setup().await;
    let transaction_id = test_transaction_id();

    let dining = Dining::new(
        transaction_id.clone(),
        MonetaryAmount::new(dec!(100.00)),
        fixture.card.clone(),
        "UNKNOWN-MERCHANT",
    );
    let err = fixture.service.reward(&dining).await.unwrap_err();
    assert!(matches!(err, RewardError::RestaurantNotFound(_)));

    assert!(fixture
        .rewards
        .find_by_transaction_id(&transaction_id)
        .await
        .unwrap()
        .is_none());
    assert_eq!(fixture.account().await.version, 0);
}

#[tokio::test]
#[ignore = "需要 PostgreSQL 数据库连接"]
async fn test_allocation_percentages_survive_storage_round_trip() {
    let fixture = setup().await;
    let manager = AccountManager::new(fixture.accounts.clone());

    // 超过四位小数的比例在进入存储前就被拒绝
    assert!(matches!(
        Percentage::new(dec!(0.33335)),
        Err(RewardError::Validation(_))
    ));

    let percentages = HashMap::from([
        ("Annabelle".to_string(), Percentage::new(dec!(0.3333)).unwrap()),
        ("Corgan".to_string(), Percentage::new(dec!(0.6667)).unwrap()),
    ]);
    let updated = manager
        .update_beneficiary_allocation_percentages(fixture.account_id, percentages)
        .await
        .unwrap();

    let reloaded = fixture.account().await;
    assert_eq!(reloaded.beneficiaries, updated.beneficiaries);
    assert!(reloaded.validate().is_ok());

    let confirmation = fixture
        .service
        .reward(&fixture.dining(&test_transaction_id()))
        .await
        .unwrap();
    assert_eq!(confirmation.distribution("Annabelle").unwrap().amount.value(), dec!(2.67));
    assert_eq!(confirmation.distribution("Corgan").unwrap().amount.value(), dec!(5.33));
}
