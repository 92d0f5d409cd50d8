//! 配置加载集成测试
//!
//! 通过 CONFIG_DIR 指向临时目录，验证文件与环境变量的覆盖顺序。

use std::fs;

use rewards_shared::config::{AppConfig, StorageBackend};

#[test]
fn test_load_from_files_and_env() {
    let dir = std::env::temp_dir().join(format!("rewards-config-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();

    fs::write(
        dir.join("default.toml"),
        r#"
[server]
port = 9000

[reward]
max_commit_attempts = 3
storage = "memory"
"#,
    )
    .unwrap();

    fs::write(
        dir.join("reward-network.toml"),
        r#"
[server]
port = 9100

[database]
max_connections = 42
"#,
    )
    .unwrap();

    // SAFETY: 本测试文件只有这一个测试，不存在并发修改环境变量
    unsafe {
        std::env::set_var("CONFIG_DIR", &dir);
        std::env::set_var("REWARDS_REWARD__ACCOUNT_REWARDS_LIMIT", "7");
    }

    let config = AppConfig::load("reward-network").unwrap();

    unsafe {
        std::env::remove_var("CONFIG_DIR");
        std::env::remove_var("REWARDS_REWARD__ACCOUNT_REWARDS_LIMIT");
    }
    fs::remove_dir_all(&dir).ok();

    // 服务特定文件覆盖默认文件
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.database.max_connections, 42);
    // 未覆盖的字段保留默认文件中的值
    assert_eq!(config.reward.max_commit_attempts, 3);
    assert_eq!(config.reward.storage, StorageBackend::Memory);
    // 环境变量最后生效
    assert_eq!(config.reward.account_rewards_limit, 7);
    // 文件中未出现的字段落到代码默认值
    assert_eq!(config.database.min_connections, 2);
    assert_eq!(config.service_name, "reward-network");
}
