//! 奖励网络服务
//!
//! 组合根：配置 -> 存储 -> 仓储 -> 服务 -> 路由

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, http::HeaderValue, http::StatusCode, routing::get};
use reward_network::{
    AccountManager, AccountRepository, InMemoryRewardStore, PgRewardUnitOfWork,
    RestaurantRepository, RewardNetworkService, RewardRepository, routes, state::AppState,
};
use rewards_shared::{
    config::{AppConfig, StorageBackend},
    database::Database,
    observability,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

const SERVICE_NAME: &str = "reward-network";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(
        environment = %config.environment,
        storage = ?config.reward.storage,
        "Starting {} on {}",
        SERVICE_NAME,
        config.server_addr()
    );

    let retry_policy = config.reward.commit_retry_policy();

    // 按存储后端装配仓储与服务
    let (reward_network, account_manager, database) = match config.reward.storage {
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            if config.database.run_migrations {
                db.run_migrations().await?;
            }

            let pool = db.pool().clone();
            let account_repo = Arc::new(AccountRepository::new(pool.clone()));
            let reward_network = RewardNetworkService::new(
                account_repo.clone(),
                Arc::new(RestaurantRepository::new(pool.clone())),
                Arc::new(RewardRepository::new(pool.clone())),
                Arc::new(PgRewardUnitOfWork::new(pool)),
            )
            .with_retry_policy(retry_policy);

            (reward_network, AccountManager::new(account_repo), Some(db))
        }
        StorageBackend::Memory => {
            if config.is_production() {
                warn!("生产环境使用内存存储，重启后数据将丢失");
            }
            let store = Arc::new(InMemoryRewardStore::with_sample_data()?);
            let reward_network = RewardNetworkService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )
            .with_retry_policy(retry_policy);

            (reward_network, AccountManager::new(store), None)
        }
    };

    let state = AppState::new(
        Arc::new(reward_network),
        Arc::new(account_manager),
        config.reward.account_rewards_limit,
    );

    let app = routes::app(
        state,
        Duration::from_secs(config.server.request_timeout_seconds),
    )
    .route(
        "/ready",
        get({
            let database = database.clone();
            move || readiness_check(database.clone())
        }),
    )
    .layer(cors_layer());

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = database {
        db.close().await;
    }
    info!("Server shutdown complete");

    Ok(())
}

/// CORS 配置：通过 REWARDS_CORS_ORIGINS 控制允许的来源，默认允许全部
fn cors_layer() -> CorsLayer {
    let allowed_origins = std::env::var("REWARDS_CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    if allowed_origins == "*" {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 就绪探针：PostgreSQL 模式下检查数据库连通性
async fn readiness_check(database: Option<Database>) -> (StatusCode, Json<serde_json::Value>) {
    let Some(db) = database else {
        return (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "storage": "memory" })),
        );
    };

    match db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "ready", "storage": "postgres" })),
        ),
        Err(e) => {
            warn!(error = %e, "数据库健康检查失败");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "not_ready", "error": "database unavailable" })),
            )
        }
    }
}
