//! 冲突重试
//!
//! 乐观锁写入失败时，调用方重新读取最新状态并重做整次操作。
//! 本模块只负责退避节奏与次数上限，是否可重试由调用方判断。

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// 指数退避重试策略
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// 首次执行之外允许的重试次数
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    /// 共 5 次尝试，退避 10ms 起步，封顶 200ms
    fn default() -> Self {
        Self {
            max_retries: 4,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(200),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// 不重试，只执行一次
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// 最多执行的总次数
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// 第 `retry` 次重试（从 0 开始）前的等待时间
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);
        let delay_ms = (self.initial_delay.as_millis() as f64 * factor)
            .min(self.max_delay.as_millis() as f64);
        Duration::from_millis(delay_ms as u64)
    }

    pub fn should_retry(&self, retry: u32) -> bool {
        retry < self.max_retries
    }
}

/// 按策略执行异步操作，遇到可重试错误时退避后重新执行
///
/// 每次重试都会重新调用 `operation`，闭包内部应重新加载所需状态。
/// 不可重试的错误与最后一次失败的错误原样返回。
pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut retry = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if retry > 0 {
                    debug!(operation = operation_name, retries = retry, "重试后成功");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !is_retryable(&err) {
            return Err(err);
        }
        if !policy.should_retry(retry) {
            warn!(
                operation = operation_name,
                attempts = policy.max_attempts(),
                error = %err,
                "重试次数耗尽"
            );
            return Err(err);
        }

        let delay = policy.delay_for_attempt(retry);
        debug!(
            operation = operation_name,
            retry,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "写入冲突，退避后重试"
        );
        tokio::time::sleep(delay).await;
        retry += 1;
    }
}
