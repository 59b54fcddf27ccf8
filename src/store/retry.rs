//! 一時的なストアエラーに対する指数バックオフ付きリトライ
//!
//! 1. 操作を実行
//! 2. 成功ならそのまま返す
//! 3. 一時的エラーでリトライ回数が残っていれば待機して再実行
//!    （待機時間は初回から倍々: 既定 1s, 2s, 4s）
//! 4. 恒久的エラー・中断・回数切れはそのまま返す

use super::StoreError;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// 初回の失敗後に行う再実行の最大回数
    pub max_retries: u32,
    /// 初回リトライまでの待機（ミリ秒）
    pub initial_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// `retry` 回目（1始まり）のリトライ前の待機時間
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut retries = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(StoreError::cancelled());
        }

        match operation().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::info!(operation = operation_name, retries, "Store operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() && retries < policy.max_retries => {
                retries += 1;
                let delay = policy.delay_for(retries);
                tracing::warn!(
                    operation = operation_name,
                    retry = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient store error, retrying after backoff"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(StoreError::cancelled()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(err) => {
                if err.is_transient() {
                    tracing::error!(
                        operation = operation_name,
                        retries,
                        error = %err,
                        "Store operation failed: retry budget exhausted"
                    );
                }
                return Err(err);
            }
        }
    }
}
