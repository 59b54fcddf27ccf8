//! アクセスコード入力
//!
//! 起動コードはCLI全体、アップロードコードは書き込み系コマンドを保護する。
//! 誤操作防止のための抑止であり、認証ではない。
//! 連続で失敗するとしばらく入力を受け付けず、設定があれば通知を送る（失敗しても続行）。

use crate::error::{CatalogError, Result};
use async_trait::async_trait;
use fabric_catalog_common::{AccessGate, GateOutcome};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// ロック発生時の通知内容
#[derive(Debug, Clone, Serialize)]
pub struct LockoutEvent {
    pub gate: String,
    pub timestamp: String,
    pub host: String,
}

impl LockoutEvent {
    pub fn now(gate: &str) -> Self {
        Self {
            gate: gate.to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
            host: std::env::var("HOSTNAME").unwrap_or_default(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// 通知は成否を返さない（失敗はログのみ）
    async fn notify(&self, event: &LockoutEvent);
}

/// 設定されたURLにJSONをPOSTする
pub struct HttpNotifier {
    client: Client,
    url: String,
}

impl HttpNotifier {
    pub fn new(url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, event: &LockoutEvent) {
        match self.client.post(&self.url).json(event).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(gate = %event.gate, "Lockout notification sent");
            }
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "Lockout notification rejected");
            }
            Err(e) => tracing::warn!(error = %e, "Lockout notification failed"),
        }
    }
}

/// コードが一致するまで入力を求める
///
/// `read_code` が `None` を返したら（入力終了・中断）拒否とする。
pub async fn unlock(
    gate_name: &str,
    code: &str,
    mut read_code: impl FnMut() -> Option<String>,
    notifier: Option<&dyn Notifier>,
) -> Result<()> {
    let mut gate = AccessGate::new(code)?;

    loop {
        let Some(input) = read_code() else {
            return Err(CatalogError::AccessDenied);
        };

        match gate.attempt(&input, tokio::time::Instant::now().into_std()) {
            GateOutcome::Granted => {
                tracing::debug!(gate = gate_name, "Access granted");
                return Ok(());
            }
            GateOutcome::Denied { remaining } => {
                println!("✖ コードが一致しません（あと{}回でロック）", remaining);
            }
            GateOutcome::LockedOut { retry_after, notify } => {
                if notify {
                    tracing::warn!(gate = gate_name, "Too many wrong codes, input locked");
                    if let Some(notifier) = notifier {
                        notifier.notify(&LockoutEvent::now(gate_name)).await;
                    }
                }
                println!("⏳ {}秒間入力できません", retry_after.as_secs().max(1));
                tokio::time::sleep(retry_after).await;
            }
        }
    }
}
