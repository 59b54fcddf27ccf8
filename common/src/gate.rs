//! 4桁アクセスコードによる入力ゲート
//!
//! 誤操作・いたずら防止のためのUI上の抑止機能であり、認証ではない。
//! コードは設定ファイルにも平文で置かれる。

use crate::error::{Error, Result};
use std::time::{Duration, Instant};

/// ロックまでの連続失敗回数
pub const MAX_ATTEMPTS: u32 = 4;

/// ロック時間
pub const LOCKOUT: Duration = Duration::from_secs(5);

/// 入力結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Granted,
    /// 不一致（ロックまでの残り回数）
    Denied { remaining: u32 },
    /// ロック中。`notify` はこの入力でロックされた場合のみtrue
    LockedOut { retry_after: Duration, notify: bool },
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    code: String,
    failures: u32,
    locked_until: Option<Instant>,
}

impl AccessGate {
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::Config("アクセスコードは4桁の数字です".into()));
        }
        Ok(Self {
            code: code.to_string(),
            failures: 0,
            locked_until: None,
        })
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn attempt(&mut self, input: &str, now: Instant) -> GateOutcome {
        if let Some(until) = self.locked_until {
            if now < until {
                return GateOutcome::LockedOut {
                    retry_after: until - now,
                    notify: false,
                };
            }
            self.locked_until = None;
        }

        if input.trim() == self.code {
            self.failures = 0;
            return GateOutcome::Granted;
        }

        self.failures += 1;
        if self.failures >= MAX_ATTEMPTS {
            self.failures = 0;
            self.locked_until = Some(now + LOCKOUT);
            return GateOutcome::LockedOut {
                retry_after: LOCKOUT,
                notify: true,
            };
        }

        GateOutcome::Denied {
            remaining: MAX_ATTEMPTS - self.failures,
        }
    }
}
