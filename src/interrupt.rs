//! Ctrl-C の扱い
//!
//! 中断できる処理（取込・確定・全削除・復旧）の実行中に押されたら、
//! キャンセルトークンを立てて保存済みの分を残したまま止める。
//! それ以外のとき、または2回目に押されたときはすぐに終了する。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 中断時の終了コード（128 + SIGINT）
pub const EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// 実行中の処理にキャンセルを伝えた
    Cancel,
    /// プロセスを終了する
    Exit,
}

#[derive(Debug, Default)]
struct State {
    active: AtomicUsize,
    presses: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    token: CancellationToken,
    state: Arc<State>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// 中断できる処理の範囲（戻り値を保持している間）
    pub fn cancellable(&self) -> CancellableScope {
        self.state.active.fetch_add(1, Ordering::SeqCst);
        CancellableScope {
            state: self.state.clone(),
        }
    }

    pub fn is_cancellable(&self) -> bool {
        self.state.active.load(Ordering::SeqCst) > 0
    }

    /// Ctrl-C が押されたときの判定
    pub fn on_signal(&self) -> InterruptAction {
        let presses = self.state.presses.fetch_add(1, Ordering::SeqCst) + 1;
        if presses == 1 && self.is_cancellable() {
            self.token.cancel();
            InterruptAction::Cancel
        } else {
            InterruptAction::Exit
        }
    }

    /// シグナルを待ち受け、判定に従って中断または終了する
    pub fn listen(&self) {
        let interrupt = self.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                match interrupt.on_signal() {
                    InterruptAction::Cancel => {
                        println!("\n中断しています...（もう一度押すと終了します）");
                    }
                    InterruptAction::Exit => {
                        tracing::debug!("Interrupted, exiting");
                        println!();
                        std::process::exit(EXIT_CODE);
                    }
                }
            }
        });
    }
}

pub struct CancellableScope {
    state: Arc<State>,
}

impl Drop for CancellableScope {
    fn drop(&mut self) {
        self.state.active.fetch_sub(1, Ordering::SeqCst);
    }
}
