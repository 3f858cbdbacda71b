use crate::store::CommentStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
}

// 只在有待审核评论时自动刷新；审核清空的那一刻停表。
// select 的结构保证同一时刻最多只有一只计时器活着：
// 快照一变，旧的 sleep 直接被丢弃，再按需重挂
pub struct PollingController {
    state: watch::Receiver<PollState>,
    cancel: CancellationToken,
}

impl PollingController {
    pub fn spawn(store: Arc<CommentStore>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(PollState::Idle);
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut rx = store.subscribe();
            loop {
                let pending = rx.borrow_and_update().has_pending;
                let next = if pending {
                    PollState::Polling
                } else {
                    PollState::Idle
                };
                state_tx.send_replace(next);

                if pending {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tokio::time::sleep(interval) => {
                            if let Err(e) = store.revalidate().await {
                                tracing::warn!("Poll revalidate failed: {}", e);
                            }
                        }
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                } else {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        changed = rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
            state_tx.send_replace(PollState::Idle);
        });

        Self {
            state: state_rx,
            cancel,
        }
    }

    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
