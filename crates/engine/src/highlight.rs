use crate::events::{EventBus, UiEvent};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    FadeIn,
    Hold,
    FadeOut,
    Done,
}

// 前 5% 渐入，到 40% 保持，剩余时间淡出
pub fn overlay_phase(elapsed: Duration, window: Duration) -> OverlayPhase {
    if window.is_zero() {
        return OverlayPhase::Done;
    }
    let ratio = elapsed.as_secs_f64() / window.as_secs_f64();
    if ratio < 0.05 {
        OverlayPhase::FadeIn
    } else if ratio < 0.40 {
        OverlayPhase::Hold
    } else if ratio < 1.0 {
        OverlayPhase::FadeOut
    } else {
        OverlayPhase::Done
    }
}

// 全局最多一个高亮目标，后触发者为准
pub struct HighlightCoordinator {
    active: Arc<watch::Sender<Option<String>>>,
    window: Duration,
    events: EventBus,
    clear_guard: Mutex<CancellationToken>,
}

impl HighlightCoordinator {
    pub fn new(window: Duration, events: EventBus) -> Self {
        let (active, _rx) = watch::channel(None);
        Self {
            active: Arc::new(active),
            window,
            events,
            clear_guard: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn active(&self) -> Option<String> {
        self.active.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.active.subscribe()
    }

    // 设定目标、请求滚动居中、挂 3 秒自动清除；
    // 窗口内再次触发会先吊销旧的清除定时器
    pub fn trigger(&self, id: &str) {
        let token = CancellationToken::new();
        {
            let mut guard = self.clear_guard.lock().unwrap();
            guard.cancel();
            *guard = token.clone();
        }

        let id = id.to_string();
        self.active.send_replace(Some(id.clone()));
        self.events.emit(UiEvent::ScrollTo { id: id.clone() });
        self.events.emit(UiEvent::HighlightChanged {
            id: Some(id.clone()),
        });

        let active = self.active.clone();
        let events = self.events.clone();
        let window = self.window;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(window) => {
                    // 只允许清掉自己点亮的那个目标
                    let cleared = active.send_if_modified(|cur| {
                        if cur.as_deref() == Some(id.as_str()) {
                            *cur = None;
                            true
                        } else {
                            false
                        }
                    });
                    if cleared {
                        events.emit(UiEvent::HighlightChanged { id: None });
                    }
                }
            }
        });
    }
}
