use futures::Stream;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

// 渲染端的订阅面：引擎内部状态变化都从这里广播出去
#[derive(Debug, Clone)]
pub enum UiEvent {
    SnapshotReplaced { count: i64, has_pending: bool },
    ScrollTo { id: String },
    HighlightChanged { id: Option<String> },
    LoginCompleted { name: String, is_new_user: bool, bound: bool },
    LoggedOut,
    Toast { level: ToastLevel, message: String },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    // 落后的订阅者丢帧即可，UI 事件无需补投
    pub fn stream(&self) -> impl Stream<Item = UiEvent> {
        BroadcastStream::new(self.subscribe()).filter_map(|r| r.ok())
    }

    pub fn emit(&self, event: UiEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_and_stream() {
        let bus = EventBus::default();
        let mut stream = Box::pin(bus.stream());
        bus.emit(UiEvent::ScrollTo { id: "c1".into() });
        match stream.next().await {
            Some(UiEvent::ScrollTo { id }) => assert_eq!(id, "c1"),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_fine() {
        let bus = EventBus::default();
        bus.emit(UiEvent::LoggedOut);
    }
}
