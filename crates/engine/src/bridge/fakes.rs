// 桥接两侧共用的测试替身：内存信道模拟 postMessage 与窗口句柄
use super::channel::{OpenerPort, PopupConnection, PopupHandle};
use domain::bridge::{BridgeMessage, Envelope, Origin};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Default)]
pub struct RecordingPort {
    pub messages: Mutex<Vec<BridgeMessage>>,
    pub closed: AtomicBool,
}

impl RecordingPort {
    pub fn posted(&self) -> Vec<BridgeMessage> {
        self.messages.lock().unwrap().clone()
    }
}

impl OpenerPort for RecordingPort {
    fn post(&self, msg: &BridgeMessage) {
        self.messages.lock().unwrap().push(msg.clone());
    }

    fn close_window(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct FakeHandle {
    pub closed: Arc<AtomicBool>,
}

impl PopupHandle for FakeHandle {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct FakePopup {
    pub tx: mpsc::UnboundedSender<Envelope>,
    pub closed: Arc<AtomicBool>,
}

impl FakePopup {
    pub fn open() -> (Self, PopupConnection) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let conn = PopupConnection {
            handle: Box::new(FakeHandle {
                closed: closed.clone(),
            }),
            messages: rx,
        };
        (Self { tx, closed }, conn)
    }

    pub fn send(&self, origin: &Origin, msg: &BridgeMessage) {
        let _ = self.tx.send(Envelope {
            origin: origin.clone(),
            payload: serde_json::to_value(msg).expect("bridge message serializes"),
        });
    }

    pub fn send_raw(&self, origin: &Origin, payload: serde_json::Value) {
        let _ = self.tx.send(Envelope {
            origin: origin.clone(),
            payload,
        });
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// 把 popup 状态机的出口直接接到 opener 的信道上，
// 用于两端合体的集成用例
pub struct ForwardingPort {
    pub tx: mpsc::UnboundedSender<Envelope>,
    pub origin: Origin,
    pub closed: Arc<AtomicBool>,
}

impl OpenerPort for ForwardingPort {
    fn post(&self, msg: &BridgeMessage) {
        let _ = self.tx.send(Envelope {
            origin: self.origin.clone(),
            payload: serde_json::to_value(msg).expect("bridge message serializes"),
        });
    }

    fn close_window(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
