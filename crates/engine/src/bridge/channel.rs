use async_trait::async_trait;
use domain::bridge::{BridgeMessage, Envelope};
use domain::Result;
use tokio::sync::mpsc;

// 宿主环境的开窗能力。浏览器里是 window.open + postMessage；
// 测试里是一对内存信道
#[async_trait]
pub trait PopupLauncher: Send + Sync {
    async fn open(&self, url: &str, width: u32, height: u32) -> Result<PopupConnection>;
}

pub trait PopupHandle: Send {
    fn is_closed(&self) -> bool;
    fn close(&self);
}

pub struct PopupConnection {
    pub handle: Box<dyn PopupHandle>,
    pub messages: mpsc::UnboundedReceiver<Envelope>,
}

// 弹窗侧往回报信的端口
pub trait OpenerPort: Send + Sync {
    fn post(&self, msg: &BridgeMessage);
    fn close_window(&self);
}
