use domain::SessionIdentity;
use std::sync::Arc;
use storage::LocalStore;
use tokio::sync::watch;

// 进程级登录态。只有两处会写：桥接成功与显式登出；
// 其余组件只读或订阅
#[derive(Clone)]
pub struct SessionHandle {
    tx: Arc<watch::Sender<Option<SessionIdentity>>>,
    store: Option<LocalStore>,
}

impl SessionHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            store: None,
        }
    }

    // 启动时从本地库恢复上次的登录态
    pub async fn restore(store: LocalStore) -> anyhow::Result<Self> {
        let existing = store.load_session().await?;
        let (tx, _rx) = watch::channel(existing);
        Ok(Self {
            tx: Arc::new(tx),
            store: Some(store),
        })
    }

    pub fn get(&self) -> Option<SessionIdentity> {
        self.tx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn is_admin(&self) -> bool {
        self.tx.borrow().as_ref().is_some_and(|s| s.user.is_admin)
    }

    pub async fn set(&self, identity: SessionIdentity) -> anyhow::Result<()> {
        if let Some(store) = &self.store {
            store.save_session(&identity).await?;
        }
        self.tx.send_replace(Some(identity));
        Ok(())
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        if let Some(store) = &self.store {
            store.clear_session().await?;
        }
        self.tx.send_replace(None);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SessionIdentity>> {
        self.tx.subscribe()
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}
