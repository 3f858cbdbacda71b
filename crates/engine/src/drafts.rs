use domain::ContentRef;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use storage::LocalStore;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DraftKey {
    pub target: ContentRef,
    pub parent: Option<String>,
}

impl DraftKey {
    pub fn root(target: ContentRef) -> Self {
        Self {
            target,
            parent: None,
        }
    }

    pub fn reply(target: ContentRef, parent: impl Into<String>) -> Self {
        Self {
            target,
            parent: Some(parent.into()),
        }
    }

    fn parent_str(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

struct PendingWrite {
    cancel: CancellationToken,
    body: String,
}

// 防抖计时器是限定资源：每次击键重挂，卸载时保证取消。
// 取消只丢掉未落盘的那一笔，已提交的内容不动
pub struct DraftStore {
    store: LocalStore,
    debounce: Duration,
    pending: Mutex<HashMap<DraftKey, PendingWrite>>,
}

impl DraftStore {
    pub fn new(store: LocalStore, debounce: Duration) -> Self {
        Self {
            store,
            debounce,
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub async fn load(&self, key: &DraftKey) -> Option<String> {
        match self.store.load_draft(&key.target, key.parent_str()).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Draft load failed: {}", e);
                None
            }
        }
    }

    pub fn record_input(&self, key: &DraftKey, body: impl Into<String>) {
        let body = body.into();
        let token = CancellationToken::new();
        {
            let mut map = self.pending.lock().unwrap();
            if let Some(prev) = map.insert(
                key.clone(),
                PendingWrite {
                    cancel: token.clone(),
                    body: body.clone(),
                },
            ) {
                prev.cancel.cancel();
            }
        }

        let store = self.store.clone();
        let key = key.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(debounce) => {
                    // 到点落盘；空文本等价于删键
                    if let Err(e) = store.save_draft(&key.target, key.parent_str(), &body).await {
                        tracing::warn!("Draft persist failed: {}", e);
                    }
                }
            }
        });
    }

    // 卸载 composer：只取消计时器
    pub fn cancel_pending(&self, key: &DraftKey) {
        if let Some(p) = self.pending.lock().unwrap().remove(key) {
            p.cancel.cancel();
        }
    }

    // 不等防抖，立即落盘（测试与关窗前用）
    pub async fn flush(&self, key: &DraftKey) -> anyhow::Result<()> {
        let pending = self.pending.lock().unwrap().remove(key);
        if let Some(p) = pending {
            p.cancel.cancel();
            self.store
                .save_draft(&key.target, key.parent_str(), &p.body)
                .await?;
        }
        Ok(())
    }

    // 提交成功或显式清空
    pub async fn clear(&self, key: &DraftKey) -> anyhow::Result<()> {
        self.cancel_pending(key);
        self.store.delete_draft(&key.target, key.parent_str()).await
    }
}
