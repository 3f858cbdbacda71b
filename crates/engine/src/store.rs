use crate::events::{EventBus, UiEvent};
use crate::session::SessionHandle;
use client::{Api, ThreadPayload};
use domain::{CommentTree, ContentRef};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub tree: CommentTree,
    pub count: i64,
    pub has_pending: bool,
}

impl Snapshot {
    fn from_payload(payload: ThreadPayload) -> Self {
        let count = payload.count;
        let tree = CommentTree::from_flat(payload.comments);
        Self {
            has_pending: tree.has_pending(),
            count,
            tree,
        }
    }
}

// 快照唯一的持有者：读者只拿 Arc，替换整棵发生在一次 send 里,
// 渲染端永远看不到半新半旧的树
pub struct CommentStore {
    target: ContentRef,
    api: Arc<dyn Api>,
    session: SessionHandle,
    events: EventBus,
    snapshot: watch::Sender<Arc<Snapshot>>,
    activated: AtomicBool,
}

impl CommentStore {
    pub fn new(
        target: ContentRef,
        api: Arc<dyn Api>,
        session: SessionHandle,
        events: EventBus,
    ) -> Self {
        let (snapshot, _rx) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            target,
            api,
            session,
            events,
            snapshot,
            activated: AtomicBool::new(false),
        }
    }

    pub fn target(&self) -> &ContentRef {
        &self.target
    }

    // 服务端预渲染好的首屏数据，不走网络
    pub fn seed(&self, payload: ThreadPayload) {
        self.replace(Snapshot::from_payload(payload));
    }

    pub fn current(&self) -> Arc<Snapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot.subscribe()
    }

    // 懒挂载：首次进入视口附近时调用，之后的曝光不再触发
    pub async fn activate(&self) -> domain::Result<()> {
        if self.activated.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.revalidate().await
    }

    pub async fn revalidate(&self) -> domain::Result<()> {
        let token = self.session.token();
        let payload = self
            .api
            .fetch_comments(&self.target, token.as_deref())
            .await?;
        self.replace(Snapshot::from_payload(payload));
        Ok(())
    }

    fn replace(&self, snapshot: Snapshot) {
        let count = snapshot.count;
        let has_pending = snapshot.has_pending;
        self.snapshot.send_replace(Arc::new(snapshot));
        self.events.emit(UiEvent::SnapshotReplaced { count, has_pending });
    }
}
