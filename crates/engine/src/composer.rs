use crate::drafts::{DraftKey, DraftStore};
use crate::events::{EventBus, ToastLevel, UiEvent};
use crate::session::SessionHandle;
use crate::store::CommentStore;
use async_trait::async_trait;
use client::{Api, CreateComment, Credential, Invalidator};
use domain::{Error, GuestIdentity, Result};
use std::sync::Arc;
use storage::LocalStore;
use tokio::sync::OnceCell;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerMode {
    Root,
    Reply { parent: String },
    Edit { comment: String },
}

#[derive(Debug, Clone)]
pub struct Sticker {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct StickerPack {
    pub name: String,
    pub stickers: Vec<Sticker>,
}

#[derive(Debug, Clone, Default)]
pub struct StickerCatalog {
    pub packs: Vec<StickerPack>,
}

// 表情目录在外部托管，首次打开面板才去拉
#[async_trait]
pub trait StickerSource: Send + Sync {
    async fn load(&self) -> Result<StickerCatalog>;
}

pub struct Composer {
    mode: ComposerMode,
    // 编辑已有评论不走草稿持久化，直接从当前内容起步
    key: Option<DraftKey>,
    text: String,
    preview: bool,
    submitting: bool,
    open: bool,
    error: Option<String>,

    api: Arc<dyn Api>,
    store: Arc<CommentStore>,
    drafts: Arc<DraftStore>,
    local: LocalStore,
    session: SessionHandle,
    invalidator: Arc<dyn Invalidator>,
    events: EventBus,
    catalog: Arc<OnceCell<Arc<StickerCatalog>>>,
}

impl Composer {
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn open(
        mode: ComposerMode,
        api: Arc<dyn Api>,
        store: Arc<CommentStore>,
        drafts: Arc<DraftStore>,
        local: LocalStore,
        session: SessionHandle,
        invalidator: Arc<dyn Invalidator>,
        events: EventBus,
        catalog: Arc<OnceCell<Arc<StickerCatalog>>>,
    ) -> Self {
        let target = store.target().clone();
        let (key, text) = match &mode {
            ComposerMode::Root => {
                let key = DraftKey::root(target);
                let text = drafts.load(&key).await.unwrap_or_default();
                (Some(key), text)
            }
            ComposerMode::Reply { parent } => {
                let key = DraftKey::reply(target, parent.clone());
                let text = drafts.load(&key).await.unwrap_or_default();
                (Some(key), text)
            }
            ComposerMode::Edit { comment } => {
                let text = store
                    .current()
                    .tree
                    .get(comment)
                    .map(|c| c.content.clone())
                    .unwrap_or_default();
                (None, text)
            }
        };
        Self {
            mode,
            key,
            text,
            preview: false,
            submitting: false,
            open: true,
            error: None,
            api,
            store,
            drafts,
            local,
            session,
            invalidator,
            events,
            catalog,
        }
    }

    pub fn mode(&self) -> &ComposerMode {
        &self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        if let Some(key) = &self.key {
            self.drafts.record_input(key, self.text.clone());
        }
    }

    pub fn toggle_preview(&mut self) -> bool {
        self.preview = !self.preview;
        self.preview
    }

    pub fn preview_enabled(&self) -> bool {
        self.preview
    }

    pub async fn stickers(&self, source: &dyn StickerSource) -> Result<Arc<StickerCatalog>> {
        self.catalog
            .get_or_try_init(|| async { source.load().await.map(Arc::new) })
            .await
            .cloned()
    }

    // 卸载：取消在途防抖，已落盘的草稿保留
    pub fn close(&mut self) {
        self.open = false;
        if let Some(key) = &self.key {
            self.drafts.cancel_pending(key);
        }
    }

    // 身份可解析 = 已登录，或给了能通过校验的匿名身份（顺手缓存复用）
    async fn resolve_credential(&self, guest: Option<GuestIdentity>) -> Result<Credential> {
        if let Some(session) = self.session.get() {
            return Ok(Credential::Token(session.token));
        }
        let guest = match guest {
            Some(g) => g,
            None => self
                .local
                .load_guest()
                .await
                .ok()
                .flatten()
                .ok_or_else(|| Error::Validation("Name and email are required.".into()))?,
        };
        guest.validate()?;
        if let Err(e) = self.local.save_guest(&guest).await {
            tracing::warn!("Guest identity cache failed: {}", e);
        }
        Ok(Credential::Guest(guest))
    }

    async fn perform_submit(&self, text: &str, guest: Option<GuestIdentity>) -> Result<()> {
        match self.mode.clone() {
            ComposerMode::Edit { comment } => {
                let session = self
                    .session
                    .get()
                    .ok_or_else(|| Error::Validation("Sign in to edit your comment.".into()))?;
                // 和渲染层的动作行一样只认作者本人，发包前就拦下
                let snapshot = self.store.current();
                let target = snapshot
                    .tree
                    .get(&comment)
                    .ok_or_else(|| Error::Validation("Comment not found.".into()))?;
                if !target.is_authored_by(&session.user) {
                    return Err(Error::Validation(
                        "You can only edit your own comments.".into(),
                    ));
                }
                self.api
                    .update_comment(&comment, text, &session.token)
                    .await
                    .map(|_| ())
            }
            mode => {
                let credential = self.resolve_credential(guest).await?;
                let parent = match mode {
                    ComposerMode::Reply { parent } => Some(parent),
                    _ => None,
                };
                self.api
                    .create_comment(&CreateComment {
                        target: self.store.target().clone(),
                        parent,
                        text: text.to_string(),
                        credential,
                    })
                    .await
                    .map(|_| ())
            }
        }
    }

    pub async fn submit(&mut self, guest: Option<GuestIdentity>) -> Result<()> {
        if self.submitting {
            return Ok(());
        }
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(Error::Validation("Comment cannot be empty.".into()));
        }

        // 不管哪条分支怎么退出，标志位都在这里成对翻转
        self.submitting = true;
        let result = self.perform_submit(&text, guest).await;
        self.submitting = false;

        match result {
            Ok(()) => {
                if let Some(key) = &self.key {
                    if let Err(e) = self.drafts.clear(key).await {
                        tracing::warn!("Draft cleanup failed: {}", e);
                    }
                }
                self.text.clear();
                self.error = None;
                self.open = false;

                if let Err(e) = self.store.revalidate().await {
                    tracing::warn!("Revalidate after submit failed: {}", e);
                }
                // 通知宿主页面该路径的缓存渲染已过期；失败不影响发帖结果
                let path = self.store.target().path();
                if let Err(e) = self.invalidator.invalidate(&path).await {
                    tracing::warn!("Cache invalidation failed for {}: {}", path, e);
                }
                self.events.emit(UiEvent::Toast {
                    level: ToastLevel::Success,
                    message: "Comment submitted.".into(),
                });
                Ok(())
            }
            Err(e) => {
                // 内容原样保留，只上屏服务端消息或兜底文案
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_api::{comment, payload, TestApi};
    use client::NullInvalidator;
    use domain::{ContentId, ContentRef, ContentType, ModerationState};
    use std::time::Duration;

    struct Rig {
        api: Arc<TestApi>,
        store: Arc<CommentStore>,
        drafts: Arc<DraftStore>,
        local: LocalStore,
        session: SessionHandle,
        events: EventBus,
        catalog: Arc<OnceCell<Arc<StickerCatalog>>>,
    }

    impl Rig {
        async fn new() -> Self {
            let api = Arc::new(TestApi::default());
            let local = LocalStore::open("sqlite::memory:").await.unwrap();
            let session = SessionHandle::new();
            let events = EventBus::default();
            let target = ContentRef::new(ContentId::new("p1").unwrap(), ContentType::Post);
            let store = Arc::new(CommentStore::new(
                target,
                api.clone(),
                session.clone(),
                events.clone(),
            ));
            let drafts = Arc::new(DraftStore::new(local.clone(), Duration::from_millis(25)));
            Self {
                api,
                store,
                drafts,
                local,
                session,
                events,
                catalog: Arc::new(OnceCell::new()),
            }
        }

        async fn composer(&self, mode: ComposerMode) -> Composer {
            Composer::open(
                mode,
                self.api.clone(),
                self.store.clone(),
                self.drafts.clone(),
                self.local.clone(),
                self.session.clone(),
                Arc::new(NullInvalidator),
                self.events.clone(),
                self.catalog.clone(),
            )
            .await
        }
    }

    fn ada() -> GuestIdentity {
        GuestIdentity {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            url: None,
        }
    }

    #[tokio::test]
    async fn test_guest_submit_clears_draft_and_revalidates() {
        let rig = Rig::new().await;
        // 提交成功后的那次拉取里已经能看到新评论
        let mut posted = comment("new", None, ModerationState::Published);
        posted.author_name = "Ada".into();
        posted.content = "Hello".into();
        rig.api.push_payload(payload(vec![posted]));

        let mut c = rig.composer(ComposerMode::Root).await;
        c.set_text("Hello");
        rig.drafts.flush(c.key.as_ref().unwrap()).await.unwrap();

        c.submit(Some(ada())).await.unwrap();

        assert!(!c.is_open());
        assert_eq!(c.text(), "");
        assert!(c.error().is_none());
        // 草稿键整个移除
        let key = DraftKey::root(rig.store.target().clone());
        assert_eq!(rig.drafts.load(&key).await, None);
        // 树里出现新根节点
        let snap = rig.store.current();
        let node = snap.tree.get("new").unwrap();
        assert_eq!(node.author_name, "Ada");
        assert_eq!(node.content, "Hello");
        assert_eq!(node.state, ModerationState::Published);
        // 匿名身份缓存下来复用
        assert_eq!(rig.local.load_guest().await.unwrap(), Some(ada()));
    }

    #[tokio::test]
    async fn test_empty_text_blocked_before_network() {
        let rig = Rig::new().await;
        let mut c = rig.composer(ComposerMode::Root).await;
        c.set_text("   ");
        let err = c.submit(Some(ada())).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(rig.api.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_guest_identity_blocked() {
        let rig = Rig::new().await;
        let mut c = rig.composer(ComposerMode::Root).await;
        c.set_text("hello");
        let err = c.submit(None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_cached_guest_reused() {
        let rig = Rig::new().await;
        rig.local.save_guest(&ada()).await.unwrap();
        let mut c = rig.composer(ComposerMode::Root).await;
        c.set_text("again");
        c.submit(None).await.unwrap();
        let created = rig.api.created.lock().unwrap();
        match &created[0].credential {
            Credential::Guest(g) => assert_eq!(g.name, "Ada"),
            other => panic!("expected guest credential, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failure_keeps_text_and_surfaces_message() {
        let rig = Rig::new().await;
        *rig.api.create_error.lock().unwrap() =
            Some(Error::server(1002, "duplicate comment"));
        let mut c = rig.composer(ComposerMode::Root).await;
        c.set_text("hello");
        let err = c.submit(Some(ada())).await.unwrap_err();
        assert!(matches!(err, Error::Server { .. }));
        assert!(c.is_open());
        assert_eq!(c.text(), "hello");
        assert_eq!(c.error(), Some("duplicate comment"));
        assert!(!c.is_submitting());
    }

    #[tokio::test]
    async fn test_authenticated_submit_uses_token() {
        let rig = Rig::new().await;
        rig.session
            .set(domain::SessionIdentity {
                user: crate::test_api::profile("u1", "Ada", false),
                token: "T1".into(),
            })
            .await
            .unwrap();
        let mut c = rig.composer(ComposerMode::Root).await;
        c.set_text("hello");
        c.submit(None).await.unwrap();
        let created = rig.api.created.lock().unwrap();
        match &created[0].credential {
            Credential::Token(t) => assert_eq!(t, "T1"),
            other => panic!("expected token credential, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_edit_mode_starts_from_current_content() {
        let rig = Rig::new().await;
        let mut own = comment("c1", None, ModerationState::Published);
        own.author_id = Some("u1".into());
        rig.store.seed(payload(vec![own]));
        rig.session
            .set(domain::SessionIdentity {
                user: crate::test_api::profile("u1", "Ada", false),
                token: "T1".into(),
            })
            .await
            .unwrap();

        let mut c = rig
            .composer(ComposerMode::Edit {
                comment: "c1".into(),
            })
            .await;
        assert_eq!(c.text(), "body of c1");

        c.set_text("body of c1, revised");
        c.submit(None).await.unwrap();
        let mutations = rig.api.mutations.lock().unwrap();
        assert_eq!(mutations[0], "update c1 body of c1, revised");
    }

    #[tokio::test]
    async fn test_edit_foreign_comment_blocked_before_network() {
        let rig = Rig::new().await;
        let mut foreign = comment("c1", None, ModerationState::Published);
        foreign.author_id = Some("u2".into());
        rig.store.seed(payload(vec![foreign]));
        rig.session
            .set(domain::SessionIdentity {
                user: crate::test_api::profile("u1", "Ada", false),
                token: "T1".into(),
            })
            .await
            .unwrap();

        let mut c = rig
            .composer(ComposerMode::Edit {
                comment: "c1".into(),
            })
            .await;
        c.set_text("hijacked");
        let err = c.submit(None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        // 没发出任何变更请求，提交标志也复位了
        assert!(rig.api.mutations.lock().unwrap().is_empty());
        assert!(!c.is_submitting());

        // 快照里不存在的 id 同样拦下
        let mut c = rig
            .composer(ComposerMode::Edit {
                comment: "ghost".into(),
            })
            .await;
        c.set_text("anything");
        let err = c.submit(None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(rig.api.mutations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reply_draft_key_is_per_parent() {
        let rig = Rig::new().await;
        let mut c = rig
            .composer(ComposerMode::Reply {
                parent: "c9".into(),
            })
            .await;
        c.set_text("reply body");
        let key = DraftKey::reply(rig.store.target().clone(), "c9");
        rig.drafts.flush(&key).await.unwrap();
        assert_eq!(
            rig.drafts.load(&key).await.as_deref(),
            Some("reply body")
        );
        // 卸载后重开同一个 key，草稿还原
        c.close();
        let c2 = rig
            .composer(ComposerMode::Reply {
                parent: "c9".into(),
            })
            .await;
        assert_eq!(c2.text(), "reply body");
    }

    struct FixedStickers;

    #[async_trait]
    impl StickerSource for FixedStickers {
        async fn load(&self) -> Result<StickerCatalog> {
            Ok(StickerCatalog {
                packs: vec![StickerPack {
                    name: "ferris".into(),
                    stickers: vec![Sticker {
                        name: "wave".into(),
                        url: "https://cdn.example/ferris-wave.png".into(),
                    }],
                }],
            })
        }
    }

    #[tokio::test]
    async fn test_sticker_catalog_loads_once() {
        let rig = Rig::new().await;
        let c = rig.composer(ComposerMode::Root).await;
        let first = c.stickers(&FixedStickers).await.unwrap();
        let second = c.stickers(&FixedStickers).await.unwrap();
        assert_eq!(first.packs.len(), 1);
        // 同一个 Arc，说明目录只拉了一次
        assert!(Arc::ptr_eq(&first, &second));
    }
}
