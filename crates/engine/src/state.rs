use crate::bridge::IdentityBridge;
use crate::composer::{Composer, ComposerMode, StickerCatalog};
use crate::config::Settings;
use crate::drafts::DraftStore;
use crate::events::{EventBus, UiEvent};
use crate::highlight::HighlightCoordinator;
use crate::moderation::ModerationActions;
use crate::polling::PollingController;
use crate::render::{self, OpenComposer, RenderNode, RenderOptions, Viewer};
use crate::session::SessionHandle;
use crate::store::CommentStore;
use client::{Api, HttpApi, InvalidationSigner, Invalidator, NullInvalidator, WebhookInvalidator};
use domain::bridge::Origin;
use domain::ContentRef;
use std::sync::Arc;
use storage::LocalStore;
use tokio::sync::OnceCell;

// 进程级装配：本地库、API、登录态、事件总线各一份，
// 线程（评论区）按内容页打开
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub local: LocalStore,
    pub api: Arc<dyn Api>,
    pub session: SessionHandle,
    pub events: EventBus,
    pub invalidator: Arc<dyn Invalidator>,
}

impl AppState {
    pub async fn init(settings: Settings) -> anyhow::Result<Self> {
        let local = LocalStore::open(&settings.storage.url).await?;
        let session = SessionHandle::restore(local.clone()).await?;
        let api: Arc<dyn Api> = Arc::new(HttpApi::new(
            settings.api.base_url.clone(),
            settings.api.timeout(),
        )?);
        let invalidator: Arc<dyn Invalidator> = match &settings.webhook.url {
            Some(url) => Arc::new(WebhookInvalidator::new(
                url.clone(),
                InvalidationSigner::new(
                    settings.webhook.secret.clone(),
                    settings.webhook.salt.clone(),
                ),
            )),
            None => Arc::new(NullInvalidator),
        };
        Ok(Self {
            settings,
            local,
            api,
            session,
            events: EventBus::default(),
            invalidator,
        })
    }

    pub fn bridge(&self) -> IdentityBridge {
        IdentityBridge::new(
            self.api.clone(),
            self.session.clone(),
            self.events.clone(),
            Origin::new(self.settings.bridge.origin.clone()),
            (
                self.settings.bridge.popup_width,
                self.settings.bridge.popup_height,
            ),
            self.settings.bridge.closed_poll(),
        )
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.session.clear().await?;
        self.events.emit(UiEvent::LoggedOut);
        Ok(())
    }

    // 个人资料区展示已关联的第三方账号
    pub async fn linked_accounts(&self) -> domain::Result<Vec<domain::LinkedAccount>> {
        let token = self
            .session
            .token()
            .ok_or_else(|| domain::Error::Validation("Sign in first.".into()))?;
        self.api.linked_accounts(&token).await
    }

    pub fn open_thread(&self, target: ContentRef) -> ThreadHandle {
        let store = Arc::new(CommentStore::new(
            target,
            self.api.clone(),
            self.session.clone(),
            self.events.clone(),
        ));
        let polling =
            PollingController::spawn(store.clone(), self.settings.thread.poll_interval());
        ThreadHandle {
            drafts: Arc::new(DraftStore::new(
                self.local.clone(),
                self.settings.thread.draft_debounce(),
            )),
            highlight: HighlightCoordinator::new(
                self.settings.thread.highlight_window(),
                self.events.clone(),
            ),
            catalog: Arc::new(OnceCell::new()),
            store,
            polling,
            app: self.clone(),
        }
    }
}

pub struct ThreadHandle {
    pub store: Arc<CommentStore>,
    pub polling: PollingController,
    pub drafts: Arc<DraftStore>,
    pub highlight: HighlightCoordinator,
    catalog: Arc<OnceCell<Arc<StickerCatalog>>>,
    app: AppState,
}

impl ThreadHandle {
    pub async fn composer(&self, mode: ComposerMode) -> Composer {
        Composer::open(
            mode,
            self.app.api.clone(),
            self.store.clone(),
            self.drafts.clone(),
            self.app.local.clone(),
            self.app.session.clone(),
            self.app.invalidator.clone(),
            self.app.events.clone(),
            self.catalog.clone(),
        )
        .await
    }

    pub fn moderation(&self) -> ModerationActions {
        ModerationActions::new(
            self.app.api.clone(),
            self.store.clone(),
            self.app.session.clone(),
        )
    }

    // 当前快照 × 当前身份 × 当前高亮 → 渲染序列
    pub async fn plan(&self, open: Option<&OpenComposer>) -> Vec<RenderNode> {
        let viewer = Viewer {
            session: self.app.session.get(),
            guest: self.app.local.load_guest().await.ok().flatten(),
        };
        let snapshot = self.store.current();
        render::plan(
            &snapshot.tree,
            &viewer,
            open,
            self.highlight.active().as_deref(),
            RenderOptions {
                max_depth: self.app.settings.thread.max_depth,
                interactive: true,
            },
        )
    }

    // 首屏那份隐藏的、无交互的副本
    pub fn prerender(&self) -> Vec<RenderNode> {
        render::prerender(
            &self.store.current().tree,
            self.app.settings.thread.max_depth,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_api::{comment, payload, TestApi};
    use domain::{ContentId, ContentType, ModerationState};

    async fn app() -> AppState {
        let local = LocalStore::open("sqlite::memory:").await.unwrap();
        let session = SessionHandle::restore(local.clone()).await.unwrap();
        AppState {
            settings: Settings::new().unwrap(),
            local,
            api: Arc::new(TestApi::default()),
            session,
            events: EventBus::default(),
            invalidator: Arc::new(NullInvalidator),
        }
    }

    #[tokio::test]
    async fn test_thread_wiring_smoke() {
        let app = app().await;
        let target = ContentRef::new(ContentId::new("p1").unwrap(), ContentType::Post);
        let thread = app.open_thread(target);

        thread.store.seed(payload(vec![
            comment("c1", None, ModerationState::Published),
            comment("c2", Some("c1"), ModerationState::Published),
        ]));

        let nodes = thread.plan(None).await;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].depth, 1);

        let inert = thread.prerender();
        assert!(inert.iter().all(|n| !n.actions.reply));

        thread.polling.shutdown();
    }

    // 深层回复的面包屑点回去：高亮的是真实父节点
    #[tokio::test]
    async fn test_breadcrumb_click_highlights_true_parent() {
        let app = app().await;
        let target = ContentRef::new(ContentId::new("p1").unwrap(), ContentType::Post);
        let thread = app.open_thread(target);

        thread.store.seed(payload(vec![
            comment("c0", None, ModerationState::Published),
            comment("c1", Some("c0"), ModerationState::Published),
            comment("c2", Some("c1"), ModerationState::Published),
            comment("c3", Some("c2"), ModerationState::Published),
            comment("c4", Some("c3"), ModerationState::Published),
        ]));

        let nodes = thread.plan(None).await;
        let deep = nodes.iter().find(|n| n.id == "c4").unwrap();
        let crumb = deep.breadcrumb.as_ref().unwrap();
        assert_eq!(crumb.parent_id, "c3");

        thread.highlight.trigger(&crumb.parent_id);
        assert_eq!(thread.highlight.active().as_deref(), Some("c3"));

        let nodes = thread.plan(None).await;
        assert!(nodes.iter().find(|n| n.id == "c3").unwrap().highlighted);
        assert!(!nodes.iter().find(|n| n.id == "c4").unwrap().highlighted);

        thread.polling.shutdown();
    }

    #[tokio::test]
    async fn test_logout_clears_and_notifies() {
        let app = app().await;
        app.session
            .set(domain::SessionIdentity {
                user: crate::test_api::profile("u1", "Ada", false),
                token: "T1".into(),
            })
            .await
            .unwrap();
        let mut rx = app.events.subscribe();

        app.logout().await.unwrap();
        assert!(app.session.get().is_none());
        assert!(matches!(rx.try_recv(), Ok(UiEvent::LoggedOut)));
    }
}
