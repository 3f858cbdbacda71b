use super::channel::{PopupConnection, PopupLauncher};
use crate::events::{EventBus, ToastLevel, UiEvent};
use crate::session::SessionHandle;
use client::Api;
use domain::bridge::{BridgeMessage, Origin};
use domain::{Error, SessionIdentity};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

// opener 侧：开窗、收信、收尾。
// 监听器与关窗轮询同生共死，监督循环一退出两者一并拆除；
// 一次登录尝试最多消费一条终态消息
#[derive(Clone)]
pub struct IdentityBridge {
    api: Arc<dyn Api>,
    session: SessionHandle,
    events: EventBus,
    origin: Origin,
    popup_size: (u32, u32),
    closed_poll: Duration,
    loading: Arc<watch::Sender<bool>>,
}

impl IdentityBridge {
    pub fn new(
        api: Arc<dyn Api>,
        session: SessionHandle,
        events: EventBus,
        origin: Origin,
        popup_size: (u32, u32),
        closed_poll: Duration,
    ) -> Self {
        let (loading, _rx) = watch::channel(false);
        Self {
            api,
            session,
            events,
            origin,
            popup_size,
            closed_poll,
            loading: Arc::new(loading),
        }
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    // 发起一次登录：开一个带尝试号的弹窗，监督任务挂到后台。
    // 返回本次尝试号，便于宿主关联
    pub async fn login(
        &self,
        launcher: &dyn PopupLauncher,
        provider_url: &str,
    ) -> domain::Result<String> {
        let attempt = format!("{:x}", rand::random::<u128>());
        let sep = if provider_url.contains('?') { '&' } else { '?' };
        let url = format!("{}{}attempt={}", provider_url, sep, attempt);
        let conn = launcher
            .open(&url, self.popup_size.0, self.popup_size.1)
            .await?;
        self.loading.send_replace(true);

        let bridge = self.clone();
        let supervised = attempt.clone();
        tokio::spawn(async move {
            bridge.complete_login(conn, &supervised).await;
        });
        Ok(attempt)
    }

    pub async fn complete_login(&self, mut conn: PopupConnection, attempt: &str) {
        let mut poll = tokio::time::interval(self.closed_poll);
        loop {
            tokio::select! {
                maybe = conn.messages.recv() => match maybe {
                    Some(env) => match BridgeMessage::accept(&env, &self.origin, attempt) {
                        Ok(msg) if msg.is_terminal() => {
                            // 第一条被接受的终态消息定胜负，之后的都到不了这里
                            self.finish(msg).await;
                            break;
                        }
                        Ok(msg) => tracing::debug!("Bridge progress: {:?}", msg),
                        // 异源/畸形/错号：静默丢弃，绝不上屏
                        Err(e) => tracing::debug!("Dropped bridge frame: {}", e),
                    },
                    None => {
                        self.reset_silently();
                        break;
                    }
                },
                _ = poll.tick() => {
                    // 手动关窗且没有终态消息：静默复位，不算错误
                    if conn.handle.is_closed() {
                        self.reset_silently();
                        break;
                    }
                }
            }
        }
    }

    async fn finish(&self, msg: BridgeMessage) {
        match msg {
            BridgeMessage::OauthSuccess {
                token,
                is_new_user,
                bound,
                ..
            } => match self.api.current_user(&token).await {
                Ok(user) => {
                    let name = user.name.clone();
                    if let Err(e) = self.session.set(SessionIdentity { user, token }).await {
                        tracing::warn!("Session persist failed: {}", e);
                    }
                    let message = match (is_new_user, bound) {
                        (true, true) => {
                            format!("Welcome, {}! Your earlier comments are now linked.", name)
                        }
                        (true, false) => format!("Welcome, {}!", name),
                        (false, _) => format!("Welcome back, {}!", name),
                    };
                    self.events.emit(UiEvent::LoginCompleted {
                        name,
                        is_new_user,
                        bound,
                    });
                    self.events.emit(UiEvent::Toast {
                        level: ToastLevel::Success,
                        message,
                    });
                }
                // token 被拒：静默登出，不上屏
                Err(Error::Auth) => {
                    if let Err(e) = self.session.clear().await {
                        tracing::warn!("Session clear failed: {}", e);
                    }
                    self.events.emit(UiEvent::LoggedOut);
                }
                Err(e) => {
                    self.events.emit(UiEvent::Toast {
                        level: ToastLevel::Error,
                        message: e.user_message(),
                    });
                }
            },
            BridgeMessage::OauthError { message, .. } => {
                self.events.emit(UiEvent::Toast {
                    level: ToastLevel::Error,
                    message,
                });
            }
            other => {
                tracing::debug!("Non-terminal message reached finish: {:?}", other);
            }
        }
        self.loading.send_replace(false);
    }

    fn reset_silently(&self) {
        self.loading.send_replace(false);
    }
}
