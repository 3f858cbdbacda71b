use super::channel::OpenerPort;
use client::Api;
use domain::bridge::{BridgeMessage, LandingParams};
use domain::{valid_email, Error, Result};
use std::sync::Arc;
use std::time::Duration;

// 终态通报后窗口自行关闭的等待时长
const ERROR_CLOSE_DELAY: Duration = Duration::from_secs(3);
const SUCCESS_CLOSE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupState {
    Processing,
    // 新账号：提示补填之前匿名评论用过的昵称/邮箱；失败可重试
    Bind { error: Option<String> },
    Success,
    Error { message: String },
}

// 弹窗落地页的状态机：Processing → {Error | Bind | Success}
pub struct PopupFlow {
    api: Arc<dyn Api>,
    port: Arc<dyn OpenerPort>,
    attempt: String,
    token: Option<String>,
    state: PopupState,
}

impl PopupFlow {
    pub fn new(api: Arc<dyn Api>, port: Arc<dyn OpenerPort>) -> Self {
        Self {
            api,
            port,
            attempt: String::new(),
            token: None,
            state: PopupState::Processing,
        }
    }

    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn land(&mut self, params: LandingParams) {
        self.attempt = params.attempt;
        if let Some(message) = params.error {
            self.fail(message);
            return;
        }
        let Some(token) = params.token else {
            self.fail("Login failed: no token in redirect.".to_string());
            return;
        };
        self.token = Some(token.clone());
        if params.is_new_user {
            self.state = PopupState::Bind { error: None };
        } else {
            self.succeed(token, false, false);
        }
    }

    pub async fn confirm_bind(&mut self, name: &str, email: &str) -> Result<()> {
        let token = self.binding_token()?;
        if name.trim().is_empty() || !valid_email(email) {
            let message = "A name and a valid email are required.".to_string();
            self.state = PopupState::Bind {
                error: Some(message.clone()),
            };
            return Err(Error::Validation(message));
        }
        match self.api.bind_identity(name, email, &token).await {
            Ok(rotated) => {
                self.port.post(&BridgeMessage::BindSuccess {
                    attempt: self.attempt.clone(),
                    token: rotated.token.clone(),
                });
                self.succeed(rotated.token, true, true);
                Ok(())
            }
            Err(e) => {
                let message = e.user_message();
                self.port.post(&BridgeMessage::BindError {
                    attempt: self.attempt.clone(),
                    message: message.clone(),
                });
                self.state = PopupState::Bind {
                    error: Some(message),
                };
                Err(e)
            }
        }
    }

    pub async fn skip_bind(&mut self) -> Result<()> {
        let token = self.binding_token()?;
        match self.api.skip_bind(&token).await {
            Ok(rotated) => {
                self.succeed(rotated.token, true, false);
                Ok(())
            }
            Err(e) => {
                self.state = PopupState::Bind {
                    error: Some(e.user_message()),
                };
                Err(e)
            }
        }
    }

    fn binding_token(&self) -> Result<String> {
        if !matches!(self.state, PopupState::Bind { .. }) {
            return Err(Error::Validation("No account binding in progress.".into()));
        }
        self.token
            .clone()
            .ok_or_else(|| Error::Protocol("binding without a token".into()))
    }

    fn fail(&mut self, message: String) {
        self.state = PopupState::Error {
            message: message.clone(),
        };
        self.port.post(&BridgeMessage::OauthError {
            attempt: self.attempt.clone(),
            message,
        });
        self.schedule_close(ERROR_CLOSE_DELAY);
    }

    // 两个成功入口（直通与绑定后）都汇到这里；token 可能已被轮换
    fn succeed(&mut self, token: String, is_new_user: bool, bound: bool) {
        self.state = PopupState::Success;
        self.port.post(&BridgeMessage::OauthSuccess {
            attempt: self.attempt.clone(),
            token,
            is_new_user,
            bound,
        });
        self.schedule_close(SUCCESS_CLOSE_DELAY);
    }

    fn schedule_close(&self, delay: Duration) {
        let port = self.port.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            port.close_window();
        });
    }
}
