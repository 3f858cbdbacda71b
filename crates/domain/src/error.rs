use thiserror::Error;

// 见错误分层约定：Validation 在发包前拦截；Auth 触发静默登出；
// Protocol 只会被丢弃，永远不上屏
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error ({code}): {message}")]
    Server { code: i64, message: String },

    #[error("authentication rejected")]
    Auth,

    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl Error {
    pub fn server(code: i64, message: impl Into<String>) -> Self {
        Error::Server {
            code,
            message: message.into(),
        }
    }

    // 给用户看的文案；Protocol/Auth 不该走到这里，给个兜底
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(m) => m.clone(),
            Error::Network(_) => "Network error, please try again.".to_string(),
            Error::Server { message, .. } if !message.is_empty() => message.clone(),
            _ => "Something went wrong, please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
