use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 跨窗口信道上的一帧：载荷在验明来源之前一律当不可信 JSON 处理
#[derive(Debug, Clone)]
pub struct Envelope {
    pub origin: Origin,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeMessage {
    OauthSuccess {
        attempt: String,
        token: String,
        #[serde(default)]
        is_new_user: bool,
        #[serde(default)]
        bound: bool,
    },
    OauthError {
        attempt: String,
        message: String,
    },
    BindSuccess {
        attempt: String,
        token: String,
    },
    BindError {
        attempt: String,
        message: String,
    },
}

impl BridgeMessage {
    pub fn attempt(&self) -> &str {
        match self {
            BridgeMessage::OauthSuccess { attempt, .. }
            | BridgeMessage::OauthError { attempt, .. }
            | BridgeMessage::BindSuccess { attempt, .. }
            | BridgeMessage::BindError { attempt, .. } => attempt,
        }
    }

    // opener 只认 oauth_* 为终态；bind_* 是过程播报
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BridgeMessage::OauthSuccess { .. } | BridgeMessage::OauthError { .. }
        )
    }

    // 信道唯一的鉴别手段就是 origin 严格相等；不相等、解不开、
    // attempt 对不上，统统拒收，由调用方静默丢弃
    pub fn accept(env: &Envelope, own: &Origin, attempt: &str) -> Result<Self, Error> {
        if env.origin != *own {
            return Err(Error::Protocol(format!(
                "foreign origin {} (expected {})",
                env.origin, own
            )));
        }
        let msg: BridgeMessage = serde_json::from_value(env.payload.clone())
            .map_err(|e| Error::Protocol(format!("malformed payload: {}", e)))?;
        if msg.attempt() != attempt {
            return Err(Error::Protocol(format!(
                "attempt mismatch: {}",
                msg.attempt()
            )));
        }
        Ok(msg)
    }
}

// 弹窗落地页拿到的重定向参数（已由宿主解析成键值对）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandingParams {
    pub attempt: String,
    pub token: Option<String>,
    pub is_new_user: bool,
    pub error: Option<String>,
}

impl LandingParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut out = Self::default();
        for (k, v) in pairs {
            let v: String = v.into();
            match k.as_ref() {
                "attempt" => out.attempt = v,
                "token" if !v.is_empty() => out.token = Some(v),
                "new_user" => out.is_new_user = v == "1" || v == "true",
                "error" if !v.is_empty() => out.error = Some(v),
                _ => {}
            }
        }
        out
    }
}
