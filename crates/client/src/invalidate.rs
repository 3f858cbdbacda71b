use async_trait::async_trait;
use domain::{Error, Result};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

// 验签侧拒绝超过 5 分钟偏移的时间戳
pub const MAX_SKEW_SECS: i64 = 300;

// signature = hex(HMAC-SHA256(secret, timestamp ‖ salt ‖ target))
#[derive(Clone)]
pub struct InvalidationSigner {
    secret: String,
    salt: String,
}

impl InvalidationSigner {
    pub fn new(secret: impl Into<String>, salt: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            salt: salt.into(),
        }
    }

    fn mac(&self, timestamp: i64, target: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(self.salt.as_bytes());
        mac.update(target.as_bytes());
        mac
    }

    pub fn sign(&self, timestamp: i64, target: &str) -> String {
        hex::encode(self.mac(timestamp, target).finalize().into_bytes())
    }

    // 比较走 verify_slice，常数时间
    pub fn verify(&self, timestamp: i64, target: &str, signature_hex: &str, now: i64) -> bool {
        if (now - timestamp).abs() > MAX_SKEW_SECS {
            return false;
        }
        let Ok(raw) = hex::decode(signature_hex) else {
            return false;
        };
        self.mac(timestamp, target).verify_slice(&raw).is_ok()
    }
}

// 发帖成功后通知宿主方让对应路径的缓存渲染失效
#[async_trait]
pub trait Invalidator: Send + Sync {
    async fn invalidate(&self, target: &str) -> Result<()>;
}

pub struct WebhookInvalidator {
    url: String,
    signer: InvalidationSigner,
    http: reqwest::Client,
}

impl WebhookInvalidator {
    pub fn new(url: impl Into<String>, signer: InvalidationSigner) -> Self {
        Self {
            url: url.into(),
            signer,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Invalidator for WebhookInvalidator {
    async fn invalidate(&self, target: &str) -> Result<()> {
        let timestamp = chrono::Utc::now().timestamp();
        let signature = self.signer.sign(timestamp, target);
        let resp = self
            .http
            .post(&self.url)
            .json(&json!({
                "target": target,
                "timestamp": timestamp,
                "signature": signature,
            }))
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::server(
                status.as_u16() as i64,
                "cache invalidation rejected",
            ));
        }
        tracing::debug!("Cache invalidated for {}", target);
        Ok(())
    }
}

// 未配置 webhook 时的空实现
pub struct NullInvalidator;

#[async_trait]
impl Invalidator for NullInvalidator {
    async fn invalidate(&self, _target: &str) -> Result<()> {
        Ok(())
    }
}
