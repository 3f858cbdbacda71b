use config::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub thread: ThreadSettings,
    pub storage: StorageSettings,
    pub bridge: BridgeSettings,
    pub webhook: WebhookSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Deserialize, Clone)]
pub struct ThreadSettings {
    pub max_depth: usize,
    pub poll_interval_secs: u64,
    pub highlight_secs: u64,
    pub draft_debounce_ms: u64,
}

impl ThreadSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn highlight_window(&self) -> Duration {
        Duration::from_secs(self.highlight_secs)
    }

    pub fn draft_debounce(&self) -> Duration {
        Duration::from_millis(self.draft_debounce_ms)
    }
}

#[derive(Deserialize, Clone)]
pub struct StorageSettings {
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct BridgeSettings {
    // opener 自己的 origin，跨窗口消息只认与它完全相等的来源
    pub origin: String,
    pub provider_url: String,
    pub popup_width: u32,
    pub popup_height: u32,
    pub closed_poll_ms: u64,
}

impl BridgeSettings {
    pub fn closed_poll(&self) -> Duration {
        Duration::from_millis(self.closed_poll_ms)
    }
}

#[derive(Deserialize, Clone)]
pub struct WebhookSettings {
    #[serde(default)]
    pub url: Option<String>,
    pub secret: String,
    pub salt: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        let env_map = collect_env_vars();

        let s = config::Config::builder()
            .set_default("api.base_url", "http://127.0.0.1:3000")?
            .set_default("api.timeout_secs", 10)?
            .set_default("thread.max_depth", 2)?
            .set_default("thread.poll_interval_secs", 5)?
            .set_default("thread.highlight_secs", 3)?
            .set_default("thread.draft_debounce_ms", 500)?
            .set_default("storage.url", "sqlite://data/colloquy.db")?
            .set_default("bridge.origin", "http://127.0.0.1:4321")?
            .set_default("bridge.provider_url", "http://127.0.0.1:3000/oauth")?
            .set_default("bridge.popup_width", 480)?
            .set_default("bridge.popup_height", 640)?
            .set_default("bridge.closed_poll_ms", 500)?
            .set_default("webhook.secret", "change_me_please")?
            .set_default("webhook.salt", "change_me_too")?
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name(&format!("config.{}", run_mode)).required(false))
            .add_source(config::File::from_str(
                &serde_json::to_string(&env_map)
                    .expect("Environment variables should serialize to JSON"),
                config::FileFormat::Json,
            ))
            .build()?;

        s.try_deserialize()
    }
}

fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(k, _)| k.starts_with("COLLOQUY_"))
        .map(|(k, v)| {
            let new_key = k
                .trim_start_matches("COLLOQUY_")
                .replace("__", ".")
                .to_lowercase();
            (new_key, v)
        })
        .collect()
}
