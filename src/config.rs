use std::env;
use std::fmt;
use std::time::Duration;

pub const API_KEY_ENV_VAR: &str = "EOD_HISTORICAL_API_KEY";
pub const API_URL_ENV_VAR: &str = "EOD_HISTORICAL_API_URL";
pub const TIMEOUT_ENV_VAR: &str = "EOD_HISTORICAL_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "https://eodhistoricaldata.com/api";
/// 官方公开的演示key，只能查询少量代码（如 AAPL.US）
pub const DEMO_API_KEY: &str = "demo";

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub stop_on_error: bool,
    pub symbol_limit: Option<usize>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_key: DEMO_API_KEY.to_string(),
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            stop_on_error: false,
            symbol_limit: None,
        }
    }

    /// 从环境变量读取配置，未设置的项保持默认值
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Ok(key) = env::var(API_KEY_ENV_VAR) {
            if !key.trim().is_empty() {
                config.api_key = key.trim().to_string();
            }
        }
        if let Ok(url) = env::var(API_URL_ENV_VAR) {
            if !url.trim().is_empty() {
                config = config.with_base_url(url.trim());
            }
        }
        if let Some(secs) = env::var(TIMEOUT_ENV_VAR)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            config.timeout_secs = secs;
        }

        config
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn with_symbol_limit(mut self, limit: usize) -> Self {
        self.symbol_limit = Some(limit);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

// api_key 不输出到日志
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("stop_on_error", &self.stop_on_error)
            .field("symbol_limit", &self.symbol_limit)
            .finish()
    }
}
