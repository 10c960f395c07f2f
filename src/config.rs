use crate::source::retry::RetryPolicy;
use crate::source::LeadFilter;

/// Runtime configuration, one env var per field. Only the REST source and the
/// run driver read this; the engine itself takes plain arguments.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub api_key: Option<String>,
    pub table: String,
    pub page_size: usize,
    pub http_timeout_secs: u64,
    pub week_offset: u32,
    pub funnel_id: Option<i64>,
    pub unit_id: Option<i64>,
    pub seller_id: Option<i64>,
    pub origin_id: Option<i64>,
    pub retry_max: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_jitter: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000/".to_string(),
            api_key: None,
            table: "leads".to_string(),
            page_size: 1000,
            http_timeout_secs: 30,
            week_offset: 0,
            funnel_id: None,
            unit_id: None,
            seller_id: None,
            origin_id: None,
            retry_max: 3,
            retry_base_delay_ms: 100,
            retry_max_delay_ms: 5000,
            retry_jitter: 0.3,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base: std::env::var("API_BASE").unwrap_or(defaults.api_base),
            api_key: std::env::var("API_KEY").ok(),
            table: std::env::var("LEADS_TABLE").unwrap_or(defaults.table),
            page_size: env_parse("PAGE_SIZE", defaults.page_size),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            week_offset: env_parse("WEEK_OFFSET", defaults.week_offset),
            funnel_id: std::env::var("FUNNEL_ID").ok().and_then(|v| v.parse().ok()),
            unit_id: std::env::var("UNIT_ID").ok().and_then(|v| v.parse().ok()),
            seller_id: std::env::var("SELLER_ID").ok().and_then(|v| v.parse().ok()),
            origin_id: std::env::var("ORIGIN_ID").ok().and_then(|v| v.parse().ok()),
            retry_max: env_parse("RETRY_MAX", defaults.retry_max),
            retry_base_delay_ms: env_parse("RETRY_BASE_MS", defaults.retry_base_delay_ms),
            retry_max_delay_ms: env_parse("RETRY_MAX_MS", defaults.retry_max_delay_ms),
            retry_jitter: env_parse("RETRY_JITTER", defaults.retry_jitter),
        }
    }

    pub fn filter(&self) -> LeadFilter {
        LeadFilter {
            funnel_id: self.funnel_id,
            unit_id: self.unit_id,
            seller_id: self.seller_id,
            origin_id: self.origin_id,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry_max,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
            jitter_factor: self.retry_jitter,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
