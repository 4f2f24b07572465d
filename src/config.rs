use std::time::Duration;

use crate::error::{AppError, Result};

pub const API_BASE_URL: &str = "http://localhost:3001";

/// Backend token list poll interval (seconds).
pub const POLL_INTERVAL_SECS: u64 = 60;

/// Identical requests issued within this window reuse the previous response.
pub const DEDUP_WINDOW_SECS: u64 = 30;

/// Retries after the first failed attempt. Total attempts = 1 + FETCH_MAX_RETRIES.
pub const FETCH_MAX_RETRIES: u32 = 3;

/// Fixed delay between fetch attempts (milliseconds). No backoff.
pub const FETCH_RETRY_DELAY_MS: u64 = 5_000;

/// Per-request HTTP timeout (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Upper bound on AI picks returned for any profile.
pub const AI_PICKS_LIMIT: usize = 10;

/// Exchanges whose tokens are eligible for AI picks unless ALLOWED_EXCHANGES overrides.
pub const DEFAULT_ALLOWED_EXCHANGES: &[&str] =
    &["binance", "coinbase", "kraken", "okx", "bybit", "kucoin"];

/// Category labels the backend is known to emit. Filtering still matches any string.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "altcoin",
    "defi",
    "memecoin",
    "layer1",
    "layer2",
    "stablecoin",
    "gaming",
    "ai",
];

/// Keys in the local kv store.
pub mod storage_keys {
    pub const TOKEN_STORE: &str = "token-store";
    pub const FILTER_PRESETS: &str = "sunnalytics-filter-presets";
    pub const WELCOME_SEEN: &str = "has-seen-welcome";
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    /// Sent as `Authorization: Bearer …` when set (API_KEY)
    pub api_key: Option<String>,
    /// Raw `Cookie` header value for session auth (SESSION_COOKIE)
    pub session_cookie: Option<String>,
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// `limit` query param for the token list (TOKEN_PAGE_LIMIT)
    pub token_page_limit: Option<u32>,
    /// `category` query param for the token list (TOKEN_CATEGORY)
    pub token_category: Option<String>,
    /// Lowercased exchange whitelist for AI picks (ALLOWED_EXCHANGES, comma-separated).
    /// Empty disables the restriction.
    pub allowed_exchanges: Vec<String>,
    pub poll_interval: Duration,
    pub dedup_window: Duration,
    pub fetch_max_retries: u32,
    pub fetch_retry_delay: Duration,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| API_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: non_empty_var("API_KEY"),
            session_cookie: non_empty_var("SESSION_COOKIE"),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "sunnalytics.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            token_page_limit: match non_empty_var("TOKEN_PAGE_LIMIT") {
                Some(v) => Some(v.parse::<u32>().map_err(|_| {
                    AppError::Config("TOKEN_PAGE_LIMIT must be a positive integer".to_string())
                })?),
                None => None,
            },
            token_category: non_empty_var("TOKEN_CATEGORY"),
            allowed_exchanges: match std::env::var("ALLOWED_EXCHANGES") {
                Ok(list) => parse_exchange_list(&list),
                Err(_) => DEFAULT_ALLOWED_EXCHANGES.iter().map(|s| s.to_string()).collect(),
            },
            poll_interval: Duration::from_secs(positive_secs(
                "POLL_INTERVAL_SECS",
                std::env::var("POLL_INTERVAL_SECS").ok(),
                POLL_INTERVAL_SECS,
            )?),
            dedup_window: Duration::from_secs(env_u64("DEDUP_WINDOW_SECS", DEDUP_WINDOW_SECS)),
            fetch_max_retries: std::env::var("FETCH_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(FETCH_MAX_RETRIES),
            fetch_retry_delay: Duration::from_millis(env_u64(
                "FETCH_RETRY_DELAY_MS",
                FETCH_RETRY_DELAY_MS,
            )),
            http_timeout: Duration::from_secs(positive_secs(
                "HTTP_TIMEOUT_SECS",
                std::env::var("HTTP_TIMEOUT_SECS").ok(),
                HTTP_TIMEOUT_SECS,
            )?),
        })
    }

    /// Defaults pointed at `api_base_url`, without reading the environment.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_key: None,
            session_cookie: None,
            log_level: "info".to_string(),
            db_path: "sunnalytics.db".to_string(),
            api_port: 3000,
            token_page_limit: None,
            token_category: None,
            allowed_exchanges: DEFAULT_ALLOWED_EXCHANGES.iter().map(|s| s.to_string()).collect(),
            poll_interval: Duration::from_secs(POLL_INTERVAL_SECS),
            dedup_window: Duration::from_secs(DEDUP_WINDOW_SECS),
            fetch_max_retries: FETCH_MAX_RETRIES,
            fetch_retry_delay: Duration::from_millis(FETCH_RETRY_DELAY_MS),
            http_timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Whole seconds that must be at least 1; unset falls back to `default`.
fn positive_secs(name: &str, raw: Option<String>, default: u64) -> Result<u64> {
    let Some(raw) = raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(AppError::Config(format!("{name} must be a positive number of seconds"))),
    }
}

pub fn parse_exchange_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_list_is_trimmed_and_lowercased() {
        let list = parse_exchange_list(" Binance, ,KRAKEN ,okx");
        assert_eq!(list, vec!["binance", "kraken", "okx"]);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = positive_secs("POLL_INTERVAL_SECS", Some("0".to_string()), 60).unwrap_err();
        assert!(matches!(err, AppError::Config(ref m) if m.contains("POLL_INTERVAL_SECS")));
        assert!(positive_secs("POLL_INTERVAL_SECS", Some("soon".to_string()), 60).is_err());
    }

    #[test]
    fn interval_falls_back_or_parses() {
        assert_eq!(positive_secs("POLL_INTERVAL_SECS", None, 60).unwrap(), 60);
        assert_eq!(positive_secs("POLL_INTERVAL_SECS", Some(" ".to_string()), 60).unwrap(), 60);
        assert_eq!(positive_secs("POLL_INTERVAL_SECS", Some("15".to_string()), 60).unwrap(), 15);
    }

    #[test]
    fn base_url_defaults_match_constants() {
        let cfg = Config::with_base_url("http://127.0.0.1:9");
        assert_eq!(cfg.poll_interval, Duration::from_secs(60));
        assert_eq!(cfg.dedup_window, Duration::from_secs(30));
        assert_eq!(cfg.fetch_max_retries, 3);
        assert_eq!(cfg.fetch_retry_delay, Duration::from_secs(5));
    }
}
