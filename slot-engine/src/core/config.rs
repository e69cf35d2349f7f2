use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use shared::{AppError, AppResult};
use tutor_client::ClientConfig;

use crate::utils::time::parse_timezone;

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | LEDGER_BASE_URL | http://localhost:8000/api | Booking API base URL |
/// | LEDGER_TOKEN | (unset) | Bearer token of the learner |
/// | REQUEST_TIMEOUT_SECS | 30 | HTTP request timeout |
/// | REFERENCE_TIMEZONE | Africa/Cairo | Zone session times are written in |
/// | RATING_PROMPT_DELAY_MINUTES | 120 | Session start to rating prompt |
/// | PROMPT_POLL_INTERVAL_SECS | 60 | Prompt reconciliation poll |
/// | BOOKING_REFRESH_INTERVAL_SECS | 300 | Booking list refresh |
/// | WORK_DIR | ./data | Working directory |
/// | ALERT_STORE_FILE | $WORK_DIR/alerts.json | Dismissed alert ids |
/// | TEACHER_IDS | (empty) | Comma-separated teachers to report capacity for |
/// | LOG_LEVEL | info | Log level |
/// | LOG_DIR | (unset) | Daily rolling log file directory |
///
/// # Example
///
/// ```ignore
/// LEDGER_TOKEN=... TEACHER_IDS=3,4 cargo run -p slot-engine
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub ledger_base_url: String,
    pub ledger_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Session date/time labels are interpreted in this zone
    pub timezone: Tz,
    pub rating_prompt_delay: chrono::Duration,
    pub prompt_poll_interval: Duration,
    pub booking_refresh_interval: Duration,
    pub work_dir: PathBuf,
    pub alert_store_file: PathBuf,
    pub teacher_ids: Vec<i64>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable numbers fall back to defaults; an unknown
    /// timezone is a configuration error.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let number = |key: &str, default: u64| -> u64 {
            get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
        };

        let timezone = match get("REFERENCE_TIMEZONE") {
            Some(name) => parse_timezone(&name)?,
            None => chrono_tz::Africa::Cairo,
        };

        let poll_secs = number("PROMPT_POLL_INTERVAL_SECS", 60);
        if poll_secs == 0 {
            return Err(AppError::config("PROMPT_POLL_INTERVAL_SECS must be positive"));
        }

        let work_dir = PathBuf::from(get("WORK_DIR").unwrap_or_else(|| "./data".into()));
        let alert_store_file = get("ALERT_STORE_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| work_dir.join("alerts.json"));

        let teacher_ids = match get("TEACHER_IDS") {
            Some(raw) => parse_id_list(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            ledger_base_url: get("LEDGER_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8000/api".into()),
            ledger_token: get("LEDGER_TOKEN").filter(|t| !t.is_empty()),
            request_timeout_secs: number("REQUEST_TIMEOUT_SECS", 30),
            timezone,
            rating_prompt_delay: chrono::Duration::minutes(
                number("RATING_PROMPT_DELAY_MINUTES", 120) as i64,
            ),
            prompt_poll_interval: Duration::from_secs(poll_secs),
            booking_refresh_interval: Duration::from_secs(number(
                "BOOKING_REFRESH_INTERVAL_SECS",
                300,
            )),
            work_dir,
            alert_store_file,
            teacher_ids,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: get("LOG_DIR").filter(|d| !d.is_empty()),
        })
    }

    /// HTTP ledger client settings
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.ledger_base_url.clone())
            .with_timeout(self.request_timeout_secs);
        match &self.ledger_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        }
    }
}

fn parse_id_list(raw: &str) -> AppResult<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::config(format!("Invalid teacher id in TEACHER_IDS: {}", s)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> AppResult<EngineConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.ledger_base_url, "http://localhost:8000/api");
        assert!(config.ledger_token.is_none());
        assert_eq!(config.timezone, chrono_tz::Africa::Cairo);
        assert_eq!(config.rating_prompt_delay, chrono::Duration::hours(2));
        assert_eq!(config.prompt_poll_interval, Duration::from_secs(60));
        assert_eq!(config.booking_refresh_interval, Duration::from_secs(300));
        assert_eq!(config.alert_store_file, PathBuf::from("./data").join("alerts.json"));
        assert!(config.teacher_ids.is_empty());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("LEDGER_TOKEN", "abc"),
            ("REFERENCE_TIMEZONE", "Europe/Berlin"),
            ("RATING_PROMPT_DELAY_MINUTES", "30"),
            ("REQUEST_TIMEOUT_SECS", "not-a-number"),
            ("WORK_DIR", "/tmp/engine"),
            ("TEACHER_IDS", "3, 4,"),
        ])
        .unwrap();
        assert_eq!(config.ledger_token.as_deref(), Some("abc"));
        assert_eq!(config.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(config.rating_prompt_delay, chrono::Duration::minutes(30));
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.alert_store_file, PathBuf::from("/tmp/engine/alerts.json"));
        assert_eq!(config.teacher_ids, vec![3, 4]);

        let client = config.client_config();
        assert_eq!(client.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = load(&[("REFERENCE_TIMEZONE", "Mars/Olympus")]).unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ConfigError);
        assert!(load(&[("TEACHER_IDS", "3,x")]).is_err());
        assert!(load(&[("PROMPT_POLL_INTERVAL_SECS", "0")]).is_err());
    }
}
