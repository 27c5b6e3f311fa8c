//! Process configuration resolved once from the environment

use crate::llm::DEFAULT_API_BASE;
use crate::session::{DEFAULT_TIMEOUT, DEFAULT_WINDOW};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BRAND: &str = "Shoply";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub brand_name: String,
    /// User/assistant exchanges kept in memory
    pub context_size: usize,
    pub faq_path: PathBuf,
    pub orders_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 1.0,
            timeout: DEFAULT_TIMEOUT,
            brand_name: DEFAULT_BRAND.to_string(),
            context_size: DEFAULT_WINDOW,
            faq_path: PathBuf::from("data/faq.json"),
            orders_path: PathBuf::from("data/orders.json"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment (and `.env`, if present)
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Failed to load .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: get("OPENAI_API_KEY"),
            api_base: get("OPENAI_API_BASE").unwrap_or(defaults.api_base),
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature: parse_or(
                "OPENAI_TEMPERATURE",
                get("OPENAI_TEMPERATURE"),
                defaults.temperature,
            ),
            timeout: Duration::from_secs(parse_positive_or(
                "OPENAI_TIMEOUT_SECS",
                get("OPENAI_TIMEOUT_SECS"),
                defaults.timeout.as_secs(),
            )),
            brand_name: get("BRAND_NAME").unwrap_or(defaults.brand_name),
            context_size: parse_positive_or(
                "SUPPORT_CONTEXT_SIZE",
                get("SUPPORT_CONTEXT_SIZE"),
                defaults.context_size,
            ),
            faq_path: get("SUPPORT_FAQ_PATH").map_or(defaults.faq_path, PathBuf::from),
            orders_path: get("SUPPORT_ORDERS_PATH").map_or(defaults.orders_path, PathBuf::from),
            logs_dir: get("SUPPORT_LOGS_DIR").map_or(defaults.logs_dir, PathBuf::from),
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting, using default");
            default
        }),
    }
}

/// Like [`parse_or`], but zero also falls back to the default
fn parse_positive_or<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Copy + Default + PartialEq,
{
    let parsed = parse_or(key, value, default);
    if parsed == T::default() {
        tracing::warn!(key, "Setting must be greater than zero, using default");
        default
    } else {
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.brand_name, "Shoply");
        assert_eq!(cfg.context_size, 8);
        assert_eq!(cfg.timeout, Duration::from_secs(25));
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let cfg = config(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_API_BASE", "https://proxy.local/v1"),
            ("OPENAI_MODEL", "gpt-5"),
            ("OPENAI_TEMPERATURE", "0.2"),
            ("OPENAI_TIMEOUT_SECS", "10"),
            ("BRAND_NAME", "Acme"),
            ("SUPPORT_CONTEXT_SIZE", "3"),
            ("SUPPORT_FAQ_PATH", "/srv/faq.json"),
            ("SUPPORT_LOGS_DIR", "/var/log/support"),
        ]);
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.api_base, "https://proxy.local/v1");
        assert_eq!(cfg.model, "gpt-5");
        assert!((cfg.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert_eq!(cfg.brand_name, "Acme");
        assert_eq!(cfg.context_size, 3);
        assert_eq!(cfg.faq_path, PathBuf::from("/srv/faq.json"));
        assert_eq!(cfg.orders_path, PathBuf::from("data/orders.json"));
        assert_eq!(cfg.logs_dir, PathBuf::from("/var/log/support"));
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let cfg = config(&[
            ("SUPPORT_CONTEXT_SIZE", "lots"),
            ("OPENAI_TIMEOUT_SECS", "-1"),
            ("OPENAI_API_KEY", "  "),
        ]);
        assert_eq!(cfg.context_size, 8);
        assert_eq!(cfg.timeout, Duration::from_secs(25));
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_zero_window_and_timeout_fall_back() {
        let cfg = config(&[("SUPPORT_CONTEXT_SIZE", "0"), ("OPENAI_TIMEOUT_SECS", " 0 ")]);
        assert_eq!(cfg.context_size, 8);
        assert_eq!(cfg.timeout, Duration::from_secs(25));
    }
}
