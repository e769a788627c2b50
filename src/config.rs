use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::services::{gemini, openrouter};

#[derive(Debug, Clone, PartialEq)]
pub enum VisionProvider {
    OpenRouter { api_key: String },
    Gemini { api_key: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub vision_provider: VisionProvider,
    pub vision_model: String,
    pub vision_timeout: Duration,
    pub biotech_insights: bool,
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub strict_records: bool,
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Read configuration from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider_name = get("VISION_PROVIDER").unwrap_or_else(|| "openrouter".to_string());
        let (vision_provider, default_model) = match provider_name.to_lowercase().as_str() {
            "openrouter" => (
                VisionProvider::OpenRouter {
                    api_key: get("OPENROUTER_API_KEY")
                        .context("OPENROUTER_API_KEY must be set in .env file")?,
                },
                openrouter::DEFAULT_OPENROUTER_MODEL,
            ),
            "gemini" => (
                VisionProvider::Gemini {
                    api_key: get("GEMINI_API_KEY").context("GEMINI_API_KEY must be set in .env file")?,
                },
                gemini::DEFAULT_GEMINI_MODEL,
            ),
            other => bail!("Unknown VISION_PROVIDER '{}' (expected 'openrouter' or 'gemini')", other),
        };

        let vision_timeout_secs: u64 = parse_or(&get, "VISION_TIMEOUT_SECS", 60)?;
        if vision_timeout_secs == 0 {
            bail!("Invalid VISION_TIMEOUT_SECS '0': must be at least 1");
        }

        Ok(Self {
            vision_provider,
            vision_model: get("VISION_MODEL").unwrap_or_else(|| default_model.to_string()),
            vision_timeout: Duration::from_secs(vision_timeout_secs),
            biotech_insights: parse_flag(&get, "BIOTECH_INSIGHTS")?,
            database_url: get("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            strict_records: parse_flag(&get, "STRICT_RECORDS")?,
            static_dir: get("STATIC_DIR").map(PathBuf::from),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn parse_flag<G>(get: &G, key: &str) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => bail!("Invalid {} '{}': expected true or false", key, v),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = config(&[("OPENROUTER_API_KEY", "k"), ("DATABASE_URL", "postgres://db")]).unwrap();

        assert_eq!(cfg.vision_provider, VisionProvider::OpenRouter { api_key: "k".into() });
        assert_eq!(cfg.vision_model, openrouter::DEFAULT_OPENROUTER_MODEL);
        assert_eq!(cfg.vision_timeout, Duration::from_secs(60));
        assert!(!cfg.biotech_insights);
        assert!(!cfg.strict_records);
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.max_upload_bytes, 20 * 1024 * 1024);
        assert!(cfg.static_dir.is_none());
    }

    #[test]
    fn test_gemini_provider() {
        let cfg = config(&[
            ("VISION_PROVIDER", "Gemini"),
            ("GEMINI_API_KEY", "g"),
            ("DATABASE_URL", "postgres://db"),
            ("BIOTECH_INSIGHTS", "yes"),
            ("VISION_TIMEOUT_SECS", "15"),
        ])
        .unwrap();

        assert_eq!(cfg.vision_provider, VisionProvider::Gemini { api_key: "g".into() });
        assert_eq!(cfg.vision_model, gemini::DEFAULT_GEMINI_MODEL);
        assert!(cfg.biotech_insights);
        assert_eq!(cfg.vision_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_credentials_are_fatal() {
        let err = config(&[("DATABASE_URL", "postgres://db")]).unwrap_err();
        assert!(err.to_string().contains("OPENROUTER_API_KEY"));

        let err = config(&[("OPENROUTER_API_KEY", "k")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let err = config(&[("VISION_PROVIDER", "gemini"), ("DATABASE_URL", "x")]).unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = [("OPENROUTER_API_KEY", "k"), ("DATABASE_URL", "postgres://db")];

        let mut vars = base.to_vec();
        vars.push(("VISION_PROVIDER", "azure"));
        assert!(config(&vars).is_err());

        let mut vars = base.to_vec();
        vars.push(("MAX_UPLOAD_BYTES", "lots"));
        assert!(config(&vars).is_err());

        let mut vars = base.to_vec();
        vars.push(("STRICT_RECORDS", "maybe"));
        assert!(config(&vars).is_err());

        let mut vars = base.to_vec();
        vars.push(("VISION_TIMEOUT_SECS", "0"));
        let err = config(&vars).unwrap_err();
        assert!(err.to_string().contains("VISION_TIMEOUT_SECS"));
    }
}
