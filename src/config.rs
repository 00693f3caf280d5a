use crate::streaming::RevealOptions;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Whether the synthetic data path is reachable at all.
    pub mock_enabled: bool,
    /// Base address of the real backend, e.g. `https://scf.example.com/api`.
    pub api_base_url: String,
    pub mock_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub typing_speed_ms: u64,
    pub upload_max_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            mock_enabled: true,
            api_base_url: "http://localhost:8080/api".to_string(),
            mock_delay_ms: 300,
            request_timeout_secs: 10,
            typing_speed_ms: 30,
            upload_max_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Missing keys fall back to
    /// [`Config::default`].
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            port: match var("PORT") {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("PORT must be a valid number between 1-65535")
                })?,
                None => defaults.port,
            },
            mock_enabled: match var("MOCK_ENABLED") {
                Some(raw) => parse_flag(&raw)
                    .ok_or_else(|| anyhow::anyhow!("MOCK_ENABLED must be true or false"))?,
                None => defaults.mock_enabled,
            },
            api_base_url: match var("API_BASE_URL") {
                Some(url) => {
                    let url = url.trim().to_string();
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        anyhow::bail!("API_BASE_URL must start with http:// or https://");
                    }
                    url
                }
                None => defaults.api_base_url,
            },
            mock_delay_ms: parse_number(var("MOCK_DELAY_MS"), "MOCK_DELAY_MS")?
                .unwrap_or(defaults.mock_delay_ms),
            request_timeout_secs: parse_number(
                var("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
            )?
            .unwrap_or(defaults.request_timeout_secs),
            typing_speed_ms: parse_number(var("TYPING_SPEED_MS"), "TYPING_SPEED_MS")?
                .unwrap_or(defaults.typing_speed_ms),
            upload_max_bytes: parse_number(var("UPLOAD_MAX_BYTES"), "UPLOAD_MAX_BYTES")?
                .unwrap_or(defaults.upload_max_bytes),
        };

        if config.request_timeout_secs == 0 {
            anyhow::bail!("REQUEST_TIMEOUT_SECS must be greater than zero");
        }
        if config.typing_speed_ms == 0 {
            anyhow::bail!("TYPING_SPEED_MS must be greater than zero");
        }

        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Mock path enabled: {}", config.mock_enabled);
        tracing::debug!("API Base URL: {}", config.api_base_url);
        tracing::debug!("Default mock delay: {}ms", config.mock_delay_ms);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    pub fn mock_delay(&self) -> Duration {
        Duration::from_millis(self.mock_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn typing_speed(&self) -> Duration {
        Duration::from_millis(self.typing_speed_ms)
    }

    /// Reveal cadence for chat sessions: one character per typing tick.
    pub fn reveal_options(&self) -> RevealOptions {
        RevealOptions::with_tick(self.typing_speed())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_number<T: std::str::FromStr>(raw: Option<String>, key: &str) -> anyhow::Result<Option<T>> {
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("{} must be a non-negative integer", key))
    })
    .transpose()
}
