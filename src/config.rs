//! Client configuration sourced from `MANUALBASE_*` environment variables.
//! CLI flags override these in the binary; library users can also build a
//! `ClientConfig` directly.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::identity::DEFAULT_ROLE_TTL;

pub const ENV_URL: &str = "MANUALBASE_URL";
pub const ENV_ANON_KEY: &str = "MANUALBASE_ANON_KEY";
pub const ENV_ROLE_TTL_SECS: &str = "MANUALBASE_ROLE_TTL_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "MANUALBASE_HTTP_TIMEOUT_SECS";
pub const ENV_PROFILES_TABLE: &str = "MANUALBASE_PROFILES_TABLE";

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_PROFILES_TABLE: &str = "profiles";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Project URL of the hosted backend, e.g. `https://abc.example.co`.
    pub base_url: String,
    /// Public (anonymous) API key sent as `apikey` on every request.
    pub anon_key: String,
    pub role_ttl: Duration,
    pub http_timeout: Duration,
    pub profiles_table: String,
}

impl ClientConfig {
    pub fn new<S: Into<String>>(base_url: S, anon_key: S) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: anon_key.into(),
            role_ttl: DEFAULT_ROLE_TTL,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            profiles_table: DEFAULT_PROFILES_TABLE.to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = get(ENV_URL).ok_or_else(|| anyhow!("{} is not set", ENV_URL))?;
        let anon_key = get(ENV_ANON_KEY).ok_or_else(|| anyhow!("{} is not set", ENV_ANON_KEY))?;
        let mut cfg = Self::new(base_url, anon_key);

        if let Some(v) = get(ENV_ROLE_TTL_SECS) {
            cfg.role_ttl = parse_secs(ENV_ROLE_TTL_SECS, &v)?;
        }
        if let Some(v) = get(ENV_HTTP_TIMEOUT_SECS) {
            let t = parse_secs(ENV_HTTP_TIMEOUT_SECS, &v)?;
            if t.is_zero() { return Err(anyhow!("{} must be greater than zero", ENV_HTTP_TIMEOUT_SECS)); }
            cfg.http_timeout = t;
        }
        if let Some(v) = get(ENV_PROFILES_TABLE) {
            cfg.profiles_table = v;
        }
        Ok(cfg)
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<Duration> {
    let secs = raw.parse::<u64>().with_context(|| format!("{} must be a whole number of seconds, got '{}'", name, raw))?;
    Ok(Duration::from_secs(secs))
}
