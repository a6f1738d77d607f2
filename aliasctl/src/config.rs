//! Runtime configuration
//!
//! One [`AppConfig`] is built at startup from CLI flags, the process
//! environment (optionally seeded from a `.env` file) and defaults, then
//! passed by reference to everything that needs it.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AliasctlError, AliasctlResult};
use crate::services::retry::RetryPolicy;

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 100;
pub const DEFAULT_OUTPUT_DIR: &str = "./output";

pub const ENV_API_TOKEN: &str = "CLOUDFLARE_API_TOKEN";
pub const ENV_ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";
pub const ENV_API_BASE: &str = "CLOUDFLARE_API_BASE";
pub const ENV_DOMAIN: &str = "ALIAS_DOMAIN";
pub const ENV_DESTINATION: &str = "ALIAS_DESTINATION";
pub const ENV_SEED: &str = "ALIAS_SEED";
pub const ENV_REQUEST_DELAY_MS: &str = "ALIAS_REQUEST_DELAY_MS";
pub const ENV_OUTPUT_DIR: &str = "ALIAS_OUTPUT_DIR";

/// Values given on the command line; each one beats the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_token: Option<String>,
    pub zone_id: Option<String>,
    pub domain: Option<String>,
    pub destination: Option<String>,
    pub seed: Option<u32>,
    pub request_delay_ms: Option<u64>,
    pub output_dir: Option<PathBuf>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_token: Option<String>,
    pub zone_id: Option<String>,
    pub api_base: String,
    pub domain: Option<String>,
    pub destination: Option<String>,
    pub seed: Option<u32>,
    pub request_delay: Duration,
    pub output_dir: PathBuf,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Load `.env` (if present) and read the real process environment
    pub fn from_env(overrides: ConfigOverrides) -> AliasctlResult<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(AliasctlError::config(format!("failed to load .env: {e}")));
            }
        }
        Self::from_lookup(overrides, |key| std::env::var(key).ok())
    }

    /// Build from overrides plus an arbitrary variable lookup
    pub fn from_lookup<F>(overrides: ConfigOverrides, lookup: F) -> AliasctlResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let seed = match overrides.seed {
            Some(seed) => Some(seed),
            None => read(ENV_SEED).map(|raw| parse_number::<u32>(ENV_SEED, &raw)).transpose()?,
        };

        let delay_ms = match overrides.request_delay_ms {
            Some(ms) => ms,
            None => read(ENV_REQUEST_DELAY_MS)
                .map(|raw| parse_number::<u64>(ENV_REQUEST_DELAY_MS, &raw))
                .transpose()?
                .unwrap_or(DEFAULT_REQUEST_DELAY_MS),
        };

        let domain = overrides
            .domain
            .or_else(|| read(ENV_DOMAIN))
            .map(|d| normalize_domain(&d))
            .transpose()?;

        let destination = overrides
            .destination
            .or_else(|| read(ENV_DESTINATION))
            .map(|d| validate_destination(&d))
            .transpose()?;

        Ok(Self {
            api_token: overrides.api_token.or_else(|| read(ENV_API_TOKEN)),
            zone_id: overrides.zone_id.or_else(|| read(ENV_ZONE_ID)),
            api_base: read(ENV_API_BASE)
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            domain,
            destination,
            seed,
            request_delay: Duration::from_millis(delay_ms),
            output_dir: overrides
                .output_dir
                .or_else(|| read(ENV_OUTPUT_DIR).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            retry: RetryPolicy::default(),
        })
    }

    pub fn require_token(&self) -> AliasctlResult<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| AliasctlError::config(format!("API token missing; set {ENV_API_TOKEN} or pass --token")))
    }

    pub fn require_domain(&self) -> AliasctlResult<&str> {
        self.domain
            .as_deref()
            .ok_or_else(|| AliasctlError::config(format!("domain missing; set {ENV_DOMAIN} or pass --domain")))
    }

    pub fn require_destination(&self) -> AliasctlResult<&str> {
        self.destination.as_deref().ok_or_else(|| {
            AliasctlError::config(format!(
                "destination address missing; set {ENV_DESTINATION} or pass --destination"
            ))
        })
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("zone_id", &self.zone_id)
            .field("api_base", &self.api_base)
            .field("domain", &self.domain)
            .field("destination", &self.destination)
            .field("seed", &self.seed)
            .field("request_delay", &self.request_delay)
            .field("output_dir", &self.output_dir)
            .field("retry", &self.retry)
            .finish()
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> AliasctlResult<T> {
    raw.parse::<T>()
        .map_err(|_| AliasctlError::config(format!("{key} must be a non-negative integer, got '{raw}'")))
}

/// Lowercase, strip a leading `@`, and require at least one dot
pub fn normalize_domain(raw: &str) -> AliasctlResult<String> {
    let domain = raw.trim().trim_start_matches('@').to_lowercase();
    if domain.is_empty() || !domain.contains('.') || domain.contains('@') || domain.contains(char::is_whitespace) {
        return Err(AliasctlError::config(format!("'{raw}' is not a valid domain")));
    }
    Ok(domain)
}

fn validate_destination(raw: &str) -> AliasctlResult<String> {
    let address = raw.trim().to_string();
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(address),
        _ => Err(AliasctlError::config(format!("'{raw}' is not a valid destination address"))),
    }
}
