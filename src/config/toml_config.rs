use crate::adapters::http::DEFAULT_ENDPOINT;
use crate::adapters::storage::DEFAULT_STORE_PATH;
use crate::core::dashboard::DashboardOptions;
use crate::core::normalizer::MalformedItemPolicy;
use crate::utils::error::{DashboardError, Result};
use crate::utils::validation::{
    validate_path, validate_positive_number, validate_range, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One year.
pub const MAX_CLOSING_SOON_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub credential: CredentialConfig,
    pub dashboard: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    /// Applied around the client by the caller; the client itself never times out.
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    pub store_path: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            store_path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub closing_soon_hours: u64,
    pub malformed_items: MalformedItemPolicy,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            closing_soon_hours: 24,
            malformed_items: MalformedItemPolicy::Skip,
        }
    }
}

impl DashboardConfig {
    /// Reads and parses a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DashboardError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Expands `${VAR}` from the environment; unset variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DashboardError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("api.endpoint", &self.api.endpoint)?;

        if let Some(seconds) = self.api.timeout_seconds {
            validate_positive_number("api.timeout_seconds", seconds, 1)?;
        }

        validate_path("credential.store_path", &self.credential.store_path)?;
        validate_range(
            "dashboard.closing_soon_hours",
            self.dashboard.closing_soon_hours,
            1,
            MAX_CLOSING_SOON_HOURS,
        )?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.timeout_seconds.map(Duration::from_secs)
    }

    /// Clamped to `MAX_CLOSING_SOON_HOURS` for unvalidated configs.
    pub fn closing_soon_window(&self) -> chrono::Duration {
        let hours = self.dashboard.closing_soon_hours.min(MAX_CLOSING_SOON_HOURS) as i64;
        chrono::Duration::hours(hours)
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            malformed_items: self.dashboard.malformed_items,
        }
    }
}

impl Validate for DashboardConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
