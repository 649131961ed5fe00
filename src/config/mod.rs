pub mod toml_config;

pub use toml_config::DashboardConfig;

#[cfg(feature = "cli")]
use crate::domain::model::DateRange;
#[cfg(feature = "cli")]
use crate::report::OutputFormat;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_date, validate_url, Validate};
#[cfg(feature = "cli")]
use chrono::NaiveDate;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "bid-dashboard")]
#[command(about = "Procurement bid-announcement dashboard")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// First announcement date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub start: Option<String>,

    /// Last announcement date (YYYY-MM-DD), defaults to --start
    #[arg(long)]
    pub end: Option<String>,

    /// API service key; stored for later runs
    #[arg(long, env = "BID_DASHBOARD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Override the API endpoint from the config file
    #[arg(long)]
    pub endpoint: Option<String>,

    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn date_range(&self, today: NaiveDate) -> Result<DateRange> {
        let today = today.format("%Y-%m-%d").to_string();
        let start = self.start.clone().unwrap_or(today);
        let end = self.end.clone().unwrap_or_else(|| start.clone());
        DateRange::parse(&start, &end)
    }

    /// Copy that is safe to log.
    pub fn redacted(mut self) -> Self {
        if self.api_key.is_some() {
            self.api_key = Some("***".to_string());
        }
        self
    }

    pub fn apply_overrides(&self, config: &mut DashboardConfig) {
        if let Some(endpoint) = &self.endpoint {
            tracing::info!("🔧 Endpoint overridden to: {}", endpoint);
            config.api.endpoint = endpoint.clone();
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(start) = &self.start {
            validate_date("start", start)?;
        }
        if let Some(end) = &self.end {
            validate_date("end", end)?;
        }
        if let Some(endpoint) = &self.endpoint {
            validate_url("endpoint", endpoint)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = CliConfig::try_parse_from(["bid-dashboard"]).unwrap();

        assert_eq!(cli.format, OutputFormat::Table);
        assert!(cli.validate().is_ok());
        assert_eq!(
            cli.date_range(today()).unwrap(),
            DateRange::new("2024-05-03", "2024-05-03")
        );
    }

    #[test]
    fn test_explicit_range_and_format() {
        let cli = CliConfig::try_parse_from([
            "bid-dashboard",
            "--start",
            "2024-05-01",
            "--end",
            "2024-05-03",
            "--format",
            "csv",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Csv);
        assert_eq!(
            cli.date_range(today()).unwrap(),
            DateRange::new("2024-05-01", "2024-05-03")
        );
    }

    #[test]
    fn test_end_defaults_to_start() {
        let cli = CliConfig::try_parse_from(["bid-dashboard", "--start", "2024-04-30"]).unwrap();
        assert_eq!(
            cli.date_range(today()).unwrap(),
            DateRange::new("2024-04-30", "2024-04-30")
        );
    }

    #[test]
    fn test_invalid_dates_and_endpoint() {
        let cli = CliConfig::try_parse_from(["bid-dashboard", "--start", "2024-02-31"]).unwrap();
        assert!(cli.validate().is_err());
        assert!(cli.date_range(today()).is_err());

        let cli = CliConfig::try_parse_from(["bid-dashboard", "--endpoint", "ftp://x"]).unwrap();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_endpoint_override() {
        let cli =
            CliConfig::try_parse_from(["bid-dashboard", "--endpoint", "http://localhost:9000/b"])
                .unwrap();
        let mut config = DashboardConfig::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.api.endpoint, "http://localhost:9000/b");
    }

    #[test]
    fn test_redacted_hides_api_key() {
        let cli = CliConfig::try_parse_from(["bid-dashboard", "--api-key", "secret"]).unwrap();
        let logged = format!("{:?}", cli.redacted());
        assert!(!logged.contains("secret"));
    }
}
