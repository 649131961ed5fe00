use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("API key is missing")]
    MissingCredential,

    #[error("API reported an error: {message}")]
    DomainError { message: String },

    #[error("API request failed: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("API request timed out after {timeout:?}")]
    TimeoutError { timeout: std::time::Duration },

    #[error("Malformed bid item at index {index}: {reason}")]
    MalformedItem { index: usize, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl DashboardError {
    /// One-line message shown to the user in place of the bid list.
    pub fn user_friendly_message(&self) -> String {
        match self {
            DashboardError::MissingCredential => "API 키를 입력해주세요.".to_string(),
            DashboardError::DomainError { message } => message.clone(),
            DashboardError::TransportError(_) | DashboardError::TimeoutError { .. } => {
                "데이터를 불러오는 중 오류가 발생했습니다.".to_string()
            }
            DashboardError::MalformedItem { index, .. } => {
                format!("{}번째 공고 데이터 형식이 올바르지 않습니다.", index + 1)
            }
            DashboardError::InvalidConfigValueError { field, reason, .. } => {
                format!("설정 값 '{}' 이(가) 올바르지 않습니다: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DashboardError::MissingCredential => "Pass --api-key once; it is saved for later runs",
            DashboardError::DomainError { .. } => "Check the API key and the requested date range",
            DashboardError::TransportError(_) | DashboardError::TimeoutError { .. } => {
                "Check network connectivity and the API endpoint, then try again"
            }
            DashboardError::MalformedItem { .. } => {
                "Set dashboard.malformed_items = \"skip\" to ignore malformed announcements"
            }
            DashboardError::IoError(_) => "Check file permissions for the credential store",
            DashboardError::SerializationError(_) | DashboardError::CsvError(_) => {
                "Try a different --format"
            }
            DashboardError::ConfigError { .. } | DashboardError::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command-line flags"
            }
        }
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            DashboardError::ConfigError { .. }
            | DashboardError::InvalidConfigValueError { .. }
            | DashboardError::MissingCredential => 1,
            DashboardError::TransportError(_) | DashboardError::TimeoutError { .. } => 2,
            DashboardError::DomainError { .. } | DashboardError::MalformedItem { .. } => 3,
            DashboardError::IoError(_)
            | DashboardError::SerializationError(_)
            | DashboardError::CsvError(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_message_is_verbatim() {
        let err = DashboardError::DomainError {
            message: "Invalid Key".to_string(),
        };
        assert_eq!(err.user_friendly_message(), "Invalid Key");
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_malformed_item_message_is_one_based() {
        let err = DashboardError::MalformedItem {
            index: 0,
            reason: "missing bidNtceNm".to_string(),
        };
        assert!(err.user_friendly_message().starts_with("1번째"));
        assert!(err.to_string().contains("index 0"));
    }
}
