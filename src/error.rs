//! Error types for lookup operations
//!
//! Every fallible operation of the engine reports one of the `LookupError`
//! variants. Rate limiting, caching and detail extraction never fail; they log
//! and degrade instead.

use thiserror::Error;

/// Result type alias for lookup operations
pub type LookupResult<T> = Result<T, LookupError>;

/// Error types for lookup operations
#[derive(Debug, Error)]
pub enum LookupError {
    /// Caller supplied an unusable input
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Transport failure or HTTP error status after all attempts
    #[error("Network error for {url}{suffix}: {message}", suffix = status_suffix(.status))]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// The portal answered with a human-verification challenge
    #[error("Verification challenge detected at {url} (HTTP {status})")]
    Blocked { url: String, status: u16 },

    /// The cancellation signal was raised
    #[error("Operation cancelled")]
    Cancelled,

    /// A page could not be interpreted at all
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LookupError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn network(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Check if error is transient and the lookup may be retried later
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            LookupError::Network { status: None, .. } => true,
            LookupError::Network {
                status: Some(status),
                ..
            } => *status == 403 || *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Text shown to end users.
    ///
    /// Cancellation renders as an empty string: the caller stopped on purpose
    /// and nothing needs reporting.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            LookupError::Validation { message, .. } => {
                format!("Dữ liệu không hợp lệ: {message}")
            }
            LookupError::Network { message, .. } => format!(
                "Không thể kết nối đến server.\n\nChi tiết: {message}\n\n\
                 Vui lòng kiểm tra kết nối internet và thử lại."
            ),
            LookupError::Blocked { .. } => "Website yêu cầu xác minh CAPTCHA. \
                 Vui lòng mở trình duyệt, giải CAPTCHA rồi thử lại sau. \
                 Các kết quả đã tra cứu được giữ lại."
                .to_string(),
            LookupError::Cancelled => String::new(),
            LookupError::Parse { message } => format!("Lỗi khi phân tích HTML: {message}"),
            LookupError::Config(e) => format!("Cấu hình không hợp lệ: {e}"),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Errors raised while building or loading a `LookupConfig`
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_display_includes_status() {
        let err = LookupError::network("https://masothue.com/Search/", Some(500), "boom");
        assert_eq!(
            err.to_string(),
            "Network error for https://masothue.com/Search/ (HTTP 500): boom"
        );

        let err = LookupError::network("https://masothue.com/", None, "timed out");
        assert_eq!(
            err.to_string(),
            "Network error for https://masothue.com/: timed out"
        );
    }

    #[test]
    fn test_is_retryable() {
        assert!(LookupError::network("u", None, "reset").is_retryable());
        assert!(LookupError::network("u", Some(429), "slow down").is_retryable());
        assert!(LookupError::network("u", Some(503), "unavailable").is_retryable());
        assert!(!LookupError::network("u", Some(404), "missing").is_retryable());
        assert!(!LookupError::Cancelled.is_retryable());
        assert!(
            !LookupError::Blocked {
                url: "u".into(),
                status: 200
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_user_messages() {
        assert!(LookupError::Cancelled.user_message().is_empty());

        let blocked = LookupError::Blocked {
            url: "u".into(),
            status: 200,
        };
        assert!(blocked.user_message().contains("CAPTCHA"));

        let network = LookupError::network("u", None, "connection refused");
        assert!(network.user_message().contains("connection refused"));
    }
}
