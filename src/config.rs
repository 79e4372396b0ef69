//! Run configuration with defaults matching the monthly sales job.

use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::mail::Delivery;
use crate::number::NumberFormat;

/// File read from the working directory when no input is given.
pub const DEFAULT_INPUT: &str = "car_sales.json";
/// File name of the rendered report inside the temp directory.
pub const DEFAULT_OUTPUT_NAME: &str = "cars.pdf";
/// Report title and email subject.
pub const DEFAULT_TITLE: &str = "Sales summary for last month";
pub const DEFAULT_SENDER: &str = "automation@example.com";
/// Domain appended to the current user's name to form the recipient.
pub const RECIPIENT_DOMAIN: &str = "example.com";

/// Everything a pipeline run needs.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub title: String,
    pub sender: String,
    pub recipient: String,
    pub number_format: NumberFormat,
    pub delivery: Delivery,
    /// Skips composing and sending the email when false.
    pub send_email: bool,
}

impl ReportConfig {
    /// Defaults with the given recipient.
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: default_output_path(),
            title: DEFAULT_TITLE.to_string(),
            sender: DEFAULT_SENDER.to_string(),
            recipient: recipient.into(),
            number_format: NumberFormat::en_us(),
            delivery: Delivery::default(),
            send_email: true,
        }
    }
}

/// `cars.pdf` inside the platform's temporary directory.
pub fn default_output_path() -> PathBuf {
    env::temp_dir().join(DEFAULT_OUTPUT_NAME)
}

/// Returns `<user>@example.com` for the user named by `USER` (or `USERNAME`).
pub fn recipient_from_env() -> Result<String, ConfigError> {
    ["USER", "USERNAME"]
        .iter()
        .filter_map(|var| env::var(var).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .map(|user| recipient_for(&user))
        .ok_or(ConfigError::MissingUser)
}

/// Recipient address for `user`.
pub fn recipient_for(user: &str) -> String {
    format!("{}@{}", user, RECIPIENT_DOMAIN)
}

/// Errors raised while assembling the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither `USER` nor `USERNAME` is set.
    MissingUser,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingUser => write!(
                f,
                "Cannot determine the recipient: neither USER nor USERNAME is set"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_monthly_job() {
        let config = ReportConfig::new("alex@example.com");
        assert_eq!(config.input, PathBuf::from("car_sales.json"));
        assert!(config.output.ends_with("cars.pdf"));
        assert!(config.output.starts_with(env::temp_dir()));
        assert_eq!(config.title, "Sales summary for last month");
        assert_eq!(config.sender, "automation@example.com");
        assert_eq!(config.number_format, NumberFormat::en_us());
        assert_eq!(
            config.delivery,
            Delivery::Smtp {
                host: "localhost".into(),
                port: 25
            }
        );
        assert!(config.send_email);
    }

    #[test]
    fn recipient_uses_example_domain() {
        assert_eq!(recipient_for("alex"), "alex@example.com");
    }
}
