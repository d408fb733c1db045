//! Configuration validation.

use recorder_protocols::StateKey;

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_backend(config, &mut result);
        Self::validate_sync(config, &mut result);
        Self::validate_review(config, &mut result);
        Self::validate_recording(config, &mut result);

        result
    }

    fn validate_backend(config: &Config, result: &mut ValidationResult) {
        match url::Url::parse(&config.backend.base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(_) => result.add_error(ValidationError::new(
                "backend.base_url",
                "base_url must start with http:// or https://",
            )),
            Err(e) => result.add_error(ValidationError::new(
                "backend.base_url",
                format!("Invalid URL: {}", e),
            )),
        }

        if config.backend.request_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "backend.request_timeout_secs",
                "request_timeout_secs must be greater than 0",
            ));
        }
    }

    fn validate_sync(config: &Config, result: &mut ValidationResult) {
        if config.sync.interval_secs == 0 {
            result.add_error(ValidationError::new(
                "sync.interval_secs",
                "interval_secs must be greater than 0",
            ));
        } else if config.sync.interval_secs < 10 {
            result.add_warning(ValidationWarning::new(
                "sync.interval_secs",
                "interval_secs is very low (<10), the backend will be polled constantly",
            ));
        }

        if config.sync.item_delay_ms == 0 {
            result.add_warning(ValidationWarning::new(
                "sync.item_delay_ms",
                "item_delay_ms is 0, queued confirmations will be sent back to back",
            ));
        }
    }

    fn validate_review(config: &Config, result: &mut ValidationResult) {
        if config.review.submit_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "review.submit_timeout_ms",
                "submit_timeout_ms must be greater than 0",
            ));
        }
    }

    fn validate_recording(config: &Config, result: &mut ValidationResult) {
        let context = &config.recording.context;
        if context.is_empty() {
            result.add_error(ValidationError::new(
                "recording.context",
                "context cannot be empty",
            ));
        } else if !StateKey::is_valid_context(context) {
            result.add_error(ValidationError::new(
                "recording.context",
                "context may only contain ASCII letters, digits, '-', '_' and '.'",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let result = ConfigValidator::validate(&Config::default());
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_invalid_base_url() {
        let mut config = Config::default();
        config.backend.base_url = "localhost".to_string();

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "backend.base_url"));
    }

    #[test]
    fn test_validate_non_http_scheme() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://example.com".to_string();

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.sync.interval_secs = 0;

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "sync.interval_secs"));
    }

    #[test]
    fn test_validate_short_interval_warning() {
        let mut config = Config::default();
        config.sync.interval_secs = 2;
        config.sync.item_delay_ms = 0;

        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_validate_context_with_separator() {
        let mut config = Config::default();
        config.recording.context = "../escape".to_string();

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "recording.context"));
    }

    #[test]
    fn test_validate_context_outside_key_charset() {
        for context in ["tab 1", "tab:1"] {
            let mut config = Config::default();
            config.recording.context = context.to_string();

            let result = ConfigValidator::validate(&config);
            assert!(!result.is_valid(), "{context} should be rejected");
            assert!(result.errors.iter().any(|e| e.path == "recording.context"));
        }

        let mut config = Config::default();
        config.recording.context = "tab-1".to_string();
        assert!(ConfigValidator::validate(&config).is_valid());
    }
}
