//! Configuration validation module.
//!
//! Every section is checked and all problems are reported together, so a
//! bad deployment fails at startup instead of at the first cache miss or
//! the first scheduled sync.

use crate::AppConfig;
use cron::Schedule;
use freestays_core::LanguageCode;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Pool size configuration is invalid (min must be <= max).
    InvalidPoolSize { min: u32, max: u32 },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Cron expression does not parse.
    InvalidCron { name: String, expression: String, message: String },
    /// No sync language configured.
    NoSyncLanguages,
    /// A configured sync language is not a language code.
    InvalidLanguage { value: String },
    /// Timeout or TTL value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Provider credentials are missing.
    MissingProviderCredentials,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPoolSize { min, max } => {
                write!(
                    f,
                    "Invalid pool size: min ({}) cannot be greater than max ({})",
                    min, max
                )
            }
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(
                    f,
                    "Pool size {} exceeds maximum allowed ({})",
                    value, maximum
                )
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::InvalidCron {
                name,
                expression,
                message,
            } => {
                write!(f, "Invalid cron expression for {}: '{}' ({})", name, expression, message)
            }
            Self::NoSyncLanguages => write!(f, "sync.languages must contain at least one language"),
            Self::InvalidLanguage { value } => {
                write!(f, "Invalid sync language: '{}'", value)
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::MissingProviderCredentials => {
                write!(f, "sunhotels.username and sunhotels.password are required in production")
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Every error found during one validation pass.
#[derive(Debug)]
struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    fn require_positive(&mut self, name: &str, value: u64) {
        if value == 0 {
            self.add_error(ConfigValidationError::NonPositiveTimeout {
                name: name.to_string(),
                value,
            });
        }
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::new();

        Self::validate_database(&config.database, &mut result);
        Self::validate_redis(&config.redis, &mut result);
        Self::validate_cache(&config.cache, &mut result);
        Self::validate_sunhotels(config, &mut result);
        Self::validate_sync(&config.sync, &mut result);
        Self::validate_scheduler(&config.scheduler, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_database(config: &crate::DatabaseConfig, result: &mut ValidationResult) {
        if config.url.is_empty() {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL cannot be empty".to_string(),
            });
        } else if !config.url.starts_with("mysql://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "database".to_string(),
                message: "URL must start with mysql://".to_string(),
            });
        }

        if config.min_connections > config.max_connections {
            result.add_error(ConfigValidationError::InvalidPoolSize {
                min: config.min_connections,
                max: config.max_connections,
            });
        }
        if config.max_connections > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: config.max_connections,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        result.require_positive("database.connect_timeout_secs", config.connect_timeout_secs);
        result.require_positive("database.idle_timeout_secs", config.idle_timeout_secs);
    }

    fn validate_redis(config: &crate::RedisConfig, result: &mut ValidationResult) {
        // An unconfigured store is legal: the process-local store takes over.
        if !config.is_configured() {
            return;
        }

        if !config.url.starts_with("redis://") && !config.url.starts_with("rediss://") {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            });
        }

        if config.pool_size > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: config.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        result.require_positive("redis.connect_timeout_secs", config.connect_timeout_secs);
    }

    fn validate_cache(config: &crate::CacheConfig, result: &mut ValidationResult) {
        result.require_positive("cache.default_ttl_secs", config.default_ttl_secs);
        result.require_positive("cache.hotel_lookup_ttl_secs", config.hotel_lookup_ttl_secs);
    }

    fn validate_sunhotels(config: &AppConfig, result: &mut ValidationResult) {
        let sunhotels = &config.sunhotels;
        if let Err(e) = Url::parse(&sunhotels.base_url) {
            result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "sunhotels".to_string(),
                message: format!("{}: {}", sunhotels.base_url, e),
            });
        }

        if config.app.environment == "production"
            && (sunhotels.username.is_empty() || sunhotels.password.is_empty())
        {
            result.add_error(ConfigValidationError::MissingProviderCredentials);
        }

        result.require_positive("sunhotels.timeout_secs", sunhotels.timeout_secs);
    }

    fn validate_sync(config: &crate::SyncConfig, result: &mut ValidationResult) {
        for (name, expression) in [
            ("sync.full_cron", &config.full_cron),
            ("sync.basic_cron", &config.basic_cron),
        ] {
            if let Err(e) = Schedule::from_str(expression) {
                result.add_error(ConfigValidationError::InvalidCron {
                    name: name.to_string(),
                    expression: expression.clone(),
                    message: e.to_string(),
                });
            }
        }

        if config.languages.is_empty() {
            result.add_error(ConfigValidationError::NoSyncLanguages);
        }
        for language in &config.languages {
            if LanguageCode::parse(language).is_err() {
                result.add_error(ConfigValidationError::InvalidLanguage {
                    value: language.clone(),
                });
            }
        }
    }

    fn validate_scheduler(config: &crate::SchedulerConfig, result: &mut ValidationResult) {
        result.require_positive("scheduler.poll_interval_secs", config.poll_interval_secs);
        result.require_positive("scheduler.lock_ttl_secs", config.lock_ttl_secs);
    }

    fn validate_observability(config: &crate::ObservabilityConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}
