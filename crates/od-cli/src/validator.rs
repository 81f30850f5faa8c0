//! Configuration validation for the orgdesk CLI.
//!
//! Startup validation catches broken configuration before the server binds
//! its port.

use crate::config::AppConfig;
use colored::Colorize;
use uuid::Uuid;

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Critical errors that prevent startup.
    pub errors: Vec<String>,
    /// Warnings that should be addressed but don't prevent startup.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Prints the validation result to the console.
    pub fn print(&self) {
        if !self.warnings.is_empty() {
            println!();
            println!("{}", "Configuration Warnings:".yellow().bold());
            for warning in &self.warnings {
                println!("  {} {}", "⚠".yellow(), warning);
            }
        }

        if !self.errors.is_empty() {
            println!();
            println!("{}", "Configuration Errors:".red().bold());
            for error in &self.errors {
                println!("  {} {}", "✗".red(), error);
            }
        }

        if self.errors.is_empty() && self.warnings.is_empty() {
            println!("  {} Configuration OK", "✓".green());
        }
    }
}

/// Validates application configuration before startup.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the application configuration.
    pub fn validate(config: &AppConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_database_url(config, &mut result);
        Self::validate_server(config, &mut result);
        Self::validate_admin_user(config, &mut result);
        Self::validate_log_level(config, &mut result);

        result
    }

    fn validate_database_url(config: &AppConfig, result: &mut ValidationResult) {
        let url = &config.database.url;
        if url.is_empty() {
            result.add_error("Database URL is empty");
        } else if !url.starts_with("sqlite:") && !url.starts_with("postgres") {
            result.add_error(format!(
                "Unsupported database URL scheme: {url}. Use sqlite:// or postgres://"
            ));
        } else if url.starts_with("sqlite::memory:") {
            result.add_warning(
                "In-memory SQLite database configured; all data is lost on restart",
            );
        }
    }

    fn validate_server(config: &AppConfig, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error("Server port must not be 0");
        }
        if config.server.host.is_empty() {
            result.add_error("Server host is empty");
        }
        if config.server.timeout_secs == 0 {
            result.add_warning("Request timeout of 0 disables timeouts entirely");
        }
    }

    fn validate_admin_user(config: &AppConfig, result: &mut ValidationResult) {
        let from_env = std::env::var("OD_ADMIN_USER_ID").ok();
        let raw = config.admin_user_id.as_ref().or(from_env.as_ref());
        match raw {
            Some(raw) if Uuid::parse_str(raw.trim()).is_err() => {
                result.add_error(format!("admin_user_id is not a valid UUID: {raw}"));
            }
            Some(_) => {}
            None => {
                result.add_warning(
                    "No admin_user_id configured (or OD_ADMIN_USER_ID set); a random \
                     account id will be generated if the staff directory is empty",
                );
            }
        }
    }

    fn validate_log_level(config: &AppConfig, result: &mut ValidationResult) {
        let level = config.logging.level.to_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            result.add_error(format!("Unknown log level: {}", config.logging.level));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_passes() {
        let result = ConfigValidator::validate(&AppConfig::default());
        assert!(!result.has_errors());
    }

    #[test]
    fn bad_database_scheme_is_an_error() {
        let mut config = AppConfig::default();
        config.database.url = "mysql://nope".to_string();
        let result = ConfigValidator::validate(&config);
        assert!(result.has_errors());
    }

    #[test]
    fn malformed_admin_id_is_an_error() {
        let mut config = AppConfig::default();
        config.admin_user_id = Some("not-a-uuid".to_string());
        let result = ConfigValidator::validate(&config);
        assert!(result.has_errors());
    }

    #[test]
    fn zero_port_is_an_error() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        let result = ConfigValidator::validate(&config);
        assert!(result.has_errors());
    }
}
