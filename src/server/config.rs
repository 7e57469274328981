//! Server configuration
//!
//! Loaded once from the environment at startup and handed to the handlers
//! through `AppState`. Provider credentials are optional at load time; an
//! endpoint whose credentials are missing fails closed on its own.

use thiserror::Error;

use crate::models::DEFAULT_COUNTRY_CODE;

/// Longest token lifetime the provider accepts
pub const MAX_TOKEN_TTL_SECS: u64 = 86_400;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Twilio account settings
#[derive(Debug, Clone, Default)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// TwiML application that receives outgoing browser calls
    pub application_sid: Option<String>,
    /// The service's own number, used as caller ID and history filter
    pub phone_number: Option<String>,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Identity the browser client registers under
    pub identity: String,
    pub country_code: String,
    pub token_ttl_secs: u64,
    pub incoming_allow: bool,
    pub twilio: TwilioConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            identity: "softphone-user".to_string(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            token_ttl_secs: 3600,
            incoming_allow: true,
            twilio: TwilioConfig {
                api_base_url: "https://api.twilio.com/2010-04-01".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Credentials needed to mint access tokens
#[derive(Debug, Clone)]
pub struct TokenCredentials {
    pub account_sid: String,
    pub api_key: String,
    pub api_secret: String,
    pub application_sid: String,
}

/// Credentials needed to read the call log
#[derive(Debug, Clone)]
pub struct RestCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub phone_number: String,
}

impl AppConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let port = match var("PORT") {
            Some(p) => p.parse().map_err(|_| ConfigError::Invalid { name: "PORT", value: p })?,
            None => defaults.port,
        };

        let token_ttl_secs = match var("TWILIO_TOKEN_TTL") {
            Some(t) => t
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "TWILIO_TOKEN_TTL", value: t })?,
            None => defaults.token_ttl_secs,
        };

        let incoming_allow = match var("TWILIO_INCOMING_ALLOW") {
            Some(v) => match v.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                _ => return Err(ConfigError::Invalid { name: "TWILIO_INCOMING_ALLOW", value: v }),
            },
            None => defaults.incoming_allow,
        };

        let config = Self {
            port,
            identity: var("SOFTPHONE_IDENTITY").unwrap_or(defaults.identity),
            country_code: var("SOFTPHONE_COUNTRY_CODE")
                .map(|c| c.trim_start_matches('+').to_string())
                .unwrap_or(defaults.country_code),
            token_ttl_secs,
            incoming_allow,
            twilio: TwilioConfig {
                account_sid: var("TWILIO_ACCOUNT_SID"),
                auth_token: var("TWILIO_AUTH_TOKEN"),
                api_key: var("TWILIO_API_KEY"),
                api_secret: var("TWILIO_API_SECRET"),
                application_sid: var("TWILIO_APPLICATION_SID"),
                phone_number: var("TWILIO_PHONE_NUMBER"),
                api_base_url: var("TWILIO_API_BASE_URL")
                    .map(|u| u.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.twilio.api_base_url),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.is_empty() || self.identity.contains(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                name: "SOFTPHONE_IDENTITY",
                value: self.identity.clone(),
            });
        }
        if self.country_code.is_empty() || !self.country_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Invalid {
                name: "SOFTPHONE_COUNTRY_CODE",
                value: self.country_code.clone(),
            });
        }
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid {
                name: "TWILIO_TOKEN_TTL",
                value: self.token_ttl_secs.to_string(),
            });
        }
        Ok(())
    }

    pub fn token_credentials(&self) -> Result<TokenCredentials, ConfigError> {
        let t = &self.twilio;
        Ok(TokenCredentials {
            account_sid: required(&t.account_sid, "TWILIO_ACCOUNT_SID")?,
            api_key: required(&t.api_key, "TWILIO_API_KEY")?,
            api_secret: required(&t.api_secret, "TWILIO_API_SECRET")?,
            application_sid: required(&t.application_sid, "TWILIO_APPLICATION_SID")?,
        })
    }

    pub fn rest_credentials(&self) -> Result<RestCredentials, ConfigError> {
        let t = &self.twilio;
        Ok(RestCredentials {
            account_sid: required(&t.account_sid, "TWILIO_ACCOUNT_SID")?,
            auth_token: required(&t.auth_token, "TWILIO_AUTH_TOKEN")?,
            phone_number: required(&t.phone_number, "TWILIO_PHONE_NUMBER")?,
        })
    }
}

fn required(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value.clone().ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.identity, "softphone-user");
        assert_eq!(config.country_code, "81");
        assert!(config.incoming_allow);
        assert_eq!(config.twilio.api_base_url, "https://api.twilio.com/2010-04-01");
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = load(&[("TWILIO_ACCOUNT_SID", "  "), ("TWILIO_API_KEY", "SK1")]).unwrap();
        assert_eq!(config.twilio.account_sid, None);
        assert_eq!(
            config.token_credentials().unwrap_err(),
            ConfigError::Missing("TWILIO_ACCOUNT_SID")
        );
    }

    #[test]
    fn test_token_credentials_complete() {
        let config = load(&[
            ("TWILIO_ACCOUNT_SID", "AC1"),
            ("TWILIO_API_KEY", "SK1"),
            ("TWILIO_API_SECRET", "secret"),
            ("TWILIO_APPLICATION_SID", "AP1"),
        ])
        .unwrap();
        let creds = config.token_credentials().unwrap();
        assert_eq!(creds.application_sid, "AP1");
        assert_eq!(
            config.rest_credentials().unwrap_err(),
            ConfigError::Missing("TWILIO_AUTH_TOKEN")
        );
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(load(&[("PORT", "http")]), Err(ConfigError::Invalid { name: "PORT", .. })));
        assert!(load(&[("TWILIO_TOKEN_TTL", "0")]).is_err());
        assert!(load(&[("TWILIO_TOKEN_TTL", "90000")]).is_err());
        assert!(load(&[("SOFTPHONE_COUNTRY_CODE", "jp")]).is_err());
        assert!(load(&[("TWILIO_INCOMING_ALLOW", "maybe")]).is_err());
    }

    #[test]
    fn test_country_code_accepts_plus_prefix() {
        let config = load(&[("SOFTPHONE_COUNTRY_CODE", "+44")]).unwrap();
        assert_eq!(config.country_code, "44");
    }
}
