use std::env;
use std::time::Duration;

use thiserror::Error;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    api: ApiSettings,
    session: SessionSettings,
    identity: IdentitySettings,
    runtime: RuntimeSettings,
    telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) base_url: String,
    pub(crate) connect_timeout_seconds: u64,
    pub(crate) request_timeout_seconds: u64,
}

/// Timer periods and the warning threshold for a proctored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionSettings {
    pub(crate) autosave_interval: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) max_warnings: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            autosave_interval: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5),
            max_warnings: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct IdentitySettings {
    pub(crate) username: String,
    pub(crate) display_name: String,
    pub(crate) session_cookie: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Test => "test",
        }
    }

    fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("missing required setting {0}")]
    Missing(&'static str),
}

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let environment =
            parse_environment(env_optional("MCQ_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("MCQ_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let base_url = parse_base_url(env_or_default("MCQ_API_BASE_URL", DEFAULT_API_BASE_URL))?;
        let connect_timeout_seconds = parse_positive_u64(
            "MCQ_CONNECT_TIMEOUT_SECONDS",
            env_or_default("MCQ_CONNECT_TIMEOUT_SECONDS", "10"),
        )?;
        let request_timeout_seconds = parse_positive_u64(
            "MCQ_REQUEST_TIMEOUT_SECONDS",
            env_or_default("MCQ_REQUEST_TIMEOUT_SECONDS", "30"),
        )?;

        let autosave_interval_seconds = parse_positive_u64(
            "PROCTOR_AUTOSAVE_INTERVAL_SECONDS",
            env_or_default("PROCTOR_AUTOSAVE_INTERVAL_SECONDS", "5"),
        )?;
        let poll_interval_seconds = parse_positive_u64(
            "PROCTOR_POLL_INTERVAL_SECONDS",
            env_or_default("PROCTOR_POLL_INTERVAL_SECONDS", "5"),
        )?;
        let max_warnings =
            parse_u32("PROCTOR_MAX_WARNINGS", env_or_default("PROCTOR_MAX_WARNINGS", "3"))?;
        if max_warnings == 0 {
            return Err(ConfigError::InvalidValue {
                field: "PROCTOR_MAX_WARNINGS",
                value: max_warnings.to_string(),
            });
        }

        let username = env_or_default("MCQ_USERNAME", "");
        let display_name = env_or_default("MCQ_DISPLAY_NAME", "");
        let session_cookie = env_optional("MCQ_SESSION_COOKIE");

        let log_level = env_or_default("MCQ_LOG_LEVEL", "info");
        let json = env_optional("MCQ_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            api: ApiSettings { base_url, connect_timeout_seconds, request_timeout_seconds },
            session: SessionSettings {
                autosave_interval: Duration::from_secs(autosave_interval_seconds),
                poll_interval: Duration::from_secs(poll_interval_seconds),
                max_warnings,
            },
            identity: IdentitySettings { username, display_name, session_cookie },
            runtime: RuntimeSettings { environment, strict_config },
            telemetry: TelemetrySettings { log_level, json },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn session(&self) -> SessionSettings {
        self.session
    }

    pub(crate) fn identity(&self) -> &IdentitySettings {
        &self.identity
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.runtime.strict_config {
            return Ok(());
        }

        if self.identity.username.is_empty() {
            return Err(ConfigError::Missing("MCQ_USERNAME"));
        }

        if self.identity.session_cookie.is_none() {
            return Err(ConfigError::Missing("MCQ_SESSION_COOKIE"));
        }

        if !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(self.api.base_url.clone()));
        }

        Ok(())
    }
}

fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn parse_u32(field: &'static str, value: String) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidValue { field, value })
}

fn parse_positive_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

fn parse_base_url(value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim_end_matches('/');
    match reqwest::Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(trimmed.to_string()),
        _ => Err(ConfigError::InvalidBaseUrl(value)),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

fn parse_environment(value: Option<String>) -> Environment {
    match value.as_deref().map(|val| val.to_lowercase()) {
        Some(ref val) if val == "production" || val == "prod" => Environment::Production,
        Some(ref val) if val == "staging" => Environment::Staging,
        Some(ref val) if val == "test" || val == "testing" => Environment::Test,
        _ => Environment::Development,
    }
}
