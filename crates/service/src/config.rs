//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CUSTOMER_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `LOAN_DEFAULT_LIMIT` - Credit limit assigned to newly registered customers
//! - `LOAN_LIMIT_ADJUSTMENT_PERCENTAGE` - Percentage applied by adjustment events
//! - `AMQP_URL` - Broker connection string
//!
//! ## Optional
//! - `CUSTOMER_HOST` - Bind address (default: 127.0.0.1)
//! - `CUSTOMER_PORT` - Listen port (default: 8080)
//! - `LOAN_LIMIT_EXCHANGE` - Exchange name (default: loan.limit.exchange)
//! - `LOAN_LIMIT_ROUTING_KEY` - Routing key (default: loan.limit.routingKey)
//! - `LOAN_LIMIT_QUEUE` - Queue name (default: loan.limit.queue)
//! - `LOAN_LIMIT_CONSUMER_TAG` - Consumer tag (default: customer-accounts)
//! - `DB_STATEMENT_TIMEOUT_SECS` - Statement and lock timeout (default: 30)
//! - `LOG_FORMAT` - `json` for structured log lines, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use customer_accounts_core::AdjustmentPercentage;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Customer Accounts service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Per-connection `statement_timeout` and `lock_timeout`
    pub statement_timeout: Duration,
    /// Loan policy applied at registration and by adjustment events
    pub loans: LoanPolicyConfig,
    /// Broker topology for adjustment events
    pub broker: BrokerConfig,
    /// Log line format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Loan policy settings.
#[derive(Debug, Clone, Copy)]
pub struct LoanPolicyConfig {
    /// Credit limit stored for every new customer
    pub default_limit: Decimal,
    /// Percentage by which adjustment events rescale the available limit
    pub adjustment_percentage: AdjustmentPercentage,
}

/// Broker connection and topology.
///
/// Implements `Debug` manually to redact the connection string.
#[derive(Clone)]
pub struct BrokerConfig {
    /// AMQP connection URL (may contain credentials)
    pub url: SecretString,
    /// Durable direct exchange the events are published to
    pub exchange: String,
    /// Routing key binding the queue to the exchange
    pub routing_key: String,
    /// Durable queue the consumer reads from
    pub queue: String,
    /// Consumer tag reported to the broker
    pub consumer_tag: String,
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("url", &"[REDACTED]")
            .field("exchange", &self.exchange)
            .field("routing_key", &self.routing_key)
            .field("queue", &self.queue)
            .field("consumer_tag", &self.consumer_tag)
            .finish()
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&Env(|key: &str| std::env::var(key).ok()))
    }

    fn from_lookup<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = env.database_url("CUSTOMER_DATABASE_URL")?;
        let host = env.parsed_or("CUSTOMER_HOST", "127.0.0.1")?;
        let port = env.parsed_or("CUSTOMER_PORT", "8080")?;
        let statement_timeout =
            Duration::from_secs(env.parsed_or("DB_STATEMENT_TIMEOUT_SECS", "30")?);

        let loans = LoanPolicyConfig::from_lookup(env)?;
        let broker = BrokerConfig::from_lookup(env)?;

        let log_format = match env.optional("LOG_FORMAT").as_deref() {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        Ok(Self {
            database_url,
            host,
            port,
            statement_timeout,
            loans,
            broker,
            log_format,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl LoanPolicyConfig {
    fn from_lookup<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_limit: Decimal = env.parsed("LOAN_DEFAULT_LIMIT")?;
        if default_limit < Decimal::ZERO {
            return Err(ConfigError::InvalidEnvVar(
                "LOAN_DEFAULT_LIMIT".to_string(),
                "must not be negative".to_string(),
            ));
        }

        let adjustment_percentage =
            AdjustmentPercentage::new(env.parsed("LOAN_LIMIT_ADJUSTMENT_PERCENTAGE")?);

        Ok(Self {
            default_limit,
            adjustment_percentage,
        })
    }
}

impl BrokerConfig {
    /// Load only the broker settings.
    ///
    /// Used by tools that publish events without running the service.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `AMQP_URL` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&Env(|key: &str| std::env::var(key).ok()))
    }

    fn from_lookup<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            url: SecretString::from(env.required("AMQP_URL")?),
            exchange: env.or_default("LOAN_LIMIT_EXCHANGE", "loan.limit.exchange"),
            routing_key: env.or_default("LOAN_LIMIT_ROUTING_KEY", "loan.limit.routingKey"),
            queue: env.or_default("LOAN_LIMIT_QUEUE", "loan.limit.queue"),
            consumer_tag: env.or_default("LOAN_LIMIT_CONSUMER_TAG", "customer-accounts"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup, backed by the process environment outside of tests.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable. Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a required variable.
    fn parsed<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        parse_value(key, &self.required(key)?)
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        parse_value(key, &self.or_default(key, default))
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
