use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use odontia_application::{PolicyOverride, RetentionSchedulerConfig};
use odontia_core::{AppError, NonEmptyString};
use odontia_domain::{RetentionCategory, RetentionPeriod};
use tracing_subscriber::EnvFilter;

const DEFAULT_INTERVAL_SECONDS: u64 = 86_400;
const DEFAULT_RUN_AT_HOUR: u32 = 3;
const DEFAULT_SWEEP_TIMEOUT_SECONDS: u64 = 300;
const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 30;
const DEFAULT_LEASE_SECONDS: u32 = 82_800;

#[derive(Debug, Clone)]
pub struct RetentionRuntimeConfig {
    pub interval: Duration,
    pub run_at_hour: Option<u32>,
    pub sweep_timeout: Duration,
    pub shutdown_grace: Duration,
    pub lease_seconds: u32,
    pub holder_id: String,
    pub policy_overrides: Vec<PolicyOverride>,
}

impl RetentionRuntimeConfig {
    pub fn scheduler_config(&self) -> Result<RetentionSchedulerConfig, AppError> {
        Ok(RetentionSchedulerConfig {
            interval: self.interval,
            first_run_hour_utc: self.run_at_hour,
            holder_id: NonEmptyString::new(self.holder_id.as_str())?,
            lease_seconds: self.lease_seconds,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    pub admin_api_token: String,
    pub retention: RetentionRuntimeConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup<F>(migrate_only: bool, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required_non_empty(&lookup, "DATABASE_URL")?;
        let redis_url = lookup("REDIS_URL").filter(|value| !value.trim().is_empty());

        let admin_api_token = required_non_empty(&lookup, "ADMIN_API_TOKEN")?;
        if admin_api_token.len() < 32 {
            return Err(AppError::Validation(
                "ADMIN_API_TOKEN must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let interval = positive_seconds(
            &lookup,
            "RETENTION_INTERVAL_SECONDS",
            DEFAULT_INTERVAL_SECONDS,
        )?;
        let sweep_timeout = positive_seconds(
            &lookup,
            "RETENTION_SWEEP_TIMEOUT_SECONDS",
            DEFAULT_SWEEP_TIMEOUT_SECONDS,
        )?;
        let shutdown_grace = Duration::from_secs(parse_or(
            &lookup,
            "RETENTION_SHUTDOWN_GRACE_SECONDS",
            DEFAULT_SHUTDOWN_GRACE_SECONDS,
        )?);
        let lease_seconds = parse_or(&lookup, "RETENTION_LEASE_SECONDS", DEFAULT_LEASE_SECONDS)?;
        let run_at_hour = parse_run_at_hour(lookup("RETENTION_RUN_AT_HOUR"))?;
        let holder_id = lookup("RETENTION_HOLDER_ID")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| format!("odontia-api:{}", uuid::Uuid::new_v4()));

        Ok(Self {
            migrate_only,
            database_url,
            redis_url,
            api_host,
            api_port,
            admin_api_token,
            retention: RetentionRuntimeConfig {
                interval,
                run_at_hour,
                sweep_timeout,
                shutdown_grace,
                lease_seconds,
                holder_id,
                policy_overrides: parse_policy_overrides(&lookup)?,
            },
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Reads `RETENTION_<CATEGORY>_{DAYS,YEARS,ENABLED}` for every category.
pub fn parse_policy_overrides<F>(lookup: &F) -> Result<Vec<PolicyOverride>, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut overrides = Vec::new();
    for category in RetentionCategory::all() {
        let prefix = format!("RETENTION_{}", category.as_str().to_ascii_uppercase());
        let days_name = format!("{prefix}_DAYS");
        let years_name = format!("{prefix}_YEARS");
        let enabled_name = format!("{prefix}_ENABLED");

        let days = parse_optional::<u32, _>(lookup, days_name.as_str())?;
        let years = parse_optional::<u32, _>(lookup, years_name.as_str())?;
        let retention_period = match (days, years) {
            (Some(_), Some(_)) => {
                return Err(AppError::Validation(format!(
                    "{days_name} and {years_name} cannot both be set"
                )));
            }
            (Some(days), None) => Some(RetentionPeriod::Days(days)),
            (None, Some(years)) => Some(RetentionPeriod::Years(years)),
            (None, None) => None,
        };

        let enabled = lookup(enabled_name.as_str())
            .map(|value| parse_bool(enabled_name.as_str(), value.as_str()))
            .transpose()?;

        if retention_period.is_none() && enabled.is_none() {
            continue;
        }

        let mut policy_override = PolicyOverride::new(*category);
        policy_override.retention_period = retention_period;
        policy_override.enabled = enabled;
        overrides.push(policy_override);
    }

    Ok(overrides)
}

fn parse_run_at_hour(value: Option<String>) -> Result<Option<u32>, AppError> {
    let Some(value) = value else {
        return Ok(Some(DEFAULT_RUN_AT_HOUR));
    };

    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }

    let hour = value.trim().parse::<u32>().map_err(|error| {
        AppError::Validation(format!("invalid RETENTION_RUN_AT_HOUR '{value}': {error}"))
    })?;
    if hour > 23 {
        return Err(AppError::Validation(format!(
            "RETENTION_RUN_AT_HOUR must be between 0 and 23, got {hour}"
        )));
    }

    Ok(Some(hour))
}

fn parse_bool(name: &str, value: &str) -> Result<bool, AppError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(AppError::Validation(format!(
            "{name} must be either 'true' or 'false', got '{value}'"
        )))
    }
}

fn positive_seconds<F>(lookup: &F, name: &str, default: u64) -> Result<Duration, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let seconds = parse_or(lookup, name, default)?;
    if seconds == 0 {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(Duration::from_secs(seconds))
}

fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_optional(lookup, name)?.unwrap_or(default))
}

fn parse_optional<T, F>(lookup: &F, name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))
        })
        .transpose()
}

fn required_non_empty<F>(lookup: &F, name: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}
