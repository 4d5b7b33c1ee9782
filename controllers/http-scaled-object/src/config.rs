//! Controller configuration, read once at start-up from the environment.

use crate::error::ControllerError;
use std::str::FromStr;
use std::time::Duration;

const EXTERNAL_SCALER_SERVICE: &str = "KEDAHTTP_OPERATOR_EXTERNAL_SCALER_SERVICE";
const EXTERNAL_SCALER_PORT: &str = "KEDAHTTP_OPERATOR_EXTERNAL_SCALER_PORT";
const OPERATOR_NAMESPACE: &str = "KEDAHTTP_OPERATOR_NAMESPACE";
const WATCH_NAMESPACE: &str = "WATCH_NAMESPACE";
const RECONCILE_TIMEOUT_SECS: &str = "RECONCILE_TIMEOUT_SECS";
const RECONCILE_CONCURRENCY: &str = "RECONCILE_CONCURRENCY";
const RESYNC_INTERVAL_SECS: &str = "RESYNC_INTERVAL_SECS";
const PROBE_PORT: &str = "PROBE_PORT";

const DEFAULT_OPERATOR_NAMESPACE: &str = "keda";
const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RECONCILE_CONCURRENCY: u16 = 4;
const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;
const DEFAULT_PROBE_PORT: u16 = 8081;

/// Runtime settings for the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Service name of the external scaler
    pub external_scaler_service: String,
    /// Port the external scaler listens on
    pub external_scaler_port: u16,
    /// Namespace the external scaler runs in
    pub operator_namespace: String,
    /// Namespace to watch; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Upper bound on the store calls of one reconciliation
    pub reconcile_timeout: Duration,
    /// Maximum reconciliations in flight
    pub reconcile_concurrency: u16,
    /// Requeue interval after a successful reconciliation
    pub resync_interval: Duration,
    /// Port serving /healthz, /readyz and /metrics
    pub probe_port: u16,
}

impl ControllerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let external_scaler_service = lookup(EXTERNAL_SCALER_SERVICE)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ControllerError::InvalidConfig(format!(
                    "{} environment variable is required",
                    EXTERNAL_SCALER_SERVICE
                ))
            })?;

        let external_scaler_port = lookup(EXTERNAL_SCALER_PORT).ok_or_else(|| {
            ControllerError::InvalidConfig(format!(
                "{} environment variable is required",
                EXTERNAL_SCALER_PORT
            ))
        })?;
        let external_scaler_port = parse_value(EXTERNAL_SCALER_PORT, &external_scaler_port)?;

        let operator_namespace = lookup(OPERATOR_NAMESPACE)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_OPERATOR_NAMESPACE.to_string());

        let watch_namespace = lookup(WATCH_NAMESPACE).filter(|v| !v.is_empty());

        let reconcile_timeout = Duration::from_secs(optional(
            &lookup,
            RECONCILE_TIMEOUT_SECS,
            DEFAULT_RECONCILE_TIMEOUT_SECS,
        )?);
        let reconcile_concurrency =
            optional(&lookup, RECONCILE_CONCURRENCY, DEFAULT_RECONCILE_CONCURRENCY)?;
        let resync_interval = Duration::from_secs(optional(
            &lookup,
            RESYNC_INTERVAL_SECS,
            DEFAULT_RESYNC_INTERVAL_SECS,
        )?);
        let probe_port = optional(&lookup, PROBE_PORT, DEFAULT_PROBE_PORT)?;

        if reconcile_timeout.is_zero() {
            return Err(ControllerError::InvalidConfig(format!(
                "{} must be greater than zero",
                RECONCILE_TIMEOUT_SECS
            )));
        }
        if reconcile_concurrency == 0 {
            return Err(ControllerError::InvalidConfig(format!(
                "{} must be greater than zero",
                RECONCILE_CONCURRENCY
            )));
        }

        Ok(Self {
            external_scaler_service,
            external_scaler_port,
            operator_namespace,
            watch_namespace,
            reconcile_timeout,
            reconcile_concurrency,
            resync_interval,
            probe_port,
        })
    }

    /// Address written into every ScaledObject's trigger metadata
    pub fn external_scaler_address(&self) -> String {
        format!(
            "{}.{}:{}",
            self.external_scaler_service, self.operator_namespace, self.external_scaler_port
        )
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ControllerError> {
    raw.trim().parse().map_err(|_| {
        ControllerError::InvalidConfig(format!("{} has an invalid value: {:?}", key, raw))
    })
}

fn optional<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ControllerError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.is_empty() => parse_value(key, &raw),
        _ => Ok(default),
    }
}
