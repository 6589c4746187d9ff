#![deny(unused_must_use)]
#![deny(unsafe_code)]

pub mod apis;
mod candle;
pub mod dataset;
pub mod normalize;
mod principal;
mod profile;
pub mod prompts;
mod session;
mod status;
mod trading;

use std::env;

pub use candle::*;
use chrono::{DateTime, Duration, Utc};
pub use dataset::{parse_dataset_bytes, parse_dataset_file, DatasetFormat, ParseError};
pub use normalize::{normalize_health_status, normalize_trading_mode};
pub use principal::*;
pub use profile::*;
pub use prompts::{PromptError, PromptTemplate};
pub use session::*;
pub use status::*;
pub use trading::*;

use apis::{fetch_trading_mode, Backend, BackendError, Retry, Timeout};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Trading(#[from] TradingError),
    #[error("Please enter a dataset name")]
    MissingName,
    #[error("Caller is not authenticated.")]
    NotAuthenticated,
}

/// Timeouts and retries for calls to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub query_timeout: Duration,
    pub health_timeout: Duration,
    /// How often a lost health or profile query is asked again.
    pub retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            query_timeout: Duration::seconds(30),
            health_timeout: Duration::seconds(10),
            retries: 1,
        }
    }
}

impl Settings {
    /// Defaults, overridden by `DASHCORE_QUERY_TIMEOUT_MS`, `DASHCORE_HEALTH_TIMEOUT_MS`
    /// and `DASHCORE_RETRIES`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|value| value.trim().parse::<i64>().ok())
                .filter(|millis| *millis > 0)
                .map(Duration::milliseconds)
                .unwrap_or(default)
        };
        let defaults = Settings::default();

        Settings {
            query_timeout: millis("DASHCORE_QUERY_TIMEOUT_MS", defaults.query_timeout),
            health_timeout: millis("DASHCORE_HEALTH_TIMEOUT_MS", defaults.health_timeout),
            retries: lookup("DASHCORE_RETRIES")
                .and_then(|value| value.trim().parse::<u32>().ok())
                .unwrap_or(defaults.retries),
        }
    }
}

/// Nanoseconds since the epoch at millisecond precision, the backend's time unit.
/// Times before the epoch clamp to zero; `None` once the value no longer fits a `u64`.
pub(crate) fn nanos(time: DateTime<Utc>) -> Option<u64> {
    u64::try_from(time.timestamp_millis())
        .unwrap_or(0)
        .checked_mul(1_000_000)
}

#[cfg(feature = "mock")]
pub(crate) fn now_nanos() -> u64 {
    nanos(Utc::now()).unwrap_or(u64::MAX)
}

/// The caller-facing side of the dashboard: who is signed in and how to talk to the backend.
pub struct Dashboard {
    pub settings: Settings,
    pub session: Session,
}

impl Dashboard {
    pub fn new(settings: Settings, session: Session) -> Self {
        Dashboard { settings, session }
    }

    /// Wrap a backend so that every call honours the configured timeouts, and lost
    /// health and profile queries are retried. Each attempt gets its own timeout.
    pub fn connect<B: Backend>(&self, backend: B) -> Retry<Timeout<B>> {
        Retry::new(Timeout::new(backend, &self.settings), self.settings.retries)
    }

    /// Parse an uploaded file and store it as a new dataset. Returns the new dataset id.
    /// Nothing is uploaded unless every row is valid.
    pub async fn upload_dataset_file<B: Backend>(
        &self,
        backend: &B,
        filename: &str,
        content: &[u8],
        name: &str,
        description: &str,
    ) -> Result<String, DashboardError> {
        if !self.session.is_authenticated() {
            return Err(DashboardError::NotAuthenticated);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(DashboardError::MissingName);
        }
        let description = Some(description.trim())
            .filter(|description| !description.is_empty())
            .map(str::to_owned);

        let candles = parse_dataset_bytes(filename, content)?;
        let id = format!("dataset-{}", Utc::now().timestamp_millis());
        log::info!(
            "Uploading {} candles from {} as {}.",
            candles.len(),
            filename,
            id
        );

        backend
            .upload_dataset(id.clone(), candles, name.to_owned(), description)
            .await?;

        Ok(id)
    }

    /// Move the caller to another trading mode. Live trading must be confirmed.
    /// Returns the mode in effect afterwards.
    pub async fn switch_trading_mode<B: Backend>(
        &self,
        backend: &B,
        target: TradingMode,
        confirmed: bool,
    ) -> Result<TradingMode, DashboardError> {
        if !self.session.is_authenticated() {
            return Err(DashboardError::NotAuthenticated);
        }

        let current = fetch_trading_mode(backend).await?;
        match request_mode_change(current, target, confirmed)? {
            Some(mode) => {
                backend.update_trading_mode(mode).await?;
                log::info!("Switched from {} to {}.", current.label(), mode.label());
                Ok(mode)
            }
            None => Ok(current),
        }
    }
}
