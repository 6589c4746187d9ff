#[cfg(feature = "mock")]
mod mock;
mod retry;
mod timeout;

#[cfg(feature = "mock")]
pub use mock::*;
pub use retry::*;
pub use timeout::*;

use async_trait::async_trait;
use futures_util::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    normalize::normalize, AppHealth, Candle, CandleSummary, Dataset, PromptTemplate,
    TradingMode, TradingStatus, UserProfile,
};

/// The remote backend actor. Implementations are the deployed service,
/// the in-memory mock and middlewares wrapping either.
#[async_trait]
pub trait Backend: Send + Sync {
    const NAME: &'static str;

    /// Store a new dataset owned by the caller.
    async fn upload_dataset(
        &self,
        id: String,
        candles: Vec<Candle>,
        name: String,
        description: Option<String>,
    ) -> Result<(), BackendError>;
    async fn get_all_dataset_ids(&self) -> Result<Vec<String>, BackendError>;
    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, BackendError>;
    async fn get_candle_summary(&self, id: &str) -> Result<CandleSummary, BackendError>;
    /// Health with the status in whatever encoding the backend chose.
    async fn get_system_health(&self) -> Result<RawAppHealth, BackendError>;
    async fn get_caller_user_profile(&self) -> Result<Option<RawUserProfile>, BackendError>;
    async fn save_caller_user_profile(&self, profile: UserProfile) -> Result<(), BackendError>;
    async fn update_trading_mode(&self, mode: TradingMode) -> Result<(), BackendError>;
    async fn get_all_prompt_templates(&self) -> Result<Vec<PromptTemplate>, BackendError>;
    async fn get_prompt_template(&self, id: &str) -> Result<Option<PromptTemplate>, BackendError>;
    async fn save_prompt_template(&self, template: PromptTemplate) -> Result<(), BackendError>;
    async fn filter_prompt_templates(
        &self,
        category: &str,
    ) -> Result<Vec<PromptTemplate>, BackendError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Could not connect to the backend.")]
    Network,
    #[error("Request timed out")]
    Timeout,
    #[error("Caller is not authenticated.")]
    Unauthenticated,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Rejected(String),
}

impl BackendError {
    /// Failures worth asking again for: the request may not have reached the backend.
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Network | BackendError::Timeout)
    }

    /// Build an error from a rejection payload of unknown shape.
    pub fn from_reject(value: &Value) -> Self {
        BackendError::Rejected(reject_message(value))
    }
}

fn reject_message(value: &Value) -> String {
    const FALLBACK: &str = "An unexpected error occurred";

    let object = match value {
        Value::String(message) => return message.clone(),
        Value::Object(object) => object,
        _ => return FALLBACK.to_owned(),
    };

    let text = |value: &Value| match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    let present = |key: &str| object.get(key).filter(|value| is_truthy(value));

    for key in ["message", "error_description", "error", "reject_message"] {
        if let Some(value) = present(key) {
            return text(value);
        }
    }
    if let Some(code) = present("reject_code") {
        return format!("Canister error (code {})", text(code));
    }

    FALLBACK.to_owned()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawAppHealth {
    pub status: Value,
    #[serde(default)]
    pub message: Option<String>,
}

impl RawAppHealth {
    pub fn normalize(self) -> AppHealth {
        AppHealth {
            status: normalize(&self.status),
            message: self.message,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTradingStatus {
    pub mode: Value,
    pub trading_enabled: bool,
    pub binance_connected: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUserProfile {
    pub name: String,
    pub email: String,
    pub created_at: u64,
    pub trading_status: RawTradingStatus,
}

impl RawUserProfile {
    pub fn normalize(self) -> UserProfile {
        UserProfile {
            name: self.name,
            email: self.email,
            created_at: self.created_at,
            trading_status: TradingStatus {
                mode: normalize(&self.trading_status.mode),
                trading_enabled: self.trading_status.trading_enabled,
                binance_connected: self.trading_status.binance_connected,
            },
        }
    }
}

pub async fn fetch_system_health<B: Backend>(backend: &B) -> Result<AppHealth, BackendError> {
    let health = backend.get_system_health().await?.normalize();
    log::debug!("{} reports {}.", B::NAME, health.status);
    Ok(health)
}

pub async fn fetch_user_profile<B: Backend>(
    backend: &B,
) -> Result<Option<UserProfile>, BackendError> {
    Ok(backend
        .get_caller_user_profile()
        .await?
        .map(RawUserProfile::normalize))
}

/// The caller's trading mode. Callers without a profile are on paper trading.
pub async fn fetch_trading_mode<B: Backend>(backend: &B) -> Result<TradingMode, BackendError> {
    Ok(fetch_user_profile(backend)
        .await?
        .map(|profile| profile.trading_status.mode)
        .unwrap_or(TradingMode::PaperTrading))
}

/// Every dataset the caller can see, fetched concurrently in id order.
/// Ids that no longer resolve are skipped.
pub async fn fetch_all_datasets<B: Backend>(backend: &B) -> Result<Vec<Dataset>, BackendError> {
    let ids = backend.get_all_dataset_ids().await?;
    let datasets = try_join_all(ids.iter().map(|id| backend.get_dataset(id))).await?;

    Ok(ids
        .iter()
        .zip(datasets)
        .filter_map(|(id, dataset)| {
            if dataset.is_none() {
                log::warn!("Dataset {} disappeared while listing.", id);
            }
            dataset
        })
        .collect())
}
