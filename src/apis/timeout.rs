use std::future::Future;

use async_trait::async_trait;
use chrono::Duration;

use super::{Backend, BackendError, RawAppHealth, RawUserProfile};
use crate::{
    Candle, CandleSummary, Dataset, PromptTemplate, Settings, TradingMode, UserProfile,
};

/// The Timeout API is a middleware that bounds every backend call.
/// Health checks get their own, usually shorter, limit.
pub struct Timeout<B>
where
    B: Backend,
{
    backend: B,
    query_timeout: std::time::Duration,
    health_timeout: std::time::Duration,
}

impl<B> Timeout<B>
where
    B: Backend,
{
    pub fn new(backend: B, settings: &Settings) -> Self {
        let defaults = Settings::default();
        Timeout {
            backend,
            query_timeout: limit(settings.query_timeout, defaults.query_timeout),
            health_timeout: limit(settings.health_timeout, defaults.health_timeout),
        }
    }

    pub fn inner(&self) -> &B {
        &self.backend
    }
}

// Zero or negative limits fall back to the default.
fn limit(configured: Duration, default: Duration) -> std::time::Duration {
    match configured.to_std() {
        Ok(limit) if !limit.is_zero() => limit,
        _ => {
            log::warn!(
                "Ignoring timeout of {} ms, using {} ms.",
                configured.num_milliseconds(),
                default.num_milliseconds()
            );
            default.to_std().unwrap_or_default()
        }
    }
}

async fn bounded<T, F>(limit: std::time::Duration, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>> + Send,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("Backend call exceeded {:?}.", limit);
            Err(BackendError::Timeout)
        }
    }
}

#[async_trait]
impl<B: Backend> Backend for Timeout<B> {
    const NAME: &'static str = B::NAME;

    async fn upload_dataset(
        &self,
        id: String,
        candles: Vec<Candle>,
        name: String,
        description: Option<String>,
    ) -> Result<(), BackendError> {
        bounded(
            self.query_timeout,
            self.backend.upload_dataset(id, candles, name, description),
        )
        .await
    }

    async fn get_all_dataset_ids(&self) -> Result<Vec<String>, BackendError> {
        bounded(self.query_timeout, self.backend.get_all_dataset_ids()).await
    }

    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, BackendError> {
        bounded(self.query_timeout, self.backend.get_dataset(id)).await
    }

    async fn get_candle_summary(&self, id: &str) -> Result<CandleSummary, BackendError> {
        bounded(self.query_timeout, self.backend.get_candle_summary(id)).await
    }

    async fn get_system_health(&self) -> Result<RawAppHealth, BackendError> {
        bounded(self.health_timeout, self.backend.get_system_health()).await
    }

    async fn get_caller_user_profile(&self) -> Result<Option<RawUserProfile>, BackendError> {
        bounded(self.query_timeout, self.backend.get_caller_user_profile()).await
    }

    async fn save_caller_user_profile(&self, profile: UserProfile) -> Result<(), BackendError> {
        bounded(
            self.query_timeout,
            self.backend.save_caller_user_profile(profile),
        )
        .await
    }

    async fn update_trading_mode(&self, mode: TradingMode) -> Result<(), BackendError> {
        bounded(self.query_timeout, self.backend.update_trading_mode(mode)).await
    }

    async fn get_all_prompt_templates(&self) -> Result<Vec<PromptTemplate>, BackendError> {
        bounded(self.query_timeout, self.backend.get_all_prompt_templates()).await
    }

    async fn get_prompt_template(&self, id: &str) -> Result<Option<PromptTemplate>, BackendError> {
        bounded(self.query_timeout, self.backend.get_prompt_template(id)).await
    }

    async fn save_prompt_template(&self, template: PromptTemplate) -> Result<(), BackendError> {
        bounded(self.query_timeout, self.backend.save_prompt_template(template)).await
    }

    async fn filter_prompt_templates(
        &self,
        category: &str,
    ) -> Result<Vec<PromptTemplate>, BackendError> {
        bounded(
            self.query_timeout,
            self.backend.filter_prompt_templates(category),
        )
        .await
    }
}
