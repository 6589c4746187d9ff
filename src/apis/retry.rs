use std::future::Future;

use async_trait::async_trait;

use super::{Backend, BackendError, RawAppHealth, RawUserProfile};
use crate::{Candle, CandleSummary, Dataset, PromptTemplate, TradingMode, UserProfile};

/// The Retry API asks again when a health or profile query is lost on the way.
/// Only network errors and timeouts are retried. Everything else, writes included,
/// goes through exactly once.
pub struct Retry<B>
where
    B: Backend,
{
    backend: B,
    retries: u32,
}

impl<B> Retry<B>
where
    B: Backend,
{
    pub fn new(backend: B, retries: u32) -> Self {
        Retry { backend, retries }
    }

    pub fn inner(&self) -> &B {
        &self.backend
    }
}

async fn retried<T, F, Fut>(retries: u32, query: &str, call: F) -> Result<T, BackendError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 0;
    loop {
        match call().await {
            Err(err) if err.is_transient() && attempt < retries => {
                attempt += 1;
                log::warn!("{} failed: {}. Retrying ({}/{}).", query, err, attempt, retries);
            }
            result => return result,
        }
    }
}

#[async_trait]
impl<B: Backend> Backend for Retry<B> {
    const NAME: &'static str = B::NAME;

    async fn upload_dataset(
        &self,
        id: String,
        candles: Vec<Candle>,
        name: String,
        description: Option<String>,
    ) -> Result<(), BackendError> {
        self.backend
            .upload_dataset(id, candles, name, description)
            .await
    }

    async fn get_all_dataset_ids(&self) -> Result<Vec<String>, BackendError> {
        self.backend.get_all_dataset_ids().await
    }

    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, BackendError> {
        self.backend.get_dataset(id).await
    }

    async fn get_candle_summary(&self, id: &str) -> Result<CandleSummary, BackendError> {
        self.backend.get_candle_summary(id).await
    }

    async fn get_system_health(&self) -> Result<RawAppHealth, BackendError> {
        retried(self.retries, "Health check", || {
            self.backend.get_system_health()
        })
        .await
    }

    async fn get_caller_user_profile(&self) -> Result<Option<RawUserProfile>, BackendError> {
        retried(self.retries, "Profile query", || {
            self.backend.get_caller_user_profile()
        })
        .await
    }

    async fn save_caller_user_profile(&self, profile: UserProfile) -> Result<(), BackendError> {
        self.backend.save_caller_user_profile(profile).await
    }

    async fn update_trading_mode(&self, mode: TradingMode) -> Result<(), BackendError> {
        self.backend.update_trading_mode(mode).await
    }

    async fn get_all_prompt_templates(&self) -> Result<Vec<PromptTemplate>, BackendError> {
        self.backend.get_all_prompt_templates().await
    }

    async fn get_prompt_template(&self, id: &str) -> Result<Option<PromptTemplate>, BackendError> {
        self.backend.get_prompt_template(id).await
    }

    async fn save_prompt_template(&self, template: PromptTemplate) -> Result<(), BackendError> {
        self.backend.save_prompt_template(template).await
    }

    async fn filter_prompt_templates(
        &self,
        category: &str,
    ) -> Result<Vec<PromptTemplate>, BackendError> {
        self.backend.filter_prompt_templates(category).await
    }
}
