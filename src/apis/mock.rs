use super::{Backend, BackendError, RawAppHealth, RawTradingStatus, RawUserProfile};
use crate::{
    now_nanos, normalize::VariantEnum, Candle, CandleSummary, Dataset, Principal,
    PromptTemplate, TradingMode, UserProfile,
};

use async_trait::async_trait;
use futures_util::lock::Mutex;
use fxhash::FxHashMap;
use serde_json::{json, Map, Value};

#[derive(Default)]
struct State {
    datasets: FxHashMap<String, Dataset>,
    dataset_order: Vec<String>,
    templates: FxHashMap<String, PromptTemplate>,
    template_order: Vec<String>,
    profile: Option<RawUserProfile>,
    health: Option<RawAppHealth>,
    offline: bool,
    failures: usize,
}

/// The Mock API keeps everything in memory for a single caller.
/// Enum values are handed out in the variant encoding, like the deployed actor does.
pub struct Mock {
    principal: Principal,
    state: Mutex<State>,
}

fn variant<T: VariantEnum>(member: T) -> Value {
    let mut object = Map::new();
    object.insert(member.name().to_owned(), Value::Null);
    Value::Object(object)
}

impl Mock {
    pub fn new(principal: Principal) -> Self {
        Mock {
            principal,
            state: Mutex::new(State::default()),
        }
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    /// Replace the health payload with an arbitrary wire encoding.
    pub async fn set_health(&self, status: Value, message: Option<&str>) {
        self.state.lock().await.health = Some(RawAppHealth {
            status,
            message: message.map(str::to_owned),
        });
    }

    /// Overwrite the stored trading mode with an arbitrary wire encoding.
    pub async fn set_raw_trading_mode(&self, mode: Value) -> Result<(), BackendError> {
        let mut state = self.state.lock().await;
        let profile = state
            .profile
            .as_mut()
            .ok_or_else(|| BackendError::NotFound("profile".to_owned()))?;
        profile.trading_status.mode = mode;
        Ok(())
    }

    /// While offline every call fails with a network error.
    pub async fn set_offline(&self, offline: bool) {
        self.state.lock().await.offline = offline;
    }

    /// The next `calls` calls fail with a network error, whatever they are.
    pub async fn fail_next(&self, calls: usize) {
        self.state.lock().await.failures = calls;
    }

    async fn online(&self) -> Result<futures_util::lock::MutexGuard<'_, State>, BackendError> {
        let mut state = self.state.lock().await;
        if state.offline {
            log::debug!("Mock is offline.");
            return Err(BackendError::Network);
        }
        if state.failures > 0 {
            state.failures -= 1;
            log::debug!("Mock drops a call, {} more to go.", state.failures);
            return Err(BackendError::Network);
        }
        Ok(state)
    }
}

#[async_trait]
impl Backend for Mock {
    const NAME: &'static str = "Mock";

    async fn upload_dataset(
        &self,
        id: String,
        candles: Vec<Candle>,
        name: String,
        description: Option<String>,
    ) -> Result<(), BackendError> {
        let mut state = self.online().await?;
        log::debug!("Storing dataset {} with {} candles.", id, candles.len());

        if !state.datasets.contains_key(&id) {
            state.dataset_order.push(id.clone());
        }
        let dataset = Dataset {
            id: id.clone(),
            owner: self.principal,
            name,
            description,
            candles,
            uploaded_at: now_nanos(),
        };
        state.datasets.insert(id, dataset);

        Ok(())
    }

    async fn get_all_dataset_ids(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.online().await?.dataset_order.clone())
    }

    async fn get_dataset(&self, id: &str) -> Result<Option<Dataset>, BackendError> {
        Ok(self.online().await?.datasets.get(id).cloned())
    }

    async fn get_candle_summary(&self, id: &str) -> Result<CandleSummary, BackendError> {
        let state = self.online().await?;
        let dataset = state
            .datasets
            .get(id)
            .ok_or_else(|| BackendError::NotFound(format!("dataset {}", id)))?;
        Ok(CandleSummary::from_candles(&dataset.candles))
    }

    async fn get_system_health(&self) -> Result<RawAppHealth, BackendError> {
        let state = self.online().await?;
        Ok(state.health.clone().unwrap_or_else(|| RawAppHealth {
            status: json!({ "healthy": null }),
            message: None,
        }))
    }

    async fn get_caller_user_profile(&self) -> Result<Option<RawUserProfile>, BackendError> {
        Ok(self.online().await?.profile.clone())
    }

    async fn save_caller_user_profile(&self, profile: UserProfile) -> Result<(), BackendError> {
        let mut state = self.online().await?;
        state.profile = Some(RawUserProfile {
            name: profile.name,
            email: profile.email,
            created_at: profile.created_at,
            trading_status: RawTradingStatus {
                mode: variant(profile.trading_status.mode),
                trading_enabled: profile.trading_status.trading_enabled,
                binance_connected: profile.trading_status.binance_connected,
            },
        });
        Ok(())
    }

    async fn update_trading_mode(&self, mode: TradingMode) -> Result<(), BackendError> {
        let mut state = self.online().await?;
        let profile = state
            .profile
            .as_mut()
            .ok_or_else(|| BackendError::NotFound("profile".to_owned()))?;
        profile.trading_status.mode = variant(mode);
        Ok(())
    }

    async fn get_all_prompt_templates(&self) -> Result<Vec<PromptTemplate>, BackendError> {
        let state = self.online().await?;
        Ok(state
            .template_order
            .iter()
            .filter_map(|id| state.templates.get(id).cloned())
            .collect())
    }

    async fn get_prompt_template(&self, id: &str) -> Result<Option<PromptTemplate>, BackendError> {
        Ok(self.online().await?.templates.get(id).cloned())
    }

    async fn save_prompt_template(&self, template: PromptTemplate) -> Result<(), BackendError> {
        let mut state = self.online().await?;
        if !state.templates.contains_key(&template.id) {
            state.template_order.push(template.id.clone());
        }
        // The backend, not the caller, decides who owns a template.
        let template = PromptTemplate {
            owner: Some(self.principal),
            ..template
        };
        state.templates.insert(template.id.clone(), template);
        Ok(())
    }

    async fn filter_prompt_templates(
        &self,
        category: &str,
    ) -> Result<Vec<PromptTemplate>, BackendError> {
        Ok(self
            .get_all_prompt_templates()
            .await?
            .into_iter()
            .filter(|template| template.category == category)
            .collect())
    }
}
