use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    apis::{Backend, BackendError},
    nanos, Principal,
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Timestamp {0} is out of range")]
    TimeOutOfRange(DateTime<Utc>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplate {
    pub id: String,
    pub name: String,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub example: Option<String>,
    /// Assigned by the backend when the template is saved.
    #[serde(default)]
    pub owner: Option<Principal>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl PromptTemplate {
    /// Build a new user template from form input.
    pub fn draft(
        name: &str,
        content: &str,
        category: &str,
        example: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, PromptError> {
        let name = name.trim();
        let content = content.trim();
        if name.is_empty() {
            return Err(PromptError::MissingField("name"));
        }
        if content.is_empty() {
            return Err(PromptError::MissingField("content"));
        }

        let category = match category.trim() {
            "" => "General",
            category => category,
        };
        let example = Some(example.trim())
            .filter(|example| !example.is_empty())
            .map(str::to_owned);
        let stamp = nanos(now).ok_or(PromptError::TimeOutOfRange(now))?;

        Ok(PromptTemplate {
            id: format!("template-{}", now.timestamp_millis()),
            name: name.to_owned(),
            category: category.to_owned(),
            content: content.to_owned(),
            example,
            owner: None,
            created_at: stamp,
            updated_at: stamp,
        })
    }
}

struct Seed {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    content: &'static str,
    example: &'static str,
}

const SEEDS: [Seed; 3] = [
    Seed {
        id: "episode_analyzer",
        name: "Episode Analyzer",
        category: "analysis",
        content: r#"SYSTEM: You are a concise episode analyzer. Input: {episode_id, episode_context: {candles, orderbook_snapshots, actions_taken, pnl_curve, news}}. Task: produce a short diagnostic (max 6 bullets) explaining why the trade lost money, whether it was model decision, slippage, or market regime (liquidity), and propose 3 candidate fixes (ranked). Output JSON: {"diagnosis":["..."], "root_cause":"model|market|slippage|data", "proposed_fixes":[...]}"#,
        example: r#"Input:
{
  "episode_id": "ep_12345",
  "episode_context": {
    "candles": [...],
    "actions_taken": [{"action": "long", "size": 0.5, "leverage": 10}],
    "pnl_curve": [-100, -250, -500],
    "news": []
  }
}

Output:
{
  "diagnosis": [
    "Entered long position during high volatility spike",
    "Leverage too high (10x) for market conditions",
    "No stop-loss triggered before major drawdown"
  ],
  "root_cause": "model",
  "proposed_fixes": [
    "Reduce max leverage to 5x during high volatility periods",
    "Implement tighter stop-loss at 1.5% from entry",
    "Add volatility filter to prevent entries when ATR > threshold"
  ]
}"#,
    },
    Seed {
        id: "reward_tuning_advisor",
        name: "Reward Tuning Advisor",
        category: "tuning",
        content: "SYSTEM: You are a reward tuning advisor. Input: current reward configuration and training logs (returns, drawdown, trade_count). Task: suggest adjustments to lambda_d, lambda_v, and L to reduce severe drawdowns without killing returns. Output JSON with suggested new params and rationale.",
        example: r#"Input:
{
  "current_config": {"lambda_d": 10, "D_thresh": 0.05, "lambda_v": 0.5, "lambda_c": 1.0, "L": 500000},
  "training_logs": {"avg_return": 0.02, "max_drawdown": 0.15, "trade_count": 450, "liquidations": 3}
}

Output:
{
  "suggested_params": {"lambda_d": 15, "D_thresh": 0.04, "lambda_v": 0.8, "lambda_c": 1.0, "L": 750000},
  "rationale": "Increase drawdown penalty and lower threshold to discourage risky behavior. Increase volatility penalty to reduce aggressive leverage. Increase liquidation penalty to make liquidations more costly."
}"#,
    },
    Seed {
        id: "orchestration_assistant",
        name: "Orchestration Assistant",
        category: "orchestration",
        content: r#"SYSTEM: You are an orchestration assistant. Input: metrics since last deployment (PnL, drawdown, model_drift_score, token_usage). Task: decide "retrain"|"hold"|"revert" and provide brief justification and required data slices. Output: {"decision":"retrain","reason":"...","dataset_filter":"2025-10-01:2026-01-31, stress days:..."}"#,
        example: r#"Input:
{
  "metrics": {"pnl": -0.05, "max_drawdown": 0.12, "model_drift_score": 0.35, "token_usage": 0.65, "days_since_deploy": 7}
}

Output:
{
  "decision": "retrain",
  "reason": "Model drift score (0.35) exceeds threshold (0.25) and recent PnL is negative.",
  "dataset_filter": "2026-01-15:2026-02-17, include high volatility days, exclude outlier liquidation events"
}"#,
    },
];

/// Built-in templates offered to callers whose library is still empty.
/// Timestamps are zero; [`seed_templates`] stamps them on save.
pub static SEED_TEMPLATES: Lazy<Vec<PromptTemplate>> = Lazy::new(|| {
    SEEDS
        .iter()
        .map(|seed| PromptTemplate {
            id: seed.id.to_owned(),
            name: seed.name.to_owned(),
            category: seed.category.to_owned(),
            content: seed.content.to_owned(),
            example: Some(seed.example.to_owned()),
            owner: None,
            created_at: 0,
            updated_at: 0,
        })
        .collect()
});

/// Save the built-in templates if the backend has none yet.
/// Returns how many were saved; a failing seed is logged and skipped.
pub async fn seed_templates<B: Backend>(
    backend: &B,
    now: DateTime<Utc>,
) -> Result<usize, BackendError> {
    if !backend.get_all_prompt_templates().await?.is_empty() {
        return Ok(0);
    }

    let stamp = nanos(now).unwrap_or_else(|| {
        log::warn!("Seeding at {} which is out of range, saturating.", now);
        u64::MAX
    });

    let mut saved = 0;
    for seed in SEED_TEMPLATES.iter() {
        let template = PromptTemplate {
            created_at: stamp,
            updated_at: stamp,
            ..seed.clone()
        };
        match backend.save_prompt_template(template).await {
            Ok(()) => saved += 1,
            Err(err) => log::error!("Failed to seed template {}: {}", seed.id, err),
        }
    }

    log::debug!("Seeded {} prompt templates.", saved);
    Ok(saved)
}
