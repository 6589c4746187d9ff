//! Reconciles the several wire encodings the backend uses for its enums.
//!
//! The same logical value can arrive as `"liveTrading"`, as `"#liveTrading"` or as the
//! variant object `{"liveTrading": null}`. Anything unrecognized becomes the enum's
//! default; normalization never fails.

use serde_json::Value;

use crate::{HealthStatus, TradingMode};

/// Marker the backend may put in front of a tagged variant name.
pub const VARIANT_SIGIL: char = '#';

/// A closed set of named members with a fallback.
pub trait VariantEnum: Copy + Sized + 'static {
    const MEMBERS: &'static [Self];
    const DEFAULT: Self;

    /// The canonical wire name of this member.
    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::MEMBERS
            .iter()
            .copied()
            .find(|member| member.name() == name)
    }
}

pub fn normalize<T: VariantEnum>(value: &Value) -> T {
    let matched = match value {
        Value::String(text) => {
            T::from_name(text.strip_prefix(VARIANT_SIGIL).unwrap_or(text.as_str()))
        }
        Value::Object(variant) if variant.len() == 1 => {
            variant.keys().next().and_then(|key| T::from_name(key))
        }
        _ => None,
    };

    matched.unwrap_or_else(|| {
        if !value.is_null() {
            log::warn!(
                "Unrecognized value {}, falling back to {}.",
                value,
                T::DEFAULT.name()
            );
        }
        T::DEFAULT
    })
}

pub fn normalize_health_status(value: &Value) -> HealthStatus {
    normalize(value)
}

pub fn normalize_trading_mode(value: &Value) -> TradingMode {
    normalize(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs() -> Vec<Value> {
        vec![
            json!("healthy"),
            json!("degraded"),
            json!("#maintenance"),
            json!("##degraded"),
            json!("appIssue"),
            json!("AppIssue"),
            json!("liveTrading"),
            json!("#shadowTrading"),
            json!({"unreachable": null}),
            json!({"paperTrading": {}}),
            json!({"liveTrading": null, "paperTrading": null}),
            json!({}),
            json!({"#liveTrading": null}),
            json!(42),
            json!(null),
            json!(true),
            json!(["degraded"]),
            json!(""),
        ]
    }

    #[test]
    fn trading_mode_encodings() {
        assert_eq!(
            normalize_trading_mode(&json!({"liveTrading": null})),
            TradingMode::LiveTrading
        );
        assert_eq!(
            normalize_trading_mode(&json!("liveTrading")),
            TradingMode::LiveTrading
        );
        assert_eq!(
            normalize_trading_mode(&json!("#liveTrading")),
            TradingMode::LiveTrading
        );
    }

    #[test]
    fn health_status_defaults() {
        assert_eq!(
            normalize_health_status(&json!({"unknownKey": null})),
            HealthStatus::Healthy
        );
        assert_eq!(normalize_health_status(&json!(42)), HealthStatus::Healthy);
        assert_eq!(normalize_health_status(&json!(null)), HealthStatus::Healthy);
        assert_eq!(
            normalize_health_status(&json!({"degraded": null, "healthy": null})),
            HealthStatus::Healthy
        );
    }

    #[test]
    fn only_one_sigil_is_stripped() {
        assert_eq!(
            normalize_health_status(&json!("##degraded")),
            HealthStatus::Healthy
        );
        assert_eq!(
            normalize_health_status(&json!("#degraded")),
            HealthStatus::Degraded
        );
    }

    #[test]
    fn names_are_case_sensitive() {
        assert_eq!(
            normalize_health_status(&json!("AppIssue")),
            HealthStatus::Healthy
        );
        assert_eq!(
            normalize_health_status(&json!("appIssue")),
            HealthStatus::AppIssue
        );
    }

    #[test]
    fn variant_payload_is_ignored() {
        assert_eq!(
            normalize_health_status(&json!({"unreachable": {"since": 5}})),
            HealthStatus::Unreachable
        );
    }

    #[test]
    fn idempotent() {
        for input in inputs() {
            let status = normalize_health_status(&input);
            let again = normalize_health_status(&serde_json::to_value(status).unwrap());
            assert_eq!(status, again, "input {}", input);

            let mode = normalize_trading_mode(&input);
            let again = normalize_trading_mode(&serde_json::to_value(mode).unwrap());
            assert_eq!(mode, again, "input {}", input);
        }
    }
}
