use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::normalize::{normalize, VariantEnum};

/// Backend health as shown in the status banner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Maintenance,
    Unreachable,
    AppIssue,
}

impl VariantEnum for HealthStatus {
    const MEMBERS: &'static [Self] = &[
        HealthStatus::Healthy,
        HealthStatus::Degraded,
        HealthStatus::Maintenance,
        HealthStatus::Unreachable,
        HealthStatus::AppIssue,
    ];
    const DEFAULT: Self = HealthStatus::Healthy;

    fn name(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Maintenance => "maintenance",
            HealthStatus::Unreachable => "unreachable",
            HealthStatus::AppIssue => "appIssue",
        }
    }
}

impl HealthStatus {
    pub fn is_healthy(self) -> bool {
        self == HealthStatus::Healthy
    }

    pub fn title(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Operational",
            HealthStatus::Degraded => "Service Degraded",
            HealthStatus::Maintenance => "Maintenance Mode",
            HealthStatus::Unreachable => "Service Unreachable",
            HealthStatus::AppIssue => "Application Issue",
        }
    }

    /// Banner text used when the backend sends no message of its own.
    pub fn default_message(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "All systems are operating normally.",
            HealthStatus::Degraded => "Some features may be slower than usual.",
            HealthStatus::Maintenance => "The system is currently under maintenance.",
            HealthStatus::Unreachable => "Unable to connect to the backend service.",
            HealthStatus::AppIssue => "An application error has occurred.",
        }
    }
}

/// How orders placed by the platform are executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TradingMode {
    PaperTrading,
    ShadowTrading,
    LiveTrading,
}

impl VariantEnum for TradingMode {
    const MEMBERS: &'static [Self] = &[
        TradingMode::PaperTrading,
        TradingMode::ShadowTrading,
        TradingMode::LiveTrading,
    ];
    const DEFAULT: Self = TradingMode::PaperTrading;

    fn name(self) -> &'static str {
        match self {
            TradingMode::PaperTrading => "paperTrading",
            TradingMode::ShadowTrading => "shadowTrading",
            TradingMode::LiveTrading => "liveTrading",
        }
    }
}

impl TradingMode {
    pub fn label(self) -> &'static str {
        match self {
            TradingMode::PaperTrading => "Paper Trading",
            TradingMode::ShadowTrading => "Shadow Trading",
            TradingMode::LiveTrading => "Live Trading",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            TradingMode::PaperTrading => "Simulated trading with virtual funds",
            TradingMode::ShadowTrading => "Live market data with simulated execution",
            TradingMode::LiveTrading => "Real orders with real funds - Exercise caution",
        }
    }

    pub fn is_live(self) -> bool {
        self == TradingMode::LiveTrading
    }
}

// Both enums accept any of the backend's wire shapes and never fail to deserialize.
impl<'de> Deserialize<'de> for HealthStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(|value| normalize(&value))
    }
}

impl<'de> Deserialize<'de> for TradingMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(|value| normalize(&value))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Normalized result of the backend's health query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppHealth {
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl AppHealth {
    /// The backend's message, or the status' stock text.
    pub fn display_message(&self) -> &str {
        self.message
            .as_deref()
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| self.status.default_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_to_canonical_names() {
        for status in HealthStatus::MEMBERS {
            assert_eq!(serde_json::to_value(status).unwrap(), json!(status.name()));
        }
        for mode in TradingMode::MEMBERS {
            assert_eq!(serde_json::to_value(mode).unwrap(), json!(mode.name()));
        }
    }

    #[test]
    fn deserializes_any_wire_shape() {
        let mode: TradingMode = serde_json::from_value(json!({"shadowTrading": null})).unwrap();
        assert_eq!(mode, TradingMode::ShadowTrading);
        let status: HealthStatus = serde_json::from_value(json!("#maintenance")).unwrap();
        assert_eq!(status, HealthStatus::Maintenance);
        let status: HealthStatus = serde_json::from_value(json!([1, 2])).unwrap();
        assert_eq!(status, HealthStatus::Healthy);
    }

    #[test]
    fn health_message_fallback() {
        let health = AppHealth {
            status: HealthStatus::Degraded,
            message: None,
        };
        assert_eq!(
            health.display_message(),
            "Some features may be slower than usual."
        );

        let health = AppHealth {
            status: HealthStatus::Unreachable,
            message: Some("Subnet upgrade".to_owned()),
        };
        assert_eq!(health.display_message(), "Subnet upgrade");
        assert!(!health.status.is_healthy());
    }

    #[test]
    fn labels() {
        assert_eq!(TradingMode::ShadowTrading.label(), "Shadow Trading");
        assert!(TradingMode::LiveTrading.is_live());
        assert_eq!(HealthStatus::AppIssue.to_string(), "appIssue");
        assert_eq!(HealthStatus::Maintenance.title(), "Maintenance Mode");
    }
}
