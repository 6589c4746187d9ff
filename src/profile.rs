use serde::{Deserialize, Serialize};

use crate::TradingMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingStatus {
    pub mode: TradingMode,
    pub trading_enabled: bool,
    pub binance_connected: bool,
}

impl Default for TradingStatus {
    fn default() -> Self {
        TradingStatus {
            mode: TradingMode::PaperTrading,
            trading_enabled: false,
            binance_connected: false,
        }
    }
}

/// The caller's profile with its trading mode normalized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub created_at: u64,
    pub trading_status: TradingStatus,
}

impl UserProfile {
    /// A first-time profile: paper trading, nothing connected.
    pub fn new<N: AsRef<str>, E: AsRef<str>>(name: N, email: E, created_at: u64) -> Self {
        UserProfile {
            name: name.as_ref().trim().to_owned(),
            email: email.as_ref().trim().to_owned(),
            created_at,
            trading_status: TradingStatus::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_profile_starts_on_paper() {
        let profile = UserProfile::new("  Ada ", "ada@example.com ", 7);
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.trading_status.mode, TradingMode::PaperTrading);
        assert!(!profile.trading_status.trading_enabled);
    }

    #[test]
    fn deserializes_variant_mode() {
        let profile: UserProfile = serde_json::from_value(json!({
            "name": "Ada",
            "email": "",
            "createdAt": 1,
            "tradingStatus": {
                "mode": {"liveTrading": null},
                "tradingEnabled": true,
                "binanceConnected": false
            }
        }))
        .unwrap();
        assert_eq!(profile.trading_status.mode, TradingMode::LiveTrading);
    }
}
