use serde::{Deserialize, Serialize};

use crate::Principal;

/// One OHLCV bar. `time` is in nanoseconds since the unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: u64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A named collection of candles as stored by the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub owner: Principal,
    pub name: String,
    pub description: Option<String>,
    pub candles: Vec<Candle>,
    pub uploaded_at: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleSummary {
    pub total_volume: f64,
    pub total_count: u64,
    pub avg_price: f64,
    pub avg_volume: f64,
}

impl CandleSummary {
    /// Aggregate a slice of candles. The average price is the mean close.
    pub fn from_candles(candles: &[Candle]) -> Self {
        if candles.is_empty() {
            return CandleSummary::default();
        }

        let count = candles.len() as f64;
        let total_volume: f64 = candles.iter().map(|candle| candle.volume).sum();
        let total_close: f64 = candles.iter().map(|candle| candle.close).sum();

        CandleSummary {
            total_volume,
            total_count: candles.len() as u64,
            avg_price: total_close / count,
            avg_volume: total_volume / count,
        }
    }
}
