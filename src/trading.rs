use thiserror::Error;

use crate::TradingMode;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradingError {
    #[error("Switching to live trading requires explicit confirmation.")]
    ConfirmationRequired,
}

/// Decide whether switching from `current` to `target` should go to the backend.
/// Returns `None` when nothing changes. Live trading is only entered once confirmed.
pub fn request_mode_change(
    current: TradingMode,
    target: TradingMode,
    confirmed: bool,
) -> Result<Option<TradingMode>, TradingError> {
    if current == target {
        return Ok(None);
    }

    if target.is_live() && !confirmed {
        return Err(TradingError::ConfirmationRequired);
    }

    Ok(Some(target))
}
