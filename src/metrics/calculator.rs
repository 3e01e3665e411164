use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

/// Derived fields of a single trade.
///
/// `risk_amount` and `r_multiple` are `None` when the trade has no stop loss,
/// so R statistics downstream can leave the trade out instead of counting a 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeMetrics {
    pub pnl: f64,
    pub return_pct: f64,
    pub risk_amount: Option<f64>,
    pub r_multiple: Option<f64>,
}

/// Round to 2 decimals, half away from zero (symmetric for losses).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn require_price(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(JournalError::validation(field, "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(JournalError::validation(
            field,
            format!("must be greater than 0 (got {})", value),
        ));
    }
    Ok(())
}

/// Compute P&L, return %, risk and R-multiple for one trade.
///
/// Inputs are validated eagerly so NaN or infinite values never reach storage
/// or the aggregates. A stop loss equal to the entry price is allowed and
/// yields zero risk and a 0R trade.
pub fn compute_trade_metrics(
    entry_price: f64,
    exit_price: f64,
    stop_loss: Option<f64>,
    quantity: u32,
) -> Result<TradeMetrics> {
    require_price("entry_price", entry_price)?;
    require_price("exit_price", exit_price)?;
    if quantity == 0 {
        return Err(JournalError::validation("quantity", "must be at least 1"));
    }
    if let Some(stop) = stop_loss {
        require_price("stop_loss", stop)?;
    }

    let qty = quantity as f64;
    let pnl = (exit_price - entry_price) * qty;
    let return_pct = (exit_price - entry_price) / entry_price * 100.0;

    let (risk_amount, r_multiple) = match stop_loss {
        Some(stop) => {
            let risk = (entry_price - stop).abs() * qty;
            let r = if risk > 0.0 { pnl / risk } else { 0.0 };
            (Some(round2(risk)), Some(round2(r)))
        }
        None => (None, None),
    };

    Ok(TradeMetrics {
        pnl: round2(pnl),
        return_pct: round2(return_pct),
        risk_amount,
        r_multiple,
    })
}
