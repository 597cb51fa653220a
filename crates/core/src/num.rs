//! Decimal rounding and formatting helpers shared by the emitters.
//!
//! Coordinates and extrusion amounts are rounded with exact decimal
//! arithmetic before emission. Rounding is always half-up
//! (`MidpointAwayFromZero`), never banker's: the output must be
//! byte-for-byte reproducible and free of binary-float drift.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Round `v` to `dp` decimal places, half-up.
///
/// Non-finite inputs (which never survive settings validation) collapse to
/// zero rather than poisoning the output.
pub(crate) fn round_dp(v: f64, dp: u32) -> Decimal {
    Decimal::from_f64(v)
        .unwrap_or_default()
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Format `v` rounded to `dp` decimal places with trailing zeros trimmed.
pub(crate) fn fmt(v: f64, dp: u32) -> String {
    fmt_dec(round_dp(v, dp))
}

/// Format a decimal with trailing zeros trimmed (`1.2000` → `1.2`).
pub(crate) fn fmt_dec(d: Decimal) -> String {
    d.normalize().to_string()
}
