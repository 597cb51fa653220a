//! Pressure-advance value range selection.
//!
//! Given a start/end pair, pick the largest step size from a fixed candidate
//! ladder that divides the span into 10 to 30 test lines, then materialize
//! the concrete advance values. All arithmetic is exact decimal so the
//! values printed next to each line never show float drift.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::GcodeError;

/// Step candidates, largest first, scaled by 1000 (so `100_000` is `100`
/// and `1` is `0.001`). The ladder follows the usual 1/2.5/5 decade
/// subdivision.
const STEP_CANDIDATES_MILLI: [i64; 16] = [
    100_000, 50_000, 25_000, 10_000, 5_000, 2_500, 1_000, 500, 250, 100, 50, 25, 10, 5, 2, 1,
];

/// Minimum number of test lines a usable step must produce.
const MIN_LINES: u32 = 10;
/// Maximum number of test lines a usable step must produce.
const MAX_LINES: u32 = 30;

/// A resolved range of pressure-advance values to test.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceRange {
    /// Requested range start.
    pub start: Decimal,
    /// Requested range end.
    pub end: Decimal,
    /// Selected step between consecutive test values.
    pub step: Decimal,
    /// The concrete values, `start`, `start + step`, ... covering `end`.
    pub values: Vec<Decimal>,
}

impl AdvanceRange {
    /// Resolve a start/end pair into concrete test values.
    ///
    /// Fails with [`GcodeError::InvalidRange`] when the inputs are not
    /// finite, the start is negative (pressure advance never is), or the
    /// span is below 0.01, and with [`GcodeError::NoSuitableStep`] when no
    /// candidate step yields a line count in the 10..=30 band.
    pub fn compute(start: f64, end: f64) -> Result<Self, GcodeError> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || start + 0.01 > end {
            return Err(GcodeError::InvalidRange);
        }
        // f64 -> Decimal only fails on non-finite input, checked above.
        let start_d = Decimal::from_f64(start).ok_or(GcodeError::InvalidRange)?;
        let end_d = Decimal::from_f64(end).ok_or(GcodeError::InvalidRange)?;
        let span = end_d - start_d;

        for milli in STEP_CANDIDATES_MILLI {
            let step = Decimal::new(milli, 3);
            let lines = div_ceil(span, step);
            if (MIN_LINES..=MAX_LINES).contains(&lines) {
                let values = (0..=lines)
                    .map(|j| {
                        (start_d + step * Decimal::from(j))
                            .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
                    })
                    .collect();
                return Ok(Self {
                    start: start_d,
                    end: end_d,
                    step,
                    values,
                });
            }
        }
        Err(GcodeError::NoSuitableStep { start, end })
    }

    /// Number of test lines (one line per step interval).
    pub fn line_count(&self) -> usize {
        self.values.len() - 1
    }
}

/// `ceil(span / step)` over exact decimals, as a line count.
fn div_ceil(span: Decimal, step: Decimal) -> u32 {
    let exact = span / step;
    let ceiled = exact.ceil();
    ceiled.to_u32().unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values_f64(r: &AdvanceRange) -> Vec<f64> {
        r.values.iter().map(|v| v.to_f64().unwrap()).collect()
    }

    #[test]
    fn direct_drive_default_range() {
        let r = AdvanceRange::compute(0.0, 0.2).unwrap();
        assert_eq!(r.step, Decimal::new(1, 2));
        assert_eq!(r.line_count(), 20);
        assert_eq!(values_f64(&r)[0], 0.0);
        assert_eq!(values_f64(&r)[1], 0.01);
        assert_eq!(*values_f64(&r).last().unwrap(), 0.2);
    }

    #[test]
    fn bowden_default_range() {
        let r = AdvanceRange::compute(0.0, 2.0).unwrap();
        assert_eq!(r.step, Decimal::new(1, 1));
        assert_eq!(r.line_count(), 20);
        assert_eq!(*values_f64(&r).last().unwrap(), 2.0);
    }

    #[test]
    fn picks_largest_step_that_fits() {
        // span 1.0: step 0.1 gives 10 lines; 0.05 would give 20 but is smaller.
        let r = AdvanceRange::compute(0.0, 1.0).unwrap();
        assert_eq!(r.step, Decimal::new(1, 1));
        assert_eq!(r.line_count(), 10);
    }

    #[test]
    fn non_integral_span_covers_end() {
        // span 0.25 with step 0.025 -> 10 lines, last value exactly 0.25.
        let r = AdvanceRange::compute(0.0, 0.25).unwrap();
        assert_eq!(r.step, Decimal::new(25, 3));
        assert_eq!(*r.values.last().unwrap(), Decimal::new(25, 2));
    }

    #[test]
    fn overshoot_when_span_is_not_a_multiple() {
        // span 0.23 with step 0.025 -> ceil = 10 lines, last value 0.25 > end.
        let r = AdvanceRange::compute(0.0, 0.23).unwrap();
        assert_eq!(r.line_count(), 10);
        assert!(*r.values.last().unwrap() >= r.end);
    }

    #[test]
    fn values_are_exact_decimals() {
        let r = AdvanceRange::compute(0.0, 0.2).unwrap();
        // 0.07 must render as "0.07", never "0.07000000000000001".
        assert_eq!(r.values[7].normalize().to_string(), "0.07");
    }

    #[test]
    fn values_round_half_up_at_midpoints() {
        // 0.0005 + 0.01 = 0.0105, a 3 dp midpoint: half-up gives 0.011,
        // banker's would give 0.010.
        let r = AdvanceRange::compute(0.0005, 0.2005).unwrap();
        assert_eq!(r.step, Decimal::new(1, 2));
        assert_eq!(r.values[0], Decimal::new(1, 3));
        assert_eq!(r.values[1], Decimal::new(11, 3));
    }

    #[test]
    fn rejects_negative_start() {
        // advance values are never negative; a `-` also has no glyph
        assert!(matches!(
            AdvanceRange::compute(-0.05, 0.15),
            Err(GcodeError::InvalidRange)
        ));
    }

    #[test]
    fn rejects_inverted_and_tiny_ranges() {
        assert!(matches!(
            AdvanceRange::compute(1.0, 0.5),
            Err(GcodeError::InvalidRange)
        ));
        assert!(matches!(
            AdvanceRange::compute(0.0, 0.005),
            Err(GcodeError::InvalidRange)
        ));
        assert!(matches!(
            AdvanceRange::compute(f64::NAN, 1.0),
            Err(GcodeError::InvalidRange)
        ));
    }

    #[test]
    fn huge_span_has_no_suitable_step() {
        // span 10000: even the largest step gives 100 lines.
        assert!(matches!(
            AdvanceRange::compute(0.0, 10_000.0),
            Err(GcodeError::NoSuitableStep { .. })
        ));
    }
}
