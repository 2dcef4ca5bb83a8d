//! Fixed-point running sums.
//!
//! Round totals (rank deltas, dangling mass) are kept as an `i64` count of
//! `1/scale` units so that many workers can add into one counter with a plain
//! atomic add. The scale must dominate the smallest delta of interest: at
//! 1e12 a delta of 1e-12 still counts as one unit.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{Error, Result};

pub const DEFAULT_SCALE: i64 = 1_000_000_000_000;
pub const MIN_SCALE: i64 = 1_000_000_000;
/// Leaves headroom for sums in the thousands; f64 resolves nothing finer anyway
pub const MAX_SCALE: i64 = 1_000_000_000_000_000;

#[derive(Debug)]
pub struct ScaledAccumulator {
    scale: i64,
    sum: AtomicI64,
}

impl ScaledAccumulator {
    pub fn new(scale: i64) -> Result<Self> {
        if scale < MIN_SCALE {
            return Err(Error::InvalidConfig(format!(
                "accumulator scale {} is below the minimum of {}", scale, MIN_SCALE)));
        }
        if scale > MAX_SCALE {
            return Err(Error::InvalidConfig(format!(
                "accumulator scale {} is above the maximum of {}", scale, MAX_SCALE)));
        }
        Ok(ScaledAccumulator { scale, sum: AtomicI64::new(0) })
    }

    pub fn scale(&self) -> i64 {
        self.scale
    }

    /// Add `value`, rounded to the nearest unit
    pub fn add(&self, value: f64) {
        self.add_units((value * self.scale as f64).round() as i64);
    }

    /// Add `value`, rounded up; a non-zero delta never vanishes
    pub fn add_ceil(&self, value: f64) {
        let units = (value * self.scale as f64).ceil() as i64;
        self.add_units(units.max(0));
    }

    /// Saturates instead of wrapping
    pub fn add_units(&self, units: i64) {
        let _ = self.sum.fetch_update(Ordering::Relaxed, Ordering::Relaxed,
                                      |sum| Some(sum.saturating_add(units)));
    }

    pub fn units(&self) -> i64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn value(&self) -> f64 {
        self.units() as f64 / self.scale as f64
    }
}
