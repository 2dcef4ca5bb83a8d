//! Run configuration
//!
//! `RankConfig` holds the numeric knobs of the algorithm and is handed, by
//! reference, to every round. `JobSettings` holds everything about where data
//! comes from and goes to.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::scaled::{DEFAULT_SCALE, MAX_SCALE, MIN_SCALE};

pub const DEFAULT_DAMPING: f64 = 0.85;
pub const DEFAULT_THRESHOLD: f64 = 1e-6;
pub const DEFAULT_MIN_ITER: usize = 5;
pub const DEFAULT_MAX_ITER: usize = 10;
pub const DEFAULT_TOP_K: usize = 50;
pub const DEFAULT_PRECISION: usize = 12;
/// Coarser round files cannot carry a rank of a large graph's nodes
pub const MIN_PRECISION: usize = 9;
pub const DEFAULT_COMMENT: &str = "#";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankConfig {
    pub damping: f64,
    pub threshold: f64,
    pub min_iterations: usize,
    pub max_iterations: usize,
    /// fixed-point scale of the round accumulators
    pub scale: i64,
    /// checked between rounds, never inside one
    pub time_budget: Option<Duration>,
}

impl Default for RankConfig {
    fn default() -> Self {
        RankConfig {
            damping: DEFAULT_DAMPING,
            threshold: DEFAULT_THRESHOLD,
            min_iterations: DEFAULT_MIN_ITER,
            max_iterations: DEFAULT_MAX_ITER,
            scale: DEFAULT_SCALE,
            time_budget: None,
        }
    }
}

impl RankConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(Error::InvalidConfig(format!(
                "damping factor must be within [0, 1], got {}", self.damping)));
        }
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "convergence threshold must be non-negative, got {}", self.threshold)));
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidConfig("max iterations must be at least 1".into()));
        }
        if self.scale < MIN_SCALE {
            return Err(Error::InvalidConfig(format!(
                "accumulator scale must be at least {}, got {}", MIN_SCALE, self.scale)));
        }
        if self.scale > MAX_SCALE {
            return Err(Error::InvalidConfig(format!(
                "accumulator scale must be at most {}, got {}", MAX_SCALE, self.scale)));
        }
        Ok(())
    }

    /// `max_iterations` wins when the bounds are inverted
    pub fn effective_min_iterations(&self) -> usize {
        self.min_iterations.min(self.max_iterations)
    }
}

/// Which rounds survive in the store once their successor is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Retention {
    Final,
    Previous,
    All,
}

impl Retention {
    /// The round that may be dropped right after `written` lands
    pub fn expired(&self, written: usize) -> Option<usize> {
        match *self {
            Retention::Final => written.checked_sub(1),
            Retention::Previous => written.checked_sub(2),
            Retention::All => None,
        }
    }
}

impl FromStr for Retention {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "final" => Ok(Retention::Final),
            "previous" => Ok(Retention::Previous),
            "all" => Ok(Retention::All),
            _ => Err(Error::InvalidConfig(format!("unknown retention `{}`", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSettings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub top_k: usize,
    pub threads: usize,
    pub precision: usize,
    pub comment_marker: String,
    pub retention: Retention,
    pub in_memory: bool,
}

impl JobSettings {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(input: P, output: Q) -> Self {
        JobSettings {
            input: input.into(),
            output: output.into(),
            top_k: DEFAULT_TOP_K,
            threads: default_threads(),
            precision: DEFAULT_PRECISION,
            comment_marker: DEFAULT_COMMENT.to_string(),
            retention: Retention::Final,
            in_memory: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.input.exists() {
            return Err(Error::MissingInput(self.input.clone()));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("thread count must be at least 1".into()));
        }
        if self.precision < MIN_PRECISION {
            return Err(Error::InvalidConfig(format!(
                "rank precision must be at least {} decimals, got {}", MIN_PRECISION, self.precision)));
        }
        if self.comment_marker.is_empty() {
            return Err(Error::InvalidConfig("comment marker cannot be empty".into()));
        }
        Ok(())
    }
}

pub fn default_threads() -> usize {
    ::std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
