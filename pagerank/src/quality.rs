//! Data-quality counters.
//!
//! Anomalies in individual records never stop a run; they are counted here,
//! logged as warnings, and summarised in the run manifest.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::node::LineFault;

#[derive(Debug, Default)]
pub struct DataQuality {
    empty_values: AtomicU64,
    rank_parse_errors: AtomicU64,
    malformed_lines: AtomicU64,
    malformed_edges: AtomicU64,
    missing_structure: AtomicU64,
    duplicate_structure: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub empty_values: u64,
    pub rank_parse_errors: u64,
    pub malformed_lines: u64,
    pub malformed_edges: u64,
    pub missing_structure: u64,
    pub duplicate_structure: u64,
}

fn bump(c: &AtomicU64) {
    c.fetch_add(1, Ordering::Relaxed);
}

impl DataQuality {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line_fault(&self, fault: LineFault) {
        match fault {
            LineFault::Blank => bump(&self.empty_values),
            LineFault::Malformed => bump(&self.malformed_lines),
            LineFault::BadRank => bump(&self.rank_parse_errors),
        }
    }
    pub fn malformed_edge(&self) {
        bump(&self.malformed_edges)
    }
    pub fn missing_structure(&self) {
        bump(&self.missing_structure)
    }
    pub fn duplicate_structure(&self) {
        bump(&self.duplicate_structure)
    }

    pub fn report(&self) -> QualityReport {
        QualityReport {
            empty_values: self.empty_values.load(Ordering::Relaxed),
            rank_parse_errors: self.rank_parse_errors.load(Ordering::Relaxed),
            malformed_lines: self.malformed_lines.load(Ordering::Relaxed),
            malformed_edges: self.malformed_edges.load(Ordering::Relaxed),
            missing_structure: self.missing_structure.load(Ordering::Relaxed),
            duplicate_structure: self.duplicate_structure.load(Ordering::Relaxed),
        }
    }
}

impl QualityReport {
    /// Anomalies that make a round's numbers best-effort.
    /// Blank lines are harmless and not counted.
    pub fn anomalies(&self) -> u64 {
        self.rank_parse_errors
            + self.malformed_lines
            + self.malformed_edges
            + self.missing_structure
            + self.duplicate_structure
    }

    pub fn is_clean(&self) -> bool {
        self.anomalies() == 0
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "malformed edges: {}, malformed lines: {}, bad ranks: {}, \
                   missing structure: {}, duplicate structure: {}",
               self.malformed_edges, self.malformed_lines, self.rank_parse_errors,
               self.missing_structure, self.duplicate_structure)
    }
}
