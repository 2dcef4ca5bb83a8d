//! Run artifacts that sit next to the ranks: a human-readable timing report,
//! the same timings as CSV, and a JSON manifest describing the run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;

use crate::config::RankConfig;
use crate::error::{Error, Result};
use crate::quality::QualityReport;
use crate::rank_state::RoundStats;

pub const REPORT_FILE: &str = "performance_report.txt";
pub const TIMINGS_FILE: &str = "timings.csv";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const FINAL_SCORES_FILE: &str = "final_scores.txt";

pub fn top_k_file(k: usize) -> String {
    format!("top_{}.txt", k)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timing {
    phase: String,
    duration_ms: u64,
    #[serde(skip)]
    description: String,
}

/// Phase timings in the order they were recorded
#[derive(Debug)]
pub struct PerfMonitor {
    timings: Vec<Timing>,
    started: Instant,
}

impl Default for PerfMonitor {
    fn default() -> Self {
        PerfMonitor {
            timings: Vec::new(),
            started: Instant::now(),
        }
    }
}

impl PerfMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<S: Into<String>, D: Into<String>>(&mut self, phase: S, ms: u64, description: D) {
        self.timings.push(Timing {
            phase: phase.into(),
            duration_ms: ms,
            description: description.into(),
        });
    }

    /// Run `f` and record how long it took
    pub fn time<T, F: FnOnce() -> T>(&mut self, phase: &str, description: &str, f: F) -> T {
        let start = Instant::now();
        let out = f();
        self.record(phase, start.elapsed().as_millis() as u64, description);
        out
    }

    pub fn record_rounds(&mut self, history: &[RoundStats]) {
        for r in history {
            let prefix = format!("Iteration_{}_", r.round);
            self.record(format!("{}Map Phase", prefix), r.map_ms,
                        format!("Map phase time for iteration {}", r.round));
            self.record(format!("{}Reduce Phase", prefix), r.reduce_ms,
                        format!("Reduce phase time for iteration {}", r.round));
            self.record(format!("{}Total", prefix), r.total_ms,
                        format!("Total time for iteration {}", r.round));
        }
    }

    pub fn len(&self) -> usize {
        self.timings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timings.is_empty()
    }

    pub fn wall_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn write_text(&self, path: &Path) -> Result<()> {
        let f = File::create(path).map_err(Error::io(path))?;
        let mut w = BufWriter::new(f);
        self.write_report(&mut w).map_err(Error::io(path))
    }

    fn write_report<W: Write>(&self, w: &mut W) -> ::std::io::Result<()> {
        let rule = "========================================";
        writeln!(w, "{}", rule)?;
        writeln!(w, "PageRank Performance Report")?;
        writeln!(w, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(w, "{}\n", rule)?;
        writeln!(w, "Detailed Timing Information:")?;
        writeln!(w, "----------------------------------------")?;
        for t in &self.timings {
            writeln!(w, "{:<40}: {:>10} ms ({:.3} s) - {}",
                     t.phase, t.duration_ms, t.duration_ms as f64 / 1000.0, t.description)?;
        }
        let total = self.wall_ms();
        writeln!(w, "----------------------------------------")?;
        writeln!(w, "{:<40}: {:>10} ms ({:.3} s)", "TOTAL WALL TIME", total, total as f64 / 1000.0)?;
        writeln!(w, "{}", rule)?;
        w.flush()
    }

    /// `phase,duration_ms`, one row per recorded timing
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut w = csv::Writer::from_path(path)?;
        for t in &self.timings {
            w.serialize(t)?;
        }
        w.flush().map_err(Error::io(path))
    }
}

/// Everything needed to interpret an output directory after the fact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub input: PathBuf,
    pub config: RankConfig,
    pub threads: usize,
    pub nodes: usize,
    pub rounds: usize,
    pub converged: bool,
    pub avg_diff: f64,
    pub quality: QualityReport,
    pub outputs: Vec<String>,
}

impl Manifest {
    pub fn write(&self, path: &Path) -> Result<()> {
        let f = File::create(path).map_err(Error::io(path))?;
        let mut w = BufWriter::new(f);
        serde_json::to_writer_pretty(&mut w, self)?;
        w.flush().map_err(Error::io(path))
    }

    pub fn read(path: &Path) -> Result<Manifest> {
        let f = File::open(path).map_err(Error::io(path))?;
        Ok(serde_json::from_reader(::std::io::BufReader::new(f))?)
    }
}
