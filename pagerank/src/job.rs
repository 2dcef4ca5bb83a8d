//! A whole run, edge list to output directory.
//!
//! Work happens inside a dedicated rayon pool sized by `JobSettings::threads`
//! so the partition count and the worker count agree.

use std::fs;
use std::path::PathBuf;

use rayon::ThreadPoolBuilder;
use slog::Logger;

use crate::config::{JobSettings, RankConfig};
use crate::error::{Error, Result};
use crate::quality::QualityReport;
use crate::rank_state::{Bootstrapped, Normalized, RankState, Scored};
use crate::report::{self, Manifest, PerfMonitor};
use crate::store::{DirStore, MemoryStore, RoundStore};

#[derive(Debug, Clone)]
pub struct Summary {
    pub nodes: usize,
    pub rounds: usize,
    pub converged: bool,
    pub avg_diff: f64,
    pub quality: QualityReport,
    pub top: Vec<Scored>,
    pub outputs: Vec<PathBuf>,
}

pub fn run(settings: &JobSettings, config: &RankConfig, log: &Logger) -> Result<Summary> {
    settings.validate()?;
    config.validate()?;
    let pool = ThreadPoolBuilder::new()
        .num_threads(settings.threads)
        .build()?;
    pool.install(|| run_in_pool(settings, config, log))
}

fn run_in_pool(settings: &JobSettings, config: &RankConfig, log: &Logger) -> Result<Summary> {
    let out_dir = &settings.output;
    fs::create_dir_all(out_dir).map_err(Error::io(out_dir))?;
    let log = log.new(o!("output" => out_dir.display().to_string()));
    let mut perf = PerfMonitor::new();

    let boot = perf.time("Preprocess", "Graph structure initialization", || {
        RankState::<Bootstrapped>::from_path(&settings.input,
                                             &settings.comment_marker,
                                             settings.threads,
                                             log.clone())
    })?;
    let normalized = perf.time("Normalize", "Uniform initial ranks",
                               || RankState::<Normalized>::from(boot));

    let mut dir_store = DirStore::create(out_dir.clone(), settings.precision)?;
    let stale = dir_store.clear_rounds()?;
    if stale > 0 {
        info!(log, "Removed {} round files from an earlier run", stale);
    }
    let mut store: Box<dyn RoundStore> = if settings.in_memory {
        Box::new(MemoryStore::new())
    } else {
        let resolution = 0.5 * 10f64.powi(-(settings.precision as i32));
        if resolution > config.threshold {
            warn!(log, "Round files are rounded more coarsely than the convergence threshold";
                  "precision" => settings.precision, "threshold" => config.threshold);
        }
        Box::new(dir_store)
    };
    let ranked = normalized.iterate(config, store.as_mut(), settings.retention)?;
    perf.record_rounds(&ranked.outcome().history);

    let scores_path = out_dir.join(report::FINAL_SCORES_FILE);
    let top_path = out_dir.join(report::top_k_file(settings.top_k));
    let top = perf.time("Finalize", "Clean and format result", || -> Result<Vec<Scored>> {
        ranked.write_final_scores(&scores_path, settings.precision)?;
        ranked.write_top_k(&top_path, settings.top_k, settings.precision)
    })?;

    let outcome = ranked.outcome();
    let quality = ranked.quality().report();
    if !quality.is_clean() {
        warn!(log, "Run finished with data-quality anomalies; ranks are best-effort";
              "anomalies" => quality.anomalies());
    }

    let mut outputs = vec![scores_path, top_path];
    if !settings.in_memory {
        outputs.push(PathBuf::from(store.locate(outcome.rounds)));
    }

    let report_path = out_dir.join(report::REPORT_FILE);
    match perf.write_text(&report_path) {
        Ok(()) => outputs.push(report_path),
        Err(e) => warn!(log, "Could not write performance report: {}", e),
    }
    let timings_path = out_dir.join(report::TIMINGS_FILE);
    match perf.write_csv(&timings_path) {
        Ok(()) => outputs.push(timings_path),
        Err(e) => warn!(log, "Could not write timings: {}", e),
    }

    let manifest_path = out_dir.join(report::MANIFEST_FILE);
    let manifest = Manifest {
        input: settings.input.clone(),
        config: *config,
        threads: settings.threads,
        nodes: ranked.size(),
        rounds: outcome.rounds,
        converged: outcome.converged,
        avg_diff: outcome.avg_diff,
        quality,
        outputs: outputs.iter()
            .filter_map(|p| p.file_name())
            .map(|f| f.to_string_lossy().into_owned())
            .collect(),
    };
    match manifest.write(&manifest_path) {
        Ok(()) => outputs.push(manifest_path),
        Err(e) => warn!(log, "Could not write manifest: {}", e),
    }

    info!(log, "Finished in {} ms", perf.wall_ms();
          "rounds" => outcome.rounds, "converged" => outcome.converged);

    Ok(Summary {
        nodes: ranked.size(),
        rounds: outcome.rounds,
        converged: outcome.converged,
        avg_diff: outcome.avg_diff,
        quality,
        top,
        outputs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Retention;
    use crate::rank_state::quiet_logger;
    use tempfile::tempdir;

    fn settings(dir: &::std::path::Path, edges: &str) -> JobSettings {
        let input = dir.join("edges.txt");
        fs::write(&input, edges).unwrap();
        let mut s = JobSettings::new(input, dir.join("out"));
        s.threads = 2;
        s.top_k = 2;
        s
    }

    #[test]
    fn writes_every_artifact() {
        let tmp = tempdir().unwrap();
        let s = settings(tmp.path(), "A B\nA C\nB C\nC A\n");
        let summary = run(&s, &RankConfig::default(), &quiet_logger()).unwrap();
        assert_eq!(summary.nodes, 3);
        assert_eq!(summary.top.len(), 2);
        for name in &["final_scores.txt", "top_2.txt", "performance_report.txt",
                      "timings.csv", "manifest.json"] {
            assert!(s.output.join(name).is_file(), "missing {}", name);
        }
        let last = format!("iteration_{}", summary.rounds);
        assert!(s.output.join(&last).is_file());
        assert!(!s.output.join("iteration_0").exists());
    }

    #[test]
    fn stale_rounds_are_removed() {
        let tmp = tempdir().unwrap();
        let s = settings(tmp.path(), "A B\nB A\n");
        fs::create_dir_all(&s.output).unwrap();
        fs::write(s.output.join("iteration_40"), "A\t0.5|B\n").unwrap();
        fs::write(s.output.join("iteration_41.partial"), "A\t0.5|B\n").unwrap();

        let config = RankConfig { max_iterations: 3, min_iterations: 1, ..RankConfig::default() };
        let summary = run(&s, &config, &quiet_logger()).unwrap();
        let rounds: Vec<String> = fs::read_dir(&s.output).unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("iteration_"))
            .collect();
        assert_eq!(rounds, vec![format!("iteration_{}", summary.rounds)]);
    }

    #[test]
    fn memory_store_leaves_no_rounds() {
        let tmp = tempdir().unwrap();
        let mut s = settings(tmp.path(), "A B\nB A\n");
        s.in_memory = true;
        s.retention = Retention::All;
        run(&s, &RankConfig::default(), &quiet_logger()).unwrap();
        assert!(!s.output.join("iteration_0").exists());
        assert!(s.output.join("final_scores.txt").is_file());
    }

    #[test]
    fn rejects_invalid_config_before_reading() {
        let tmp = tempdir().unwrap();
        let s = settings(tmp.path(), "A B\n");
        let config = RankConfig { damping: 2.0, ..RankConfig::default() };
        match run(&s, &config, &quiet_logger()) {
            Err(Error::InvalidConfig(_)) => (),
            other => panic!("unexpected {:?}", other.map(|s| s.nodes)),
        }
        assert!(!s.output.exists());
    }
}
