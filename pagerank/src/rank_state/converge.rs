//! Drives rounds until the ranks settle or the iteration budget runs out.
//!
//! Round 0 is the normalized state. After round `i+1` is produced:
//!   avg_diff = Σ|Δrank| / N
//!   converged  if i+1 >= min_iterations && avg_diff <= threshold
//!   forced     if i+1 >= max_iterations
//! The dangling mass of round `i+1` becomes the carry of the round after it.

use std::time::Instant;

use super::{RankState, Normalized, Ranked};
use super::transform::Round;
use crate::config::{RankConfig, Retention};
use crate::error::{Error, Result};
use crate::store::RoundStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStats {
    pub round: usize,
    pub avg_diff: f64,
    pub dangling_mass: f64,
    pub rank_sum: f64,
    pub map_ms: u64,
    pub reduce_ms: u64,
    pub total_ms: u64,
    pub anomalies: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub rounds: usize,
    pub converged: bool,
    pub avg_diff: f64,
    pub history: Vec<RoundStats>,
}

impl RankState<Normalized> {
    pub fn iterate(self, config: &RankConfig, store: &mut dyn RoundStore, retention: Retention)
        -> Result<RankState<Ranked>>
    {
        config.validate()?;
        let log = self.log.new(o!(
                "damping" => config.damping,
                "epsilon" => config.threshold,
                "nodes" => self.size));
        if config.min_iterations > config.max_iterations {
            warn!(log, "min iterations exceeds max iterations; max wins";
                  "min" => config.min_iterations, "max" => config.max_iterations);
        }
        let min_iter = config.effective_min_iterations();
        let n = self.size as f64;

        store.write_round(0, &self.state.round)?;
        let mut carry = self.state.initial_dangling;
        let mut current = self.state.round;
        let mut history: Vec<RoundStats> = Vec::with_capacity(config.max_iterations);
        let mut converged = false;
        let mut avg_diff = ::std::f64::MAX;
        let started = Instant::now();
        let mut round = 0;

        while round < config.max_iterations {
            if let Some(budget) = config.time_budget {
                if started.elapsed() >= budget {
                    warn!(log, "Time budget exhausted before round {}", round + 1);
                    return Err(Error::Timeout { rounds: round });
                }
            }
            let round_start = Instant::now();
            let anomalies_before = self.quality.report().anomalies();

            let input = if round == 0 {
                current
            } else {
                store.read_round(round, &self.quality)?
            };
            let out = Round {
                index: round + 1,
                config,
                total_nodes: self.size,
                dangling_carry: carry,
                partitions: self.threads,
                quality: &self.quality,
                log: &log,
            }.run(input)?;
            store.write_round(round + 1, &out.state)?;
            round += 1;

            if let Some(old) = retention.expired(round) {
                if let Err(e) = store.remove_round(old) {
                    warn!(log, "Could not remove {}: {}", store.locate(old), e);
                }
            }

            avg_diff = out.diff_sum / n;
            carry = out.dangling_mass;
            let stats = RoundStats {
                round,
                avg_diff,
                dangling_mass: out.dangling_mass,
                rank_sum: out.state.rank_sum(),
                map_ms: out.times.map_ms,
                reduce_ms: out.times.reduce_ms,
                total_ms: round_start.elapsed().as_millis() as u64,
                anomalies: self.quality.report().anomalies() - anomalies_before,
            };
            info!(log, "Finished round {}", round;
                  "avg_diff" => format!("{:.6e}", stats.avg_diff),
                  "dangling" => stats.dangling_mass,
                  "sum" => stats.rank_sum,
                  "ms" => stats.total_ms);
            if stats.anomalies > 0 {
                warn!(log, "Round {} saw {} data-quality anomalies; ranks are best-effort",
                      round, stats.anomalies);
            }
            history.push(stats);
            current = out.state;

            if round >= min_iter && avg_diff <= config.threshold {
                converged = true;
                break;
            }
        }

        if converged {
            info!(log, "Converged after {} rounds", round; "avg_diff" => avg_diff);
        } else {
            warn!(log, "Stopped at max iterations without converging";
                  "rounds" => round, "avg_diff" => avg_diff);
        }

        Ok(RankState {
            threads: self.threads,
            size:    self.size,
            log:     self.log,
            quality: self.quality,
            state:   Ranked {
                round: current,
                outcome: Outcome { rounds: round, converged, avg_diff, history },
            },
        })
    }
}
