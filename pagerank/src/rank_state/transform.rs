//! One round of the rank update.
//!
//! *Distribute* turns every node into messages: an equal share of its rank
//! for each outlink, plus a structure message keyed by its own id that carries
//! the previous rank and the adjacency forward. A dangling node sends only its
//! structure message; its mass reaches everyone through the dangling carry of
//! the *next* round.
//!
//! *Aggregate* sees every message for one id and computes
//!     PR = (1-d)/N + d * (Σ shares + carry/N)
//! where `carry` is the dangling mass at the end of the previous round.

use slog::Logger;

use crate::config::RankConfig;
use crate::error::{Error, Result};
use crate::node::{Node, NodeId};
use crate::quality::DataQuality;
use crate::round::RoundState;
use crate::scaled::ScaledAccumulator;
use crate::shuffle::{self, Emitter, PhaseTimes};

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Structure { rank: f64, outlinks: Vec<NodeId> },
    Contribution(f64),
}

pub fn distribute(node: Node, out: &mut Emitter<Message>) {
    let Node { id, rank, outlinks } = node;
    if !outlinks.is_empty() {
        let share = rank / outlinks.len() as f64;
        for link in &outlinks {
            out.emit(link.clone(), Message::Contribution(share));
        }
    }
    out.emit(id, Message::Structure { rank, outlinks });
}

/// Everything an aggregation needs besides its own messages
pub struct RoundContext<'a> {
    pub damping: f64,
    pub total_nodes: usize,
    pub dangling_carry: f64,
    pub diff: &'a ScaledAccumulator,
    pub dangling: &'a ScaledAccumulator,
    pub quality: &'a DataQuality,
    pub log: &'a Logger,
}

impl<'a> RoundContext<'a> {
    pub fn next_rank(&self, link_sum: f64) -> f64 {
        let n = self.total_nodes as f64;
        let d = self.damping;
        let rank = (1.0 - d) / n + d * (link_sum + self.dangling_carry / n);
        // float error only; the formula is non-negative for valid input
        rank.max(0.0)
    }
}

pub fn aggregate(id: NodeId, messages: Vec<Message>, ctx: &RoundContext) -> Node {
    let mut link_sum = 0f64;
    let mut structure: Option<(f64, Vec<NodeId>)> = None;
    let received = messages.len();
    for m in messages {
        match m {
            Message::Contribution(share) => link_sum += share,
            Message::Structure { rank, outlinks } => {
                if structure.is_none() {
                    structure = Some((rank, outlinks));
                } else {
                    ctx.quality.duplicate_structure();
                    warn!(ctx.log, "Duplicate structure record ignored"; "node" => &id);
                }
            }
        }
    }
    let (previous, outlinks) = structure.unwrap_or_else(|| {
        ctx.quality.missing_structure();
        warn!(ctx.log, "No structure record for node";
              "node" => &id, "received" => received);
        (0.0, Vec::new())
    });

    let rank = ctx.next_rank(link_sum);
    ctx.diff.add_ceil((rank - previous).abs());
    if outlinks.is_empty() {
        ctx.dangling.add(rank);
    }
    Node { id, rank, outlinks }
}

pub struct RoundOutput {
    pub state: RoundState,
    /// Σ |new - previous| over all nodes
    pub diff_sum: f64,
    /// rank held by dangling nodes in `state`; the next round's carry
    pub dangling_mass: f64,
    pub times: PhaseTimes,
}

/// Parameters of a single round, fixed before it starts
pub struct Round<'a> {
    pub index: usize,
    pub config: &'a RankConfig,
    pub total_nodes: usize,
    pub dangling_carry: f64,
    pub partitions: usize,
    pub quality: &'a DataQuality,
    pub log: &'a Logger,
}

impl<'a> Round<'a> {
    pub fn run(&self, input: RoundState) -> Result<RoundOutput> {
        let fail = |reason: String| Error::RoundFailed { round: self.index, reason };
        if self.total_nodes == 0 {
            return Err(fail("total node count is zero".into()));
        }
        if input.is_empty() {
            return Err(fail("round input is empty".into()));
        }
        let diff = ScaledAccumulator::new(self.config.scale)?;
        let dangling = ScaledAccumulator::new(self.config.scale)?;
        let ctx = RoundContext {
            damping: self.config.damping,
            total_nodes: self.total_nodes,
            dangling_carry: self.dangling_carry,
            diff: &diff,
            dangling: &dangling,
            quality: self.quality,
            log: self.log,
        };

        let (nodes, times) = {
            let ctx = &ctx;
            shuffle::map_reduce(input.into_nodes(),
                                self.partitions,
                                distribute,
                                move |id, messages| aggregate(id, messages, ctx))
        };

        let diff_sum = diff.value();
        if !diff_sum.is_finite() {
            return Err(fail(format!("rank difference is not finite ({})", diff_sum)));
        }
        Ok(RoundOutput {
            state: RoundState::from_nodes(nodes),
            diff_sum,
            dangling_mass: dangling.value(),
            times,
        })
    }
}
