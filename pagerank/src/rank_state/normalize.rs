use super::{RankState, Bootstrapped, Normalized};
use crate::node::Node;
use crate::round::RoundState;

impl From<RankState<Bootstrapped>> for RankState<Normalized> {
    fn from(old: RankState<Bootstrapped>) -> RankState<Normalized> {
        // start each pagerank at 1/N; bootstrapping guarantees N > 0
        let uniform = (old.size as f64).recip();
        let nodes: Vec<Node> = old.state.round
            .into_nodes()
            .into_iter()
            .map(|n| Node { rank: uniform, ..n })
            .collect();
        let round = RoundState::from_nodes(nodes);
        let initial_dangling = round.dangling_mass();
        debug!(old.log, "Normalized initial ranks";
               "uniform" => uniform, "initial_dangling" => initial_dangling);

        RankState {
            threads: old.threads,
            size:    old.size,
            log:     old.log,
            quality: old.quality,
            state:   Normalized { round, initial_dangling },
        }
    }
}
