// https://hoverbear.org/2016/10/12/rust-state-machine-pattern/

use slog::{Drain, Logger};

use crate::quality::DataQuality;
use crate::round::RoundState;

pub mod bootstrap;
pub mod normalize;
pub mod transform;
pub mod converge;
pub mod top_k;

pub use self::converge::{Outcome, RoundStats};
pub use self::top_k::Scored;


//  ------STATE--MACHINE------


pub trait State { }
impl State for Bootstrapped { }
impl State for Normalized { }
impl State for Ranked { }

pub struct RankState<S: State> {
    threads: usize,         // number of shuffle partitions per round
    size:    usize,         // number of nodes, N
    log:     Logger,        // root logger that will be split off for components
    quality: DataQuality,   // anomalies seen so far, carried through every state
    state:   S,
}

pub fn new_logger() -> Logger {
    let decorator = slog_term::PlainSyncDecorator::new(::std::io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    Logger::root(drain, o!())
}

/// A logger that drops everything, for tests and library callers that
/// don't care
pub fn quiet_logger() -> Logger {
    Logger::root(slog::Discard, o!())
}


//  ----------STATES----------


pub struct Bootstrapped {
    /// Every node discovered in the edge list, rank still the 1.0 placeholder
    round: RoundState,
}

pub struct Normalized {
    /// Uniform 1/N distribution; the input of round 0
    round: RoundState,
    initial_dangling: f64,
}

pub struct Ranked {
    /// The last round produced by the controller
    round: RoundState,
    outcome: Outcome,
}


//  ------COMMON-ACCESSORS------


impl<S: State> RankState<S> {
    pub fn size(&self) -> usize {
        self.size
    }
    pub fn threads(&self) -> usize {
        self.threads
    }
    pub fn log(&self) -> &Logger {
        &self.log
    }
    pub fn quality(&self) -> &DataQuality {
        &self.quality
    }
}

impl RankState<Bootstrapped> {
    pub fn round(&self) -> &RoundState {
        &self.state.round
    }
}

impl RankState<Normalized> {
    pub fn round(&self) -> &RoundState {
        &self.state.round
    }
    pub fn initial_dangling(&self) -> f64 {
        self.state.initial_dangling
    }
}

impl RankState<Ranked> {
    pub fn round(&self) -> &RoundState {
        &self.state.round
    }
    pub fn outcome(&self) -> &Outcome {
        &self.state.outcome
    }
    pub fn into_round(self) -> RoundState {
        self.state.round
    }
}
