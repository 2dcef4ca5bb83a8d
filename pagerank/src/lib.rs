// LOGGING
#[macro_use] extern crate slog;
extern crate slog_term;
// SERIALIZING
#[macro_use] extern crate serde_derive;
extern crate serde_json;
extern crate csv;
// MISC
#[macro_use] extern crate lazy_static;
extern crate regex;
extern crate fnv;
extern crate chrono;
extern crate rayon;
extern crate thiserror;

// COMPONENTS
pub mod error;
pub mod config;
pub mod node;
pub mod round;
pub mod scaled;
pub mod quality;
pub mod shuffle;
pub mod store;
pub mod report;
pub mod rank_state;
pub mod job;

pub use error::{Error, Result};
pub use config::{JobSettings, RankConfig, Retention};
pub use node::{Node, NodeId};
pub use rank_state::{RankState, Bootstrapped, Normalized, Ranked, Outcome, RoundStats, Scored};
pub use job::{run, Summary};
