use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on `{}`: {source}", .path.display())]
    Io {
        source: io::Error,
        path: PathBuf,
    },

    #[error("input path `{}` does not exist", .0.display())]
    MissingInput(PathBuf),

    #[error("no nodes were discovered in the edge list")]
    NoNodes,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("input for round {0} is missing from the round store")]
    MissingRound(usize),

    #[error("round {round} failed: {reason}")]
    RoundFailed { round: usize, reason: String },

    #[error("time budget exhausted after {rounds} rounds")]
    Timeout { rounds: usize },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl Error {
    pub fn io<P: Into<PathBuf>>(path: P) -> impl FnOnce(io::Error) -> Error {
        let path = path.into();
        move |source| Error::Io { source, path }
    }

    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        match *self {
            Error::RoundFailed { .. } | Error::Timeout { .. } => 2,
            Error::NoNodes => 3,
            Error::MissingRound(_) => 4,
            _ => 1,
        }
    }
}
