//! Round-addressable storage for materialized round state.
//!
//! `DirStore` lays rounds out as `<dir>/iteration_<i>` text files in the
//! state line format; `MemoryStore` keeps them as values and loses nothing
//! to decimal formatting.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use fnv::FnvHashMap;
use regex::Regex;

use crate::error::{Error, Result};
use crate::node::Node;
use crate::quality::DataQuality;
use crate::round::RoundState;

pub trait RoundStore {
    fn write_round(&mut self, round: usize, state: &RoundState) -> Result<()>;
    /// Fails with `MissingRound` if the round was never written (or was removed)
    fn read_round(&self, round: usize, quality: &DataQuality) -> Result<RoundState>;
    fn remove_round(&mut self, round: usize) -> Result<()>;
    fn has_round(&self, round: usize) -> bool;
    /// Where the round lives, for logs and manifests
    fn locate(&self, round: usize) -> String;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    rounds: FnvHashMap<usize, RoundState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoundStore for MemoryStore {
    fn write_round(&mut self, round: usize, state: &RoundState) -> Result<()> {
        self.rounds.insert(round, state.clone());
        Ok(())
    }
    fn read_round(&self, round: usize, _: &DataQuality) -> Result<RoundState> {
        self.rounds.get(&round).cloned().ok_or(Error::MissingRound(round))
    }
    fn remove_round(&mut self, round: usize) -> Result<()> {
        self.rounds.remove(&round);
        Ok(())
    }
    fn has_round(&self, round: usize) -> bool {
        self.rounds.contains_key(&round)
    }
    fn locate(&self, round: usize) -> String {
        format!("memory:iteration_{}", round)
    }
}

#[derive(Debug)]
pub struct DirStore {
    dir: PathBuf,
    precision: usize,
}

impl DirStore {
    pub fn create<P: Into<PathBuf>>(dir: P, precision: usize) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(Error::io(&dir))?;
        Ok(DirStore { dir, precision })
    }

    pub fn round_path(&self, round: usize) -> PathBuf {
        self.dir.join(format!("iteration_{}", round))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove round files (finished or partial) left by an earlier run.
    /// Returns how many were removed.
    pub fn clear_rounds(&mut self) -> Result<usize> {
        lazy_static! {
            static ref ROUND_FILE: Regex = Regex::new(r"^iteration_\d+(\.partial)?$").unwrap();
        }
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir).map_err(Error::io(&self.dir))? {
            let path = entry.map_err(Error::io(&self.dir))?.path();
            let stale = path.file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| ROUND_FILE.is_match(n));
            if stale && path.is_file() {
                fs::remove_file(&path).map_err(Error::io(&path))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

impl RoundStore for DirStore {
    fn write_round(&mut self, round: usize, state: &RoundState) -> Result<()> {
        let path = self.round_path(round);
        // write beside the target and rename, so a round is either whole or absent
        let tmp = path.with_extension("partial");
        {
            let f = File::create(&tmp).map_err(Error::io(&tmp))?;
            let mut w = BufWriter::new(f);
            for node in state {
                writeln!(w, "{}", node.to_line(self.precision)).map_err(Error::io(&tmp))?;
            }
            w.flush().map_err(Error::io(&tmp))?;
        }
        fs::rename(&tmp, &path).map_err(Error::io(&path))
    }

    fn read_round(&self, round: usize, quality: &DataQuality) -> Result<RoundState> {
        let path = self.round_path(round);
        if !path.is_file() {
            return Err(Error::MissingRound(round));
        }
        let f = File::open(&path).map_err(Error::io(&path))?;
        let mut nodes = Vec::new();
        for line in BufReader::new(f).lines() {
            let line = line.map_err(Error::io(&path))?;
            match Node::parse_line(&line) {
                Ok(n) => nodes.push(n),
                Err((fault, salvaged)) => {
                    quality.line_fault(fault);
                    nodes.extend(salvaged);
                }
            }
        }
        Ok(RoundState::from_nodes(nodes))
    }

    fn remove_round(&mut self, round: usize) -> Result<()> {
        let path = self.round_path(round);
        if path.exists() {
            fs::remove_file(&path).map_err(Error::io(&path))?;
        }
        Ok(())
    }

    fn has_round(&self, round: usize) -> bool {
        self.round_path(round).is_file()
    }

    fn locate(&self, round: usize) -> String {
        self.round_path(round).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> RoundState {
        RoundState::from_nodes(vec![
            Node::new("A", 0.5, vec!["B".into()]),
            Node::new("B", 0.5, vec![]),
        ])
    }

    #[test]
    fn memory_store_round_trip() {
        let mut s = MemoryStore::new();
        let q = DataQuality::new();
        s.write_round(3, &sample()).unwrap();
        assert_eq!(s.read_round(3, &q).unwrap(), sample());
        s.remove_round(3).unwrap();
        match s.read_round(3, &q) {
            Err(Error::MissingRound(3)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dir_store_writes_state_lines() {
        let tmp = tempdir().unwrap();
        let mut s = DirStore::create(tmp.path(), 4).unwrap();
        s.write_round(0, &sample()).unwrap();
        let text = fs::read_to_string(s.round_path(0)).unwrap();
        assert_eq!(text, "A\t0.5000|B\nB\t0.5000|\n");
        assert!(!s.round_path(0).with_extension("partial").exists());
    }

    #[test]
    fn dir_store_skips_bad_lines() {
        let tmp = tempdir().unwrap();
        let s = DirStore::create(tmp.path(), 4).unwrap();
        fs::write(s.round_path(1), "A\t0.5|B\ngarbage\n\nB\tnan?|\nC\t|A\n").unwrap();
        let q = DataQuality::new();
        let state = s.read_round(1, &q).unwrap();
        // C is salvaged with rank 0
        assert_eq!(state.len(), 2);
        assert_eq!(state.rank("C"), Some(0.0));
        let r = q.report();
        assert_eq!(r.malformed_lines, 1);
        assert_eq!(r.empty_values, 1);
        assert_eq!(r.rank_parse_errors, 2);
    }

    #[test]
    fn clear_rounds_leaves_other_files() {
        let tmp = tempdir().unwrap();
        let mut s = DirStore::create(tmp.path(), 4).unwrap();
        s.write_round(7, &sample()).unwrap();
        fs::write(s.round_path(8).with_extension("partial"), "A\t0.1|\n").unwrap();
        fs::write(tmp.path().join("final_scores.txt"), "A\t1\n").unwrap();
        fs::write(tmp.path().join("iteration_notes"), "keep").unwrap();

        assert_eq!(s.clear_rounds().unwrap(), 2);
        assert!(!s.has_round(7));
        assert!(!s.round_path(8).with_extension("partial").exists());
        assert!(tmp.path().join("final_scores.txt").exists());
        assert!(tmp.path().join("iteration_notes").exists());
    }

    #[test]
    fn dir_store_missing_round() {
        let tmp = tempdir().unwrap();
        let mut s = DirStore::create(tmp.path(), 4).unwrap();
        assert!(!s.has_round(7));
        assert!(s.remove_round(7).is_ok());
        match s.read_round(7, &DataQuality::new()) {
            Err(Error::MissingRound(7)) => (),
            other => panic!("unexpected {:?}", other),
        }
    }
}
