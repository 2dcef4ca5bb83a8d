//! Edge list → per-node state
//!
//! Input is one edge per line, `<source><whitespace><destination>`. Blank
//! lines and lines starting with the comment marker are skipped; lines with
//! a third column, or an id containing `,`, are counted as malformed. Each edge
//! is emitted twice: keyed by the source (carrying the destination) and keyed
//! by the destination (carrying nothing) so that nodes which only ever appear
//! as a target still get a record of their own.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use fnv::FnvHashSet;
use slog::Logger;

use super::{RankState, Bootstrapped};
use crate::error::{Error, Result};
use crate::node::{Node, NodeId, LINK_SEP};
use crate::quality::DataQuality;
use crate::round::RoundState;
use crate::shuffle::{self, Emitter};

pub const PLACEHOLDER_RANK: f64 = 1.0;

impl RankState<Bootstrapped> {
    pub fn from_path(path: &Path, comment: &str, threads: usize, log: Logger) -> Result<Self> {
        if !path.exists() {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let f = File::open(path).map_err(Error::io(path))?;
        let lines = BufReader::new(f)
            .lines()
            .collect::<::std::io::Result<Vec<String>>>()
            .map_err(Error::io(path))?;
        let src_log = log.new(o!("input" => path.display().to_string()));
        let state = Self::from_lines(lines, comment, threads, src_log)?;
        Ok(RankState { log, ..state })
    }

    pub fn from_lines(lines: Vec<String>, comment: &str, threads: usize, log: Logger)
        -> Result<Self>
    {
        let quality = DataQuality::new();
        let num_lines = lines.len();
        let (nodes, times) = {
            let quality = &quality;
            shuffle::map_reduce(
                lines,
                threads,
                |line, out: &mut Emitter<Option<NodeId>>| emit_edge(&line, comment, out, quality),
                |id, targets| collect_node(id, targets))
        };

        let round = RoundState::from_nodes(nodes);
        let size = round.len();
        if size == 0 {
            return Err(Error::NoNodes);
        }
        let report = quality.report();
        if report.malformed_edges > 0 {
            warn!(log, "Skipped {} malformed edge lines", report.malformed_edges);
        }
        info!(log, "Bootstrapped graph";
              "lines" => num_lines,
              "nodes" => size,
              "edges" => round.edge_count(),
              "dangling" => round.dangling_count(),
              "map_ms" => times.map_ms,
              "reduce_ms" => times.reduce_ms);

        Ok(RankState {
            threads,
            size,
            log,
            quality,
            state: Bootstrapped { round },
        })
    }
}

fn emit_edge(line: &str, comment: &str, out: &mut Emitter<Option<NodeId>>, quality: &DataQuality) {
    let line = line.trim();
    if line.is_empty() || line.starts_with(comment) {
        return;
    }
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        // the link separator cannot appear inside an id of the round files
        (Some(src), Some(dst), None) if !src.contains(LINK_SEP) && !dst.contains(LINK_SEP) => {
            out.emit(src.to_string(), Some(dst.to_string()));
            out.emit(dst.to_string(), None);
        }
        _ => quality.malformed_edge(),
    }
}

/// Destinations deduplicated, first occurrence order kept
fn collect_node(id: NodeId, targets: Vec<Option<NodeId>>) -> Node {
    let mut seen: FnvHashSet<NodeId> = FnvHashSet::default();
    let mut outlinks = Vec::new();
    for t in targets.into_iter().flatten() {
        if !seen.contains(&t) {
            seen.insert(t.clone());
            outlinks.push(t);
        }
    }
    Node::new(id, PLACEHOLDER_RANK, outlinks)
}
