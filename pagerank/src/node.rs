//! Per-node state and its on-disk line format
//!
//! A round is persisted one node per line:
//!     `<id>\t<rank>|<outlink>,<outlink>,...`
//! The outlink list is empty for dangling nodes (`C\t0.25|`).

use std::fmt::Write;

use regex::Regex;

pub type NodeId = String;

pub const RANK_SEP: char = '|';
pub const LINK_SEP: char = ',';

lazy_static! {
    static ref STATE_LINE: Regex = Regex::new(r"^([^\t]+)\t([^|]*)\|(.*)$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub rank: f64,
    pub outlinks: Vec<NodeId>,
}

/// Why a state line could not be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFault {
    Blank,
    Malformed,
    BadRank,
}

impl Node {
    pub fn new<S: Into<NodeId>>(id: S, rank: f64, outlinks: Vec<NodeId>) -> Self {
        Node { id: id.into(), rank, outlinks }
    }

    #[inline]
    pub fn is_dangling(&self) -> bool {
        self.outlinks.is_empty()
    }

    pub fn to_line(&self, precision: usize) -> String {
        let mut line = String::with_capacity(self.id.len() + 16 + 8 * self.outlinks.len());
        line.push_str(&self.id);
        line.push('\t');
        // writing to a String cannot fail
        let _ = write!(line, "{:.*}", precision, self.rank);
        line.push(RANK_SEP);
        for (i, link) in self.outlinks.iter().enumerate() {
            if i > 0 {
                line.push(LINK_SEP);
            }
            line.push_str(link);
        }
        line
    }

    /// Parse one state line.
    ///
    /// An empty rank field is accepted as rank 0 (older structure-only lines)
    /// but still reported as `BadRank` alongside the node.
    pub fn parse_line(line: &str) -> Result<Node, (LineFault, Option<Node>)> {
        let line = line.trim_end_matches(|c| c == '\n' || c == '\r');
        if line.trim().is_empty() {
            return Err((LineFault::Blank, None));
        }
        let caps = STATE_LINE.captures(line).ok_or((LineFault::Malformed, None))?;
        let id = caps[1].trim();
        if id.is_empty() {
            return Err((LineFault::Malformed, None));
        }
        let outlinks = split_links(&caps[3]);
        let rank_s = caps[2].trim();
        if rank_s.is_empty() {
            return Err((LineFault::BadRank, Some(Node::new(id, 0.0, outlinks))));
        }
        match rank_s.parse::<f64>() {
            Ok(rank) if rank.is_finite() => Ok(Node::new(id, rank, outlinks)),
            _ => Err((LineFault::BadRank, None)),
        }
    }
}

pub fn split_links(s: &str) -> Vec<NodeId> {
    s.split(LINK_SEP)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// `<id>\t<rank>`, the format of final scores and top-k reports
pub fn score_line(id: &str, rank: f64, precision: usize) -> String {
    format!("{}\t{:.*}", id, precision, rank)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_state_line() {
        let n = Node::new("A", 0.25, vec!["B".into(), "C".into()]);
        assert_eq!(n.to_line(4), "A\t0.2500|B,C");
        let d = Node::new("D", 0.125, vec![]);
        assert_eq!(d.to_line(3), "D\t0.125|");
    }

    #[test]
    fn reads_state_line() {
        let n = Node::parse_line("A\t0.2500000000|B,C\n").unwrap();
        assert_eq!(n, Node::new("A", 0.25, vec!["B".into(), "C".into()]));
        let d = Node::parse_line("D\t0.1|").unwrap();
        assert!(d.is_dangling());
    }

    #[test]
    fn tolerates_stray_commas() {
        let n = Node::parse_line("A\t1.0|B,,C,").unwrap();
        assert_eq!(n.outlinks, vec!["B".to_string(), "C".to_string()]);
    }

    #[test]
    fn classifies_bad_lines() {
        assert_eq!(Node::parse_line("   ").unwrap_err().0, LineFault::Blank);
        assert_eq!(Node::parse_line("A 0.5|B").unwrap_err().0, LineFault::Malformed);
        assert_eq!(Node::parse_line("A\t0.5").unwrap_err().0, LineFault::Malformed);
        let (fault, node) = Node::parse_line("A\tabc|B").unwrap_err();
        assert_eq!(fault, LineFault::BadRank);
        assert!(node.is_none());
    }

    #[test]
    fn empty_rank_reads_as_zero() {
        let (fault, node) = Node::parse_line("A\t|B,C").unwrap_err();
        assert_eq!(fault, LineFault::BadRank);
        let node = node.unwrap();
        assert_eq!(node.rank, 0.0);
        assert_eq!(node.outlinks.len(), 2);
    }

    #[test]
    fn score_line_has_two_columns() {
        assert_eq!(score_line("X", 0.5, 2), "X\t0.50");
    }
}
