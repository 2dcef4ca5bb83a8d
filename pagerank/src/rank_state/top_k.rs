//! Final ranking: the full score list and the k best nodes.
//!
//! Top-k keeps a bounded min-heap, so a pass over n nodes costs O(n log k).
//! Equal ranks are ordered by id, ascending, so reports are reproducible.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{RankState, Ranked};
use crate::error::{Error, Result};
use crate::node::{score_line, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scored {
    pub id: NodeId,
    pub rank: f64,
}

impl Eq for Scored { }

impl Ord for Scored {
    /// Greater means better: higher rank, then smaller id
    fn cmp(&self, other: &Scored) -> Ordering {
        self.rank.total_cmp(&other.rank)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Scored) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The `k` best of `items`, best first
pub fn top_k<I: IntoIterator<Item = Scored>>(items: I, k: usize) -> Vec<Scored> {
    if k == 0 {
        return Vec::new();
    }
    let mut heap: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(k + 1);
    for s in items {
        if heap.len() < k {
            heap.push(Reverse(s));
        } else if heap.peek().map_or(false, |worst| s > worst.0) {
            heap.pop();
            heap.push(Reverse(s));
        }
    }
    // ascending order of Reverse is descending order of Scored
    heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
}

fn write_scores<'a, I>(path: &Path, scores: I, precision: usize) -> Result<usize>
    where I: Iterator<Item = (&'a str, f64)>
{
    let f = File::create(path).map_err(Error::io(path))?;
    let mut w = BufWriter::new(f);
    let mut count = 0;
    for (id, rank) in scores {
        writeln!(w, "{}", score_line(id, rank, precision)).map_err(Error::io(path))?;
        count += 1;
    }
    w.flush().map_err(Error::io(path))?;
    Ok(count)
}

impl RankState<Ranked> {
    pub fn top_k(&self, k: usize) -> Vec<Scored> {
        top_k(self.state.round.iter().map(|n| Scored { id: n.id.clone(), rank: n.rank }), k)
    }

    /// Every node as `<id>\t<rank>`, ordered by id; adjacency is dropped
    pub fn write_final_scores(&self, path: &Path, precision: usize) -> Result<usize> {
        let n = write_scores(path,
                             self.state.round.iter().map(|n| (n.id.as_str(), n.rank)),
                             precision)?;
        info!(self.log, "Wrote {} final scores", n; "path" => path.display().to_string());
        Ok(n)
    }

    /// At most `k` lines, best first
    pub fn write_top_k(&self, path: &Path, k: usize, precision: usize) -> Result<Vec<Scored>> {
        let best = self.top_k(k);
        write_scores(path, best.iter().map(|s| (s.id.as_str(), s.rank)), precision)?;
        info!(self.log, "Wrote top {} ranks", best.len(); "path" => path.display().to_string());
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn scored(id: &str, rank: f64) -> Scored {
        Scored { id: id.to_string(), rank }
    }

    fn reference(mut items: Vec<Scored>, k: usize) -> Vec<Scored> {
        items.sort_by(|a, b| b.cmp(a));
        items.truncate(k);
        items
    }

    #[test]
    fn picks_largest_descending() {
        let items = vec![scored("a", 0.1), scored("b", 0.4), scored("c", 0.3), scored("d", 0.2)];
        let best = top_k(items, 2);
        assert_eq!(best, vec![scored("b", 0.4), scored("c", 0.3)]);
    }

    #[test]
    fn fewer_nodes_than_k() {
        let best = top_k(vec![scored("a", 0.1), scored("b", 0.9)], 10);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].id, "b");
    }

    #[test]
    fn zero_k_is_empty() {
        assert!(top_k(vec![scored("a", 1.0)], 0).is_empty());
    }

    #[test]
    fn ties_break_on_id() {
        let items = vec![scored("z", 0.5), scored("m", 0.5), scored("a", 0.5), scored("q", 0.1)];
        let best = top_k(items, 2);
        assert_eq!(best, vec![scored("a", 0.5), scored("m", 0.5)]);
    }

    #[test]
    fn matches_sort_and_slice() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for trial in 0..50 {
            let n = rng.gen_range(0..300);
            // a coarse grid of ranks makes ties common
            let items: Vec<Scored> = (0..n)
                .map(|i| scored(&format!("n{}", i), rng.gen_range(0..40) as f64 / 40.0))
                .collect();
            let k = rng.gen_range(0..60);
            assert_eq!(top_k(items.clone(), k), reference(items, k), "trial {}", trial);
        }
    }
}
