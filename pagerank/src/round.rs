//! One round's worth of node records, kept sorted by id
use std::slice;

use crate::node::Node;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundState {
    nodes: Vec<Node>,
}

impl RoundState {
    /// Ids are expected to be unique; the first record for an id wins
    pub fn from_nodes(mut nodes: Vec<Node>) -> Self {
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes.dedup_by(|later, earlier| later.id == earlier.id);
        RoundState { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes
            .binary_search_by(|n| n.id.as_str().cmp(id))
            .ok()
            .map(|i| &self.nodes[i])
    }

    pub fn rank(&self, id: &str) -> Option<f64> {
        self.get(id).map(|n| n.rank)
    }

    pub fn iter(&self) -> slice::Iter<Node> {
        self.nodes.iter()
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn rank_sum(&self) -> f64 {
        self.nodes.iter().map(|n| n.rank).sum()
    }

    pub fn dangling_mass(&self) -> f64 {
        self.nodes.iter().filter(|n| n.is_dangling()).map(|n| n.rank).sum()
    }

    pub fn dangling_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_dangling()).count()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.outlinks.len()).sum()
    }
}

impl<'a> IntoIterator for &'a RoundState {
    type Item = &'a Node;
    type IntoIter = slice::Iter<'a, Node>;
    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
