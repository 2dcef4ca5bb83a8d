//! In-process map / shuffle / reduce.
//!
//! Mappers run over owned chunks of the input and write keyed records into an
//! `Emitter`, which hash-partitions them by key. Each partition's buckets are
//! then concatenated in chunk order, grouped by key, and every group is handed
//! to the reducer exactly once. Within a group the values keep the order in
//! which they were emitted, so "first seen" is well defined.

use std::hash::Hasher;

use fnv::{FnvHashMap, FnvHasher};
use rayon::prelude::*;

pub struct Emitter<V> {
    buckets: Vec<Vec<(String, V)>>,
}

impl<V> Emitter<V> {
    fn new(partitions: usize) -> Self {
        Emitter { buckets: (0..partitions).map(|_| Vec::new()).collect() }
    }

    pub fn emit(&mut self, key: String, value: V) {
        let p = partition_of(&key, self.buckets.len());
        self.buckets[p].push((key, value));
    }
}

pub fn partition_of(key: &str, partitions: usize) -> usize {
    let mut h = FnvHasher::default();
    h.write(key.as_bytes());
    (h.finish() % partitions as u64) as usize
}

/// Wall time spent in each phase, in milliseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseTimes {
    pub map_ms: u64,
    pub reduce_ms: u64,
}

pub fn map_reduce<T, V, O, M, R>(inputs: Vec<T>, partitions: usize, map: M, reduce: R)
    -> (Vec<O>, PhaseTimes)
    where T: Send,
          V: Send,
          O: Send,
          M: Fn(T, &mut Emitter<V>) + Sync,
          R: Fn(String, Vec<V>) -> O + Sync,
{
    let partitions = partitions.max(1);
    let chunk_size = (inputs.len() / partitions).max(1);

    let start = ::std::time::Instant::now();
    let mapped: Vec<Emitter<V>> = into_chunks(inputs, chunk_size)
        .into_par_iter()
        .map(|chunk| {
            let mut e = Emitter::new(partitions);
            for item in chunk {
                map(item, &mut e);
            }
            e
        })
        .collect();

    let mut shuffled: Vec<Vec<(String, V)>> = (0..partitions).map(|_| Vec::new()).collect();
    for e in mapped {
        for (p, bucket) in e.buckets.into_iter().enumerate() {
            shuffled[p].extend(bucket);
        }
    }
    let map_ms = start.elapsed().as_millis() as u64;

    let start = ::std::time::Instant::now();
    let reduce = &reduce;
    let out: Vec<O> = shuffled
        .into_par_iter()
        .flat_map_iter(move |bucket| {
            group(bucket).into_iter().map(move |(k, vs)| reduce(k, vs))
        })
        .collect();
    let reduce_ms = start.elapsed().as_millis() as u64;

    (out, PhaseTimes { map_ms, reduce_ms })
}

fn into_chunks<T>(items: Vec<T>, size: usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::with_capacity(items.len() / size + 1);
    let mut it = items.into_iter();
    loop {
        let chunk: Vec<T> = it.by_ref().take(size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    chunks
}

/// Group by key, keeping first-seen key order and emission order of values
fn group<V>(bucket: Vec<(String, V)>) -> Vec<(String, Vec<V>)> {
    let mut index: FnvHashMap<String, usize> = FnvHashMap::default();
    let mut groups: Vec<(String, Vec<V>)> = Vec::new();
    for (k, v) in bucket {
        if let Some(&i) = index.get(&k) {
            groups[i].1.push(v);
        } else {
            index.insert(k.clone(), groups.len());
            groups.push((k, vec![v]));
        }
    }
    groups
}
