//! HNSW approximate nearest-neighbor index
//!
//! Greedy layered graph search over unit vectors. Vectors live in one
//! contiguous buffer for cache locality; visited tracking uses generation
//! stamps so clearing between searches is a counter bump, not a scan.
//!
//! Distances are `1 - dot(query, node)`, which on normalized vectors is the
//! cosine distance; reported scores are the complementary similarity.

use fincabot_core::vector;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Generation-stamped visited marks.
struct VisitedSet {
    generation: u64,
    marks: Vec<u64>,
}

impl VisitedSet {
    fn new(capacity: usize) -> Self {
        Self {
            generation: 1,
            marks: vec![0; capacity],
        }
    }

    fn reset(&mut self, capacity: usize) {
        self.generation += 1;
        if self.marks.len() < capacity {
            self.marks.resize(capacity, 0);
        }
    }

    /// Mark a node as visited; returns false if it already was.
    #[inline]
    fn mark(&mut self, idx: usize) -> bool {
        if self.marks[idx] == self.generation {
            return false;
        }
        self.marks[idx] = self.generation;
        true
    }
}

/// Search candidate ordered by distance, ties broken by index so the heap
/// ordering is total.
#[derive(Clone, Copy, PartialEq)]
struct Candidate {
    idx: usize,
    dist: f32,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .partial_cmp(&other.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct HnswNode {
    /// Neighbor lists per layer, index 0 is the base layer.
    layers: Vec<Vec<usize>>,
}

/// HNSW index over documents identified by insertion order.
///
/// Insertion order is the document index returned from [`search`]; the
/// owning store keeps its document table in the same order. No removal is
/// supported - a reload rebuilds the index from scratch.
///
/// [`search`]: HnswIndex::search
pub struct HnswIndex {
    nodes: Vec<HnswNode>,
    /// Contiguous storage for all vectors
    vectors: Vec<f32>,
    dim: usize,
    max_connections: usize,
    max_layers: usize,
    ef_construction: usize,
    visited: VisitedSet,
}

impl HnswIndex {
    pub fn new(dim: usize, max_connections: usize, max_layers: usize) -> Self {
        Self {
            nodes: Vec::new(),
            vectors: Vec::new(),
            dim,
            max_connections,
            max_layers,
            ef_construction: 200,
            visited: VisitedSet::new(1024),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    fn vector_of(&self, node_idx: usize) -> &[f32] {
        let start = node_idx * self.dim;
        &self.vectors[start..start + self.dim]
    }

    /// Cosine distance on unit vectors.
    #[inline]
    fn distance_to_node(&self, query: &[f32], node_idx: usize) -> f32 {
        1.0 - vector::dot(query, self.vector_of(node_idx))
    }

    /// Select layer using exponential decay
    fn select_layer(&self) -> usize {
        let mut layer = 0;
        while layer < self.max_layers - 1 && rand::random::<f32>() < 0.5 {
            layer += 1;
        }
        layer
    }

    /// Greedy beam search within one layer, returning up to `ef` nearest
    /// nodes sorted by ascending distance.
    fn search_layer(
        &mut self,
        query: &[f32],
        entry_point: usize,
        ef: usize,
        layer: usize,
    ) -> Vec<(usize, f32)> {
        self.visited.reset(self.nodes.len());

        // Min-heap of nodes to expand, max-heap of the best results so far.
        let mut candidates: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(ef * 2);
        let mut results: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef + 1);

        let entry_dist = self.distance_to_node(query, entry_point);
        self.visited.mark(entry_point);
        candidates.push(Reverse(Candidate {
            idx: entry_point,
            dist: entry_dist,
        }));
        results.push(Candidate {
            idx: entry_point,
            dist: entry_dist,
        });

        let mut neighbor_buffer: Vec<usize> = Vec::with_capacity(self.max_connections * 2);

        while let Some(Reverse(current)) = candidates.pop() {
            let worst = results.peek().map(|c| c.dist).unwrap_or(f32::INFINITY);
            if results.len() >= ef && current.dist > worst {
                break;
            }

            neighbor_buffer.clear();
            if let Some(links) = self.nodes[current.idx].layers.get(layer) {
                neighbor_buffer.extend_from_slice(links);
            }

            for &neighbor_idx in &neighbor_buffer {
                if !self.visited.mark(neighbor_idx) {
                    continue;
                }

                let dist = self.distance_to_node(query, neighbor_idx);
                let worst = results.peek().map(|c| c.dist).unwrap_or(f32::INFINITY);

                if results.len() < ef || dist < worst {
                    candidates.push(Reverse(Candidate {
                        idx: neighbor_idx,
                        dist,
                    }));
                    results.push(Candidate {
                        idx: neighbor_idx,
                        dist,
                    });
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<(usize, f32)> = results.into_iter().map(|c| (c.idx, c.dist)).collect();
        out.sort_unstable_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        out
    }

    /// Insert a vector; returns its document index (insertion order).
    pub fn insert(&mut self, vector: &[f32]) -> usize {
        debug_assert_eq!(vector.len(), self.dim);

        let top_layer = self.select_layer();
        let node_idx = self.nodes.len();
        self.vectors.extend_from_slice(vector);

        if node_idx == 0 {
            self.nodes.push(HnswNode {
                layers: vec![Vec::new(); top_layer + 1],
            });
            return node_idx;
        }

        // Link on every layer up to the node's top layer so the base layer
        // stays fully connected.
        let entry_point = 0;
        let mut node = HnswNode {
            layers: vec![Vec::new(); top_layer + 1],
        };
        for layer in 0..=top_layer {
            let found = self.search_layer(vector, entry_point, self.ef_construction, layer);
            node.layers[layer] = found
                .iter()
                .take(self.max_connections)
                .map(|(idx, _)| *idx)
                .collect();
        }
        self.nodes.push(node);

        for layer in 0..=top_layer {
            let neighbors = self.nodes[node_idx].layers[layer].clone();
            for neighbor_idx in neighbors {
                if layer >= self.nodes[neighbor_idx].layers.len() {
                    continue;
                }
                self.nodes[neighbor_idx].layers[layer].push(node_idx);
                if self.nodes[neighbor_idx].layers[layer].len() > self.max_connections * 2 {
                    self.prune_connections(neighbor_idx, layer);
                }
            }
        }

        node_idx
    }

    /// Drop the furthest connections of an over-linked node.
    fn prune_connections(&mut self, node_idx: usize, layer: usize) {
        let base = self.vector_of(node_idx).to_vec();
        let mut connections = self.nodes[node_idx].layers[layer].clone();
        connections.sort_by(|&a, &b| {
            let dist_a = vector::l2(&base, self.vector_of(a));
            let dist_b = vector::l2(&base, self.vector_of(b));
            dist_a.partial_cmp(&dist_b).unwrap_or(Ordering::Equal)
        });
        connections.truncate(self.max_connections * 2);
        self.nodes[node_idx].layers[layer] = connections;
    }

    /// Search for the `k` nearest documents.
    ///
    /// Returns `(document index, similarity)` pairs sorted by descending
    /// similarity, where similarity is `1 - cosine distance`.
    pub fn search(&mut self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        let ef = (k + k / 2).max(16);
        let entry_point = 0;

        // Upper-layer descent only pays off on larger graphs.
        if self.nodes.len() >= 1000 {
            let mut current_layer = self.max_layers - 1;
            while current_layer > 0 {
                if self
                    .search_layer(query, entry_point, 1, current_layer)
                    .is_empty()
                {
                    break;
                }
                current_layer -= 1;
            }
        }

        self.search_layer(query, entry_point, ef, 0)
            .into_iter()
            .take(k)
            .map(|(idx, dist)| (idx, 1.0 - dist))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(mut v: Vec<f32>) -> Vec<f32> {
        let norm = vector::norm(&v);
        for x in &mut v {
            *x /= norm;
        }
        v
    }

    #[test]
    fn test_insert_and_search() {
        let mut index = HnswIndex::new(3, 16, 3);
        for i in 0..10 {
            index.insert(&unit(vec![i as f32 + 1.0, 1.0, 1.0]));
        }
        assert_eq!(index.len(), 10);

        let query = unit(vec![5.0, 1.0, 1.0]);
        let results = index.search(&query, 3);
        assert_eq!(results.len(), 3);
        assert!(results[0].1 > 0.9);
    }

    #[test]
    fn test_results_sorted_by_descending_similarity() {
        let mut index = HnswIndex::new(4, 16, 3);
        for i in 0..20 {
            index.insert(&unit(vec![i as f32 + 1.0, 2.0, 1.0, 0.5]));
        }

        let query = unit(vec![3.0, 2.0, 1.0, 0.5]);
        let results = index.search(&query, 10);
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_search_caps_at_available_documents() {
        let mut index = HnswIndex::new(2, 16, 3);
        index.insert(&unit(vec![1.0, 0.0]));
        index.insert(&unit(vec![0.0, 1.0]));

        let results = index.search(&unit(vec![1.0, 0.5]), 10);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let mut index = HnswIndex::new(2, 16, 3);
        assert!(index.search(&[1.0, 0.0], 5).is_empty());
    }

    #[test]
    fn test_visited_set_generations() {
        let mut visited = VisitedSet::new(10);
        visited.reset(10);
        assert!(visited.mark(5));
        assert!(!visited.mark(5));

        visited.reset(10);
        assert!(visited.mark(5));
    }

    #[test]
    fn test_nearest_neighbor_is_exactish_on_small_sets() {
        let mut index = HnswIndex::new(2, 16, 3);
        index.insert(&unit(vec![1.0, 0.0]));
        index.insert(&unit(vec![0.0, 1.0]));
        index.insert(&unit(vec![1.0, 1.0]));

        let results = index.search(&unit(vec![0.9, 0.1]), 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, 0);
    }
}
