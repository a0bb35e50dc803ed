use crate::backend::{AnnBackend, Neighbor};
use crate::embedding::normalize_in_place;
use crate::{Embedding, IndexConfig, Result, Space};
use ordered_float::OrderedFloat;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use smallvec::SmallVec;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

type Links = SmallVec<[usize; 32]>;

/// Fast bit vector for visited node tracking
/// Much faster than HashSet for dense integer sets
#[derive(Clone)]
struct VisitedSet {
    bits: Vec<u64>,
    generation: u64,
    generations: Vec<u64>,
}

impl VisitedSet {
    #[inline]
    fn new(capacity: usize) -> Self {
        let num_words = capacity.div_ceil(64);
        Self {
            bits: vec![0; num_words],
            generation: 1,
            generations: vec![0; num_words],
        }
    }

    /// Forget every visited node without touching the whole buffer
    #[inline]
    fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.generation = 1;
            self.bits.fill(0);
            self.generations.fill(0);
        }
    }

    #[inline]
    fn ensure_capacity(&mut self, capacity: usize) {
        let num_words = capacity.div_ceil(64);
        if num_words > self.bits.len() {
            self.bits.resize(num_words, 0);
            self.generations.resize(num_words, 0);
        }
    }

    /// Returns true if `idx` was not yet visited in this generation
    #[inline]
    fn insert(&mut self, idx: usize) -> bool {
        let word_idx = idx / 64;
        let mask = 1u64 << (idx % 64);

        if word_idx >= self.bits.len() {
            self.ensure_capacity(idx + 1);
        }

        if self.generations[word_idx] != self.generation {
            self.bits[word_idx] = 0;
            self.generations[word_idx] = self.generation;
        }

        let was_set = (self.bits[word_idx] & mask) != 0;
        self.bits[word_idx] |= mask;
        !was_set
    }

    #[cfg(test)]
    fn contains(&self, idx: usize) -> bool {
        let word_idx = idx / 64;
        if word_idx >= self.bits.len() || self.generations[word_idx] != self.generation {
            return false;
        }
        (self.bits[word_idx] & (1u64 << (idx % 64))) != 0
    }
}

/// Search candidate. Orders by distance, then by node index so that
/// equal distances resolve the same way on every run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Scored {
    dist: OrderedFloat<f32>,
    idx: usize,
}

impl Scored {
    #[inline]
    fn new(idx: usize, dist: f32) -> Self {
        Self {
            dist: OrderedFloat(dist),
            idx,
        }
    }
}

#[derive(Debug, Clone)]
struct HnswNode {
    /// Neighbor lists, one per level the node lives on
    layers: Vec<Links>,
}

/// HNSW graph over a fixed corpus.
///
/// Built once, then read-only: queries take `&self` and borrow scratch
/// visited sets from a pool, so one index can serve many threads.
pub struct HnswBackend {
    space: Space,
    dim: usize,
    /// Contiguous storage for all vectors (cache-friendly), normalized for cosine
    vectors: Vec<f32>,
    nodes: Vec<HnswNode>,
    entry_point: usize,
    max_level: usize,
    /// Max connections on upper layers
    m: usize,
    /// Max connections on layer 0
    max_m0: usize,
    ef_construction: usize,
    ef: usize,
    level_mult: f64,
    visited_pool: Mutex<Vec<VisitedSet>>,
}

impl HnswBackend {
    #[inline(always)]
    fn vector(&self, node_idx: usize) -> &[f32] {
        let start = node_idx * self.dim;
        &self.vectors[start..start + self.dim]
    }

    #[inline(always)]
    fn distance_to_node(&self, query: &[f32], node_idx: usize) -> f32 {
        self.space.distance(query, self.vector(node_idx))
    }

    #[inline]
    fn links(&self, node_idx: usize, layer: usize) -> &[usize] {
        self.nodes[node_idx]
            .layers
            .get(layer)
            .map(|l| l.as_slice())
            .unwrap_or(&[])
    }

    /// Exponentially decaying level assignment
    #[inline]
    fn random_level(rng: &mut StdRng, level_mult: f64) -> usize {
        let r: f64 = rng.random();
        (-(1.0 - r).ln() * level_mult).floor() as usize
    }

    /// Walk to the locally closest node on `layer` (ef = 1)
    fn greedy_closest(&self, query: &[f32], mut current: usize, layer: usize) -> usize {
        let mut current_dist = self.distance_to_node(query, current);
        loop {
            let mut changed = false;
            for &neighbor in self.links(current, layer) {
                let dist = self.distance_to_node(query, neighbor);
                if dist < current_dist {
                    current = neighbor;
                    current_dist = dist;
                    changed = true;
                }
            }
            if !changed {
                return current;
            }
        }
    }

    /// Beam search on one layer. Returns up to `ef` nodes by ascending distance.
    fn search_layer(
        &self,
        query: &[f32],
        entry_point: usize,
        ef: usize,
        layer: usize,
        visited: &mut VisitedSet,
    ) -> Vec<Scored> {
        visited.clear();
        visited.ensure_capacity(self.nodes.len());

        let capacity = ef.min(self.nodes.len());
        let mut candidates: BinaryHeap<Reverse<Scored>> = BinaryHeap::with_capacity(capacity);
        let mut results: BinaryHeap<Scored> = BinaryHeap::with_capacity(capacity + 1);

        let entry = Scored::new(entry_point, self.distance_to_node(query, entry_point));
        candidates.push(Reverse(entry));
        results.push(entry);
        visited.insert(entry_point);

        while let Some(Reverse(current)) = candidates.pop() {
            let worst = results.peek().map(|w| w.dist).unwrap_or(current.dist);
            if results.len() >= ef && current.dist > worst {
                break;
            }

            for &neighbor in self.links(current.idx, layer) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let next = Scored::new(neighbor, self.distance_to_node(query, neighbor));
                let worst = results.peek().map(|w| w.dist);
                if results.len() < ef || worst.is_some_and(|w| next.dist < w) {
                    candidates.push(Reverse(next));
                    results.push(next);
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        results.into_sorted_vec()
    }

    /// Add `node_idx` as a neighbor of `from`, shrinking the list to the
    /// closest `max_links` when it overflows
    fn link(&mut self, from: usize, node_idx: usize, layer: usize, max_links: usize) {
        self.nodes[from].layers[layer].push(node_idx);
        if self.nodes[from].layers[layer].len() <= max_links {
            return;
        }

        let base = self.vector(from);
        let mut scored: Vec<Scored> = self.nodes[from].layers[layer]
            .iter()
            .map(|&n| Scored::new(n, self.space.distance(base, self.vector(n))))
            .collect();
        scored.sort_unstable();
        scored.truncate(max_links);
        self.nodes[from].layers[layer] = scored.into_iter().map(|s| s.idx).collect();
    }

    /// Connect an already-stored node into the graph
    fn insert(&mut self, node_idx: usize, level: usize, visited: &mut VisitedSet) {
        if node_idx == 0 {
            self.entry_point = 0;
            self.max_level = level;
            return;
        }

        let query = self.vector(node_idx).to_vec();
        let mut entry = self.entry_point;

        for layer in (level + 1..=self.max_level).rev() {
            entry = self.greedy_closest(&query, entry, layer);
        }

        for layer in (0..=level.min(self.max_level)).rev() {
            let candidates = self.search_layer(&query, entry, self.ef_construction, layer, visited);
            let max_links = if layer == 0 { self.max_m0 } else { self.m };

            let neighbors: Links = candidates
                .iter()
                .filter(|c| c.idx != node_idx)
                .take(self.m)
                .map(|c| c.idx)
                .collect();

            for &neighbor in &neighbors {
                self.link(neighbor, node_idx, layer, max_links);
            }
            self.nodes[node_idx].layers[layer] = neighbors;

            if let Some(closest) = candidates.first() {
                entry = closest.idx;
            }
        }

        if level > self.max_level {
            self.max_level = level;
            self.entry_point = node_idx;
        }
    }

    /// k nearest neighbors of an already-normalized query
    fn search(&self, query: &[f32], k: usize, visited: &mut VisitedSet) -> Vec<Neighbor> {
        // a beam wider than the graph visits nothing extra
        let k = k.min(self.nodes.len());
        let ef = self.ef.max(k).min(self.nodes.len());

        let mut entry = self.entry_point;
        for layer in (1..=self.max_level).rev() {
            entry = self.greedy_closest(query, entry, layer);
        }

        self.search_layer(query, entry, ef, 0, visited)
            .into_iter()
            .take(k)
            .map(|s| Neighbor::new(s.idx, s.dist.into_inner()))
            .collect()
    }

    fn with_visited<R>(&self, f: impl FnOnce(&mut VisitedSet) -> R) -> R {
        let mut visited = self
            .visited_pool
            .lock()
            .pop()
            .unwrap_or_else(|| VisitedSet::new(self.nodes.len()));
        let result = f(&mut visited);
        self.visited_pool.lock().push(visited);
        result
    }

    /// Highest layer of the graph
    #[inline]
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.max_level
    }
}

impl AnnBackend for HnswBackend {
    fn build(embeddings: &[Embedding], space: Space, config: &IndexConfig) -> Result<Self> {
        config.validate()?;
        let dim = embeddings.first().map(Embedding::dim).unwrap_or(0);

        let mut vectors = Vec::with_capacity(embeddings.len() * dim);
        for embedding in embeddings {
            let start = vectors.len();
            vectors.extend_from_slice(embedding.as_slice());
            if space.normalizes() {
                normalize_in_place(&mut vectors[start..]);
            }
        }

        let m = config.m;
        let mut index = Self {
            space,
            dim,
            vectors,
            nodes: Vec::with_capacity(embeddings.len()),
            entry_point: 0,
            max_level: 0,
            m,
            max_m0: m * 2,
            ef_construction: config.ef_construction,
            ef: config.search_breadth,
            level_mult: 1.0 / (m as f64).ln(),
            visited_pool: Mutex::new(Vec::new()),
        };

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut visited = VisitedSet::new(embeddings.len());
        for node_idx in 0..embeddings.len() {
            let level = Self::random_level(&mut rng, index.level_mult);
            index.nodes.push(HnswNode {
                layers: vec![Links::new(); level + 1],
            });
            index.insert(node_idx, level, &mut visited);
        }
        index.visited_pool.lock().push(visited);

        Ok(index)
    }

    fn set_query_quality(&mut self, search_breadth: usize) {
        self.ef = search_breadth;
    }

    fn knn_query(&self, queries: &[Embedding], k: usize) -> Vec<Vec<Neighbor>> {
        if self.nodes.is_empty() || k == 0 {
            return vec![Vec::new(); queries.len()];
        }

        queries
            .par_iter()
            .map(|query| {
                let mut q = query.as_slice().to_vec();
                if self.space.normalizes() {
                    normalize_in_place(&mut q);
                }
                self.with_visited(|visited| self.search(&q, k, visited))
            })
            .collect()
    }

    #[inline]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    fn space(&self) -> Space {
        self.space
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat::FlatBackend;

    fn grid(n: usize) -> Vec<Embedding> {
        (0..n)
            .map(|i| {
                let x = (i % 17) as f32;
                let y = (i / 17) as f32;
                Embedding::new(vec![x, y, (x * y).sin(), 1.0])
            })
            .collect()
    }

    #[test]
    fn test_hnsw_build_search() {
        let corpus = grid(10);
        let index = HnswBackend::build(&corpus, Space::Euclidean, &IndexConfig::default()).unwrap();
        assert_eq!(index.len(), 10);
        assert_eq!(index.dim(), 4);

        let rows = index.knn_query(&corpus[3..4], 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][0].id, 3);
        assert!(rows[0][0].distance.abs() < 1e-6);
    }

    #[test]
    fn test_hnsw_fewer_than_k() {
        let corpus = grid(4);
        let index = HnswBackend::build(&corpus, Space::Cosine, &IndexConfig::default()).unwrap();
        let rows = index.knn_query(&corpus[..2], 10);
        assert_eq!(rows[0].len(), 4);
        assert_eq!(rows[1].len(), 4);
    }

    #[test]
    fn test_hnsw_huge_k_returns_whole_corpus() {
        let corpus = grid(2);
        let index = HnswBackend::build(&corpus, Space::Cosine, &IndexConfig::default()).unwrap();
        let rows = index.knn_query(&corpus[..1], usize::MAX);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[0][0].id, 0);
    }

    #[test]
    fn test_hnsw_k_above_search_breadth() {
        let corpus = grid(40);
        let config = IndexConfig { search_breadth: 2, ..IndexConfig::default() };
        let hnsw = HnswBackend::build(&corpus, Space::Euclidean, &config).unwrap();
        let flat = FlatBackend::build(&corpus, Space::Euclidean, &config).unwrap();

        let queries: Vec<Embedding> = corpus.iter().step_by(9).cloned().collect();
        let approx = hnsw.knn_query(&queries, 10);
        let exact = flat.knn_query(&queries, 10);
        for (a, e) in approx.iter().zip(&exact) {
            assert_eq!(a.len(), 10);
            assert_eq!(a[0].id, e[0].id);
            let worst = e[9].distance;
            let hits = a.iter().filter(|n| n.distance <= worst + 1e-4).count();
            assert!(hits >= 9);
        }
    }

    #[test]
    fn test_hnsw_build_validates_config() {
        let corpus = grid(3);
        let config = IndexConfig { m: 1, ..IndexConfig::default() };
        assert!(matches!(
            HnswBackend::build(&corpus, Space::Cosine, &config),
            Err(crate::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_hnsw_recall_against_flat() {
        let corpus = grid(300);
        let config = IndexConfig::default();
        let hnsw = HnswBackend::build(&corpus, Space::Euclidean, &config).unwrap();
        let flat = FlatBackend::build(&corpus, Space::Euclidean, &config).unwrap();

        let queries: Vec<Embedding> = corpus.iter().step_by(7).cloned().collect();
        let approx = hnsw.knn_query(&queries, 10);
        let exact = flat.knn_query(&queries, 10);

        let mut hits = 0;
        let mut total = 0;
        for (a, e) in approx.iter().zip(&exact) {
            let worst = e.last().map(|n| n.distance).unwrap_or(0.0);
            hits += a.iter().filter(|n| n.distance <= worst + 1e-4).count();
            total += e.len();
        }
        assert!(hits as f32 / total as f32 >= 0.9);
    }

    #[test]
    fn test_hnsw_is_deterministic_for_seed() {
        let corpus = grid(120);
        let config = IndexConfig::default();
        let a = HnswBackend::build(&corpus, Space::Cosine, &config).unwrap();
        let b = HnswBackend::build(&corpus, Space::Cosine, &config).unwrap();
        assert_eq!(a.max_level(), b.max_level());
        assert_eq!(a.knn_query(&corpus[5..9], 5), b.knn_query(&corpus[5..9], 5));
    }

    #[test]
    fn test_visited_set() {
        let mut vs = VisitedSet::new(100);

        assert!(!vs.contains(5));
        assert!(vs.insert(5));
        assert!(vs.contains(5));
        assert!(!vs.insert(5));

        vs.clear();
        assert!(!vs.contains(5));
        assert!(vs.insert(5));

        // grows on demand
        assert!(vs.insert(1000));
        assert!(vs.contains(1000));
    }
}
