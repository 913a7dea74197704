//! The BMZ minimal-perfect-hash constructor (Botelho, Menoyo, Ziviani).
//!
//! Builds a bipartite hash graph over the domain, peels it down to its critical core,
//! assigns conflict-free integers to the critical vertices, then fills the rest by BFS.
//! Retries with fresh seeds on duplicate edges or assignment conflicts, bounded by
//! [`BmzConf::max_attempts`].

use std::collections::{HashSet, VecDeque};

use bitm::{BitAccess, BitVec};
use rand::Rng;
use seedable_hash::{map64_to_64, BuildDefaultSeededHasher, BuildSeededHasher};

use dyn_size_of::GetSize;

use crate::error::{Error, Result};
use crate::hash::SeededHash;
use crate::stats::BuildStatsCollector;

/// Tunables for [`build`]: `c` is the slack ratio (vertex count = `ceil(c * n)`),
/// `max_attempts` bounds the number of seed retries before giving up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BmzConf {
    pub max_attempts: u32,
    pub c: f64,
}

impl Default for BmzConf {
    fn default() -> Self {
        Self { max_attempts: 100, c: 1.15 }
    }
}

/// A minimal perfect hash over some domain `K`, derived from a perfect base hasher `H`
/// by the BMZ construction. `hash` is total over `K` only when `K` is drawn from the
/// domain this was built for; behaviour on foreign keys is unspecified (as for any MPHF).
#[derive(Clone)]
pub struct BmzHash<H> {
    h0: H,
    seed1: u32,
    seed2: u32,
    n: usize,
    cap: usize,
    g: Box<[u32]>,
}

impl<H> BmzHash<H> {
    /// The size of the hash's range, `[0, n)`.
    pub fn range(&self) -> usize {
        self.n
    }

    /// Computes the minimal hash of `key`. `H` must be the same hasher family (though not
    /// necessarily the same instance) that [`build`] was called with.
    pub fn hash<K>(&self, key: &K) -> usize
    where
        H: SeededHash<K>,
    {
        if self.n == 0 {
            return 0;
        }
        let (a, b) = self.edge(key);
        self.g[a].wrapping_add(self.g[b]) as usize
    }

    fn edge<K>(&self, key: &K) -> (usize, usize)
    where
        H: SeededHash<K>,
    {
        let hv = self.h0.int_hash(key);
        let builder = BuildDefaultSeededHasher::default();
        let a = hash_to_vertex(&builder, hv, self.seed1, self.cap);
        let mut b = hash_to_vertex(&builder, hv, self.seed2, self.cap);
        if a == b {
            b = if b == self.cap - 1 { 0 } else { b + 1 };
        }
        (a, b)
    }
}

impl<H: GetSize> GetSize for BmzHash<H> {
    fn size_bytes_dyn(&self) -> usize {
        self.g.size_bytes_dyn() + self.h0.size_bytes_dyn()
    }
    fn size_bytes_content_dyn(&self) -> usize {
        self.g.size_bytes_content_dyn() + self.h0.size_bytes_content_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

#[inline]
fn hash_to_vertex(builder: &BuildDefaultSeededHasher, key_hash: u64, seed: u32, n_vertices: usize) -> usize {
    let mixed = builder.hash_one(&key_hash, seed);
    map64_to_64(mixed, n_vertices as u64) as usize
}

/// Takes the lowest index not yet marked in `used` at or after `*cursor`, marks it, and
/// advances `*cursor` past it. `used` and `cursor` together implement a "lowest unset bit"
/// search in amortised-linear rather than rescan-per-call time: the cursor never needs to
/// move backward, since bits are only ever set, never cleared.
fn take_next_free(used: &mut [u64], cursor: &mut usize, n: usize) -> Option<usize> {
    while *cursor < n && used.get_bit(*cursor) {
        *cursor += 1;
    }
    if *cursor >= n {
        return None;
    }
    let r = *cursor;
    used.set_bit(r);
    Some(r)
}

/// As [`build_with_stats`], reporting to no collector at all.
pub fn build<K, H>(keys: &[K], h0: &H, conf: BmzConf, rng: &mut impl Rng) -> Result<BmzHash<H>>
where
    H: SeededHash<K> + Clone,
{
    build_with_stats(keys, h0, conf, rng, &mut ())
}

/// Runs the BMZ construction over `keys`, using `h0` (already verified perfect over the
/// domain) as the base hash feeding the bipartite graph's two vertex hashes.
///
/// Reports one `stats.level(n, cap)` call per attempt made (successful or not) and a final
/// `stats.end()` once the construction either succeeds or exhausts `conf.max_attempts`,
/// mirroring the per-level reporting convention of this crate's sibling MPHF builders.
pub fn build_with_stats<K, H, BS: BuildStatsCollector>(
    keys: &[K],
    h0: &H,
    conf: BmzConf,
    rng: &mut impl Rng,
    stats: &mut BS,
) -> Result<BmzHash<H>>
where
    H: SeededHash<K> + Clone,
{
    if conf.c < 1.0 {
        return Err(Error::invalid_argument("BmzConf::c must be >= 1.0"));
    }
    if conf.max_attempts < 1 {
        return Err(Error::invalid_argument("BmzConf::max_attempts must be >= 1"));
    }

    let n = keys.len();
    if n == 0 {
        return Ok(BmzHash { h0: h0.clone(), seed1: 0, seed2: 0, n: 0, cap: 0, g: Box::new([]) });
    }

    let base_hashes: Vec<u64> = keys.iter().map(|k| h0.int_hash(k)).collect();
    let builder = BuildDefaultSeededHasher::default();
    let cap = ((conf.c * n as f64).ceil() as usize).max(2);

    'attempt: for _ in 0..conf.max_attempts {
        stats.level(n, cap);
        let seed1: u32 = rng.gen();
        let seed2: u32 = rng.gen();

        let mut adjacency: Vec<Vec<(u32, u32)>> = vec![Vec::new(); cap];
        let mut seen_pairs: HashSet<(u32, u32)> = HashSet::with_capacity(n);

        for (i, &hv) in base_hashes.iter().enumerate() {
            let a = hash_to_vertex(&builder, hv, seed1, cap);
            let mut b = hash_to_vertex(&builder, hv, seed2, cap);
            if a == b {
                b = if b == cap - 1 { 0 } else { b + 1 };
            }
            let pair = if a < b { (a as u32, b as u32) } else { (b as u32, a as u32) };
            if !seen_pairs.insert(pair) {
                continue 'attempt;
            }
            adjacency[a].push((b as u32, i as u32));
            adjacency[b].push((a as u32, i as u32));
        }

        // Iterative degree-1 peeling: whatever remains unprocessed with positive residual
        // degree is critical (BMZ's terminology for "inside a cycle of the hash graph").
        let mut degree: Vec<u32> = adjacency.iter().map(|a| a.len() as u32).collect();
        let mut edge_active = vec![true; n];
        let mut processed = vec![false; cap];
        let mut queue: VecDeque<u32> = (0..cap as u32).filter(|&v| degree[v as usize] == 1).collect();

        while let Some(v) = queue.pop_front() {
            let v = v as usize;
            if processed[v] || degree[v] != 1 {
                continue;
            }
            processed[v] = true;
            if let Some(&(u, e)) = adjacency[v].iter().find(|&&(_, e)| edge_active[e as usize]) {
                edge_active[e as usize] = false;
                degree[v] = 0;
                degree[u as usize] -= 1;
                if degree[u as usize] == 1 && !processed[u as usize] {
                    queue.push_back(u);
                }
            }
        }

        let critical: Vec<bool> = (0..cap).map(|v| !processed[v] && degree[v] > 0).collect();
        let critical_count = critical.iter().filter(|&&c| c).count();

        // Step 4: conflict-free assignment over the critical subgraph.
        let mut g: Vec<u32> = vec![0u32; cap];
        let mut vertex_assigned = vec![false; cap];
        let mut edge_value_used = Box::<[u64]>::with_zeroed_bits(n);
        let mut next_candidate: u32 = 0;
        let mut assigned_critical_count = 0usize;
        let mut conflict = false;

        'critical_components: while assigned_critical_count < critical_count {
            let root = match (0..cap).find(|&v| critical[v] && !vertex_assigned[v]) {
                Some(r) => r,
                None => break,
            };

            g[root] = next_candidate;
            vertex_assigned[root] = true;
            assigned_critical_count += 1;
            next_candidate += 1;

            let mut bfs: VecDeque<usize> = VecDeque::new();
            bfs.push_back(root);

            while let Some(v) = bfs.pop_front() {
                for &(u, e) in &adjacency[v] {
                    let u = u as usize;
                    if !critical[u] || !edge_active[e as usize] || vertex_assigned[u] {
                        continue;
                    }

                    let assigned_neighbours: Vec<u32> = adjacency[u]
                        .iter()
                        .filter(|&&(w, ew)| edge_active[ew as usize] && vertex_assigned[w as usize])
                        .map(|&(w, _)| g[w as usize])
                        .collect();

                    let mut x = next_candidate;
                    let found = loop {
                        if (x as usize) >= 2 * n + 64 {
                            break None;
                        }
                        let ok = assigned_neighbours.iter().all(|&gu| {
                            let value = gu.wrapping_add(x);
                            (value as usize) < n && !edge_value_used.get_bit(value as usize)
                        });
                        if ok {
                            break Some(x);
                        }
                        x += 1;
                    };

                    let Some(x) = found else {
                        conflict = true;
                        break 'critical_components;
                    };

                    g[u] = x;
                    vertex_assigned[u] = true;
                    assigned_critical_count += 1;
                    next_candidate = x + 1;
                    for &gu in &assigned_neighbours {
                        edge_value_used.set_bit(gu.wrapping_add(x) as usize);
                    }
                    bfs.push_back(u);
                }
            }
        }

        if conflict {
            continue 'attempt;
        }

        // Step 5: fill every remaining vertex by BFS, first from the critical frontier,
        // then from any leftover component root (pure-tree components with no critical
        // vertex at all, including the common small-n case).
        let mut visited = vertex_assigned;
        let mut cursor = 0usize;
        let mut queue2: VecDeque<usize> = (0..cap).filter(|&v| visited[v]).collect();

        'fill: loop {
            while let Some(v) = queue2.pop_front() {
                for &(u, _e) in &adjacency[v] {
                    let u = u as usize;
                    if visited[u] {
                        continue;
                    }
                    let Some(next_edge) = take_next_free(&mut edge_value_used, &mut cursor, n) else {
                        conflict = true;
                        break 'fill;
                    };
                    g[u] = (next_edge as u32).wrapping_sub(g[v]);
                    visited[u] = true;
                    queue2.push_back(u);
                }
            }

            match (0..cap).find(|&v| !visited[v] && !adjacency[v].is_empty()) {
                Some(root) => {
                    g[root] = 0;
                    visited[root] = true;
                    queue2.push_back(root);
                }
                None => break,
            }
        }

        if conflict {
            continue 'attempt;
        }

        stats.end();
        return Ok(BmzHash { h0: h0.clone(), seed1, seed2, n, cap, g: g.into_boxed_slice() });
    }

    stats.end();
    Err(Error::perfection_failure(format!(
        "failed to find minimal hash after {} attempts",
        conf.max_attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::DefaultHash;
    use rand_pcg::Pcg64;

    fn minimal_hash_is_bijective(keys: &[&str]) {
        let h0 = DefaultHash::sized(64);
        let mut rng = Pcg64::new(0xcafef00dd15ea5e5, 0xa02bdbf7bb3c0a7);
        let bmz = build(keys, &h0, BmzConf::default(), &mut rng).expect("construction should succeed");
        assert_eq!(bmz.range(), keys.len());
        let mut seen = vec![false; keys.len()];
        for k in keys {
            let h = bmz.hash(k);
            assert!(h < keys.len());
            assert!(!seen[h], "hash value {h} produced twice");
            seen[h] = true;
        }
        assert!(seen.into_iter().all(|b| b));
    }

    #[test]
    fn small_domain() {
        minimal_hash_is_bijective(&["Tom", "Astrid", "Joy", "Magnus", "Horse", "Cow", "Crow", "Spoon"]);
    }

    #[test]
    fn singleton_domain() {
        minimal_hash_is_bijective(&["Alice"]);
    }

    #[test]
    fn five_keys() {
        minimal_hash_is_bijective(&["Dog", "Cat", "Horse", "Goat", "Llama"]);
    }

    #[test]
    fn empty_domain() {
        let h0 = DefaultHash::sized(64);
        let mut rng = Pcg64::new(1, 1);
        let keys: [&str; 0] = [];
        let bmz = build(&keys, &h0, BmzConf::default(), &mut rng).unwrap();
        assert_eq!(bmz.range(), 0);
    }

    #[test]
    fn rejects_bad_conf() {
        let h0 = DefaultHash::sized(64);
        let mut rng = Pcg64::new(1, 1);
        let keys = ["a", "b"];
        assert!(build(&keys, &h0, BmzConf { max_attempts: 10, c: 0.5 }, &mut rng).is_err());
        assert!(build(&keys, &h0, BmzConf { max_attempts: 0, c: 1.15 }, &mut rng).is_err());
    }

    #[test]
    fn reports_its_own_size() {
        let h0 = DefaultHash::sized(64);
        let mut rng = Pcg64::new(3, 3);
        let keys = ["Tom", "Astrid", "Joy", "Magnus"];
        let bmz = build(&keys, &h0, BmzConf::default(), &mut rng).unwrap();
        assert!(bmz.size_bytes_dyn() >= keys.len() * std::mem::size_of::<u32>());
    }

    #[test]
    fn moderately_large_domain() {
        let keys: Vec<u64> = (0..5000u64).collect();
        let h0 = DefaultHash::sized(64);
        let mut rng = Pcg64::new(42, 7);
        let bmz = build(&keys, &h0, BmzConf::default(), &mut rng).expect("construction should succeed");
        let mut seen = vec![false; keys.len()];
        for k in &keys {
            let h = bmz.hash(k);
            assert!(h < keys.len());
            assert!(!seen[h]);
            seen[h] = true;
        }
    }
}
