//! Two-pass, Bloom-assisted duplicate detection over arbitrary iterables.
//!
//! See [`crate::domain::PerfectDomain::is_perfect`] and
//! [`crate::domain::PerfectDomain::is_injective`], the two callers of [`all_distinct`].

use std::collections::HashSet;
use std::hash::Hash;

use bitm::{BitAccess, BitVec};

use crate::hash::{DefaultHash, SeededHash};

/// Size of the Bloom filter (in bits, rounded up to a whole number of 64-bit words) and the
/// number of probe positions per item, chosen to minimise the false-positive rate at roughly
/// one bit per object-byte of density, with a 256-bit floor against pathological small `n`.
fn bloom_params(n: usize, avg_item_bytes: usize) -> (usize, u32) {
    let ln2 = std::f64::consts::LN_2;
    let density = 8.0 * (avg_item_bytes.max(1) as f64) * ln2 * ln2;
    let raw_m = (n.max(1) as f64) * density.ln() / ln2;
    let m_bits = raw_m.max(256.0).ceil() as usize;
    let m_bits = bitm::ceiling_div(m_bits, 64) * 64;
    let k = ((ln2 * m_bits as f64 / n.max(1) as f64).round() as u32).max(1);
    (m_bits, k)
}

/// A fixed-size Bloom filter over items whose positions are derived from two independent hashes
/// (Kirsch–Mitzenmacher double hashing): `position_i = (h1 + i * h2) mod m`.
struct Bloom {
    bits: Box<[u64]>,
    m_bits: usize,
    k: u32,
    h1: DefaultHash,
    h2: DefaultHash,
}

impl Bloom {
    fn new(n: usize, avg_item_bytes: usize) -> Self {
        let (m_bits, k) = bloom_params(n, avg_item_bytes);
        Self {
            bits: Box::with_zeroed_bits(m_bits),
            m_bits,
            k,
            h1: DefaultHash::sized(64),
            h2: DefaultHash::sized(64).reseed(1),
        }
    }

    fn positions<T: Hash>(&self, item: &T) -> impl Iterator<Item = usize> + '_ {
        use crate::hash::Reseed;
        let h1 = SeededHash::<T>::int_hash(&self.h1, item);
        let mut h2 = SeededHash::<T>::int_hash(&self.h2, item);
        if h2 == 0 { h2 = 1; } // avoid a degenerate all-zero stride
        (0..self.k).map(move |i| ((h1.wrapping_add((i as u64).wrapping_mul(h2))) as usize) % self.m_bits)
    }

    /// Marks `item` as seen, returning whether it already looked present beforehand
    /// (i.e. a candidate for being a true duplicate).
    fn insert_and_test<T: Hash>(&mut self, item: &T) -> bool {
        let positions: Vec<usize> = self.positions(item).collect();
        let already_present = positions.iter().all(|&p| self.bits.get_bit(p));
        for p in positions {
            self.bits.set_bit(p);
        }
        already_present
    }
}

/// Returns `true` if and only if every item yielded by `source()` is distinct, calling `source`
/// exactly twice (it must yield the same sequence both times).
///
/// `n` is the expected item count and `avg_item_bytes` the average item size in bytes; both only
/// affect the size of the transient Bloom filter, never correctness (no false negatives are possible:
/// the Bloom filter only ever grows the candidate set, and every candidate is confirmed by a
/// second, exact pass).
pub fn all_distinct<T, I>(mut source: impl FnMut() -> I, n: usize, avg_item_bytes: usize) -> bool
where
    T: Hash + Eq + Clone,
    I: Iterator<Item = T>,
{
    let mut bloom = Bloom::new(n, avg_item_bytes);
    let mut candidates: HashSet<T> = HashSet::new();
    for item in source() {
        if bloom.insert_and_test(&item) {
            if !candidates.insert(item) {
                return false;
            }
        }
    }

    let mut witnesses: HashSet<T> = HashSet::new();
    for item in source() {
        if candidates.contains(&item) {
            if !witnesses.insert(item) {
                return false;
            }
        }
    }

    true
}
