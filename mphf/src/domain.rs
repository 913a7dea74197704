//! `PerfectDomain`: the finite key collection that every other construction in this crate
//! verifies hashes against.

use std::rc::Rc;

use bitm::{BitAccess, BitVec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::hash::SeededHash;
use crate::perfectionist::{Perfectionist, PerfectionistConf};
use crate::uniqueness;

/// A finite, deduplicated-by-contract set of keys.
///
/// Keys are held in an [`Rc<[K]>`] rather than a `Vec<K>` so that [`PerfectDomain`] is cheap
/// to clone: every downstream stage (`Perfectionist`, `Perfect`, `Minimal`) owns its own handle
/// to the same backing storage instead of borrowing it, which keeps this crate's public types
/// free of lifetime parameters. Perfection is always checked against what's actually present in
/// `keys` — this type never assumes its caller deduplicated upstream; a domain containing
/// duplicates simply never reports `is_perfect` as true for any candidate hasher.
#[derive(Clone)]
pub struct PerfectDomain<K> {
    keys: Rc<[K]>,
    type_tag: Option<&'static str>,
}

impl<K> PerfectDomain<K> {
    /// Builds a domain from an owned vector, consuming it.
    pub fn over_vec(keys: Vec<K>) -> Self {
        Self { keys: keys.into(), type_tag: Some(std::any::type_name::<K>()) }
    }

    /// Builds a domain from any iterable, collecting it once.
    pub fn over_iter(keys: impl IntoIterator<Item = K>) -> Self {
        Self::over_vec(keys.into_iter().collect())
    }

    /// Builds a domain from a borrowed slice, cloning each element.
    pub fn over_slice(keys: &[K]) -> Self
    where
        K: Clone,
    {
        Self::over_vec(keys.to_vec())
    }

    /// The domain's keys, in the order they were supplied.
    pub fn values(&self) -> &[K] {
        self.keys.as_ref()
    }

    /// `n`, the number of keys in the domain (not deduplicated — see the struct docs).
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    /// The element type's name, recorded for diagnostics.
    pub fn type_tag(&self) -> Option<&'static str> {
        self.type_tag
    }

    /// Checks whether `hasher` is injective over this domain.
    ///
    /// Below a 16-bit range, a dense bit vector over the whole range costs at most 8 KiB and
    /// settles the question in a single pass with no false positives of any kind. Above that,
    /// the same dense vector would cost too much memory to be worth allocating, so this falls
    /// back to the Bloom-assisted two-pass check over each key's wide digest (`big_hash`),
    /// sized for a `(range_bits+31)/32*4 + 11`-byte-wide value — the width a dense encoding of
    /// that same range would have needed.
    pub fn is_perfect<H: SeededHash<K>>(&self, hasher: &H) -> bool {
        let range_bits = hasher.range_bits();
        if range_bits <= 16 {
            let size = 1usize << range_bits;
            let mut seen = Box::<[u64]>::with_zeroed_bits(size);
            for k in &self.keys {
                let h = hasher.int_hash(k) as usize;
                if h >= size || seen.get_bit(h) {
                    return false;
                }
                seen.set_bit(h);
            }
            true
        } else {
            let avg_bytes = ((range_bits as usize + 31) / 32) * 4 + 11;
            let keys = &self.keys;
            uniqueness::all_distinct(|| keys.iter().map(|k| hasher.big_hash(k)), keys.len(), avg_bytes)
        }
    }

    /// Checks whether the byte sequences `serialize` produces for each key are all distinct.
    /// Used by [`Perfectionist::perfect`] to fail fast when no seed could ever make the
    /// composed hash injective.
    pub fn is_injective(&self, serialize: impl Fn(&K, &mut Vec<u8>)) -> bool {
        let keys = &self.keys;
        uniqueness::all_distinct(
            || keys.iter().map(|k| { let mut buf = Vec::new(); serialize(k, &mut buf); buf }),
            keys.len(),
            50,
        )
    }

    /// Returns a [`Perfectionist`] that draws seeds from `rng`, trying at most
    /// `max_seed_attempts` candidates before giving up.
    pub fn using<R: Rng>(&self, max_seed_attempts: u32, rng: R) -> Result<Perfectionist<K, R>>
    where
        K: Clone,
    {
        if max_seed_attempts < 1 {
            return Err(Error::invalid_argument("max_seed_attempts must be >= 1"));
        }
        Ok(Perfectionist::new(self.clone(), PerfectionistConf { max_seed_attempts }, rng))
    }

    /// Convenience over [`Self::using`] with [`PerfectionistConf::default`] and an
    /// entropy-seeded [`StdRng`].
    pub fn using_defaults(&self) -> Perfectionist<K, StdRng>
    where
        K: Clone,
    {
        Perfectionist::new(self.clone(), PerfectionistConf::default(), StdRng::from_entropy())
    }
}
