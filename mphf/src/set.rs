//! `MinimalSet`: a set over a minimal perfect hash's domain, backed by a dense bitset.

use bitm::{BitAccess, BitVec};
use dyn_size_of::GetSize;

use crate::error::{Error, Result};
use crate::hash::SeededHash;
use crate::minimal::Minimal;
use crate::stats::AccessStatsCollector;

/// A set over the domain of a [`Minimal`] hash, backed by one bit per domain key.
///
/// `contains`/`add`/`remove` all cost a single hash evaluation plus a bit test: there is no
/// hashing-to-bucket indirection beyond the minimal hash itself, since the hash value already
/// *is* the bit index.
pub struct MinimalSet<K, H> {
    minimal: Minimal<K, H>,
    bits: Box<[u64]>,
    len: usize,
}

impl<K: Clone + PartialEq, H: SeededHash<K> + Clone> MinimalSet<K, H> {
    pub(crate) fn new(minimal: Minimal<K, H>) -> Self {
        let len = minimal.range();
        Self { bits: Box::with_zeroed_bits(len), len, minimal }
    }

    /// The key at hash value `j`, or `None` if `e` isn't a member of the underlying domain.
    fn index_of(&self, e: &K) -> Option<usize> {
        let j = self.minimal.hash(e);
        let store = self.minimal.store();
        (j < self.len && &store[j] == e).then_some(j)
    }

    /// Adds `e` to the set, returning whether it was absent beforehand.
    ///
    /// Errors if `e` is not a member of the domain this set was built over — unlike
    /// `contains`/`remove`, there is no silent "not present" answer here, since a set that
    /// accepted foreign keys could never report them back through `contains`.
    pub fn add(&mut self, e: &K) -> Result<bool> {
        let j = self.index_of(e).ok_or_else(|| {
            Error::invalid_argument("key is not a member of this set's domain")
        })?;
        let was_clear = !self.bits.get_bit(j);
        self.bits.set_bit(j);
        Ok(was_clear)
    }

    /// Whether `e` is a member of this set. Keys outside the underlying domain simply read
    /// as absent, exactly like a foreign key in any `HashSet`-style container.
    pub fn contains(&self, e: &K) -> bool {
        self.contains_stats(e, &mut ())
    }

    /// As [`Self::contains`], reporting a single-level hit or miss to `access_stats` — every
    /// lookup through a minimal hash resolves in exactly one probe, unlike the multi-level
    /// fallback chains this crate's sibling MPHF containers report through the same trait.
    pub fn contains_stats<A: AccessStatsCollector>(&self, e: &K, access_stats: &mut A) -> bool {
        match self.index_of(e) {
            Some(j) if self.bits.get_bit(j) => {
                access_stats.found_on_level(0);
                true
            }
            _ => {
                access_stats.fail_on_level(0);
                false
            }
        }
    }

    /// Removes `e`, returning whether it had been present.
    pub fn remove(&mut self, e: &K) -> bool {
        match self.index_of(e) {
            Some(j) if self.bits.get_bit(j) => {
                self.bits.clear_bit(j);
                true
            }
            _ => false,
        }
    }

    /// Number of members currently set.
    pub fn size(&self) -> usize {
        self.bits.count_bit_ones()
    }

    /// Whether no member is currently set, independent of how many slots the underlying
    /// domain allocated.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether every domain member is currently set.
    pub fn is_full(&self) -> bool {
        self.size() == self.len
    }

    /// Sets every domain member as a member.
    pub fn fill(&mut self) -> &mut Self {
        for j in 0..self.len {
            self.bits.set_bit(j);
        }
        self
    }

    /// Clears every member.
    pub fn clear(&mut self) -> &mut Self {
        for j in 0..self.len {
            self.bits.clear_bit(j);
        }
        self
    }

    /// Iterates the members, in ascending hash-value order.
    ///
    /// Yields owned clones rather than borrows: the store backing these keys is reference
    /// counted internally (see [`crate::minimal::Store`]), so cloning it out per member is a
    /// cheap `Rc`-friendly choice for `K`, and it sidesteps tying the iterator's item lifetime
    /// to a store snapshot that the iterator itself, not `self`, actually owns.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        let store = self.minimal.store();
        self.bits.bit_ones().filter(|&j| j < self.len).map(move |j| store[j].clone())
    }

    /// Applies `f` to every member, in ascending hash-value order.
    pub fn for_each(&self, mut f: impl FnMut(&K)) {
        for k in self.iter() {
            f(&k);
        }
    }

    /// Removes every member for which `predicate` returns `true`.
    ///
    /// Non-reentrant with respect to the bitset being walked: `predicate` is evaluated
    /// against a fixed snapshot of the members present when this call started, and the matched
    /// positions are cleared only after the walk completes.
    pub fn remove_if(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        let store = self.minimal.store();
        let to_clear: Vec<usize> = self
            .bits
            .bit_ones()
            .filter(|&j| j < self.len && predicate(&store[j]))
            .collect();
        for j in &to_clear {
            self.bits.clear_bit(*j);
        }
        to_clear.len()
    }

    /// Identity: `self` is already mutable. Present for parity with [`Self::immutable`].
    pub fn mutable(self) -> Self {
        self
    }

    /// An independent mutable copy with the same members.
    pub fn mutable_copy(&self) -> Self {
        Self { minimal: self.minimal.clone(), bits: self.bits.clone(), len: self.len }
    }

    /// Consumes `self` into a read-only [`ImmutableSet`].
    pub fn immutable(self) -> ImmutableSet<K, H> {
        ImmutableSet { minimal: self.minimal, bits: self.bits, len: self.len }
    }

    /// A read-only snapshot of the current members, leaving `self` untouched.
    pub fn immutable_view(&self) -> ImmutableSet<K, H> {
        ImmutableSet { minimal: self.minimal.clone(), bits: self.bits.clone(), len: self.len }
    }
}

/// Dynamic memory is the backing bitset plus the shared minimal hash's own `g`-table; the
/// minimal hash is `Rc`-shared, so its contribution is divided across however many containers
/// currently reference it (see [`dyn_size_of::GetSize`]'s `Rc` impl).
impl<K, H: GetSize> GetSize for MinimalSet<K, H> {
    fn size_bytes_dyn(&self) -> usize {
        self.bits.size_bytes_dyn() + self.minimal.hasher().size_bytes_dyn()
    }
    fn size_bytes_content_dyn(&self) -> usize {
        self.bits.size_bytes_content_dyn() + self.minimal.hasher().size_bytes_content_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

/// A read-only view of a [`MinimalSet`]'s members. Has no mutating methods at all — attempting
/// to mutate through this type is rejected at compile time rather than by a runtime
/// `ContainerIntegrity` error, since Rust's ownership model already makes "immutable view"
/// a type-level guarantee instead of a runtime-checked one.
pub struct ImmutableSet<K, H> {
    minimal: Minimal<K, H>,
    bits: Box<[u64]>,
    len: usize,
}

impl<K: Clone + PartialEq, H: SeededHash<K> + Clone> ImmutableSet<K, H> {
    pub fn contains(&self, e: &K) -> bool {
        self.contains_stats(e, &mut ())
    }

    /// As [`Self::contains`], reporting a single-level hit or miss to `access_stats`.
    pub fn contains_stats<A: AccessStatsCollector>(&self, e: &K, access_stats: &mut A) -> bool {
        let j = self.minimal.hash(e);
        let store = self.minimal.store();
        if j < self.len && &store[j] == e && self.bits.get_bit(j) {
            access_stats.found_on_level(0);
            true
        } else {
            access_stats.fail_on_level(0);
            false
        }
    }

    pub fn size(&self) -> usize {
        self.bits.count_bit_ones()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn is_full(&self) -> bool {
        self.size() == self.len
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        let store = self.minimal.store();
        self.bits.bit_ones().filter(|&j| j < self.len).map(move |j| store[j].clone())
    }

    pub fn for_each(&self, mut f: impl FnMut(&K)) {
        for k in self.iter() {
            f(&k);
        }
    }

    /// An independent mutable copy, for when the caller does need to start mutating again.
    pub fn mutable_copy(&self) -> MinimalSet<K, H> {
        MinimalSet { minimal: self.minimal.clone(), bits: self.bits.clone(), len: self.len }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::DefaultHash;
    use rand_pcg::Pcg64;

    fn minimal_for(keys: &[&str]) -> Minimal<String, impl SeededHash<String> + Clone + GetSize> {
        let domain = crate::domain::PerfectDomain::over_iter(keys.iter().map(|s| s.to_string()));
        let mut perfectionist = domain.using(16, Pcg64::new(0xdead_beef, 1)).unwrap();
        let perfect = perfectionist
            .perfect(|s: &String, buf: &mut Vec<u8>| buf.extend_from_slice(s.as_bytes()))
            .unwrap();
        let _ = DefaultHash::sized(64); // keep DefaultHash import alive for doc-linking purposes
        perfect.minimized_with_rng(crate::bmz::BmzConf::default(), &mut Pcg64::new(1, 1)).unwrap()
    }

    #[test]
    fn add_contains_remove_round_trip() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut set = minimal.new_set();
        assert!(set.is_empty());

        let dog = "dog".to_string();
        assert!(set.add(&dog).unwrap());
        assert!(set.contains(&dog));
        assert!(!set.is_empty());

        assert!(set.remove(&dog));
        assert!(!set.contains(&dog));
    }

    #[test]
    fn add_rejects_foreign_key() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut set = minimal.new_set();
        assert!(set.add(&"giraffe".to_string()).is_err());
    }

    #[test]
    fn fill_and_iterate_covers_every_key() {
        let keys = ["ostrich", "dog", "snail", "centipede"];
        let minimal = minimal_for(&keys);
        let mut set = minimal.new_set();
        set.fill();
        assert!(set.is_full());
        let mut seen: Vec<String> = set.iter().collect();
        seen.sort();
        let mut expected: Vec<String> = keys.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn remove_if_clears_matching_members() {
        let keys = ["ostrich", "dog", "snail", "centipede"];
        let minimal = minimal_for(&keys);
        let mut set = minimal.new_set();
        set.fill();
        let removed = set.remove_if(|k| k.starts_with('c') || k.starts_with('s'));
        assert_eq!(removed, 2);
        assert!(set.contains(&"dog".to_string()));
        assert!(!set.contains(&"snail".to_string()));
        assert!(!set.contains(&"centipede".to_string()));
    }

    #[test]
    fn reports_its_own_size() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut set = minimal.new_set();
        set.fill();
        assert!(set.size_bytes_dyn() > 0);
    }

    #[test]
    fn contains_stats_reports_hits_and_misses() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut set = minimal.new_set();
        set.add(&"dog".to_string()).unwrap();

        let mut hits = 0u32;
        assert!(set.contains_stats(&"dog".to_string(), &mut hits));
        assert_eq!(hits, 1);

        let mut misses = 0u32;
        assert!(!set.contains_stats(&"snail".to_string(), &mut misses));
        assert_eq!(misses, 1);
    }

    #[test]
    fn immutable_view_shares_state_without_consuming() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut set = minimal.new_set();
        set.add(&"dog".to_string()).unwrap();
        let view = set.immutable_view();
        assert!(view.contains(&"dog".to_string()));
        assert!(set.contains(&"dog".to_string()));
    }
}
