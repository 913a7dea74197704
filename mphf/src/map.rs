//! `MinimalMap`: a map over a minimal perfect hash's domain, backed by a dense slot array.

use dyn_size_of::GetSize;

use crate::error::{Error, Result};
use crate::hash::SeededHash;
use crate::minimal::Minimal;
use crate::stats::AccessStatsCollector;

/// A map over the domain of a [`Minimal`] hash, backed by one slot per domain key.
///
/// Without a configured default value, a slot is *absent* until `put`. With one (see
/// [`Minimal::new_map_with_default`]), every key is always present — `size()` is always `n`,
/// and `remove` resets the slot to the default rather than emptying it, which suits
/// primitive-valued maps that would otherwise box every entry just to represent absence.
pub struct MinimalMap<K, H, V> {
    minimal: Minimal<K, H>,
    slots: Vec<Option<V>>,
    default: Option<V>,
    present: usize,
}

impl<K: Clone + PartialEq, H: SeededHash<K> + Clone, V> MinimalMap<K, H, V> {
    pub(crate) fn new(minimal: Minimal<K, H>) -> Self {
        let n = minimal.range();
        Self { slots: (0..n).map(|_| None).collect(), default: None, minimal, present: 0 }
    }

    pub(crate) fn with_default(minimal: Minimal<K, H>, default: V) -> Self
    where
        V: Clone,
    {
        let n = minimal.range();
        let present = n;
        Self { slots: (0..n).map(|_| Some(default.clone())).collect(), default: Some(default), minimal, present }
    }

    fn slot_index(&self, k: &K) -> Result<usize> {
        let j = self.minimal.hash(k);
        let store = self.minimal.store();
        if j >= self.slots.len() || &store[j] != k {
            return Err(Error::invalid_argument("key is not a member of this map's domain"));
        }
        Ok(j)
    }

    fn slot_index_opt(&self, k: &K) -> Option<usize> {
        let j = self.minimal.hash(k);
        let store = self.minimal.store();
        (j < self.slots.len() && &store[j] == k).then_some(j)
    }

    /// The value mapped to `k`, or `None` if `k` is absent (or not a member of the domain).
    pub fn get(&self, k: &K) -> Option<&V> {
        self.get_stats(k, &mut ())
    }

    /// As [`Self::get`], reporting a single-level hit or miss to `access_stats` — every lookup
    /// through a minimal hash resolves in exactly one probe, so there is only ever level `0` to report.
    pub fn get_stats<A: AccessStatsCollector>(&self, k: &K, access_stats: &mut A) -> Option<&V> {
        match self.slot_index_opt(k).and_then(|j| self.slots[j].as_ref()) {
            Some(v) => {
                access_stats.found_on_level(0);
                Some(v)
            }
            None => {
                access_stats.fail_on_level(0);
                None
            }
        }
    }

    /// Maps `k` to `v`, returning the previous value (if any). Errors if `k` is not a member
    /// of this map's domain — a silent no-op here would make the map's `size()` lie.
    pub fn put(&mut self, k: &K, v: V) -> Result<Option<V>> {
        let j = self.slot_index(k)?;
        let old = self.slots[j].replace(v);
        if old.is_none() {
            self.present += 1;
        }
        Ok(old)
    }

    /// As [`Self::put`], but accepts an absent value explicitly instead of requiring the
    /// caller to pick between `put` and `remove`.
    ///
    /// A default-value map reinterprets `None` as `remove`, since every slot there is always
    /// present with at least the default. A map with no configured default rejects `None`
    /// outright: storing "nothing" would make a slot indistinguishable from one that was
    /// never written, with no default to fall back to.
    pub fn put_nullable(&mut self, k: &K, v: Option<V>) -> Result<Option<V>>
    where
        V: Clone,
    {
        match v {
            Some(v) => self.put(k, v),
            None if self.default.is_some() => Ok(self.remove(k)),
            None => Err(Error::container_integrity(
                "null values are not permitted in a map with no configured default",
            )),
        }
    }

    /// Clears the mapping for `k`. In default-value mode the slot is reset to the default
    /// rather than emptied, and the returned value is whatever was there immediately before.
    pub fn remove(&mut self, k: &K) -> Option<V>
    where
        V: Clone,
    {
        let j = self.slot_index_opt(k)?;
        let old = self.slots[j].take();
        match &self.default {
            Some(default) => {
                self.slots[j] = Some(default.clone());
            }
            None => {
                if old.is_some() {
                    self.present -= 1;
                }
            }
        }
        old
    }

    /// Maps `k` to `v` only if it is currently absent, returning the existing value otherwise.
    pub fn put_if_absent(&mut self, k: &K, v: V) -> Result<Option<V>>
    where
        V: Clone,
    {
        let j = self.slot_index(k)?;
        match &self.slots[j] {
            Some(existing) => Ok(Some(existing.clone())),
            None => {
                self.slots[j] = Some(v);
                self.present += 1;
                Ok(None)
            }
        }
    }

    /// Replaces the value mapped to `k` only if one is already present, returning the old value.
    pub fn replace(&mut self, k: &K, v: V) -> Result<Option<V>> {
        let j = self.slot_index(k)?;
        if self.slots[j].is_none() {
            return Ok(None);
        }
        Ok(self.slots[j].replace(v))
    }

    /// Replaces the value mapped to `k` with `new_v` only if it currently equals `old_v`.
    pub fn replace_if_equals(&mut self, k: &K, old_v: &V, new_v: V) -> Result<bool>
    where
        V: PartialEq,
    {
        let j = self.slot_index(k)?;
        if self.slots[j].as_ref() == Some(old_v) {
            self.slots[j] = Some(new_v);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn contains_key(&self, k: &K) -> bool {
        self.get(k).is_some()
    }

    pub fn contains_value(&self, v: &V) -> bool
    where
        V: PartialEq,
    {
        self.slots.iter().any(|slot| slot.as_ref() == Some(v))
    }

    /// Number of populated slots — always `n` in default-value mode.
    pub fn size(&self) -> usize {
        if self.default.is_some() {
            self.slots.len()
        } else {
            self.present
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Resets every slot: to absent normally, or back to the default in default-value mode.
    pub fn clear(&mut self)
    where
        V: Clone,
    {
        match &self.default {
            Some(default) => {
                for slot in &mut self.slots {
                    *slot = Some(default.clone());
                }
            }
            None => {
                for slot in &mut self.slots {
                    *slot = None;
                }
                self.present = 0;
            }
        }
    }

    /// A view of every `(key, value)` pair currently present, in ascending hash-value order,
    /// reflecting `self` at call time. Yielded entries don't support an in-place `set_value` —
    /// callers mutate through `put` instead, which this map's ownership model makes no more expensive.
    pub fn entries(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        let store = self.minimal.store();
        self.slots.iter().enumerate().filter_map(move |(j, slot)| slot.as_ref().map(|v| (store[j].clone(), v)))
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        let store = self.minimal.store();
        self.slots.iter().enumerate().filter_map(move |(j, slot)| slot.is_some().then(|| store[j].clone()))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Identity: `self` is already mutable. Present for parity with [`Self::immutable`].
    pub fn mutable(self) -> Self {
        self
    }

    /// An independent mutable copy with the same mappings.
    pub fn mutable_copy(&self) -> Self
    where
        V: Clone,
    {
        Self {
            minimal: self.minimal.clone(),
            slots: self.slots.clone(),
            default: self.default.clone(),
            present: self.present,
        }
    }

    /// Consumes `self` into a read-only [`ImmutableMap`].
    pub fn immutable(self) -> ImmutableMap<K, H, V> {
        ImmutableMap { minimal: self.minimal, slots: self.slots, default: self.default, present: self.present }
    }

    /// A read-only snapshot of the current mappings, leaving `self` untouched.
    pub fn immutable_view(&self) -> ImmutableMap<K, H, V>
    where
        V: Clone,
    {
        ImmutableMap {
            minimal: self.minimal.clone(),
            slots: self.slots.clone(),
            default: self.default.clone(),
            present: self.present,
        }
    }
}

/// Dynamic memory is the slot vector plus the shared minimal hash's own `g`-table (see
/// [`crate::set::MinimalSet`]'s `GetSize` impl for the `Rc`-sharing caveat). Each slot counts
/// as `Option<V>` regardless of default-value mode, since that is this type's actual in-memory
/// representation — avoiding that per-slot `Option` tag for primitive `V` would need a second,
/// monomorphic container type per primitive, which this crate does not introduce.
impl<K, H: GetSize, V: GetSize> GetSize for MinimalMap<K, H, V> {
    fn size_bytes_dyn(&self) -> usize {
        let slot_width = std::mem::size_of::<Option<V>>();
        let slots_dyn = slot_width * self.slots.capacity()
            + if V::USES_DYN_MEM {
                self.slots.iter().filter_map(|s| s.as_ref()).map(GetSize::size_bytes_dyn).sum()
            } else {
                0
            };
        slots_dyn + self.minimal.hasher().size_bytes_dyn()
    }
    fn size_bytes_content_dyn(&self) -> usize {
        let slot_width = std::mem::size_of::<Option<V>>();
        let slots_dyn = slot_width * self.slots.len()
            + if V::USES_DYN_MEM {
                self.slots.iter().filter_map(|s| s.as_ref()).map(GetSize::size_bytes_content_dyn).sum()
            } else {
                0
            };
        slots_dyn + self.minimal.hasher().size_bytes_content_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

/// A read-only view of a [`MinimalMap`]'s mappings (see [`crate::set::ImmutableSet`] for
/// why this is a distinct type rather than a runtime-checked mutation guard).
pub struct ImmutableMap<K, H, V> {
    minimal: Minimal<K, H>,
    slots: Vec<Option<V>>,
    default: Option<V>,
    present: usize,
}

impl<K: Clone + PartialEq, H: SeededHash<K> + Clone, V> ImmutableMap<K, H, V> {
    fn slot_index_opt(&self, k: &K) -> Option<usize> {
        let j = self.minimal.hash(k);
        let store = self.minimal.store();
        (j < self.slots.len() && &store[j] == k).then_some(j)
    }

    pub fn get(&self, k: &K) -> Option<&V> {
        self.slot_index_opt(k).and_then(|j| self.slots[j].as_ref())
    }

    /// As [`Self::get`], reporting a single-level hit or miss to `access_stats`.
    pub fn get_stats<A: AccessStatsCollector>(&self, k: &K, access_stats: &mut A) -> Option<&V> {
        match self.slot_index_opt(k).and_then(|j| self.slots[j].as_ref()) {
            Some(v) => {
                access_stats.found_on_level(0);
                Some(v)
            }
            None => {
                access_stats.fail_on_level(0);
                None
            }
        }
    }

    pub fn contains_key(&self, k: &K) -> bool {
        self.get(k).is_some()
    }

    pub fn size(&self) -> usize {
        if self.default.is_some() {
            self.slots.len()
        } else {
            self.present
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn entries(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        let store = self.minimal.store();
        self.slots.iter().enumerate().filter_map(move |(j, slot)| slot.as_ref().map(|v| (store[j].clone(), v)))
    }

    /// An independent mutable copy, for when the caller needs to start mutating again.
    pub fn mutable_copy(&self) -> MinimalMap<K, H, V>
    where
        V: Clone,
    {
        MinimalMap {
            minimal: self.minimal.clone(),
            slots: self.slots.clone(),
            default: self.default.clone(),
            present: self.present,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_pcg::Pcg64;

    fn minimal_for(keys: &[&str]) -> Minimal<String, impl SeededHash<String> + Clone + GetSize> {
        let domain = crate::domain::PerfectDomain::over_iter(keys.iter().map(|s| s.to_string()));
        let mut perfectionist = domain.using(16, Pcg64::new(0x1234_5678, 1)).unwrap();
        let perfect = perfectionist
            .perfect(|s: &String, buf: &mut Vec<u8>| buf.extend_from_slice(s.as_bytes()))
            .unwrap();
        perfect.minimized_with_rng(crate::bmz::BmzConf::default(), &mut Pcg64::new(2, 2)).unwrap()
    }

    #[test]
    fn map_container_contract() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut map: MinimalMap<String, _, i32> = minimal.new_map();

        let ostrich = "ostrich".to_string();
        map.put(&ostrich, 2).unwrap();
        assert_eq!(map.get(&ostrich), Some(&2));

        let whippet = "whippet".to_string();
        assert!(map.put(&whippet, 3).is_err());

        for (k, v) in map.entries().collect::<Vec<_>>() {
            if k == "dog" {
                map.put(&k, v + 4).unwrap();
            }
        }
        assert_eq!(map.get(&"dog".to_string()), Some(&4));
    }

    #[test]
    fn default_value_map_is_always_fully_present() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut map: MinimalMap<String, _, i32> = minimal.new_map_with_default(0);

        assert_eq!(map.get(&"snail".to_string()), Some(&0));
        assert_eq!(map.size(), 4);

        let dog = "dog".to_string();
        map.put(&dog, 9).unwrap();
        let removed = map.remove(&dog).unwrap();
        assert_eq!(removed, 9);
        assert_eq!(map.get(&dog), Some(&0));
        assert_eq!(map.size(), 4);
    }

    #[test]
    fn reports_its_own_size() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut map: MinimalMap<String, _, i32> = minimal.new_map();
        map.put(&"dog".to_string(), 4).unwrap();
        assert!(map.size_bytes_dyn() > 0);
    }

    #[test]
    fn get_stats_reports_hits_and_misses() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut map: MinimalMap<String, _, i32> = minimal.new_map();
        map.put(&"dog".to_string(), 4).unwrap();

        let mut hits = 0u32;
        assert_eq!(map.get_stats(&"dog".to_string(), &mut hits), Some(&4));
        assert_eq!(hits, 1);

        let mut misses = 0u32;
        assert_eq!(map.get_stats(&"snail".to_string(), &mut misses), None);
        assert_eq!(misses, 1);
    }

    #[test]
    fn put_nullable_rejects_null_without_a_default_and_removes_with_one() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let dog = "dog".to_string();

        let mut plain: MinimalMap<String, _, i32> = minimal.new_map();
        plain.put(&dog, 4).unwrap();
        assert!(plain.put_nullable(&dog, None).is_err());
        assert_eq!(plain.get(&dog), Some(&4));

        let mut defaulted: MinimalMap<String, _, i32> = minimal.new_map_with_default(0);
        defaulted.put(&dog, 9).unwrap();
        assert_eq!(defaulted.put_nullable(&dog, None).unwrap(), Some(9));
        assert_eq!(defaulted.get(&dog), Some(&0));
    }

    #[test]
    fn put_if_absent_and_replace() {
        let minimal = minimal_for(&["ostrich", "dog", "snail", "centipede"]);
        let mut map: MinimalMap<String, _, i32> = minimal.new_map();
        let dog = "dog".to_string();

        assert_eq!(map.put_if_absent(&dog, 1).unwrap(), None);
        assert_eq!(map.put_if_absent(&dog, 2).unwrap(), Some(1));
        assert_eq!(map.get(&dog), Some(&1));

        assert!(map.replace_if_equals(&dog, &1, 5).unwrap());
        assert_eq!(map.get(&dog), Some(&5));
        assert!(!map.replace_if_equals(&dog, &1, 9).unwrap());
    }
}
