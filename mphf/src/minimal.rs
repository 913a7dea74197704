//! `Minimal`: a minimal perfect hash over a domain, plus its lazily materialized permutation
//! and store.

use std::cell::RefCell;
use std::rc::Rc;

use crate::bmz::BmzHash;
use crate::domain::PerfectDomain;
use crate::hash::SeededHash;
use crate::map::MinimalMap;
use crate::set::MinimalSet;

/// The reordering induced by sorting keys by their minimal hash value: `π(i)` is the hash of
/// the `i`-th key in domain-iteration order. A bijection on `[0, n)`.
#[derive(Clone)]
pub struct Permutation(Rc<[usize]>);

impl Permutation {
    fn from_vec(v: Vec<usize>) -> Self {
        Self(v.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> usize {
        self.0[i]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// The inverse permutation `ρ`, where `ρ(π(i)) = i` for every `i`.
    pub fn inverse(&self) -> Permutation {
        let mut inv = vec![0usize; self.0.len()];
        for (i, &p) in self.0.iter().enumerate() {
            inv[p] = i;
        }
        Permutation::from_vec(inv)
    }

    /// Scatters `items` through `self`: `result[π(i)] = items[i]`.
    ///
    /// Applying a [`Minimal`]'s own permutation to its domain's keys produces the store;
    /// applying the inverse permutation to the store reproduces the domain's original
    /// iteration order.
    pub fn apply<T: Clone>(&self, items: &[T]) -> Vec<T> {
        assert_eq!(items.len(), self.0.len(), "permutation length must match the item slice");
        let mut result: Vec<Option<T>> = vec![None; items.len()];
        for (i, &p) in self.0.iter().enumerate() {
            result[p] = Some(items[i].clone());
        }
        result.into_iter().map(|o| o.expect("permutation is a bijection on [0, n)")).collect()
    }
}

/// The array of domain keys indexed by minimal hash value: `store[j]` is the unique key `k`
/// with `hash(k) = j`. There is no setter here at all, since `Rc<[K]>` has none to begin with —
/// a store is built once, then shared.
#[derive(Clone)]
pub struct Store<K>(Rc<[K]>);

impl<K> Store<K> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[K] {
        &self.0
    }
}

impl<K> std::ops::Index<usize> for Store<K> {
    type Output = K;
    fn index(&self, j: usize) -> &K {
        &self.0[j]
    }
}

/// A minimal perfect hash over `domain` (range `[0, n)`), plus its lazily materialized
/// permutation and store.
///
/// Cheap to clone: every clone shares the same backing domain and, once published, the same
/// permutation/store — `PerfectDomain`'s `Rc<[K]>` and this type's own `Rc`-wrapped lazy cells
/// are the mechanism. The lazy fields are plain `RefCell<Option<_>>`s: this crate makes no
/// thread-safety promises, so there is no need for an atomic double-checked-publication guard,
/// only a cheap interior-mutability cell.
#[derive(Clone)]
pub struct Minimal<K, H> {
    domain: PerfectDomain<K>,
    bmz: BmzHash<H>,
    permutation: Rc<RefCell<Option<Permutation>>>,
    store: Rc<RefCell<Option<Store<K>>>>,
}

impl<K, H> Minimal<K, H> {
    pub(crate) fn new(domain: PerfectDomain<K>, bmz: BmzHash<H>) -> Self {
        Self { domain, bmz, permutation: Rc::new(RefCell::new(None)), store: Rc::new(RefCell::new(None)) }
    }

    /// The hash's range, `[0, n)`.
    pub fn range(&self) -> usize {
        self.bmz.range()
    }

    pub fn domain(&self) -> &PerfectDomain<K> {
        &self.domain
    }

    /// The underlying minimal hasher, for callers that want to hash keys directly without
    /// going through a container.
    pub fn hasher(&self) -> &BmzHash<H> {
        &self.bmz
    }
}

impl<K: Clone, H: SeededHash<K>> Minimal<K, H> {
    pub fn hash(&self, key: &K) -> usize {
        self.bmz.hash(key)
    }

    /// The permutation `π`, materializing it on first observation.
    pub fn permutation(&self) -> Permutation {
        if let Some(p) = self.permutation.borrow().clone() {
            return p;
        }
        let order: Vec<usize> = self.domain.values().iter().map(|k| self.hash(k)).collect();
        let perm = Permutation::from_vec(order);
        *self.permutation.borrow_mut() = Some(perm.clone());
        perm
    }

    /// The store `S`, materializing it on first observation.
    ///
    /// When a permutation has already been published, this reuses it instead of re-hashing
    /// every key; otherwise it computes both in the same pass over the domain, so a caller that
    /// asks for the store first still only pays for one traversal even if it asks for the
    /// permutation afterwards.
    pub fn store(&self) -> Store<K> {
        if let Some(s) = self.store.borrow().clone() {
            return s;
        }
        let n = self.domain.size();
        let store = if let Some(perm) = self.permutation.borrow().clone() {
            Store(perm.apply(self.domain.values()).into())
        } else {
            let mut slots: Vec<Option<K>> = vec![None; n];
            let mut order = vec![0usize; n];
            for (i, key) in self.domain.values().iter().enumerate() {
                let j = self.hash(key);
                order[i] = j;
                slots[j] = Some(key.clone());
            }
            *self.permutation.borrow_mut() = Some(Permutation::from_vec(order));
            let keys: Vec<K> =
                slots.into_iter().map(|o| o.expect("minimal hash did not cover every slot")).collect();
            Store(keys.into())
        };
        *self.store.borrow_mut() = Some(store.clone());
        store
    }
}

impl<K: Clone + PartialEq, H: SeededHash<K> + Clone> Minimal<K, H> {
    /// A fresh, empty [`MinimalSet`] sharing this minimal hash.
    pub fn new_set(&self) -> MinimalSet<K, H> {
        MinimalSet::new(self.clone())
    }

    /// A fresh [`MinimalMap`] with no default value: an absent slot reads as `None`.
    pub fn new_map<V>(&self) -> MinimalMap<K, H, V> {
        MinimalMap::new(self.clone())
    }

    /// A fresh [`MinimalMap`] whose every slot starts — and, after `remove`, returns to —
    /// `default` rather than being absent, which suits primitive-valued maps that would
    /// otherwise box every entry just to represent absence.
    pub fn new_map_with_default<V: Clone>(&self, default: V) -> MinimalMap<K, H, V> {
        MinimalMap::with_default(self.clone(), default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PerfectDomain;
    use rand_pcg::Pcg64;

    fn minimize(keys: &[&str]) -> (Vec<String>, Minimal<String, impl SeededHash<String> + Clone>) {
        let owned: Vec<String> = keys.iter().map(|s| s.to_string()).collect();
        let domain = PerfectDomain::over_vec(owned.clone());
        let mut perfectionist = domain.using(16, Pcg64::new(7, 7)).unwrap();
        let perfect = perfectionist
            .perfect(|s: &String, buf: &mut Vec<u8>| buf.extend_from_slice(s.as_bytes()))
            .unwrap();
        let minimal = perfect.minimized_with_rng(crate::bmz::BmzConf::default(), &mut Pcg64::new(3, 3)).unwrap();
        (owned, minimal)
    }

    #[test]
    fn permutation_law() {
        let (domain, minimal) = minimize(&["Dog", "Cat", "Horse", "Goat", "Llama"]);
        let perm = minimal.permutation();
        let p = perm.apply(&domain);
        for (i, key) in domain.iter().enumerate() {
            assert_eq!(&p[minimal.hash(key)], &domain[i]);
        }
    }

    #[test]
    fn store_round_trips_through_inverse_permutation() {
        let (domain, minimal) = minimize(&["Alice", "Bob", "Eve"]);
        let store = minimal.store();
        let restored = minimal.permutation().inverse().apply(store.as_slice());
        assert_eq!(restored, domain);
    }

    #[test]
    fn store_matches_hash_for_every_key() {
        let (domain, minimal) = minimize(&["Tom", "Astrid", "Joy", "Magnus", "Horse", "Cow", "Crow", "Spoon"]);
        let store = minimal.store();
        for key in &domain {
            assert_eq!(&store[minimal.hash(key)], key);
        }
    }

    #[test]
    fn requesting_permutation_after_store_reuses_cache() {
        let (domain, minimal) = minimize(&["Alice", "Bob", "Eve"]);
        let _store = minimal.store();
        let perm = minimal.permutation();
        for (i, key) in domain.iter().enumerate() {
            assert_eq!(perm.get(i), minimal.hash(key));
        }
    }
}
