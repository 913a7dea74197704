//! `Perfectionist`: the randomized search for a hash function that is perfect over a domain.

use rand::Rng;

use crate::domain::PerfectDomain;
use crate::error::{Error, Result};
use crate::hash::{ComposedHash, DefaultHash, Reseed, SeededHash};
use crate::perfect::Perfect;

/// Tunables for [`PerfectDomain::using`]: how many candidate seeds
/// [`Perfectionist::perfect`]/[`Perfectionist::perfect_with_hash`] will try before giving up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerfectionistConf {
    pub max_seed_attempts: u32,
}

impl Default for PerfectionistConf {
    fn default() -> Self {
        Self { max_seed_attempts: 8 }
    }
}

/// Searches for a perfect hash over a fixed domain, drawing seeds from an explicitly
/// supplied RNG (never a global one, per this crate's single-threaded, no-hidden-state contract).
pub struct Perfectionist<K, R> {
    domain: PerfectDomain<K>,
    conf: PerfectionistConf,
    rng: R,
}

impl<K, R> Perfectionist<K, R> {
    pub(crate) fn new(domain: PerfectDomain<K>, conf: PerfectionistConf, rng: R) -> Self {
        Self { domain, conf, rng }
    }

    pub fn domain(&self) -> &PerfectDomain<K> {
        &self.domain
    }

    /// Wraps `hasher` as perfect without verifying it. The caller vouches for injectivity.
    pub fn assumed_perfect<H: SeededHash<K> + Clone>(&self, hasher: H) -> Perfect<K, H> {
        Perfect::new(self.domain.clone(), hasher)
    }

    /// Verifies `hasher` is perfect over the domain, returning it wrapped if so.
    pub fn maybe_perfect<H: SeededHash<K> + Clone>(&self, hasher: H) -> Option<Perfect<K, H>> {
        self.domain.is_perfect(&hasher).then(|| Perfect::new(self.domain.clone(), hasher))
    }

    /// [`Self::maybe_perfect`] against the crate's own default hash family, sized to the full
    /// 64-bit range (the Bloom-assisted path of [`PerfectDomain::is_perfect`] always applies).
    pub fn maybe_perfect_default(&self) -> Option<Perfect<K, DefaultHash>>
    where
        DefaultHash: SeededHash<K>,
    {
        self.maybe_perfect(DefaultHash::sized(64))
    }
}

impl<K, R: Rng> Perfectionist<K, R> {
    /// Randomized search using the crate's default hash family composed with `serialize`.
    /// See [`Self::perfect_with_hash`] for the search policy.
    pub fn perfect<F>(&mut self, serialize: F) -> Result<Perfect<K, ComposedHash<DefaultHash, F>>>
    where
        F: Fn(&K, &mut Vec<u8>) + Clone,
    {
        self.perfect_with_hash(serialize, DefaultHash::sized(64))
    }

    /// Randomized search for a perfect hash composed of `hash` (a reseedable byte hasher) and
    /// `serialize` (the byte encoding of a key).
    ///
    /// Attempt 0 uses `hash` unseeded; every later attempt draws a fresh 64-bit seed from the
    /// RNG. After the second failed attempt, if the serializer itself cannot possibly be
    /// injective over the domain, the search fails immediately rather than retrying uselessly.
    pub fn perfect_with_hash<F, H>(&mut self, serialize: F, hash: H) -> Result<Perfect<K, ComposedHash<H, F>>>
    where
        F: Fn(&K, &mut Vec<u8>) + Clone,
        H: SeededHash<[u8]> + Reseed,
    {
        for attempt in 0..self.conf.max_seed_attempts {
            let seeded = if attempt == 0 { hash.reseed(0) } else { hash.reseed(self.rng.gen()) };
            let candidate = seeded.composed_with(serialize.clone());
            if self.domain.is_perfect(&candidate) {
                return Ok(Perfect::new(self.domain.clone(), candidate));
            }
            if attempt == 1 && !self.domain.is_injective(&serialize) {
                return Err(Error::perfection_failure("serializer not injective"));
            }
        }
        Err(Error::perfection_failure(format!(
            "unable to find hash function after {} attempts",
            self.conf.max_seed_attempts
        )))
    }

    /// As [`Self::perfect`], but serializes `K` with a [`binout::Serializer`] instead of a
    /// caller-supplied closure — the natural choice when `K` is one of the fixed-width
    /// integer types `binout` already knows how to encode (e.g. `binout::AsIs` for `u32`/`u64`,
    /// `binout::VByte` for a more compact variable-width encoding).
    pub fn perfect_with_binout<S: binout::Serializer<K>>(
        &mut self,
    ) -> Result<Perfect<K, ComposedHash<DefaultHash, impl Fn(&K, &mut Vec<u8>) + Clone>>>
    where
        K: Copy,
    {
        self.perfect(|k: &K, buf: &mut Vec<u8>| {
            S::write(buf, *k).expect("writing to a Vec<u8> never fails")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_pcg::Pcg64;

    #[test]
    fn bounded_construction() {
        let domain = PerfectDomain::over_iter(["Alice".to_string(), "Bob".to_string(), "Eve".to_string()]);
        let rng = Pcg64::new(0, 0);
        let mut perfectionist = domain.using(3, rng).unwrap();
        let perfect = perfectionist
            .perfect(|s: &String, buf: &mut Vec<u8>| buf.extend_from_slice(s.as_bytes()))
            .expect("three short, distinct strings should yield a perfect hash within budget");
        assert_eq!(perfect.domain().size(), 3);
    }

    #[test]
    fn rejects_non_injective_serializer() {
        let domain = PerfectDomain::over_iter(["Ant".to_string(), "Bear".to_string(), "Aardvark".to_string()]);
        let rng = Pcg64::new(7, 7);
        let mut perfectionist = domain.using(5, rng).unwrap();
        let result = perfectionist.perfect(|s: &String, buf: &mut Vec<u8>| buf.push(s.as_bytes()[0]));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_attempts() {
        let domain = PerfectDomain::over_iter([1u32, 2, 3]);
        assert!(domain.using(0, Pcg64::new(0, 0)).is_err());
    }

    #[test]
    fn small_perfect_test_via_defaults() {
        let domain = PerfectDomain::over_iter([
            "Tom".to_string(), "Astrid".to_string(), "Joy".to_string(), "Magnus".to_string(),
            "Horse".to_string(), "Cow".to_string(), "Crow".to_string(), "Spoon".to_string(),
        ]);
        let perfectionist = domain.using_defaults();
        let perfect = perfectionist
            .maybe_perfect_default()
            .expect("the default 64-bit hash should already be perfect over eight distinct strings");
        let minimal = perfect
            .minimized_with_rng(crate::bmz::BmzConf::default(), &mut Pcg64::new(0, 0))
            .unwrap();
        assert_eq!(minimal.range(), 8);
    }

    #[test]
    fn perfect_with_binout_serializer() {
        let domain = PerfectDomain::over_iter([10u32, 20, 30, 40]);
        let mut perfectionist = domain.using(8, Pcg64::new(11, 11)).unwrap();
        let perfect = perfectionist
            .perfect_with_binout::<binout::AsIs>()
            .expect("four distinct u32 keys should yield a perfect hash within the default budget");
        assert_eq!(perfect.domain().size(), 4);
    }
}
