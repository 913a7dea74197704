//! `Perfect`: a verified (or assumed) perfect hash over a domain, ready to be minimized.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::bmz::{self, BmzConf};
use crate::domain::PerfectDomain;
use crate::error::Result;
use crate::hash::SeededHash;
use crate::minimal::Minimal;
use crate::stats::BuildStatsCollector;

/// A hash known (or trusted) to be injective over `domain`. Equivalence between keys — the
/// relation perfection is checked against — is simply `K: PartialEq`, used throughout the
/// containers built on top of a [`Minimal`]; there is no separate `equivalence` handle to
/// configure, unlike in languages without an `Eq`/`PartialEq` trait pair to lean on.
#[derive(Clone)]
pub struct Perfect<K, H> {
    domain: PerfectDomain<K>,
    hasher: H,
}

impl<K, H> Perfect<K, H> {
    pub(crate) fn new(domain: PerfectDomain<K>, hasher: H) -> Self {
        Self { domain, hasher }
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub fn domain(&self) -> &PerfectDomain<K> {
        &self.domain
    }
}

impl<K: Clone, H: SeededHash<K> + Clone> Perfect<K, H> {
    /// Minimizes this hash with [`BmzConf::default`], seeding BMZ from an entropy-seeded RNG.
    /// Use [`Self::minimized_with_rng`] for reproducible construction.
    pub fn minimized(&self) -> Result<Minimal<K, H>> {
        self.minimized_with_bmz(BmzConf::default())
    }

    /// As [`Self::minimized`], with a custom [`BmzConf`].
    pub fn minimized_with_bmz(&self, conf: BmzConf) -> Result<Minimal<K, H>> {
        let mut rng = StdRng::from_entropy();
        self.minimized_with_rng(conf, &mut rng)
    }

    /// Minimizes this hash, threading `rng` explicitly through the BMZ construction —
    /// the reproducible form, since BMZ's seed draws are the only source of non-determinism.
    pub fn minimized_with_rng(&self, conf: BmzConf, rng: &mut impl Rng) -> Result<Minimal<K, H>> {
        self.minimized_with_stats(conf, rng, &mut ())
    }

    /// As [`Self::minimized_with_rng`], reporting one `level` call per BMZ attempt to `stats`.
    pub fn minimized_with_stats<BS: BuildStatsCollector>(
        &self,
        conf: BmzConf,
        rng: &mut impl Rng,
        stats: &mut BS,
    ) -> Result<Minimal<K, H>> {
        let bmz = bmz::build_with_stats(self.domain.values(), &self.hasher, conf, rng, stats)?;
        Ok(Minimal::new(self.domain.clone(), bmz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_pcg::Pcg64;

    #[test]
    fn small_perfect_domain_minimizes() {
        let domain = PerfectDomain::over_iter([
            "Tom".to_string(), "Astrid".to_string(), "Joy".to_string(), "Magnus".to_string(),
            "Horse".to_string(), "Cow".to_string(), "Crow".to_string(), "Spoon".to_string(),
        ]);
        let mut perfectionist = domain.using_defaults();
        let perfect = perfectionist
            .perfect(|s: &String, buf: &mut Vec<u8>| buf.extend_from_slice(s.as_bytes()))
            .expect("eight short, distinct strings should yield a perfect hash within the default attempt budget");
        let mut rng = Pcg64::new(1, 1);
        let minimal = perfect.minimized_with_rng(BmzConf::default(), &mut rng).unwrap();
        assert_eq!(minimal.range(), 8);
    }

    #[test]
    fn minimized_with_stats_reports_at_least_one_attempt() {
        struct AttemptCounter(u32);
        impl BuildStatsCollector for AttemptCounter {
            fn level(&mut self, _input_size: usize, _level_size: usize) {
                self.0 += 1;
            }
        }

        let domain = PerfectDomain::over_iter(["Dog".to_string(), "Cat".to_string(), "Horse".to_string()]);
        let mut perfectionist = domain.using_defaults();
        let perfect = perfectionist
            .perfect(|s: &String, buf: &mut Vec<u8>| buf.extend_from_slice(s.as_bytes()))
            .unwrap();
        let mut rng = Pcg64::new(9, 9);
        let mut counter = AttemptCounter(0);
        perfect.minimized_with_stats(BmzConf::default(), &mut rng, &mut counter).unwrap();
        assert!(counter.0 >= 1);
    }
}
