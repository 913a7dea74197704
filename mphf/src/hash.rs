//! The `Hasher` collaborator: maps a key to an integer in a declared range.
//!
//! This is deliberately thin. The actual seeded-hash-family machinery (seed → [`std::hash::Hasher`])
//! is [`seedable_hash::BuildSeededHasher`]; this module only adds the range-awareness and
//! byte-serializer composition that [`crate::domain::PerfectDomain`] and [`crate::perfectionist::Perfectionist`]
//! need and that the bare collaborator does not provide.

use std::hash::Hash;
use dyn_size_of::GetSize;
use seedable_hash::{BuildDefaultSeededHasher, BuildSeededHasher, map64_to_64};

/// A hash function over keys of type `T`, with a declared output range `[0, 2^range_bits)`
/// (or the full `u64` range when `range_bits >= 64`).
pub trait SeededHash<T: ?Sized> {
    /// Number of bits of the declared range. `is_perfect`'s dense-bitset path is only taken
    /// when this is at most 16 (see [`crate::domain::PerfectDomain::is_perfect`]).
    fn range_bits(&self) -> u32;

    /// Hashes `key` into `[0, 2^range_bits)`.
    fn int_hash(&self, key: &T) -> u64;

    /// Hashes `key` into the full `u64` range, ignoring `range_bits`. Used by the Bloom-assisted
    /// uniqueness check above the dense-bitset threshold, where only a wide, low-collision digest matters.
    fn big_hash(&self, key: &T) -> u64;
}

/// A family of [`SeededHash`] instances that can be freshly seeded and resized.
///
/// Implemented by the concrete hash types this crate constructs on the caller's behalf
/// ([`DefaultHash`], and [`ComposedHash`] via [`Reseed`]); a caller-supplied collaborator type
/// only needs [`SeededHash`] itself to be usable with [`crate::domain::PerfectDomain::is_perfect`].
pub trait Reseed: Clone {
    /// Returns a copy of `self` reseeded with `seed`. Two hashers built from the same seed
    /// always behave identically; different seeds are expected (not guaranteed) to behave independently.
    fn reseed(&self, seed: u64) -> Self;
}

/// The default hash family: a murmur-style 64-bit hash (backed by [`BuildDefaultSeededHasher`],
/// i.e. whichever family `seedable_hash`'s default feature selects — `wyhash` unless this
/// crate's own `wyhash` feature is turned off), independently reseedable, reducible to a
/// declared bit-width range via Lemire's fast alternative to the modulo reduction.
#[derive(Clone, Copy)]
pub struct DefaultHash {
    seed: u64,
    range_bits: u32,
    builder: BuildDefaultSeededHasher,
}

impl Default for DefaultHash {
    fn default() -> Self {
        Self::sized(64)
    }
}

impl DefaultHash {
    /// Returns the unseeded hash (seed `0`) with the given declared range, in bits.
    pub fn sized(range_bits: u32) -> Self {
        Self { seed: 0, range_bits, builder: Default::default() }
    }

    /// Returns a copy of `self` with a new declared range, keeping the current seed.
    pub fn with_range_bits(self, range_bits: u32) -> Self {
        Self { range_bits, ..self }
    }

    /// Composes this hasher's seed family with a byte `serializer`, producing a [`SeededHash`]
    /// over arbitrary `T` instead of over `T: Hash`. Used by [`crate::domain::PerfectDomain::is_injective`]
    /// and by [`crate::perfectionist::Perfectionist::perfect`].
    pub fn composed_with<T: ?Sized, F: Fn(&T, &mut Vec<u8>) + Clone>(self, serialize: F) -> ComposedHash<Self, F> {
        ComposedHash { inner: self, serialize }
    }
}

impl<T: Hash + ?Sized> SeededHash<T> for DefaultHash {
    fn range_bits(&self) -> u32 {
        self.range_bits
    }

    fn int_hash(&self, key: &T) -> u64 {
        let h = self.builder.hash_one(key, self.seed as u32) ^ self.seed.rotate_left(31);
        if self.range_bits >= 64 { h } else { map64_to_64(h, 1u64 << self.range_bits) }
    }

    fn big_hash(&self, key: &T) -> u64 {
        let lo = self.builder.hash_one(key, self.seed as u32);
        let hi = self.builder.hash_one(key, (self.seed as u32) ^ 0x9E37_79B9);
        lo ^ hi.rotate_left(32)
    }
}

impl Reseed for DefaultHash {
    fn reseed(&self, seed: u64) -> Self {
        Self { seed, ..*self }
    }
}

/// No heap allocation of its own: `builder` is a zero-sized marker type.
impl GetSize for DefaultHash {}

/// A [`SeededHash`] over arbitrary `T`, obtained by serializing `T` to bytes with `serialize`
/// and hashing the resulting byte string with `inner`.
///
/// `inner` is typically [`DefaultHash`], but any [`SeededHash<[u8]>`] works.
#[derive(Clone)]
pub struct ComposedHash<H, F> {
    inner: H,
    serialize: F,
}

impl<T: ?Sized, H, F> SeededHash<T> for ComposedHash<H, F>
where
    H: SeededHash<[u8]>,
    F: Fn(&T, &mut Vec<u8>),
{
    fn range_bits(&self) -> u32 {
        self.inner.range_bits()
    }

    fn int_hash(&self, key: &T) -> u64 {
        let mut buf = Vec::new();
        (self.serialize)(key, &mut buf);
        self.inner.int_hash(&buf[..])
    }

    fn big_hash(&self, key: &T) -> u64 {
        let mut buf = Vec::new();
        (self.serialize)(key, &mut buf);
        self.inner.big_hash(&buf[..])
    }
}

impl<H: Reseed, F: Clone> Reseed for ComposedHash<H, F> {
    fn reseed(&self, seed: u64) -> Self {
        Self { inner: self.inner.reseed(seed), serialize: self.serialize.clone() }
    }
}

/// Heap usage is `inner`'s alone: `serialize` is almost always a zero-sized closure, and any
/// captured state it does carry lives inline in this struct, already covered by `size_of_val`.
impl<H: GetSize, F> GetSize for ComposedHash<H, F> {
    fn size_bytes_dyn(&self) -> usize {
        self.inner.size_bytes_dyn()
    }
    fn size_bytes_content_dyn(&self) -> usize {
        self.inner.size_bytes_content_dyn()
    }
    const USES_DYN_MEM: bool = H::USES_DYN_MEM;
}
