#![doc = include_str!("../README.md")]

pub mod error;
pub mod hash;
pub mod uniqueness;
pub mod domain;
pub mod perfectionist;
pub mod perfect;
pub mod bmz;
pub mod minimal;
pub mod set;
pub mod map;
pub mod stats;

pub use error::{Error, Result};
pub use hash::{DefaultHash, Reseed, SeededHash};
pub use domain::PerfectDomain;
pub use perfectionist::{Perfectionist, PerfectionistConf};
pub use perfect::Perfect;
pub use bmz::{BmzConf, BmzHash};
pub use minimal::{Minimal, Permutation, Store};
pub use set::{ImmutableSet, MinimalSet};
pub use map::{ImmutableMap, MinimalMap};

pub use dyn_size_of::GetSize;
