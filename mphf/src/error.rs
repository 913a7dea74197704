//! The single error type shared by every fallible operation in this crate.

use thiserror::Error;

/// Failure of a construction or container operation.
///
/// `is_perfect`/`is_injective` never produce this type — they are infallible and return `bool`,
/// per the contract of [`crate::domain::PerfectDomain`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A supplied argument was out of its valid range (e.g. `c < 1.0`, `max_attempts == 0`),
    /// or a key passed to a container operation is not a member of the container's domain.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        reason: String,
    },

    /// The randomized search for a (minimal) perfect hash exhausted its attempt budget,
    /// or proved early that the configured serializer cannot possibly be injective over the domain.
    #[error("failed to find a perfect hash: {reason}")]
    PerfectionFailure {
        reason: String,
    },

    /// An operation tried to mutate a container through an immutable view, or to store
    /// a forbidden null value in a container configured to disallow it.
    #[error("container integrity violation: {reason}")]
    ContainerIntegrity {
        reason: String,
    },
}

impl Error {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument { reason: reason.into() }
    }

    pub(crate) fn perfection_failure(reason: impl Into<String>) -> Self {
        Self::PerfectionFailure { reason: reason.into() }
    }

    pub(crate) fn container_integrity(reason: impl Into<String>) -> Self {
        Self::ContainerIntegrity { reason: reason.into() }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
