//! Error types shared across the crate.

use thiserror::Error;

/// Result type returned by fallible operations of this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures reported by the generator, the quota rules, and the service facade.
///
/// Every variant except [`Error::RandomSourceUnavailable`] and [`Error::Store`] is a local
/// validation or policy outcome that the caller is expected to surface to the user. No variant
/// implies a partial state change: an operation either completes or leaves everything untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// The namespace for a v5 UUID is missing or is not a valid UUID string.
    #[error("namespace must be a valid UUID")]
    InvalidNamespace,

    /// The name for a v5 UUID is missing or blank.
    #[error("name is required for v5")]
    InvalidName,

    /// The free-tier capacity is exhausted.
    #[error("storage limit reached")]
    LimitReached,

    /// A record with the same canonical value is already stored.
    #[error("this UUID is already stored")]
    DuplicateValue,

    /// The number of active bonus slots is already at the maximum.
    #[error("bonus slot limit reached")]
    BonusLimitReached,

    /// A quota policy carries a bonus duration that is zero or negative.
    #[error("bonus duration must be positive, got {0} ms")]
    InvalidBonusDuration(i64),

    /// A bonus slot expiry would fall outside the representable date range.
    #[error("bonus slot expiry out of range")]
    ExpiryOutOfRange,

    /// The cryptographically secure random source could not produce bytes.
    ///
    /// This is never papered over with a weaker generator.
    #[error("secure random source unavailable")]
    RandomSourceUnavailable(#[source] rand::Error),

    /// A persistence or settings collaborator failed.
    #[error("store operation failed")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps a collaborator failure.
    pub(crate) fn store<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        Self::Store(Box::new(err))
    }
}

/// Error parsing an invalid string representation of UUID.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default, Error)]
#[error("invalid string representation")]
pub struct ParseError {}
