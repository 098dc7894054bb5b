//! UUID generation, formatting, and storage quota rules for a UUID generator app.
//!
//! ```rust
//! let uuid = uuidgen_core::uuid7()?;
//! println!("{}", uuid); // e.g. "01809424-3e59-7c05-9219-566f82fff672"
//! println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
//! # Ok::<(), uuidgen_core::Error>(())
//! ```
//!
//! # Supported versions
//!
//! - Version 4 takes 122 bits from a cryptographically secure random source.
//! - Version 5 hashes a namespace UUID and a name with SHA-1 and is fully deterministic.
//! - Version 7 puts a 48-bit Unix timestamp in milliseconds in front of 74 random bits, so
//!   values generated in different milliseconds sort in creation order.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          unix_ts_ms                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          unix_ts_ms           |  ver  |        rand_a         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|                        rand_b                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                            rand_b                             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! # Formatting
//!
//! [`FormatOptions`] renders a value with or without hyphens, in either case, and optionally in
//! braces. [`parse_canonical`] reads every such rendering back.
//!
//! # Quota
//!
//! Free users may store [`quota::BASE_LIMIT`] values plus one per active bonus slot, with at most
//! [`quota::MAX_BONUS`] slots active at once. Pro users have no limit. See the [`quota`] module for
//! the rules and [`UuidService`] for a facade that applies them against a [`RecordStore`].
//!
//! # Crate features
//!
//! - `global_gen` (default): the OS-seeded default generator behind [`uuid4()`], [`uuid7()`],
//!   and [`generate()`].
//! - `serde`: `Serialize` and `Deserialize` for the value types.
//! - `uuid`: conversions from and to `uuid::Uuid`.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod codec;
mod error;
mod format;
mod id;

pub mod generator;
mod global_gen;
pub mod quota;
pub mod service;
pub mod settings;
pub mod store;

pub use codec::{canonicalize, parse_canonical};
pub use error::{Error, Result};
pub use format::{FormatOption, FormatOptions};
pub use id::{ParseError, Uuid, Variant};

pub use generator::{
    unix_ts_ms, uuid4_from_random, uuid5, uuid7_from_parts, GeneratedUuid, Generator, RandSource,
    UuidVersion,
};
#[cfg(feature = "global_gen")]
pub use global_gen::{generate, uuid4, uuid7, GlobalGenRng};
pub use quota::{BonusSlot, EntitlementState, LimitState, QuotaPolicy};
pub use service::UuidService;
pub use settings::{MemorySettings, Preferences, SettingsStore};
pub use store::{MemoryStore, RecordStore, StoredUuidRecord};
