//! UUID generator for versions 4, 5, and 7 and related types.

use std::{fmt, str};

use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};

use crate::{parse_canonical, Error, Result, Uuid};

pub mod with_rand08;


/// The largest value the 48-bit `unix_ts_ms` field can hold.
pub const MAX_TIMESTAMP: u64 = (1 << 48) - 1;

/// A trait that defines the minimum random number generator interface for [`Generator`].
///
/// Implementations must be backed by a cryptographically secure source. A failure to produce
/// bytes is reported as is; the generator never retries or falls back to a weaker source.
pub trait RandSource {
    /// Fills `dest` with random data or reports why the source could not.
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error>;
}

/// The UUID versions this crate generates.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum UuidVersion {
    /// Random-based.
    #[default]
    V4,

    /// Namespace and name based, hashed with SHA-1.
    V5,

    /// Unix time based.
    V7,
}

impl UuidVersion {
    /// All versions in display order.
    pub const ALL: [Self; 3] = [Self::V4, Self::V5, Self::V7];

    /// Returns the short name used in settings and stored records (`"v4"`, `"v5"`, `"v7"`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V4 => "v4",
            Self::V5 => "v5",
            Self::V7 => "v7",
        }
    }

    /// Returns the value of the version field.
    pub const fn number(self) -> u8 {
        match self {
            Self::V4 => 4,
            Self::V5 => 5,
            Self::V7 => 7,
        }
    }

    /// Returns a human-readable title.
    pub const fn title(self) -> &'static str {
        match self {
            Self::V4 => "UUID v4",
            Self::V5 => "UUID v5",
            Self::V7 => "UUID v7",
        }
    }

    /// Returns a short description of how values of this version are derived.
    pub const fn description(self) -> &'static str {
        match self {
            Self::V4 => "Random",
            Self::V5 => "Namespace + name (SHA-1)",
            Self::V7 => "Time-based (RFC 9562)",
        }
    }

    /// Decodes a stored version name, falling back to [`UuidVersion::V4`] when the value is
    /// missing or unknown.
    pub fn decode(src: Option<&str>) -> Self {
        src.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for UuidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl str::FromStr for UuidVersion {
    type Err = crate::ParseError;

    /// Accepts `v4`, `v5`, `v7` in any case, or the bare version number.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let digits = src
            .strip_prefix('v')
            .or_else(|| src.strip_prefix('V'))
            .unwrap_or(src);
        match digits {
            "4" => Ok(Self::V4),
            "5" => Ok(Self::V5),
            "7" => Ok(Self::V7),
            _ => Err(crate::ParseError {}),
        }
    }
}

/// A freshly generated UUID along with the inputs it was derived from.
///
/// This is handed to the caller for display or saving and is not persisted as is; see
/// [`GeneratedUuid::to_record`].
#[derive(Clone, Eq, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratedUuid {
    pub value: Uuid,
    pub version: UuidVersion,
    pub created_at: DateTime<Utc>,

    /// The namespace of a v5 UUID.
    pub namespace: Option<Uuid>,

    /// The name of a v5 UUID.
    pub name: Option<String>,
}

/// Computes the v5 UUID of `name` in `namespace`.
///
/// The SHA-1 digest of the namespace bytes followed by the UTF-8 bytes of `name` is truncated to
/// 16 bytes, and the version and variant fields are overwritten. The result depends only on the
/// arguments.
///
/// # Examples
///
/// ```rust
/// use uuidgen_core::{uuid5, Uuid};
///
/// let dns: Uuid = "6ba7b810-9dad-11d1-80b4-00c04fd430c8".parse()?;
/// assert_eq!(uuid5(&dns, "example").to_string(), "7cb48787-6d91-5b9f-bc60-f30298ea5736");
/// # Ok::<(), uuidgen_core::ParseError>(())
/// ```
pub fn uuid5(namespace: &Uuid, name: &str) -> Uuid {
    let digest = Sha1::new()
        .chain_update(namespace.as_bytes())
        .chain_update(name.as_bytes())
        .finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    bytes[6] = (bytes[6] & 0x0f) | 0x50;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from(bytes)
}

/// Creates a v4 UUID from 16 random bytes by overwriting the version and variant fields.
pub const fn uuid4_from_random(mut bytes: [u8; 16]) -> Uuid {
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}

/// Creates a v7 UUID from a millisecond timestamp and 10 random bytes.
///
/// Only the low 48 bits of `unix_ts_ms` are used; larger values wrap silently. This truncation is
/// deliberate and only matters after the year 10889.
///
/// ```text
/// byte  0..6   unix_ts_ms (big-endian)
/// byte  6      0111 | low nibble of random[0]
/// byte  7      random[1]
/// byte  8      10   | low 6 bits of random[2]
/// byte  9      random[3]
/// byte 10..16  random[4..10]
/// ```
pub const fn uuid7_from_parts(unix_ts_ms: u64, random: [u8; 10]) -> Uuid {
    let ts = unix_ts_ms & MAX_TIMESTAMP;
    Uuid::from_bytes([
        (ts >> 40) as u8,
        (ts >> 32) as u8,
        (ts >> 24) as u8,
        (ts >> 16) as u8,
        (ts >> 8) as u8,
        ts as u8,
        (random[0] & 0x0f) | 0x70,
        random[1],
        (random[2] & 0x3f) | 0x80,
        random[3],
        random[4],
        random[5],
        random[6],
        random[7],
        random[8],
        random[9],
    ])
}

/// Represents a UUID generator that draws randomness from a [`RandSource`].
///
/// The generator holds no state besides the random source: v4 and v7 values depend only on the
/// random bytes and the timestamp passed in, and v5 values depend only on their inputs. Sharing a
/// generator across threads therefore only requires whatever synchronization the random source
/// needs.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use rand::rngs::OsRng;
/// use uuidgen_core::{Generator, UuidVersion};
///
/// let mut g = Generator::with_rand08(OsRng);
/// let generated = g.generate(UuidVersion::V7, None, None, Utc::now())?;
/// assert_eq!(generated.value.version(), Some(7));
/// # Ok::<(), uuidgen_core::Error>(())
/// ```
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Generator<R> {
    /// The random number generator used by the generator.
    rng: R,
}

impl<R: RandSource> Generator<R> {
    /// Creates a generator instance.
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generates a UUID of `version` at `now`.
    ///
    /// `namespace` and `name` are only consulted for [`UuidVersion::V5`]. The namespace may be
    /// given in any rendering [`parse_canonical`] accepts.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidNamespace`] if a v5 namespace is missing or malformed.
    /// - [`Error::InvalidName`] if a v5 name is missing or blank.
    /// - [`Error::RandomSourceUnavailable`] if a v4 or v7 value cannot get random bytes.
    pub fn generate(
        &mut self,
        version: UuidVersion,
        namespace: Option<&str>,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<GeneratedUuid> {
        let (value, namespace, name) = match version {
            UuidVersion::V4 => (self.generate_v4()?, None, None),
            UuidVersion::V5 => {
                let namespace = namespace
                    .and_then(|s| parse_canonical(s).ok())
                    .ok_or(Error::InvalidNamespace)?;
                let name = name
                    .filter(|s| !s.trim().is_empty())
                    .ok_or(Error::InvalidName)?;
                (uuid5(&namespace, name), Some(namespace), Some(name.to_owned()))
            }
            UuidVersion::V7 => (self.generate_v7(unix_ts_ms(now))?, None, None),
        };

        Ok(GeneratedUuid {
            value,
            version,
            created_at: now,
            namespace,
            name,
        })
    }

    /// Generates a new UUIDv4 object utilizing the random number generator inside.
    pub fn generate_v4(&mut self) -> Result<Uuid> {
        let mut bytes = [0u8; 16];
        self.fill(&mut bytes)?;
        Ok(uuid4_from_random(bytes))
    }

    /// Generates a new UUIDv7 object from the `unix_ts_ms` passed.
    ///
    /// See [`uuid7_from_parts`] for the layout and the handling of timestamps beyond 48 bits.
    pub fn generate_v7(&mut self, unix_ts_ms: u64) -> Result<Uuid> {
        let mut random = [0u8; 10];
        self.fill(&mut random)?;
        Ok(uuid7_from_parts(unix_ts_ms, random))
    }

    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        self.rng
            .try_fill_bytes(dest)
            .map_err(Error::RandomSourceUnavailable)
    }
}

/// Converts `now` to the millisecond count that goes into a v7 UUID.
///
/// Times before the Unix epoch wrap like any other out-of-range value.
pub fn unix_ts_ms(now: DateTime<Utc>) -> u64 {
    (now.timestamp_millis() as u64) & MAX_TIMESTAMP
}


#[cfg(test)]
mod tests_v4 {
    use super::Generator;

    const N_SAMPLES: usize = 100_000;
    thread_local!(static SAMPLES: Vec<String> = {
        let mut g = Generator::for_testing(6);
        (0..N_SAMPLES).map(|_| g.generate_v4().unwrap().into()).collect()
    });

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let pattern = r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";
        let re = regex::Regex::new(pattern).unwrap();
        SAMPLES.with(|samples| {
            for e in samples {
                assert!(re.is_match(e));
            }
        });
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        use std::collections::HashSet;
        SAMPLES.with(|samples| {
            let s: HashSet<&String> = samples.iter().collect();
            assert_eq!(s.len(), N_SAMPLES);
        });
    }

    /// Sets constant bits and random bits properly
    #[test]
    fn sets_constant_bits_and_random_bits_properly() {
        // count '1' of each bit
        let bins = SAMPLES.with(|samples| {
            let mut bins = [0u32; 128];
            for e in samples {
                let mut it = bins.iter_mut().rev();
                for c in e.chars().rev() {
                    if let Some(mut num) = c.to_digit(16) {
                        for _ in 0..4 {
                            *it.next().unwrap() += num & 1;
                            num >>= 1;
                        }
                    }
                }
            }
            bins
        });

        // test if constant bits are all set to 1 or 0
        let n = N_SAMPLES as u32;
        assert_eq!(bins[48], 0, "version bit 48");
        assert_eq!(bins[49], n, "version bit 49");
        assert_eq!(bins[50], 0, "version bit 50");
        assert_eq!(bins[51], 0, "version bit 51");
        assert_eq!(bins[64], n, "variant bit 64");
        assert_eq!(bins[65], 0, "variant bit 65");

        // test if random bits are set to 1 at ~50% probability
        // set margin based on binom dist 99.999% confidence interval
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();
        for i in (0..48).chain(52..64).chain(66..128) {
            let p = bins[i] as f64 / N_SAMPLES as f64;
            assert!((p - 0.5).abs() < margin, "random bit {}: {}", i, p);
        }
    }
}
