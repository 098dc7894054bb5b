//! Default generator and entry point functions.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::cell::RefCell;

use chrono::{DateTime, Utc};

use crate::{GeneratedUuid, Generator, Result, Uuid, UuidVersion};
use inner::GlobalGenInner;
pub use inner::GlobalGenRng;

thread_local! {
    static GLOBAL_GEN: RefCell<Option<GlobalGenInner>> = const { RefCell::new(None) };
}

/// Runs `f` with the thread-local generator, creating one if none exists or if the process ID has
/// changed since it was seeded.
fn with_global_gen<T>(f: impl FnOnce(&mut Generator<GlobalGenRng>) -> Result<T>) -> Result<T> {
    GLOBAL_GEN.with(|cell| {
        let mut slot = cell.borrow_mut();
        let inner = match slot.take() {
            Some(inner) if !inner.is_stale() => inner,
            _ => GlobalGenInner::new()?,
        };
        f(&mut slot.insert(inner).generator)
    })
}

/// Generates a UUIDv4 object.
///
/// # Errors
///
/// Returns [`crate::Error::RandomSourceUnavailable`] if the operating system's random source fails.
///
/// # Examples
///
/// ```rust
/// let uuid = uuidgen_core::uuid4()?;
/// println!("{}", uuid); // e.g., "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
/// # Ok::<(), uuidgen_core::Error>(())
/// ```
pub fn uuid4() -> Result<Uuid> {
    with_global_gen(|g| g.generate_v4())
}

/// Generates a UUIDv7 object from the current time.
///
/// Values generated in distinct milliseconds sort in creation order; values generated within the
/// same millisecond are ordered randomly.
///
/// # Examples
///
/// ```rust
/// let uuid = uuidgen_core::uuid7()?;
/// println!("{}", uuid); // e.g., "01809424-3e59-7c05-9219-566f82fff672"
/// println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
/// # Ok::<(), uuidgen_core::Error>(())
/// ```
pub fn uuid7() -> Result<Uuid> {
    let unix_ts_ms = crate::unix_ts_ms(Utc::now());
    with_global_gen(|g| g.generate_v7(unix_ts_ms))
}

/// Generates a UUID of `version` with the default generator.
///
/// See [`Generator::generate`].
pub fn generate(
    version: UuidVersion,
    namespace: Option<&str>,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<GeneratedUuid> {
    with_global_gen(|g| g.generate(version, namespace, name, now))
}

mod inner {
    use rand::rngs::{adapter::ReseedingRng, OsRng};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Core;

    use crate::{Error, Generator, RandSource, Result};

    /// Bytes generated before the generator reseeds itself from the OS.
    const RESEED_THRESHOLD: u64 = 1024 * 64;

    /// The random number generator of the default generator.
    ///
    /// The default generator currently employs [`ChaCha12Core`] with [`ReseedingRng`] wrapper to
    /// emulate the strategy used by [`rand::rngs::ThreadRng`], seeded from [`OsRng`].
    #[derive(Debug)]
    pub struct GlobalGenRng(ReseedingRng<ChaCha12Core, OsRng>);

    impl RandSource for GlobalGenRng {
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            rand::RngCore::try_fill_bytes(&mut self.0, dest)
        }
    }

    /// A thin wrapper to reset the state when the process ID changes (i.e., upon Unix forks).
    #[derive(Debug)]
    pub(super) struct GlobalGenInner {
        #[cfg(unix)]
        pid: u32,
        pub(super) generator: Generator<GlobalGenRng>,
    }

    impl GlobalGenInner {
        pub(super) fn new() -> Result<Self> {
            let core = ChaCha12Core::from_rng(OsRng).map_err(Error::RandomSourceUnavailable)?;
            tracing::debug!("seeded default UUID generator from OS entropy");
            Ok(Self {
                #[cfg(unix)]
                pid: std::process::id(),
                generator: Generator::new(GlobalGenRng(ReseedingRng::new(
                    core,
                    RESEED_THRESHOLD,
                    OsRng,
                ))),
            })
        }

        /// Returns true if the process has forked since the generator was seeded.
        pub(super) fn is_stale(&self) -> bool {
            #[cfg(unix)]
            return self.pid != std::process::id();

            #[cfg(not(unix))]
            false
        }
    }
}
