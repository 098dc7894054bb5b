//! Display and export options for UUID strings.

use std::{fmt, ops};

use crate::{codec, Uuid};

/// One rendering option of [`FormatOptions`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FormatOption {
    /// Groups the digits as 8-4-4-4-12.
    Hyphen,

    /// Uses upper case hexadecimal digits.
    Uppercase,

    /// Wraps the result in `{` and `}`.
    Braces,
}

impl FormatOption {
    /// All options in bit order.
    pub const ALL: [Self; 3] = [Self::Hyphen, Self::Uppercase, Self::Braces];

    /// Returns the bit that represents this option in [`FormatOptions::bits`].
    pub const fn mask(self) -> u8 {
        match self {
            Self::Hyphen => 1 << 0,
            Self::Uppercase => 1 << 1,
            Self::Braces => 1 << 2,
        }
    }
}

/// A set of [`FormatOption`]s.
///
/// The set is an immutable value; every one of the eight combinations is valid. The bit encoding
/// is stable and is what stored records carry, so a record can be rendered the way it was saved.
///
/// # Examples
///
/// ```rust
/// use uuidgen_core::{FormatOption, FormatOptions, Uuid};
///
/// let uuid: Uuid = "91d3e977-b34a-5505-b2e8-71b62328a7d0".parse()?;
/// let options = FormatOptions::default()
///     .with(FormatOption::Uppercase, true)
///     .with(FormatOption::Braces, true);
/// assert_eq!(options.apply(&uuid), "{91D3E977-B34A-5505-B2E8-71B62328A7D0}");
/// # Ok::<(), uuidgen_core::ParseError>(())
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "u8", into = "u8"))]
pub struct FormatOptions(u8);

impl FormatOptions {
    const VALID_BITS: u8 = 0b111;

    /// No option set: 32 lowercase digits.
    pub const EMPTY: Self = Self(0);

    /// The default rendering: the canonical 8-4-4-4-12 lowercase form.
    pub const DEFAULT: Self = Self(FormatOption::Hyphen.mask());

    /// Decodes stored flags, ignoring bits that do not name an option.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::VALID_BITS)
    }

    /// Returns the stored flag encoding.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if `option` is set.
    pub const fn contains(self, option: FormatOption) -> bool {
        self.0 & option.mask() != 0
    }

    /// Returns a copy with `option` set to `enabled`.
    #[must_use]
    pub const fn with(self, option: FormatOption, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | option.mask())
        } else {
            Self(self.0 & !option.mask())
        }
    }

    /// Renders `uuid` according to the options.
    ///
    /// The output is accepted by [`parse_canonical`](crate::parse_canonical) for every
    /// combination of options.
    pub fn apply(self, uuid: &Uuid) -> String {
        let mut buffer = [0u8; 38];
        let braces = self.contains(FormatOption::Braces);
        let start = usize::from(braces);
        let mut end = start
            + codec::write_hex(
                uuid.as_bytes(),
                self.contains(FormatOption::Hyphen),
                self.contains(FormatOption::Uppercase),
                &mut buffer[start..],
            );
        if braces {
            buffer[0] = b'{';
            buffer[end] = b'}';
            end += 1;
        }
        buffer[..end].iter().map(|&c| char::from(c)).collect()
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Debug for FormatOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for option in FormatOption::ALL {
            if self.contains(option) {
                set.entry(&option);
            }
        }
        set.finish()
    }
}

impl From<FormatOption> for FormatOptions {
    fn from(src: FormatOption) -> Self {
        Self(src.mask())
    }
}

impl ops::BitOr<FormatOption> for FormatOptions {
    type Output = Self;

    fn bitor(self, rhs: FormatOption) -> Self::Output {
        self.with(rhs, true)
    }
}

impl From<u8> for FormatOptions {
    fn from(src: u8) -> Self {
        Self::from_bits(src)
    }
}

impl From<FormatOptions> for u8 {
    fn from(src: FormatOptions) -> Self {
        src.bits()
    }
}
