//! User preferences: the default UUID version and the display format.

use std::convert::Infallible;

use crate::{FormatOptions, UuidVersion};

/// The preferences the app remembers between sessions.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Preferences {
    pub default_version: UuidVersion,
    pub format_options: FormatOptions,
}

/// The key-value settings storage the surrounding app provides.
pub trait SettingsStore {
    /// The failure type of the underlying storage.
    type Error: std::error::Error + Send + Sync + 'static;

    fn default_version(&self) -> Result<UuidVersion, Self::Error>;

    fn set_default_version(&mut self, version: UuidVersion) -> Result<(), Self::Error>;

    fn format_options(&self) -> Result<FormatOptions, Self::Error>;

    fn set_format_options(&mut self, options: FormatOptions) -> Result<(), Self::Error>;

    /// Reads both preferences at once.
    fn preferences(&self) -> Result<Preferences, Self::Error> {
        Ok(Preferences {
            default_version: self.default_version()?,
            format_options: self.format_options()?,
        })
    }
}

/// An in-memory [`SettingsStore`].
#[derive(Clone, Debug, Default)]
pub struct MemorySettings {
    preferences: Preferences,
}

impl MemorySettings {
    /// Creates a store holding `preferences`.
    pub fn new(preferences: Preferences) -> Self {
        Self { preferences }
    }
}

impl SettingsStore for MemorySettings {
    type Error = Infallible;

    fn default_version(&self) -> Result<UuidVersion, Self::Error> {
        Ok(self.preferences.default_version)
    }

    fn set_default_version(&mut self, version: UuidVersion) -> Result<(), Self::Error> {
        self.preferences.default_version = version;
        Ok(())
    }

    fn format_options(&self) -> Result<FormatOptions, Self::Error> {
        Ok(self.preferences.format_options)
    }

    fn set_format_options(&mut self, options: FormatOptions) -> Result<(), Self::Error> {
        self.preferences.format_options = options;
        Ok(())
    }
}
