//! Persisted modem configuration (`SPEC_FULL.md` §3 "Configuration
//! persistence"). `ModemSettings` is the `postcard`-serialisable record
//! stored in flash; `Config` (`crate::config`) is what the hot path actually
//! consumes, derived from it once at startup.

use crate::config::{Config, FilterProfile, RxTimeout};
use crate::error::ModemError;
use embedded_storage::nor_flash::NorFlashError;
use sequential_storage::map::{fetch_item, store_item, StorageItem};
use sequential_storage::Error as StorageError;

/// A single flash-backed key under which the settings blob lives.
const SETTINGS_KEY: u8 = 0;

/// The on-flash representation of everything a foreground operator can
/// change. Raw `CONFIG_*` values in milliseconds/Hz, validated into a
/// [`Config`] by [`ModemSettings::to_config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModemSettings {
    pub dac_sample_rate: u32,
    pub preamble_len_ms: u32,
    pub trailer_len_ms: u32,
    pub rx_timeout_ms: i32,
    pub filter: FilterProfile,
}

impl ModemSettings {
    /// Defaults matching typical Bell-202 TNC practice: 300 ms of preamble
    /// and trailer, non-blocking reads, Butterworth filtering.
    pub const fn defaults() -> Self {
        Self {
            dac_sample_rate: 9600,
            preamble_len_ms: 300,
            trailer_len_ms: 300,
            rx_timeout_ms: 0,
            filter: FilterProfile::Butterworth,
        }
    }

    /// Validates and derives the runtime [`Config`] from these settings.
    pub fn to_config(self) -> Result<Config, ModemError> {
        Config::new(
            self.dac_sample_rate,
            self.preamble_len_ms,
            self.trailer_len_ms,
            RxTimeout::from_config_ms(self.rx_timeout_ms),
        )
    }
}

impl Default for ModemSettings {
    fn default() -> Self {
        Self::defaults()
    }
}

/// `sequential_storage::map::{fetch_item, store_item}` key off this rather
/// than `serde` directly, so the on-flash record format is whatever
/// `postcard` produces and the key space is a single fixed byte.
impl StorageItem for ModemSettings {
    type Key = u8;
    type Error = ModemError;

    fn serialize_into(&self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        postcard::to_slice(self, buffer)
            .map(|used| used.len())
            .map_err(|_| ModemError::StorageFailure)
    }

    fn deserialize_from(buffer: &[u8]) -> Result<Self, Self::Error> {
        postcard::from_bytes(buffer).map_err(|_| ModemError::StorageFailure)
    }

    fn key(&self) -> Self::Key {
        SETTINGS_KEY
    }
}

fn map_storage_err<E: NorFlashError>(_: StorageError<E>) -> ModemError {
    ModemError::StorageFailure
}

/// Loads settings from `flash_range` of `flash`, falling back to
/// [`ModemSettings::defaults`] if the region has never been written.
pub fn load<F>(
    flash: &mut F,
    flash_range: core::ops::Range<u32>,
    data_buffer: &mut [u8],
) -> Result<ModemSettings, ModemError>
where
    F: embedded_storage::nor_flash::MultiwriteNorFlash,
    F::Error: NorFlashError,
{
    let found: Option<ModemSettings> = fetch_item(flash, flash_range, data_buffer, SETTINGS_KEY)
        .map_err(map_storage_err)?;
    Ok(found.unwrap_or_default())
}

/// Persists `settings`, overwriting any previous value under the same key.
pub fn save<F>(
    flash: &mut F,
    flash_range: core::ops::Range<u32>,
    data_buffer: &mut [u8],
    settings: &ModemSettings,
) -> Result<(), ModemError>
where
    F: embedded_storage::nor_flash::MultiwriteNorFlash,
    F::Error: NorFlashError,
{
    store_item(flash, flash_range, data_buffer, SETTINGS_KEY, settings).map_err(map_storage_err)
}
