//! Storage router: one parameter in, exactly one backend out.
//!
//! RTC- and EEPROM-backed parameters load and store individually and
//! immediately. Key-value parameters go through batch operations that take
//! the flash mutex once per batch, which keeps open/commit cycles (and
//! erase wear) down. A failing backend never aborts a batch and never
//! escalates: the affected parameter falls back to its default and the
//! incident is logged.

use defmt::{info, warn};
use sequential_storage::cache::NoCache;
use sequential_storage::map::{fetch_item, store_item};

use panel_core::format::{canonical_date, canonical_time};
use panel_core::params::{
    Backend, PARAM_COUNT, PARAMETERS, ParamKind, ParamSpec, TIME_INDEX, Value, kv_key,
};
use panel_core::validate::{canonical_default, validate};

use crate::config::{EEPROM_SLOT_SIZE, kv_flash_range};
use crate::devices::eeprom::Eeprom24c32;
use crate::devices::rtc::Ds1307;
use crate::KV_FLASH;

#[derive(Debug, defmt::Format)]
pub enum StorageError {
    Flash(embassy_rp::flash::Error),
    Storage,
}

impl From<embassy_rp::flash::Error> for StorageError {
    fn from(error: embassy_rp::flash::Error) -> Self {
        StorageError::Flash(error)
    }
}

impl From<sequential_storage::Error<embassy_rp::flash::Error>> for StorageError {
    fn from(_: sequential_storage::Error<embassy_rp::flash::Error>) -> Self {
        StorageError::Storage
    }
}

/// Byte address of a parameter's EEPROM slot.
fn eeprom_slot(spec: &ParamSpec) -> u16 {
    spec.id * EEPROM_SLOT_SIZE
}

/// Run a raw stored value through the validation gate. Anything that does
/// not satisfy the parameter's rules becomes the default.
fn gate(spec: &ParamSpec, raw: &str) -> Value {
    match validate(spec, raw) {
        Ok(value) => value,
        Err(invalid) => {
            warn!("{}: stored value rejected, using default", spec.label);
            invalid.fallback
        }
    }
}

/// All parameter values plus the two individually-addressed backends.
/// Owned exclusively by the menu task.
pub struct ParamStore {
    rtc: Ds1307,
    eeprom: Eeprom24c32,
    values: [Value; PARAM_COUNT],
}

impl ParamStore {
    pub fn new(rtc: Ds1307, eeprom: Eeprom24c32) -> Self {
        Self {
            rtc,
            eeprom,
            values: core::array::from_fn(|_| Value::new()),
        }
    }

    /// Probe the clock hardware and bring every parameter to a valid
    /// current value.
    pub async fn init(&mut self) {
        self.rtc.probe().await;
        self.load_all().await;
        info!(
            "all parameters loaded, clock source: {}",
            if self.rtc.is_hardware() {
                "hardware"
            } else {
                "simulated"
            }
        );
    }

    pub fn value(&self, index: usize) -> &Value {
        &self.values[index]
    }

    pub fn set_value(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }

    pub fn spec(index: usize) -> &'static ParamSpec {
        &PARAMETERS[index]
    }

    pub fn password(&self) -> &str {
        self.values[panel_core::params::PASSWORD_INDEX].as_str()
    }

    pub fn password_enabled(&self) -> bool {
        self.values[panel_core::params::PASSWORD_ENABLE_INDEX].as_str() == "Enable"
    }

    /// Load every parameter: clock and EEPROM individually, then the
    /// key-value batch.
    pub async fn load_all(&mut self) {
        for index in 0..PARAM_COUNT {
            match PARAMETERS[index].backend {
                Backend::Rtc => self.load_from_rtc(index).await,
                Backend::Eeprom => self.load_from_eeprom(index).await,
                Backend::KeyValue => {}
            }
        }
        self.kv_load_all().await;
    }

    /// Persist one parameter to its backend. A key-value parameter flushes
    /// the whole key-value batch in one flash session.
    pub async fn store(&mut self, index: usize) {
        match PARAMETERS[index].backend {
            Backend::Rtc => self.store_to_rtc(index).await,
            Backend::Eeprom => {
                let spec = &PARAMETERS[index];
                if let Err(error) = self
                    .eeprom
                    .write_str(eeprom_slot(spec), self.values[index].as_str())
                    .await
                {
                    warn!("{}: EEPROM store failed: {}", spec.label, error);
                }
            }
            Backend::KeyValue => self.kv_store_all().await,
        }
    }

    /// Re-read the time parameter from the clock (hardware or simulated).
    pub async fn refresh_time(&mut self) {
        let snap = self.rtc.snapshot().await;
        self.values[TIME_INDEX] = if snap.time_is_valid() {
            canonical_time(snap.hours, snap.minutes)
        } else {
            warn!("clock returned invalid time, using default");
            canonical_default(&PARAMETERS[TIME_INDEX])
        };
    }

    async fn load_from_rtc(&mut self, index: usize) {
        let spec = &PARAMETERS[index];
        let snap = self.rtc.snapshot().await;
        self.values[index] = match spec.kind {
            ParamKind::Time if snap.time_is_valid() => canonical_time(snap.hours, snap.minutes),
            ParamKind::Date if snap.date_is_valid() => {
                canonical_date(snap.day, snap.month, snap.year)
            }
            _ => {
                warn!("{}: clock returned invalid value, using default", spec.label);
                canonical_default(spec)
            }
        };
    }

    async fn load_from_eeprom(&mut self, index: usize) {
        let spec = &PARAMETERS[index];
        self.values[index] = match self.eeprom.read_str(eeprom_slot(spec)).await {
            Ok(raw) => gate(spec, raw.as_str()),
            Err(error) => {
                warn!("{}: EEPROM load failed ({}), using default", spec.label, error);
                canonical_default(spec)
            }
        };
    }

    async fn store_to_rtc(&mut self, index: usize) {
        let spec = &PARAMETERS[index];
        let value = self.values[index].as_str();
        match spec.kind {
            // Canonical HH:MM.
            ParamKind::Time => {
                if let (Some(hour), Some(minute)) = (parse_two(value, 0), parse_two(value, 3)) {
                    self.rtc.set_time(hour, minute).await;
                }
            }
            // Canonical DDMMYY.
            ParamKind::Date => {
                if let (Some(day), Some(month), Some(year)) =
                    (parse_two(value, 0), parse_two(value, 2), parse_two(value, 4))
                {
                    self.rtc.set_date(day, month, year).await;
                }
            }
            _ => warn!("{}: not a clock parameter", spec.label),
        }
    }

    /// Fetch every key-value parameter in one flash session. Missing,
    /// corrupt, or rejected entries fall back to the default, which is then
    /// re-persisted in the same session.
    async fn kv_load_all(&mut self) {
        let flash = KV_FLASH.get().await;
        let mut flash = flash.lock().await;
        let range = kv_flash_range();
        let mut buffer = [0u8; 128];
        let mut reseed: heapless::Vec<usize, PARAM_COUNT> = heapless::Vec::new();

        for index in 0..PARAM_COUNT {
            let spec = &PARAMETERS[index];
            if spec.backend != Backend::KeyValue {
                continue;
            }
            let key = kv_key(spec);
            let fetched: Result<Option<&[u8]>, _> = fetch_item(
                &mut *flash,
                range.clone(),
                &mut NoCache::new(),
                &mut buffer,
                &key,
            )
            .await;

            let fresh = match fetched {
                Ok(Some(bytes)) => match core::str::from_utf8(bytes) {
                    Ok(text) => match validate(spec, text) {
                        Ok(value) => Some(value),
                        Err(invalid) => {
                            warn!("{}: stored value rejected, reseeding default", spec.label);
                            self.values[index] = invalid.fallback;
                            None
                        }
                    },
                    Err(_) => {
                        warn!("{}: stored value not UTF-8, reseeding default", spec.label);
                        None
                    }
                },
                Ok(None) => {
                    info!("{}: no stored value, seeding default", spec.label);
                    None
                }
                Err(error) => {
                    let error = StorageError::from(error);
                    warn!(
                        "{}: key-value fetch failed ({}), reseeding default",
                        spec.label, error
                    );
                    None
                }
            };

            match fresh {
                Some(value) => self.values[index] = value,
                None => {
                    if self.values[index].is_empty() {
                        self.values[index] = canonical_default(spec);
                    }
                    let _ = reseed.push(index);
                }
            }
        }

        for index in reseed {
            let spec = &PARAMETERS[index];
            let bytes: &[u8] = self.values[index].as_bytes();
            let stored = store_item(
                &mut *flash,
                range.clone(),
                &mut NoCache::new(),
                &mut buffer,
                &kv_key(spec),
                &bytes,
            )
            .await;
            if stored.is_err() {
                warn!("{}: default reseed failed", spec.label);
            }
        }
    }

    /// Write every key-value parameter in one flash session. A failing
    /// entry is logged and skipped; the rest of the batch still goes out.
    async fn kv_store_all(&mut self) {
        let flash = KV_FLASH.get().await;
        let mut flash = flash.lock().await;
        let range = kv_flash_range();
        let mut buffer = [0u8; 128];

        for index in 0..PARAM_COUNT {
            let spec = &PARAMETERS[index];
            if spec.backend != Backend::KeyValue {
                continue;
            }
            let bytes: &[u8] = self.values[index].as_bytes();
            let stored = store_item(
                &mut *flash,
                range.clone(),
                &mut NoCache::new(),
                &mut buffer,
                &kv_key(spec),
                &bytes,
            )
            .await;
            if let Err(error) = stored {
                let error = StorageError::from(error);
                warn!("{}: key-value store failed ({})", spec.label, error);
            }
        }
    }
}

fn parse_two(s: &str, at: usize) -> Option<u8> {
    let chunk = s.get(at..at + 2)?;
    if chunk.bytes().all(|b| b.is_ascii_digit()) {
        chunk.parse().ok()
    } else {
        None
    }
}
