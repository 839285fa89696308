//! 24C32 serial EEPROM: one 32-byte slot per parameter.
//!
//! Values are NUL-terminated ASCII strings at fixed byte addresses. The
//! device takes a two-byte big-endian word address; a write must be
//! followed by the part's internal write-cycle pause before the next
//! transaction will be acknowledged.

use embedded_hal_async::i2c::I2c;
use embassy_time::Timer;

use panel_core::params::{VALUE_CAP, Value};

use crate::BusDevice;
use crate::config::{EEPROM_ADDR, EEPROM_WRITE_CYCLE_MS};

#[derive(Debug, defmt::Format)]
pub enum EepromError {
    /// Transaction NACKed or the bus errored out.
    Bus,
    /// Slot contents are not a terminated ASCII string.
    Corrupt,
}

pub struct Eeprom24c32 {
    dev: BusDevice,
}

impl Eeprom24c32 {
    pub fn new(dev: BusDevice) -> Self {
        Self { dev }
    }

    /// Read the string stored at `addr`.
    pub async fn read_str(&mut self, addr: u16) -> Result<Value, EepromError> {
        let mut raw = [0u8; VALUE_CAP + 1];
        self.dev
            .write_read(EEPROM_ADDR, &addr.to_be_bytes(), &mut raw)
            .await
            .map_err(|_| EepromError::Bus)?;

        let len = raw
            .iter()
            .position(|b| *b == 0)
            .ok_or(EepromError::Corrupt)?;
        let text = core::str::from_utf8(&raw[..len]).map_err(|_| EepromError::Corrupt)?;
        if !text.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(EepromError::Corrupt);
        }
        Ok(panel_core::params::value_from(text))
    }

    /// Store a string (plus terminator) at `addr`.
    pub async fn write_str(&mut self, addr: u16, text: &str) -> Result<(), EepromError> {
        let mut frame: heapless::Vec<u8, { VALUE_CAP + 3 }> = heapless::Vec::new();
        let _ = frame.extend_from_slice(&addr.to_be_bytes());
        let _ = frame.extend_from_slice(text.as_bytes());
        let _ = frame.push(0);

        self.dev
            .write(EEPROM_ADDR, &frame)
            .await
            .map_err(|_| EepromError::Bus)?;
        Timer::after_millis(EEPROM_WRITE_CYCLE_MS).await;
        Ok(())
    }
}
