use core::ops::Range;

// I2C addresses of the peripherals sharing the bus.
pub const LCD_ADDR: u8 = 0x27; // HD44780 behind a PCF8574 backpack
pub const KEYPAD_ADDR: u8 = 0x23; // PCF8574 driving the 4x4 matrix
pub const RTC_ADDR: u8 = 0x68; // DS1307
pub const EEPROM_ADDR: u8 = 0x50; // 24C32

pub const I2C_FREQUENCY_HZ: u32 = 100_000; // DS1307 tops out at 100 kHz

// RTC transaction bounds. The probe uses the short timeout so a missing
// chip is detected quickly at startup; regular operations get more slack.
pub const RTC_PROBE_TIMEOUT_MS: u64 = 50;
pub const RTC_OP_TIMEOUT_MS: u64 = 250;

// Delay between writing a time parameter and reading it back for display.
pub const RTC_SETTLE_MS: u64 = 100;

pub const KEYPAD_DEBOUNCE_MS: u64 = 300;
pub const KEYPAD_SETTLE_US: u64 = 100; // PCF8574 output settle before readback
pub const KEYPAD_ROW_GAP_MS: u64 = 1;

pub const MENU_TICK_MS: u64 = 50; // keypress poll period
pub const IDLE_REFRESH_MS: u64 = 1000; // idle screen update period
pub const SPLASH_DURATION_MS: u64 = 2000;

// Leaving the menu untouched this long abandons any edit and clears
// authentication.
pub const INACTIVITY_TIMEOUT_MS: u64 = 15_000;

// How long transient notices stay on screen.
pub const SAVED_NOTICE_MS: u64 = 1000;
pub const ERROR_NOTICE_MS: u64 = 2000;
pub const RETRY_NOTICE_MS: u64 = 1500;
pub const TIMEOUT_NOTICE_MS: u64 = 1000;

pub const LCD_COLS: u8 = 16;

// 24C32 layout: one 32-byte slot per parameter id, value stored as a
// NUL-terminated string. Slots are page-aligned so a write never crosses
// a page boundary.
pub const EEPROM_SLOT_SIZE: u16 = 32;
pub const EEPROM_WRITE_CYCLE_MS: u64 = 5;

pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const FLASH_ERASE_BLOCK: u32 = 4096;
const KV_STORE_SECTORS: u32 = 2;

/// Flash offset range of the parameter key-value store: the top sectors of
/// the 2 MB QSPI flash, clear of the firmware image.
pub fn kv_flash_range() -> Range<u32> {
    let end = FLASH_SIZE as u32;
    (end - KV_STORE_SECTORS * FLASH_ERASE_BLOCK)..end
}

pub const FW_VERSION_STR: &str = "1.0.0";
