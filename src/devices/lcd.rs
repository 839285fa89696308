//! HD44780 character display behind a PCF8574 I2C backpack.
//!
//! 4-bit mode: each byte goes out as two nibbles on the expander's upper
//! pins, strobed with the enable line. The panel never issues raw bus bytes
//! from elsewhere; this driver is the only writer to the display address.
//!
//! Display writes are deliberately infallible at the API boundary: a
//! failing display must never stall the menu, so errors are logged and
//! swallowed here.

use defmt::warn;
use embedded_hal_async::i2c::I2c;
use embassy_time::Timer;

use crate::BusDevice;
use crate::config::LCD_ADDR;

const CMD_CLEAR: u8 = 0x01;
const CMD_HOME: u8 = 0x02;
const CMD_ENTRY_MODE: u8 = 0x06; // increment, no shift
const CMD_FUNCTION_SET: u8 = 0x28; // 4-bit, 2 lines, 5x8 dots
const CMD_DISPLAY_ON: u8 = 0x0C; // display on, cursor off, blink off
const CMD_CURSOR_ON: u8 = 0x0E;
const CMD_CURSOR_BLINK: u8 = 0x0F;
const CMD_SET_DDRAM: u8 = 0x80;

const BACKLIGHT_BIT: u8 = 0x08;
const ENABLE_BIT: u8 = 0x04;
const RS_BIT: u8 = 0x01;

pub struct Lcd {
    dev: BusDevice,
    backlight: u8,
    cursor_shown: bool,
}

impl Lcd {
    pub fn new(dev: BusDevice) -> Self {
        Self {
            dev,
            backlight: BACKLIGHT_BIT,
            cursor_shown: false,
        }
    }

    /// Standard power-on sequence into 4-bit mode.
    pub async fn init(&mut self) {
        Timer::after_millis(50).await;

        // Three times 0x3, then 0x2 to switch the interface width.
        for _ in 0..3 {
            self.write_nibble(0x03, false).await;
            Timer::after_millis(5).await;
        }
        self.write_nibble(0x02, false).await;
        Timer::after_millis(5).await;

        self.command(CMD_FUNCTION_SET).await;
        self.command(CMD_DISPLAY_ON).await;
        self.command(CMD_CLEAR).await;
        Timer::after_millis(2).await;
        self.command(CMD_ENTRY_MODE).await;
    }

    pub async fn clear(&mut self) {
        self.command(CMD_CLEAR).await;
        Timer::after_millis(2).await;
        self.command(CMD_HOME).await;
        Timer::after_millis(2).await;
    }

    /// Row 0 or 1, column 0..=15.
    pub async fn set_cursor(&mut self, row: u8, col: u8) {
        let base: u8 = if row == 0 { 0x00 } else { 0x40 };
        self.command(CMD_SET_DDRAM | (base + col)).await;
    }

    pub async fn print(&mut self, text: &str) {
        for byte in text.bytes() {
            self.write_byte(byte, true).await;
        }
    }

    pub async fn show_cursor(&mut self, show: bool) {
        self.cursor_shown = show;
        self.command(if show { CMD_CURSOR_ON } else { CMD_DISPLAY_ON })
            .await;
    }

    pub async fn blink_cursor(&mut self, blink: bool) {
        let cmd = if blink {
            CMD_CURSOR_BLINK
        } else if self.cursor_shown {
            CMD_CURSOR_ON
        } else {
            CMD_DISPLAY_ON
        };
        self.command(cmd).await;
    }

    pub async fn backlight(&mut self, on: bool) {
        self.backlight = if on { BACKLIGHT_BIT } else { 0 };
        // Latch the new backlight bit with an otherwise empty write.
        self.write_nibble(0, false).await;
    }

    async fn command(&mut self, cmd: u8) {
        self.write_byte(cmd, false).await;
        // Command execution time per the HD44780 datasheet.
        Timer::after_micros(50).await;
    }

    async fn write_byte(&mut self, byte: u8, is_data: bool) {
        self.write_nibble(byte >> 4, is_data).await;
        self.write_nibble(byte & 0x0F, is_data).await;
    }

    async fn write_nibble(&mut self, nibble: u8, is_data: bool) {
        let data = (nibble << 4) | self.backlight | if is_data { RS_BIT } else { 0 };
        // Strobe the enable line: high with the nibble, then low.
        if self
            .dev
            .write(LCD_ADDR, &[data | ENABLE_BIT, data])
            .await
            .is_err()
        {
            warn!("LCD write failed");
        }
    }
}
