//! 4x4 matrix keypad behind a PCF8574 expander.
//!
//! Rows are driven low one at a time on P0..P3 and the columns read back on
//! P4..P7. One debounced key per physical press; the scan reports nothing
//! until the debounce window after a press has elapsed.

use defmt::debug;
use embedded_hal_async::i2c::I2c;
use embassy_time::{Duration, Instant, Timer};

use crate::BusDevice;
use crate::config::{KEYPAD_ADDR, KEYPAD_DEBOUNCE_MS, KEYPAD_ROW_GAP_MS, KEYPAD_SETTLE_US};

/// One keypress, named by the keypad legend.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum Key {
    Digit(char),
    /// Enter / exit the menu.
    A,
    /// Previous parameter.
    B,
    /// Next parameter.
    C,
    /// Delete last keystroke.
    D,
    /// Decimal point or sign toggle.
    Star,
    /// Submit.
    Hash,
}

#[rustfmt::skip]
const KEYS: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Row select masks: one row pin low per scan step.
const ROW_MASKS: [u8; 4] = [0b1111_1110, 0b1111_1101, 0b1111_1011, 0b1111_0111];

fn key_from_char(ch: char) -> Key {
    match ch {
        'A' => Key::A,
        'B' => Key::B,
        'C' => Key::C,
        'D' => Key::D,
        '*' => Key::Star,
        '#' => Key::Hash,
        digit => Key::Digit(digit),
    }
}

pub struct Keypad {
    dev: BusDevice,
    held: bool,
    pressed_at: Instant,
}

impl Keypad {
    pub fn new(dev: BusDevice) -> Self {
        Self {
            dev,
            held: false,
            pressed_at: Instant::MIN,
        }
    }

    /// Scan all rows once. Returns a key only on a fresh press.
    pub async fn scan(&mut self) -> Option<Key> {
        if self.held {
            if Instant::now() - self.pressed_at > Duration::from_millis(KEYPAD_DEBOUNCE_MS) {
                self.held = false;
            }
            return None;
        }

        for (row, mask) in ROW_MASKS.iter().enumerate() {
            let Some(data) = self.read_row(*mask).await else {
                continue;
            };
            if let Some(col) = pressed_column(data) {
                let ch = KEYS[row][col];
                self.held = true;
                self.pressed_at = Instant::now();
                debug!("key {} (raw {=u8:x})", ch, data);
                return Some(key_from_char(ch));
            }
            Timer::after_millis(KEYPAD_ROW_GAP_MS).await;
        }
        None
    }

    /// Drive one row mask, let the expander settle, read the pins back.
    async fn read_row(&mut self, mask: u8) -> Option<u8> {
        self.dev.write(KEYPAD_ADDR, &[mask]).await.ok()?;
        Timer::after_micros(KEYPAD_SETTLE_US).await;
        let mut data = [0u8; 1];
        self.dev.read(KEYPAD_ADDR, &mut data).await.ok()?;
        Some(data[0])
    }
}

/// Which column pin is pulled low, if exactly one is.
fn pressed_column(data: u8) -> Option<usize> {
    match !data & 0xF0 {
        0x10 => Some(0),
        0x20 => Some(1),
        0x40 => Some(2),
        0x80 => Some(3),
        _ => None,
    }
}
