//! One-shot startup splash. Holds the display for its whole duration so
//! the other tasks cannot tear the first screen.

use core::fmt::Write as _;

use defmt::info;
use embassy_executor::task;
use embassy_time::Timer;

use crate::DISPLAY;
use crate::config::{FW_VERSION_STR, SPLASH_DURATION_MS};

#[task]
pub async fn splash_task() {
    info!("Showing startup splash");

    let mut line: heapless::String<16> = heapless::String::new();
    let _ = write!(line, "fw {}", FW_VERSION_STR);

    let display = DISPLAY.get().await;
    let mut lcd = display.lock().await;
    lcd.clear().await;
    lcd.set_cursor(0, 0).await;
    lcd.print("Feeder Panel").await;
    lcd.set_cursor(1, 0).await;
    lcd.print(line.as_str()).await;
    Timer::after_millis(SPLASH_DURATION_MS).await;
}
