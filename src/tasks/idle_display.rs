//! Idle screen: uptime counter and the entry hint.
//!
//! Runs once per second and stays off the display whenever the menu task
//! has claimed it. The display mutex guarantees whichever task gets there
//! first finishes its full render.

use core::fmt::Write as _;
use core::sync::atomic::Ordering;

use defmt::info;
use embassy_executor::task;
use embassy_time::{Duration, Ticker};

use crate::DISPLAY;
use crate::config::IDLE_REFRESH_MS;
use crate::tasks::menu::MENU_ACTIVE;

#[task]
pub async fn idle_display_task() {
    info!("Starting idle display task");

    let mut ticker = Ticker::every(Duration::from_millis(IDLE_REFRESH_MS));
    let mut seconds: u32 = 0;

    loop {
        ticker.next().await;
        if MENU_ACTIVE.load(Ordering::Relaxed) {
            continue;
        }

        let mut line: heapless::String<16> = heapless::String::new();
        let _ = write!(line, "Seconds: {}", seconds);

        let display = DISPLAY.get().await;
        let mut lcd = display.lock().await;
        lcd.clear().await;
        lcd.set_cursor(0, 0).await;
        lcd.print(line.as_str()).await;
        lcd.set_cursor(1, 0).await;
        lcd.print("Press A to edit").await;

        seconds = seconds.wrapping_add(1);
    }
}
