//! Parameter-configuration panel firmware for the feeder-pillar protection
//! controller: 4x4 keypad, 16x2 character display, DS1307 clock, 24C32
//! EEPROM and a flash key-value store, all behind one I2C bus.

#![no_std]
#![no_main]

use defmt::{error, info};
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::{FLASH, I2C0};
use embassy_rp::watchdog::Watchdog;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_sync::once_lock::OnceLock;
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

mod config;
mod config_resources;
mod devices;
mod storage;
mod tasks;

use crate::config::{FLASH_SIZE, I2C_FREQUENCY_HZ};
use crate::config_resources::{AssignedResources, FlashResources, I2cBusResources};
use crate::devices::eeprom::Eeprom24c32;
use crate::devices::keypad::Keypad;
use crate::devices::lcd::Lcd;
use crate::devices::rtc::Ds1307;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

/// The shared I2C bus. Keypad expander, display, clock and EEPROM all sit
/// on it; the mutex is held for exactly one transaction at a time.
pub type I2cBusType = Mutex<NoopRawMutex, I2c<'static, I2C0, i2c::Async>>;
pub static I2C_BUS: OnceLock<I2cBusType> = OnceLock::new();

/// Per-peripheral handle onto the shared bus.
pub type BusDevice = I2cDevice<'static, NoopRawMutex, I2c<'static, I2C0, i2c::Async>>;

pub type FlashType = Flash<'static, FLASH, Async, FLASH_SIZE>;
pub type MFlashType = Mutex<NoopRawMutex, FlashType>;
pub static KV_FLASH: OnceLock<MFlashType> = OnceLock::new();

/// The display is a shared resource of its own: the menu task and the idle
/// display task both render to it, and a render must never be torn.
pub type MDisplayType = Mutex<NoopRawMutex, Lcd>;
pub static DISPLAY: OnceLock<MDisplayType> = OnceLock::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);

    info!("Starting up...");

    let mut watchdog = Watchdog::new(p.WATCHDOG);
    watchdog.start(Duration::from_secs(8));

    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = I2C_FREQUENCY_HZ;
    let i2c = I2c::new_async(r.i2c_bus.i2c, r.i2c_bus.scl, r.i2c_bus.sda, Irqs, i2c_config);
    if I2C_BUS.init(Mutex::new(i2c)).is_err() {
        error!("Failed to initialize I2C bus");
        return;
    }
    let bus = I2C_BUS.get().await;

    let flash = Flash::<_, Async, FLASH_SIZE>::new(r.flash.flash, r.flash.dma);
    if KV_FLASH.init(Mutex::new(flash)).is_err() {
        error!("Failed to initialize flash");
        return;
    }

    let mut lcd = Lcd::new(I2cDevice::new(bus));
    lcd.init().await;
    lcd.backlight(true).await;
    if DISPLAY.init(Mutex::new(lcd)).is_err() {
        error!("Failed to initialize display");
        return;
    }

    let keypad = Keypad::new(I2cDevice::new(bus));
    let rtc = Ds1307::new(I2cDevice::new(bus));
    let eeprom = Eeprom24c32::new(I2cDevice::new(bus));

    spawner.spawn(tasks::splash::splash_task()).unwrap();
    spawner
        .spawn(tasks::menu::menu_task(keypad, rtc, eeprom))
        .unwrap();
    spawner
        .spawn(tasks::idle_display::idle_display_task())
        .unwrap();

    info!("Tasks started");

    loop {
        Timer::after(Duration::from_secs(1)).await;
        watchdog.feed();
    }
}
