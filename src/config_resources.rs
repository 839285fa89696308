// Pin mapping for the panel controller.

//
//| GPIO # | Name     | Description                                          |
//| ------ | -------- | ---------------------------------------------------- |
//| 4      | I2C0_SDA | Shared bus: keypad expander, LCD, DS1307, 24C32.     |
//| 5      | I2C0_SCL | Shared bus clock.                                    |
//
// Everything else on the panel hangs off the I2C bus; the remaining GPIOs
// are unconnected.

use assign_resources::assign_resources;
use embassy_rp::peripherals;

assign_resources! {
  i2c_bus: I2cBusResources {
    sda: PIN_4,
    scl: PIN_5,
    i2c: I2C0,
  },
  flash: FlashResources {
    flash: FLASH,
    dma: DMA_CH0,
  },
}
