pub mod eeprom;
pub mod keypad;
pub mod lcd;
pub mod rtc;
