//! Platform-neutral core of the feeder-panel firmware.
//!
//! Holds everything that does not touch hardware: the parameter table, the
//! validation and display-formatting engine, the BCD codec for the clock
//! chip's register image, the password/lockout session, and the edit buffer
//! used while a parameter is being keyed in. The firmware crate drives these
//! from its tasks; tests run on the host.

#![cfg_attr(not(test), no_std)]

pub mod auth;
pub mod bcd;
pub mod edit;
pub mod format;
pub mod params;
pub mod validate;

pub use params::{
    Backend, PARAM_COUNT, PARAMETERS, ParamGroup, ParamKind, ParamSpec, Rules, VALUE_CAP, Value,
};
