//! Services the board code borrows from the bootloader.
//!
//! The bootloader owns the GPIO, I2C and environment drivers. Board code only
//! sees them through the traits in this crate, so that every call can fail
//! with a closed set of causes and the board decides what to do about it.

#![no_std]

mod env;
mod gpio;
mod i2c;

pub use env::*;
pub use gpio::*;
pub use i2c::*;
