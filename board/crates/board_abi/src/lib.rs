#![no_std]

pub mod lm96063;
pub mod max77620;

/// Bootloader I2C bus numbering is not the kernel's: bus 1 here is the
/// kernel's `i2c-0`.
pub type I2cBusNumber = u8;
