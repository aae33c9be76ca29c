//! LM96063 remote diode temperature sensor and fan controller

use bitflags::bitflags;

use crate::I2cBusNumber;

pub const I2C_BUS: I2cBusNumber = 1;
pub const I2C_ADDR_7BIT: u8 = 0x4c;

pub const CONFIG_REG: u8 = 0x03;

bitflags! {
    /// Configuration register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Config: u8 {
        /// Route the ALERT/TACH pin to the tachometer input. Off after reset.
        const TACH_ENABLE = 1 << 2;
    }
}
