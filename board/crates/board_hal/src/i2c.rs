use core::fmt::{Display, Formatter};

use thiserror::Error;

/// A chip found on a bus, as returned by [`I2cController::probe`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct I2cChip {
    pub bus: u8,
    pub addr: u8,
}

impl Display for I2cChip {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "i2c{}:0x{:02x}", self.bus, self.addr)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum I2cError {
    #[error("no such bus")]
    NoBus,
    #[error("no device at address")]
    NoDevice,
    #[error("transfer not acknowledged")]
    Nack,
    #[error("transfer timed out")]
    Timeout,
    #[error("i2c driver error {0}")]
    Driver(i32),
}

/// Register-oriented I2C access.
pub trait I2cController {
    /// Locates the chip at 7-bit address `addr` on bus `bus`.
    ///
    /// # Errors
    /// Returns [`I2cError::NoBus`] or [`I2cError::NoDevice`] if nothing
    /// answers at that location.
    fn probe(&mut self, bus: u8, addr: u8) -> Result<I2cChip, I2cError>;

    /// Writes `data` starting at register `reg`.
    ///
    /// # Errors
    /// Returns an error if the transfer fails.
    fn write(&mut self, chip: I2cChip, reg: u8, data: &[u8]) -> Result<(), I2cError>;

    /// Writes a single register.
    ///
    /// # Errors
    /// Returns an error if the transfer fails.
    fn write_byte(&mut self, chip: I2cChip, reg: u8, value: u8) -> Result<(), I2cError> {
        self.write(chip, reg, &[value])
    }
}
