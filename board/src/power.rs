//! Regulator and fan-controller programming over I2C.

use board_abi::max77620::{self, LdoConfig1, LdoPowerMode};
use board_abi::lm96063;
use board_hal::{I2cChip, I2cController, I2cError};
use thiserror::Error;

/// SD card I/O supply.
pub const SDMMC_LDO_MV: u32 = 3300;
/// PCIe supply.
pub const PEX_LDO_MV: u32 = 1050;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum PowerError {
    #[error("cannot find {name} at i2c{bus}:{addr:#04x}: {cause}")]
    ChipNotFound {
        name: &'static str,
        bus: u8,
        addr: u8,
        cause: I2cError,
    },
    #[error("writing {value:#04x} to {chip} register {reg:#04x} failed: {cause}")]
    Write {
        chip: I2cChip,
        reg: u8,
        value: u8,
        cause: I2cError,
    },
    #[error("{0} mV is not a valid ldo output")]
    Voltage(u32),
}

/// A register write to a chip at a fixed location.
#[derive(Debug, Copy, Clone)]
struct RegisterWrite {
    name: &'static str,
    bus: u8,
    addr: u8,
    reg: u8,
    value: u8,
}

impl RegisterWrite {
    fn apply<I: I2cController>(self, i2c: &mut I) -> Result<(), PowerError> {
        let chip = i2c
            .probe(self.bus, self.addr)
            .map_err(|cause| PowerError::ChipNotFound {
                name: self.name,
                bus: self.bus,
                addr: self.addr,
                cause,
            })?;

        log::debug!(
            "{}: {chip} reg {:#04x} <- {:#04x}",
            self.name,
            self.reg,
            self.value
        );
        i2c.write_byte(chip, self.reg, self.value)
            .map_err(|cause| PowerError::Write {
                chip,
                reg: self.reg,
                value: self.value,
                cause,
            })
    }
}

fn max77620_ldo(reg: u8, millivolts: u32) -> Result<RegisterWrite, PowerError> {
    let value = LdoConfig1::new(LdoPowerMode::Normal, millivolts)
        .ok_or(PowerError::Voltage(millivolts))?;
    Ok(RegisterWrite {
        name: "MAX77620",
        bus: max77620::I2C_BUS,
        addr: max77620::I2C_ADDR_7BIT,
        reg,
        value: value.bits(),
    })
}

/// Sets MAX77620 LDO3 to 3.3 V for SD card I/O.
///
/// # Errors
/// Returns an error if the PMIC is missing or the write fails.
pub fn enable_sdmmc_power<I: I2cController>(i2c: &mut I) -> Result<(), PowerError> {
    max77620_ldo(max77620::CNFG1_L3_REG, SDMMC_LDO_MV)?.apply(i2c)
}

/// Sets MAX77620 LDO7 to 1.05 V for PCIe.
///
/// # Errors
/// Returns an error if the PMIC is missing or the write fails.
pub fn enable_pex_power<I: I2cController>(i2c: &mut I) -> Result<(), PowerError> {
    max77620_ldo(max77620::CNFG1_L7_REG, PEX_LDO_MV)?.apply(i2c)
}

/// Routes the LM96063 ALERT/TACH pin to the tachometer input.
///
/// # Errors
/// Returns an error if the fan controller is missing or the write fails.
pub fn enable_fan_tach<I: I2cController>(i2c: &mut I) -> Result<(), PowerError> {
    RegisterWrite {
        name: "LM96063",
        bus: lm96063::I2C_BUS,
        addr: lm96063::I2C_ADDR_7BIT,
        reg: lm96063::CONFIG_REG,
        value: lm96063::Config::TACH_ENABLE.bits(),
    }
    .apply(i2c)
}

/// Powers the PCIe controller.
///
/// A failed register write is only logged.
///
/// # Errors
/// Returns [`PowerError::ChipNotFound`] if the PMIC does not answer.
pub fn init_pcie_power<I: I2cController>(i2c: &mut I) -> Result<(), PowerError> {
    match enable_pex_power(i2c) {
        Ok(()) => Ok(()),
        Err(e @ PowerError::ChipNotFound { .. }) => {
            log::error!("pcie power: {e}");
            Err(e)
        }
        Err(e) => {
            log::warn!("pcie power: {e}");
            Ok(())
        }
    }
}
