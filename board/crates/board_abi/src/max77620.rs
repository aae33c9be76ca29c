//! MAX77620 power management IC
//!
//! Only the LDO configuration registers are described here. Each LDO has a
//! pair of configuration registers starting at [`CNFG1_L0_REG`]; the first
//! of the pair selects the power mode and the output voltage.

use bitfield::bitfield;

use crate::I2cBusNumber;

/// Bus the PMIC sits on.
pub const I2C_BUS: I2cBusNumber = 0;
pub const I2C_ADDR_7BIT: u8 = 0x3c;

pub const CNFG1_L0_REG: u8 = 0x23;
pub const CNFG1_L3_REG: u8 = cnfg1_ldo_reg(3);
pub const CNFG1_L7_REG: u8 = cnfg1_ldo_reg(7);

/// Lowest programmable LDO output.
pub const LDO_MIN_MV: u32 = 800;
pub const LDO_STEP_MV: u32 = 50;
pub const LDO_MAX_CODE: u8 = 0x3f;

/// Returns the CNFG1 register of LDO `ldo`.
#[must_use]
pub const fn cnfg1_ldo_reg(ldo: u8) -> u8 {
    CNFG1_L0_REG + 2 * ldo
}

/// LDO power mode, bits 7:6 of CNFG1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LdoPowerMode {
    Disabled = 0b00,
    LowPower = 0b01,
    Normal = 0b11,
}

impl LdoPowerMode {
    #[must_use]
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0b11 {
            0b00 => Some(Self::Disabled),
            0b01 => Some(Self::LowPower),
            0b11 => Some(Self::Normal),
            _ => None,
        }
    }
}

bitfield! {
    /// CNFG1 register of an LDO.
    #[derive(Clone, Copy, PartialEq, Eq)]
    pub struct LdoConfig1(u8);
    impl Debug;
    pub power_mode_bits, set_power_mode_bits: 7, 6;
    pub voltage_code, set_voltage_code: 5, 0;
}

impl LdoConfig1 {
    /// Builds the register value for `mode` at `millivolts`.
    ///
    /// Returns `None` if the voltage is not reachable with the LDO step.
    #[must_use]
    pub fn new(mode: LdoPowerMode, millivolts: u32) -> Option<Self> {
        let code = millivolts_to_code(millivolts)?;
        let mut reg = LdoConfig1(0);
        reg.set_power_mode_bits(mode as u8);
        reg.set_voltage_code(code);
        Some(reg)
    }

    #[must_use]
    pub fn power_mode(&self) -> Option<LdoPowerMode> {
        LdoPowerMode::from_bits(self.power_mode_bits())
    }

    #[must_use]
    pub fn millivolts(&self) -> u32 {
        LDO_MIN_MV + u32::from(self.voltage_code()) * LDO_STEP_MV
    }

    #[must_use]
    pub fn bits(&self) -> u8 {
        self.0
    }
}

fn millivolts_to_code(millivolts: u32) -> Option<u8> {
    let above_min = millivolts.checked_sub(LDO_MIN_MV)?;
    if above_min % LDO_STEP_MV != 0 {
        return None;
    }
    let code = u8::try_from(above_min / LDO_STEP_MV).ok()?;
    (code <= LDO_MAX_CODE).then_some(code)
}
