//! Stand-ins for the bootloader services.

use alloc::string::String;
use alloc::vec::Vec;

use board_hal::{Environment, GpioController, GpioError, I2cChip, I2cController, I2cError};

pub const MAX77620: I2cChip = I2cChip { bus: 0, addr: 0x3c };
pub const LM96063: I2cChip = I2cChip { bus: 1, addr: 0x4c };

pub struct FakeGpio {
    pub level: bool,
    pub lookup_error: Option<GpioError>,
    pub request_error: Option<GpioError>,
    pub read_error: Option<GpioError>,
    /// `(pin, label)` of every successful request.
    pub requested: Vec<(String, String)>,
}

impl FakeGpio {
    pub fn reading(level: bool) -> Self {
        Self {
            level,
            lookup_error: None,
            request_error: None,
            read_error: None,
            requested: Vec::new(),
        }
    }
}

impl GpioController for FakeGpio {
    type Line = String;

    fn lookup_name(&mut self, name: &str) -> Result<Self::Line, GpioError> {
        match self.lookup_error {
            Some(e) => Err(e),
            None => Ok(name.into()),
        }
    }

    fn request_input(&mut self, line: &mut Self::Line, label: &str) -> Result<(), GpioError> {
        if let Some(e) = self.request_error {
            return Err(e);
        }
        self.requested.push((line.clone(), label.into()));
        Ok(())
    }

    fn get_value(&mut self, _line: &Self::Line) -> Result<bool, GpioError> {
        match self.read_error {
            Some(e) => Err(e),
            None => Ok(self.level),
        }
    }
}

/// Records every successful register write.
#[derive(Default)]
pub struct FakeI2c {
    pub present: Vec<I2cChip>,
    /// Chips that NAK every write.
    pub failing: Vec<I2cChip>,
    pub writes: Vec<(I2cChip, u8, Vec<u8>)>,
}

impl FakeI2c {
    pub fn with_all_chips() -> Self {
        Self {
            present: alloc::vec![MAX77620, LM96063],
            ..Self::default()
        }
    }
}

impl I2cController for FakeI2c {
    fn probe(&mut self, bus: u8, addr: u8) -> Result<I2cChip, I2cError> {
        let chip = I2cChip { bus, addr };
        if self.present.contains(&chip) {
            Ok(chip)
        } else {
            Err(I2cError::NoDevice)
        }
    }

    fn write(&mut self, chip: I2cChip, reg: u8, data: &[u8]) -> Result<(), I2cError> {
        if self.failing.contains(&chip) {
            return Err(I2cError::Nack);
        }
        self.writes.push((chip, reg, data.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeEnv(pub Vec<(&'static str, &'static str)>);

impl Environment for FakeEnv {
    fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}
