use thiserror::Error;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum GpioError {
    #[error("no gpio with that name")]
    NotFound,
    #[error("gpio line already requested")]
    Busy,
    #[error("gpio driver error {0}")]
    Driver(i32),
}

/// Named-pin GPIO service.
///
/// Pins are looked up by the platform's name for them (e.g. `"x6"` for
/// port X, offset 6), then requested before they can be sampled.
pub trait GpioController {
    type Line;

    /// Resolves a pin name to a line descriptor.
    ///
    /// # Errors
    /// Returns [`GpioError::NotFound`] if no controller knows the name.
    fn lookup_name(&mut self, name: &str) -> Result<Self::Line, GpioError>;

    /// Takes ownership of `line` and configures it as an input.
    ///
    /// # Errors
    /// Returns [`GpioError::Busy`] if the line is already owned.
    fn request_input(&mut self, line: &mut Self::Line, label: &str) -> Result<(), GpioError>;

    /// Samples the logic level of a requested line.
    ///
    /// # Errors
    /// Returns an error if the controller could not read the line.
    fn get_value(&mut self, line: &Self::Line) -> Result<bool, GpioError>;
}
