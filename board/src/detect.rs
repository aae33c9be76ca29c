//! Txslot strap sampling.
//!
//! The strap is read once during peripheral init. Any failure along the way
//! falls back to slot A.

use board_hal::{GpioController, GpioError};
use thiserror::Error;

use crate::txslot::TxSlot;

/// Label the strap line is requested under.
pub const TXSLOT_GPIO_LABEL: &str = "txslot-gpios";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum StrapError {
    #[error("strap pin lookup failed: {0}")]
    Lookup(GpioError),
    #[error("strap pin request failed: {0}")]
    Request(GpioError),
    #[error("strap pin read failed: {0}")]
    Read(GpioError),
}

/// Outcome of sampling the strap.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Detection {
    High,
    Low,
    Failed(StrapError),
}

impl Detection {
    /// High selects slot A, low slot B. Failures default to A.
    #[must_use]
    pub const fn txslot(self) -> TxSlot {
        match self {
            Self::High | Self::Failed(_) => TxSlot::A,
            Self::Low => TxSlot::B,
        }
    }

    #[must_use]
    pub const fn is_fallback(self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<Result<bool, StrapError>> for Detection {
    fn from(sample: Result<bool, StrapError>) -> Self {
        match sample {
            Ok(true) => Self::High,
            Ok(false) => Self::Low,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Samples strap pin `pin` and decides which slot is populated.
pub fn detect_txslot<G: GpioController>(gpio: &mut G, pin: &str) -> Detection {
    let detection = Detection::from(sample_strap(gpio, pin));
    match detection {
        Detection::Failed(e @ StrapError::Read(_)) => {
            // treated like a high level, but flagged so the board owner sees it
            log::error!("txslot strap {pin}: {e}, reporting slot A");
        }
        Detection::Failed(e) => log::warn!("txslot strap {pin}: {e}, defaulting to slot A"),
        _ => log::debug!("txslot strap {pin} reads {detection:?}"),
    }
    detection
}

fn sample_strap<G: GpioController>(gpio: &mut G, pin: &str) -> Result<bool, StrapError> {
    let mut line = gpio.lookup_name(pin).map_err(StrapError::Lookup)?;
    gpio.request_input(&mut line, TXSLOT_GPIO_LABEL)
        .map_err(StrapError::Request)?;
    gpio.get_value(&line).map_err(StrapError::Read)
}
