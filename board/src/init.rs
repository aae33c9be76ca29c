//! Peripheral init entry points called by the bootloader.

use board_hal::{GpioController, I2cController};

use crate::detect::detect_txslot;
use crate::power::{self, PowerError};
use crate::profile::BoardProfile;
use crate::state::BoardState;
use crate::txslot::TxSlot;

/// Detects the txslot and powers the peripherals that depend on it.
///
/// The returned state is what [`crate::fixup::finalize_tree`] prunes the
/// outgoing tree with. Nothing here stops the boot: every failure is logged
/// and the board carries on with a safe default. The fan controller is only
/// touched once SD card power is up.
pub fn init_peripherals<P, G, I>(gpio: &mut G, i2c: &mut I) -> BoardState
where
    P: BoardProfile,
    G: GpioController,
    I: I2cController,
{
    log::info!("board: {}", P::NAME);

    let state = BoardState::new();
    if let Some(pin) = P::TXSLOT_STRAP {
        let txslot = detect_txslot(gpio, pin).txslot();
        log::info!("txslot: {txslot}");
        if let Err(e) = state.publish_txslot(txslot) {
            log::warn!("{e}");
        }
    }

    if let Err(e) = power::enable_sdmmc_power(i2c) {
        log::warn!("sdmmc power: {e}, skipping fan controller");
        return state;
    }

    if state.txslot() == TxSlot::A {
        if let Err(e) = power::enable_fan_tach(i2c) {
            log::warn!("fan tachometer: {e}");
        }
    }

    state
}

/// Board init for boards without a txslot strap.
///
/// Powers SD card I/O and enables the fan tachometer.
///
/// # Errors
/// Returns the PMIC error if SD card power could not be set. Fan controller
/// failures are only logged.
pub fn init_board<I: I2cController>(i2c: &mut I) -> Result<(), PowerError> {
    let sdmmc = power::enable_sdmmc_power(i2c);
    if let Err(e) = &sdmmc {
        log::error!("sdmmc power: {e}");
    }

    if let Err(e) = power::enable_fan_tach(i2c) {
        log::warn!("fan tachometer: {e}");
    }

    sdmmc
}
