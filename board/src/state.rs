//! Board facts gathered during peripheral init and consumed when the
//! outgoing device tree is finalized.

use conquer_once::spin::OnceCell;
use thiserror::Error;

use crate::txslot::TxSlot;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
pub enum StateError {
    #[error("txslot already published as {0}")]
    AlreadyPublished(TxSlot),
}

/// Write-once board state.
///
/// The detector publishes the txslot exactly once. Readers before that see
/// [`TxSlot::Unknown`].
#[derive(Debug)]
pub struct BoardState {
    txslot: OnceCell<TxSlot>,
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            txslot: OnceCell::uninit(),
        }
    }

    /// Records the detected slot.
    ///
    /// # Errors
    /// Returns [`StateError::AlreadyPublished`] with the stored slot if one
    /// was published before. The stored value is left unchanged.
    pub fn publish_txslot(&self, txslot: TxSlot) -> Result<(), StateError> {
        if self.txslot.try_init_once(|| txslot).is_ok() {
            return Ok(());
        }

        let current = self.txslot();
        log::warn!("ignoring txslot {txslot}, already published as {current}");
        Err(StateError::AlreadyPublished(current))
    }

    #[must_use]
    pub fn txslot(&self) -> TxSlot {
        self.txslot.get().copied().unwrap_or_default()
    }
}
