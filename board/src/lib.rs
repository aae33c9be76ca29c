//! Board support for the Miovision SmartSense carrier boards.
//!
//! Boot runs in two phases. [`init::init_peripherals`] samples the txslot
//! strap and powers the peripherals, returning a [`BoardState`].
//! [`fixup::finalize_tree`] later takes that state and edits the device tree
//! handed to the kernel.

#![no_std]

extern crate alloc;

pub mod detect;
pub mod fixup;
pub mod handoff;
pub mod init;
pub mod net;
pub mod power;
pub mod profile;
pub mod state;
pub mod txslot;

#[cfg(test)]
mod testing;

pub use profile::{ActiveBoard, BoardProfile};
pub use state::BoardState;
pub use txslot::TxSlot;
