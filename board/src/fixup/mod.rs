//! Edits applied to the outgoing device tree right before it is handed on.

mod carveout;
mod mac;
mod prune;

use board_fdt::DeviceTree;
use board_hal::Environment;

pub use carveout::copy_carveouts;
pub use mac::fixup_mac_address;
pub use prune::{PrunableTree, PruneStats, prune_tree};

use crate::handoff::{Handoff, HandoffError};
use crate::net::MacAddress;
use crate::profile::BoardProfile;
use crate::state::BoardState;

/// Applies every board fixup to `tree`: ethernet addresses, display
/// carveouts and finally txslot pruning.
///
/// Without a handoff tree only the environment MAC and pruning apply.
/// Failures are logged, the tree is always left bootable.
pub fn finalize_tree<P: BoardProfile, E: Environment + ?Sized>(
    tree: &mut DeviceTree,
    handoff: Option<&Handoff<'_>>,
    env: &E,
    state: &BoardState,
) {
    let local = match handoff.map(Handoff::ethaddr) {
        Some(Ok(mac)) => mac,
        Some(Err(HandoffError::NotFound)) | None => MacAddress::ZERO,
        Some(Err(e)) => {
            log::warn!("cannot read local MAC address: {e}");
            MacAddress::ZERO
        }
    };
    fixup_mac_address(tree, local, env);

    if let Some(handoff) = handoff {
        copy_carveouts(tree, handoff, P::DISPLAY_NODES);
    }

    let txslot = state.txslot();
    match prune_tree(tree, txslot) {
        Ok(stats) if stats.deleted > 0 || stats.failed > 0 => log::info!(
            "txslot {txslot}: removed {} of {} nodes, {} could not be removed",
            stats.deleted,
            stats.examined,
            stats.failed
        ),
        Ok(_) => {}
        Err(e) => log::error!("txslot pruning stopped, device tree is corrupt: {e}"),
    }
}
