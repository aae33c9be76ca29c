use board_fdt::DeviceTree;

use crate::handoff::{Handoff, HandoffError};

const MEMORY_REGION: &str = "memory-region";
const FRAMEBUFFER: &str = "framebuffer";

/// Hands the framebuffer carveouts of `nodes` from the handoff tree on to
/// `tree`.
///
/// Nodes without a carveout in the handoff tree are skipped quietly. Any
/// other failure is logged and only affects that node.
pub fn copy_carveouts(tree: &mut DeviceTree, handoff: &Handoff<'_>, nodes: &[&str]) {
    for &path in nodes {
        log::info!("copying carveout for {path}");

        let carveout = match handoff.carveout(path, MEMORY_REGION, 0) {
            Ok(carveout) => carveout,
            Err(HandoffError::NotFound) => continue,
            Err(e) => {
                log::warn!("failed to get carveout for {path}: {e}");
                continue;
            }
        };

        match tree.set_carveout(path, MEMORY_REGION, 0, FRAMEBUFFER, &carveout) {
            Ok(phandle) => log::debug!(
                "{path}: {:#x} size {:#x} as phandle {phandle}",
                carveout.start,
                carveout.size
            ),
            Err(e) => log::warn!("failed to set carveout for {path}: {e}"),
        }
    }
}
