use board_fdt::DeviceTree;
use board_hal::Environment;

use crate::net::MacAddress;

const ETHERNET_ALIAS: &str = "ethernet";
const ETHADDR_VAR: &str = "ethaddr";

/// Publishes the ethernet addresses on the node behind the `ethernet` alias.
///
/// `local` goes to `local-mac-address` when it is usable. The `ethaddr`
/// environment variable goes to `mac-address`, but only if it differs from
/// `local`.
pub fn fixup_mac_address<E: Environment + ?Sized>(
    tree: &mut DeviceTree,
    local: MacAddress,
    env: &E,
) {
    let Some(path) = tree.alias(ETHERNET_ALIAS) else {
        return;
    };
    log::debug!("ethernet alias found: {path}");

    let node = match tree.path_offset(path) {
        Ok(node) => node,
        Err(e) => {
            log::warn!("ethernet alias points to absent node {path}: {e}");
            return;
        }
    };

    if local.is_valid() {
        match tree.set_property(node, "local-mac-address", local.octets()) {
            Ok(()) => log::debug!("local MAC address set: {local}"),
            Err(e) => log::warn!("cannot set local-mac-address: {e}"),
        }
    }

    let Some(ethaddr) = env.get(ETHADDR_VAR) else {
        return;
    };
    let mac = match ethaddr.parse::<MacAddress>() {
        Ok(mac) if mac.is_valid() => mac,
        Ok(mac) => {
            log::warn!("ignoring unusable {ETHADDR_VAR} {mac}");
            return;
        }
        Err(e) => {
            log::warn!("ignoring {ETHADDR_VAR} '{ethaddr}': {e}");
            return;
        }
    };
    if mac == local {
        return;
    }
    match tree.set_property(node, "mac-address", mac.octets()) {
        Ok(()) => log::debug!("MAC address set: {mac}"),
        Err(e) => log::warn!("cannot set mac-address: {e}"),
    }
}
