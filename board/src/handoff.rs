//! Read access to the device tree the previous boot stage hands over.

use board_fdt::Carveout;
use fdt::Fdt;
use thiserror::Error;

use crate::net::MacAddress;

const ETHERNET_ALIAS: &str = "ethernet";
const LOCAL_MAC_ADDRESS: &str = "local-mac-address";
/// `/chosen` properties carrying the MAC as a string, newest first.
const CHOSEN_MAC_PROPERTIES: [&str; 2] = ["nvidia,ethernet-mac", "nvidia,ether-mac"];

#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("handoff device tree is invalid: {0:?}")]
    Parse(fdt::FdtError),
    #[error("not found")]
    NotFound,
    #[error("malformed value")]
    BadValue,
}

/// A parsed, read-only handoff device tree.
pub struct Handoff<'a> {
    fdt: Fdt<'a>,
}

impl<'a> Handoff<'a> {
    /// # Errors
    /// Returns [`HandoffError::Parse`] if `blob` is not a device tree.
    pub fn new(blob: &'a [u8]) -> Result<Self, HandoffError> {
        Fdt::new(blob)
            .map(|fdt| Self { fdt })
            .map_err(HandoffError::Parse)
    }

    /// The locally administered MAC address of the on-board ethernet.
    ///
    /// Taken from the node behind the `ethernet` alias, falling back to the
    /// string properties under `/chosen` when that node has no address of
    /// the right length.
    ///
    /// # Errors
    /// Returns [`HandoffError::NotFound`] if no source carries an address and
    /// [`HandoffError::BadValue`] if the `/chosen` string is malformed.
    pub fn ethaddr(&self) -> Result<MacAddress, HandoffError> {
        let eth = self
            .fdt
            .aliases()
            .and_then(|aliases| aliases.resolve(ETHERNET_ALIAS))
            .and_then(|path| self.fdt.find_node(path));
        if let Some(prop) = eth.and_then(|node| node.property(LOCAL_MAC_ADDRESS)) {
            match MacAddress::try_from(prop.value) {
                Ok(mac) => return Ok(mac),
                Err(_) => log::debug!(
                    "ignoring {LOCAL_MAC_ADDRESS} of {} bytes",
                    prop.value.len()
                ),
            }
        }

        let chosen = self.fdt.find_node("/chosen").ok_or(HandoffError::NotFound)?;
        for name in CHOSEN_MAC_PROPERTIES {
            if let Some(mac) = chosen.property(name) {
                return mac
                    .as_str()
                    .and_then(|s| s.parse().ok())
                    .ok_or(HandoffError::BadValue);
            }
        }
        Err(HandoffError::NotFound)
    }

    /// Resolves entry `index` of the phandle list `prop_name` on the node at
    /// `path` to the memory region it points at, wherever that node lives.
    ///
    /// # Errors
    /// Returns [`HandoffError::NotFound`] if the node, the property, the
    /// entry or the region is missing, and [`HandoffError::BadValue`] if the
    /// region's `reg` cannot be decoded.
    pub fn carveout(
        &self,
        path: &str,
        prop_name: &str,
        index: usize,
    ) -> Result<Carveout, HandoffError> {
        let node = self.fdt.find_node(path).ok_or(HandoffError::NotFound)?;
        let phandles = node
            .property(prop_name)
            .ok_or(HandoffError::NotFound)?
            .value;
        let phandle = phandles
            .chunks_exact(4)
            .nth(index)
            .map(|raw| u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
            .ok_or(HandoffError::NotFound)?;

        let region = self
            .fdt
            .all_nodes()
            .find(|node| {
                node.property("phandle")
                    .or_else(|| node.property("linux,phandle"))
                    .and_then(|p| p.as_usize())
                    == Some(phandle as usize)
            })
            .ok_or(HandoffError::NotFound)?;

        // decoded with the cell sizes of the region's parent
        let reg = region
            .raw_reg()
            .ok_or(HandoffError::NotFound)?
            .next()
            .ok_or(HandoffError::BadValue)?;
        let start = decode_cells(reg.address)?;
        let size = decode_cells(reg.size)?;
        if size == 0 {
            return Err(HandoffError::BadValue);
        }
        Ok(Carveout::new(start, size))
    }
}

fn decode_cells(raw: &[u8]) -> Result<u64, HandoffError> {
    if raw.len() != 4 && raw.len() != 8 {
        return Err(HandoffError::BadValue);
    }
    Ok(raw.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}


#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use vm_fdt::FdtWriter;

    use super::fixtures::{DISPLAYS, cboot_blob};
    use super::*;

    const MAC: [u8; 6] = [0x00, 0x04, 0x4b, 0x12, 0x34, 0x56];

    #[test]
    fn ethaddr_from_ethernet_node() {
        let blob = cboot_blob(Some(MAC), Some("00:04:4b:ff:ff:ff"), &[]);
        let handoff = Handoff::new(&blob).unwrap();
        assert_eq!(handoff.ethaddr().unwrap(), MacAddress::new(MAC));
    }

    #[test]
    fn ethaddr_from_chosen() {
        let blob = cboot_blob(None, Some("00:04:4b:12:34:56"), &[]);
        let handoff = Handoff::new(&blob).unwrap();
        assert_eq!(handoff.ethaddr().unwrap(), MacAddress::new(MAC));

        let blob = cboot_blob(None, Some("not a mac"), &[]);
        let handoff = Handoff::new(&blob).unwrap();
        assert!(matches!(handoff.ethaddr(), Err(HandoffError::BadValue)));

        let blob = cboot_blob(None, None, &[]);
        let handoff = Handoff::new(&blob).unwrap();
        assert!(matches!(handoff.ethaddr(), Err(HandoffError::NotFound)));
    }

    #[test]
    fn carveout_lookup() {
        let blob = cboot_blob(
            None,
            None,
            &[("15200000", 0x9600_0000, 0x80_0000), ("15220000", 0x1_0000_0000, 0x1000)],
        );
        let handoff = Handoff::new(&blob).unwrap();

        assert_eq!(
            handoff.carveout(DISPLAYS[0], "memory-region", 0).unwrap(),
            Carveout::new(0x9600_0000, 0x80_0000)
        );
        assert_eq!(
            handoff.carveout(DISPLAYS[2], "memory-region", 0).unwrap(),
            Carveout::new(0x1_0000_0000, 0x1000)
        );
        assert!(matches!(
            handoff.carveout(DISPLAYS[1], "memory-region", 0),
            Err(HandoffError::NotFound)
        ));
        assert!(matches!(
            handoff.carveout(DISPLAYS[0], "memory-region", 1),
            Err(HandoffError::NotFound)
        ));
        assert!(matches!(
            handoff.carveout("/host1x@13e00000/nope", "memory-region", 0),
            Err(HandoffError::NotFound)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Handoff::new(&[0u8; 64]),
            Err(HandoffError::Parse(_))
        ));
    }

    fn short_local_mac_blob(chosen_mac: Option<&str>) -> Vec<u8> {
        let mut fdt = FdtWriter::new().unwrap();
        let root = fdt.begin_node("").unwrap();
        let aliases = fdt.begin_node("aliases").unwrap();
        fdt.property_string("ethernet", "/ethernet@2490000").unwrap();
        fdt.end_node(aliases).unwrap();
        let chosen = fdt.begin_node("chosen").unwrap();
        if let Some(mac) = chosen_mac {
            fdt.property_string("nvidia,ethernet-mac", mac).unwrap();
        }
        fdt.end_node(chosen).unwrap();
        let eth = fdt.begin_node("ethernet@2490000").unwrap();
        fdt.property("local-mac-address", &[0x00, 0x04, 0x4b, 0x12])
            .unwrap();
        fdt.end_node(eth).unwrap();
        fdt.end_node(root).unwrap();
        fdt.finish().unwrap()
    }

    #[test]
    fn short_local_mac_falls_back_to_chosen() {
        let blob = short_local_mac_blob(Some("00:04:4b:12:34:56"));
        let handoff = Handoff::new(&blob).unwrap();
        assert_eq!(handoff.ethaddr().unwrap(), MacAddress::new(MAC));

        let blob = short_local_mac_blob(None);
        let handoff = Handoff::new(&blob).unwrap();
        assert!(matches!(handoff.ethaddr(), Err(HandoffError::NotFound)));
    }

    #[test]
    fn carveout_outside_reserved_memory() {
        let mut fdt = FdtWriter::new().unwrap();
        let root = fdt.begin_node("").unwrap();
        fdt.property_u32("#address-cells", 2).unwrap();
        fdt.property_u32("#size-cells", 2).unwrap();

        let pool = fdt.begin_node("carveouts").unwrap();
        fdt.property_u32("#address-cells", 1).unwrap();
        fdt.property_u32("#size-cells", 1).unwrap();
        let fb = fdt.begin_node("fb@80000000").unwrap();
        fdt.property_array_u32("reg", &[0x8000_0000, 0x10_0000])
            .unwrap();
        fdt.property_u32("linux,phandle", 7).unwrap();
        fdt.end_node(fb).unwrap();
        let empty = fdt.begin_node("empty").unwrap();
        fdt.property_array_u32("reg", &[0x9000_0000]).unwrap();
        fdt.property_u32("phandle", 8).unwrap();
        fdt.end_node(empty).unwrap();
        fdt.end_node(pool).unwrap();

        let display = fdt.begin_node("display").unwrap();
        fdt.property_array_u32("memory-region", &[7, 8]).unwrap();
        fdt.end_node(display).unwrap();
        fdt.end_node(root).unwrap();
        let blob = fdt.finish().unwrap();

        let handoff = Handoff::new(&blob).unwrap();
        assert_eq!(
            handoff.carveout("/display", "memory-region", 0).unwrap(),
            Carveout::new(0x8000_0000, 0x10_0000)
        );
        assert!(matches!(
            handoff.carveout("/display", "memory-region", 1),
            Err(HandoffError::BadValue)
        ));
    }
}
