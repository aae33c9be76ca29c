//! `/reserved-memory` regions and the `memory-region` carveouts pointing at
//! them.

use alloc::borrow::ToOwned;
use alloc::format;
use alloc::vec::Vec;

use crate::{DeviceTree, FdtError, FdtResult, NodeOffset};

const RESERVED_MEMORY: &str = "reserved-memory";

/// A physical memory region reserved for one hardware block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Carveout {
    pub start: u64,
    pub size: u64,
}

impl Carveout {
    #[must_use]
    pub const fn new(start: u64, size: u64) -> Self {
        Self { start, size }
    }

    /// Last byte of the region, `None` if it is empty or wraps around.
    #[must_use]
    pub const fn end(&self) -> Option<u64> {
        if self.size == 0 {
            return None;
        }
        self.start.checked_add(self.size - 1)
    }
}

impl DeviceTree {
    /// Reserves `carveout` under `/reserved-memory` and returns the phandle of
    /// the region node.
    ///
    /// `/reserved-memory` is created with the root's cell sizes when missing.
    /// A region node that already covers exactly the same range is reused.
    ///
    /// # Errors
    /// Returns [`FdtError::BadValue`] for an empty or wrapping range or one
    /// that does not fit the cell sizes. Also fails if the tree is corrupt
    /// or no phandle is left.
    pub fn add_reserved_memory(&mut self, basename: &str, carveout: &Carveout) -> FdtResult<u32> {
        let end = carveout.end().ok_or(FdtError::BadValue)?;
        let parent = self.reserved_memory_node()?;
        let address_cells = self.address_cells(parent)?;
        let size_cells = self.size_cells(parent)?;

        let mut existing = None;
        for node in self.subnodes(parent) {
            let node = node?;
            let Ok(reg) = self.property(node, "reg") else {
                continue;
            };
            if decode_reg(reg, address_cells, size_cells) == Some(*carveout) {
                existing = Some(node);
                break;
            }
        }

        if let Some(node) = existing {
            if let Some(phandle) = self.phandle(node)? {
                return Ok(phandle);
            }
            let phandle = self.generate_phandle()?;
            self.set_property_u32(node, "phandle", phandle)?;
            return Ok(phandle);
        }

        let name = if carveout.start == 0 {
            basename.to_owned()
        } else {
            format!("{basename}@{:x}", carveout.start)
        };

        let mut reg = Vec::with_capacity(16);
        push_cells(&mut reg, carveout.start, address_cells)?;
        push_cells(&mut reg, carveout.size, size_cells)?;

        let phandle = self.generate_phandle()?;
        let node = self.add_subnode(parent, &name)?;
        self.set_property(node, "reg", &reg)?;
        self.set_property_u32(node, "phandle", phandle)?;
        log::debug!(
            "reserved {name} {:#x}-{end:#x} as phandle {phandle}",
            carveout.start
        );
        Ok(phandle)
    }

    /// Reserves `carveout` as `name` and stores its phandle at position
    /// `index` of `prop_name` on the node at `path`.
    ///
    /// `index` may point at an existing entry or one past the last.
    ///
    /// # Errors
    /// Returns [`FdtError::NotFound`] if `path` does not exist and
    /// [`FdtError::BadValue`] for an index that would leave a hole. Nothing is
    /// reserved in either case.
    pub fn set_carveout(
        &mut self,
        path: &str,
        prop_name: &str,
        index: usize,
        name: &str,
        carveout: &Carveout,
    ) -> FdtResult<u32> {
        let node = self.path_offset(path)?;
        let mut phandles = match self.property(node, prop_name) {
            Ok(value) => value.to_vec(),
            Err(FdtError::NotFound) => Vec::new(),
            Err(e) => return Err(e),
        };
        if phandles.len() % 4 != 0 {
            return Err(FdtError::BadValue);
        }
        let slot = index
            .checked_mul(4)
            .filter(|&slot| slot <= phandles.len())
            .ok_or(FdtError::BadValue)?;

        let phandle = self.add_reserved_memory(name, carveout)?;
        if slot == phandles.len() {
            phandles.extend_from_slice(&phandle.to_be_bytes());
        } else {
            phandles[slot..slot + 4].copy_from_slice(&phandle.to_be_bytes());
        }

        // reserving memory may have moved the node
        let node = self.path_offset(path)?;
        self.set_property(node, prop_name, &phandles)?;
        Ok(phandle)
    }

    fn reserved_memory_node(&mut self) -> FdtResult<NodeOffset> {
        let root = self.root();
        match self.subnode_offset(root, RESERVED_MEMORY) {
            Ok(node) => return Ok(node),
            Err(FdtError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let address_cells = self.address_cells(root)?;
        let size_cells = self.size_cells(root)?;
        let node = self.add_subnode(root, RESERVED_MEMORY)?;
        self.set_property_u32(node, "#address-cells", address_cells)?;
        self.set_property_u32(node, "#size-cells", size_cells)?;
        self.set_property(node, "ranges", &[])?;
        Ok(node)
    }
}

fn push_cells(out: &mut Vec<u8>, value: u64, cells: u32) -> FdtResult<()> {
    match cells {
        1 => {
            let value = u32::try_from(value).map_err(|_| FdtError::BadValue)?;
            out.extend_from_slice(&value.to_be_bytes());
        }
        2 => out.extend_from_slice(&value.to_be_bytes()),
        _ => return Err(FdtError::BadValue),
    }
    Ok(())
}

/// Decodes the first `(address, size)` pair of a `reg` value.
fn decode_reg(reg: &[u8], address_cells: u32, size_cells: u32) -> Option<Carveout> {
    let (start, rest) = read_cells(reg, address_cells)?;
    let (size, _) = read_cells(rest, size_cells)?;
    Some(Carveout::new(start, size))
}

fn read_cells(raw: &[u8], cells: u32) -> Option<(u64, &[u8])> {
    let len = cells as usize * 4;
    if !(1..=2).contains(&cells) || raw.len() < len {
        return None;
    }
    let (value, rest) = raw.split_at(len);
    let value = value
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    Some((value, rest))
}
