//! In-place mutation. Every function here may move the nodes that follow
//! the edit.

use alloc::vec::Vec;

use crate::walk::{FDT_BEGIN_NODE, FDT_END_NODE, FDT_PROP, PROP_HEADER_SIZE, align4};
use crate::{DeviceTree, FdtError, FdtResult, NodeOffset};

impl DeviceTree {
    /// Creates or replaces a property.
    ///
    /// New properties are appended after the node's existing ones.
    ///
    /// # Errors
    /// Returns an error if `node` is not a node.
    pub fn set_property(&mut self, node: NodeOffset, name: &str, value: &[u8]) -> FdtResult<()> {
        let len = u32::try_from(value.len()).map_err(|_| FdtError::BadValue)?;

        if let Some(slot) = self.find_property(node, name)? {
            let start = slot.offset + PROP_HEADER_SIZE;
            let old_end = start + align4(slot.len);
            self.structure
                .splice(start..old_end, padded(value.iter().copied()));
            self.structure[slot.offset + 4..slot.offset + 8].copy_from_slice(&len.to_be_bytes());
            return Ok(());
        }

        let at = self.properties_end(node)?;
        let name_offset = self.string_offset(name)?;

        let mut entry = Vec::with_capacity(PROP_HEADER_SIZE + align4(value.len()));
        entry.extend_from_slice(&FDT_PROP.to_be_bytes());
        entry.extend_from_slice(&len.to_be_bytes());
        entry.extend_from_slice(&name_offset.to_be_bytes());
        entry.extend(padded(value.iter().copied()));
        self.structure.splice(at..at, entry);
        Ok(())
    }

    /// # Errors
    /// See [`DeviceTree::set_property`].
    pub fn set_property_u32(&mut self, node: NodeOffset, name: &str, value: u32) -> FdtResult<()> {
        self.set_property(node, name, &value.to_be_bytes())
    }

    /// Stores `value` with its NUL terminator.
    ///
    /// # Errors
    /// See [`DeviceTree::set_property`].
    pub fn set_property_str(&mut self, node: NodeOffset, name: &str, value: &str) -> FdtResult<()> {
        let mut raw = Vec::with_capacity(value.len() + 1);
        raw.extend_from_slice(value.as_bytes());
        raw.push(0);
        self.set_property(node, name, &raw)
    }

    /// Adds an empty child node named `name` and returns its offset.
    ///
    /// The child goes in front of `parent`'s existing children.
    ///
    /// # Errors
    /// Returns [`FdtError::Exists`] if `parent` already has a child of that
    /// name and [`FdtError::BadPath`] for names that cannot be stored.
    pub fn add_subnode(&mut self, parent: NodeOffset, name: &str) -> FdtResult<NodeOffset> {
        if name.is_empty() || name.contains(['/', '\0']) {
            return Err(FdtError::BadPath);
        }
        match self.subnode_offset(parent, name) {
            Ok(_) => return Err(FdtError::Exists),
            Err(FdtError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let at = self.properties_end(parent)?;
        let mut entry = Vec::with_capacity(8 + align4(name.len() + 1));
        entry.extend_from_slice(&FDT_BEGIN_NODE.to_be_bytes());
        entry.extend(padded(name.bytes().chain([0])));
        entry.extend_from_slice(&FDT_END_NODE.to_be_bytes());
        self.structure.splice(at..at, entry);
        Ok(NodeOffset(at))
    }

    /// Removes `node` and everything below it.
    ///
    /// The node's following siblings move down to `node`'s offset.
    ///
    /// # Errors
    /// Returns [`FdtError::BadOffset`] for the root or a non-node offset.
    pub fn delete_node(&mut self, node: NodeOffset) -> FdtResult<()> {
        if node == NodeOffset::ROOT {
            return Err(FdtError::BadOffset);
        }
        let end = self.node_end(node)?;
        self.structure.drain(node.0..end);
        Ok(())
    }

    /// Returns a phandle no node uses yet.
    ///
    /// # Errors
    /// Returns [`FdtError::NoPhandles`] when the largest phandle is taken.
    pub fn generate_phandle(&self) -> FdtResult<u32> {
        match self.max_phandle()?.checked_add(1) {
            Some(phandle) if phandle != u32::MAX => Ok(phandle),
            _ => Err(FdtError::NoPhandles),
        }
    }

    /// Offset of `name` in the strings block, appending it if missing.
    fn string_offset(&mut self, name: &str) -> FdtResult<u32> {
        let needle = name.as_bytes();
        let existing = self
            .strings
            .windows(needle.len() + 1)
            .position(|w| w[needle.len()] == 0 && &w[..needle.len()] == needle);

        let offset = match existing {
            Some(offset) => offset,
            None => {
                let offset = self.strings.len();
                self.strings.extend_from_slice(needle);
                self.strings.push(0);
                offset
            }
        };
        u32::try_from(offset).map_err(|_| FdtError::BadValue)
    }
}

/// Pads `bytes` with zeroes to a multiple of four.
fn padded(bytes: impl Iterator<Item = u8>) -> Vec<u8> {
    let mut out: Vec<u8> = bytes.collect();
    out.resize(align4(out.len()), 0);
    out
}
