//! Flattened device tree editor.
//!
//! [`DeviceTree`] owns a copy of an FDT blob and edits it in place, the way
//! libfdt does: nodes are addressed by their byte offset in the structure
//! block. Any insertion or deletion moves every node behind it, so offsets
//! obtained before a mutation must be looked up again afterwards.

#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use core::fmt::{Display, Formatter};

pub use error::*;
pub use reserved::Carveout;
pub use walk::Subnodes;

mod edit;
mod error;
mod reserved;
mod walk;

const FDT_MAGIC: u32 = 0xd00d_feed;
const FDT_VERSION: u32 = 17;
const FDT_LAST_COMP_VERSION: u32 = 16;

const HEADER_SIZE: usize = 40;
const RSVMAP_ENTRY_SIZE: usize = 16;

const HDR_MAGIC: usize = 0;
const HDR_TOTALSIZE: usize = 4;
const HDR_OFF_DT_STRUCT: usize = 8;
const HDR_OFF_DT_STRINGS: usize = 12;
const HDR_OFF_MEM_RSVMAP: usize = 16;
const HDR_VERSION: usize = 20;
const HDR_LAST_COMP_VERSION: usize = 24;
const HDR_BOOT_CPUID_PHYS: usize = 28;
const HDR_SIZE_DT_STRINGS: usize = 32;
const HDR_SIZE_DT_STRUCT: usize = 36;

/// Byte offset of a node inside the structure block.
///
/// Only valid until the next mutation of the tree it came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeOffset(usize);

impl NodeOffset {
    pub const ROOT: Self = Self(0);

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0
    }
}

impl Display for NodeOffset {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// An editable device tree.
///
/// The memory reservation block, the structure block and the strings block
/// are kept apart so that edits never have to relocate more than one of them.
/// [`DeviceTree::to_bytes`] lays them out again as a version 17 blob.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DeviceTree {
    boot_cpuid_phys: u32,
    mem_rsvmap: Vec<u8>,
    structure: Vec<u8>,
    strings: Vec<u8>,
}

impl Default for DeviceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceTree {
    /// Creates a tree holding nothing but an empty root node.
    #[must_use]
    pub fn new() -> Self {
        let mut structure = Vec::with_capacity(16);
        structure.extend_from_slice(&walk::FDT_BEGIN_NODE.to_be_bytes());
        structure.extend_from_slice(&[0; 4]);
        structure.extend_from_slice(&walk::FDT_END_NODE.to_be_bytes());
        structure.extend_from_slice(&walk::FDT_END.to_be_bytes());

        Self {
            boot_cpuid_phys: 0,
            mem_rsvmap: alloc::vec![0; RSVMAP_ENTRY_SIZE],
            structure,
            strings: Vec::new(),
        }
    }

    /// Copies a blob into an editable tree.
    ///
    /// # Errors
    /// Returns an error if the header is invalid, the blob is shorter than
    /// its header claims, or the structure block does not start with a node.
    pub fn from_bytes(blob: &[u8]) -> FdtResult<Self> {
        let field = |offset| walk::be32(blob, offset).ok_or(FdtError::Truncated);

        if field(HDR_MAGIC)? != FDT_MAGIC {
            return Err(FdtError::BadMagic);
        }

        let total_size = field(HDR_TOTALSIZE)? as usize;
        let blob = blob.get(..total_size).ok_or(FdtError::Truncated)?;

        let version = field(HDR_VERSION)?;
        if version < FDT_VERSION {
            return Err(FdtError::BadVersion(version));
        }
        let last_comp_version = field(HDR_LAST_COMP_VERSION)?;
        if last_comp_version > FDT_VERSION {
            return Err(FdtError::BadVersion(last_comp_version));
        }

        let structure = block(
            blob,
            field(HDR_OFF_DT_STRUCT)? as usize,
            field(HDR_SIZE_DT_STRUCT)? as usize,
        )?;
        let strings = block(
            blob,
            field(HDR_OFF_DT_STRINGS)? as usize,
            field(HDR_SIZE_DT_STRINGS)? as usize,
        )?;

        let rsvmap_start = field(HDR_OFF_MEM_RSVMAP)? as usize;
        let mut rsvmap_end = rsvmap_start;
        loop {
            let entry = blob
                .get(rsvmap_end..rsvmap_end + RSVMAP_ENTRY_SIZE)
                .ok_or(FdtError::Truncated)?;
            rsvmap_end += RSVMAP_ENTRY_SIZE;
            if entry.iter().all(|&b| b == 0) {
                break;
            }
        }

        let tree = Self {
            boot_cpuid_phys: field(HDR_BOOT_CPUID_PHYS)?,
            mem_rsvmap: blob[rsvmap_start..rsvmap_end].to_vec(),
            structure: structure.to_vec(),
            strings: strings.to_vec(),
        };

        if tree.token(0)?.0 != walk::Token::BeginNode {
            return Err(FdtError::BadStructure);
        }

        Ok(tree)
    }

    /// Serializes the tree into a version 17 blob.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let off_mem_rsvmap = HEADER_SIZE;
        let off_dt_struct = off_mem_rsvmap + self.mem_rsvmap.len();
        let off_dt_strings = off_dt_struct + self.structure.len();
        let total_size = off_dt_strings + self.strings.len();

        let header = [
            FDT_MAGIC,
            total_size as u32,
            off_dt_struct as u32,
            off_dt_strings as u32,
            off_mem_rsvmap as u32,
            FDT_VERSION,
            FDT_LAST_COMP_VERSION,
            self.boot_cpuid_phys,
            self.strings.len() as u32,
            self.structure.len() as u32,
        ];

        let mut blob = Vec::with_capacity(total_size);
        for field in header {
            blob.extend_from_slice(&field.to_be_bytes());
        }
        blob.extend_from_slice(&self.mem_rsvmap);
        blob.extend_from_slice(&self.structure);
        blob.extend_from_slice(&self.strings);
        blob
    }

    /// Size of the blob [`DeviceTree::to_bytes`] would produce.
    #[must_use]
    pub fn total_size(&self) -> usize {
        HEADER_SIZE + self.mem_rsvmap.len() + self.structure.len() + self.strings.len()
    }

    #[must_use]
    pub fn root(&self) -> NodeOffset {
        NodeOffset::ROOT
    }
}

fn block(blob: &[u8], offset: usize, size: usize) -> FdtResult<&[u8]> {
    offset
        .checked_add(size)
        .and_then(|end| blob.get(offset..end))
        .ok_or(FdtError::Truncated)
}
