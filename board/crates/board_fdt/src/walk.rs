//! Read-only navigation of the structure block.

use crate::{DeviceTree, FdtError, FdtResult, NodeOffset};

pub(crate) const FDT_BEGIN_NODE: u32 = 0x1;
pub(crate) const FDT_END_NODE: u32 = 0x2;
pub(crate) const FDT_PROP: u32 = 0x3;
pub(crate) const FDT_NOP: u32 = 0x4;
pub(crate) const FDT_END: u32 = 0x9;

pub(crate) const TAG_SIZE: usize = 4;
/// Tag, value length and name offset.
pub(crate) const PROP_HEADER_SIZE: usize = 12;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Token {
    BeginNode,
    EndNode,
    Prop,
    Nop,
    End,
}

pub(crate) fn be32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
    Some(u32::from_be_bytes(raw))
}

pub(crate) const fn align4(n: usize) -> usize {
    (n + 3) & !3
}

/// A property located in the structure block.
#[derive(Debug, Copy, Clone)]
pub(crate) struct PropertySlot {
    pub offset: usize,
    pub len: usize,
}

impl PropertySlot {
    pub fn value_range(&self) -> core::ops::Range<usize> {
        let start = self.offset + PROP_HEADER_SIZE;
        start..start + self.len
    }
}

impl DeviceTree {
    /// Decodes the token at `offset`, returning it with the offset of the
    /// token that follows.
    pub(crate) fn token(&self, offset: usize) -> FdtResult<(Token, usize)> {
        let s = &self.structure;
        let tag = be32(s, offset).ok_or(FdtError::Truncated)?;
        let body = offset + TAG_SIZE;

        let (token, next) = match tag {
            FDT_BEGIN_NODE => {
                let name_len = s
                    .get(body..)
                    .and_then(|rest| rest.iter().position(|&b| b == 0))
                    .ok_or(FdtError::Truncated)?;
                (Token::BeginNode, align4(body + name_len + 1))
            }
            FDT_PROP => {
                let len = be32(s, body).ok_or(FdtError::Truncated)? as usize;
                (Token::Prop, align4(offset + PROP_HEADER_SIZE + len))
            }
            FDT_END_NODE => (Token::EndNode, body),
            FDT_NOP => (Token::Nop, body),
            FDT_END => (Token::End, body),
            _ => return Err(FdtError::BadStructure),
        };

        if next > s.len() {
            return Err(FdtError::Truncated);
        }
        Ok((token, next))
    }

    /// Offset of the first token after the node's name.
    pub(crate) fn node_body(&self, node: NodeOffset) -> FdtResult<usize> {
        match self.token(node.0)? {
            (Token::BeginNode, next) => Ok(next),
            _ => Err(FdtError::BadOffset),
        }
    }

    /// Finds the next node in document order, tracking nesting in `depth`.
    ///
    /// Returns `None` once the walk leaves the node `depth` was relative to.
    pub(crate) fn next_node(&self, offset: usize, depth: &mut isize) -> FdtResult<Option<usize>> {
        let mut next = self.node_body(NodeOffset(offset))?;
        loop {
            let current = next;
            let (token, after) = self.token(current)?;
            next = after;
            match token {
                Token::BeginNode => {
                    *depth += 1;
                    return Ok(Some(current));
                }
                Token::EndNode => {
                    *depth -= 1;
                    if *depth < 0 {
                        return Ok(None);
                    }
                }
                Token::Prop | Token::Nop => {}
                Token::End => return Err(FdtError::BadStructure),
            }
        }
    }

    /// Offset just past the node's closing token.
    pub(crate) fn node_end(&self, node: NodeOffset) -> FdtResult<usize> {
        let mut offset = self.node_body(node)?;
        let mut depth = 1usize;
        loop {
            let (token, next) = self.token(offset)?;
            match token {
                Token::BeginNode => depth += 1,
                Token::EndNode => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(next);
                    }
                }
                Token::End => return Err(FdtError::BadStructure),
                Token::Prop | Token::Nop => {}
            }
            offset = next;
        }
    }

    /// First child of `parent`, if any.
    ///
    /// # Errors
    /// Returns an error if `parent` is not a node or the structure is corrupt.
    pub fn first_subnode(&self, parent: NodeOffset) -> FdtResult<Option<NodeOffset>> {
        let mut depth = 0;
        match self.next_node(parent.0, &mut depth)? {
            Some(offset) if depth == 1 => Ok(Some(NodeOffset(offset))),
            _ => Ok(None),
        }
    }

    /// Sibling following `node`, if any.
    ///
    /// # Errors
    /// Returns an error if `node` is not a node or the structure is corrupt.
    pub fn next_subnode(&self, node: NodeOffset) -> FdtResult<Option<NodeOffset>> {
        let mut depth = 1;
        let mut offset = node.0;
        loop {
            match self.next_node(offset, &mut depth)? {
                None => return Ok(None),
                Some(next) if depth == 1 => return Ok(Some(NodeOffset(next))),
                Some(next) => offset = next,
            }
        }
    }

    /// Iterates over the children of `parent`.
    ///
    /// The iterator borrows the tree, so it cannot be used while deleting
    /// nodes; walk with [`DeviceTree::next_subnode`] instead.
    #[must_use]
    pub fn subnodes(&self, parent: NodeOffset) -> Subnodes<'_> {
        Subnodes {
            tree: self,
            state: SubnodesState::Start(parent),
        }
    }

    /// Name of the node, unit address included.
    ///
    /// # Errors
    /// Returns [`FdtError::BadOffset`] if `node` does not point at a node.
    pub fn name(&self, node: NodeOffset) -> FdtResult<&str> {
        self.node_body(node)?;
        let raw = self
            .structure
            .get(node.0 + TAG_SIZE..)
            .ok_or(FdtError::Truncated)?;
        let len = raw.iter().position(|&b| b == 0).ok_or(FdtError::Truncated)?;
        core::str::from_utf8(&raw[..len]).map_err(|_| FdtError::BadStructure)
    }

    /// Looks up a direct child by name.
    ///
    /// A name without a unit address also matches children that have one,
    /// so `"memory"` finds `memory@80000000`.
    ///
    /// # Errors
    /// Returns [`FdtError::NotFound`] if there is no such child.
    pub fn subnode_offset(&self, parent: NodeOffset, name: &str) -> FdtResult<NodeOffset> {
        let mut next = self.first_subnode(parent)?;
        while let Some(node) = next {
            if node_name_eq(self.name(node)?, name) {
                return Ok(node);
            }
            next = self.next_subnode(node)?;
        }
        Err(FdtError::NotFound)
    }

    /// Resolves an absolute path, or an alias optionally followed by a
    /// relative path (`"ethernet/mdio"`).
    ///
    /// # Errors
    /// Returns [`FdtError::NotFound`] if a component is missing and
    /// [`FdtError::BadPath`] if an alias cannot be resolved.
    pub fn path_offset(&self, path: &str) -> FdtResult<NodeOffset> {
        let (mut node, rest) = if let Some(rest) = path.strip_prefix('/') {
            (NodeOffset::ROOT, rest)
        } else {
            let (alias, rest) = path.split_once('/').unwrap_or((path, ""));
            let target = self.alias(alias).ok_or(FdtError::BadPath)?;
            if !target.starts_with('/') {
                return Err(FdtError::BadPath);
            }
            (self.path_offset(target)?, rest)
        };

        for component in rest.split('/').filter(|c| !c.is_empty()) {
            node = self.subnode_offset(node, component)?;
        }
        Ok(node)
    }

    /// Path stored under `name` in `/aliases`.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&str> {
        let aliases = self.subnode_offset(NodeOffset::ROOT, "aliases").ok()?;
        self.property_str(aliases, name).ok()
    }

    pub(crate) fn find_property(
        &self,
        node: NodeOffset,
        name: &str,
    ) -> FdtResult<Option<PropertySlot>> {
        let mut offset = self.node_body(node)?;
        loop {
            let (token, next) = self.token(offset)?;
            match token {
                Token::Prop => {
                    let len = be32(&self.structure, offset + 4).ok_or(FdtError::Truncated)?;
                    let name_offset =
                        be32(&self.structure, offset + 8).ok_or(FdtError::Truncated)?;
                    if self.string_at(name_offset as usize)? == name {
                        return Ok(Some(PropertySlot {
                            offset,
                            len: len as usize,
                        }));
                    }
                }
                Token::Nop => {}
                _ => return Ok(None),
            }
            offset = next;
        }
    }

    /// Offset at which a new property (or the first child) of `node` goes.
    pub(crate) fn properties_end(&self, node: NodeOffset) -> FdtResult<usize> {
        let mut offset = self.node_body(node)?;
        loop {
            match self.token(offset)? {
                (Token::Prop | Token::Nop, next) => offset = next,
                _ => return Ok(offset),
            }
        }
    }

    fn string_at(&self, offset: usize) -> FdtResult<&str> {
        let raw = self.strings.get(offset..).ok_or(FdtError::Truncated)?;
        let len = raw.iter().position(|&b| b == 0).ok_or(FdtError::Truncated)?;
        core::str::from_utf8(&raw[..len]).map_err(|_| FdtError::BadStructure)
    }

    /// Raw value of a property.
    ///
    /// # Errors
    /// Returns [`FdtError::NotFound`] if the node lacks the property.
    pub fn property(&self, node: NodeOffset, name: &str) -> FdtResult<&[u8]> {
        let slot = self.find_property(node, name)?.ok_or(FdtError::NotFound)?;
        self.structure
            .get(slot.value_range())
            .ok_or(FdtError::Truncated)
    }

    /// Value of a string property, without its terminator.
    ///
    /// # Errors
    /// Returns [`FdtError::BadValue`] if the value is not UTF-8.
    pub fn property_str(&self, node: NodeOffset, name: &str) -> FdtResult<&str> {
        let raw = self.property(node, name)?;
        let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
        core::str::from_utf8(raw).map_err(|_| FdtError::BadValue)
    }

    /// Value of a single-cell property.
    ///
    /// # Errors
    /// Returns [`FdtError::BadValue`] if the value is not exactly one cell.
    pub fn property_u32(&self, node: NodeOffset, name: &str) -> FdtResult<u32> {
        let raw = self.property(node, name)?;
        if raw.len() != 4 {
            return Err(FdtError::BadValue);
        }
        be32(raw, 0).ok_or(FdtError::BadValue)
    }

    /// `#address-cells` of `node`, defaulting to 2.
    ///
    /// # Errors
    /// Returns [`FdtError::BadValue`] for counts outside 1..=4.
    pub fn address_cells(&self, node: NodeOffset) -> FdtResult<u32> {
        match self.property_u32(node, "#address-cells") {
            Ok(cells) if (1..=4).contains(&cells) => Ok(cells),
            Ok(_) => Err(FdtError::BadValue),
            Err(FdtError::NotFound) => Ok(2),
            Err(e) => Err(e),
        }
    }

    /// `#size-cells` of `node`, defaulting to 1.
    ///
    /// # Errors
    /// Returns [`FdtError::BadValue`] for counts above 4.
    pub fn size_cells(&self, node: NodeOffset) -> FdtResult<u32> {
        match self.property_u32(node, "#size-cells") {
            Ok(cells) if cells <= 4 => Ok(cells),
            Ok(_) => Err(FdtError::BadValue),
            Err(FdtError::NotFound) => Ok(1),
            Err(e) => Err(e),
        }
    }

    /// Phandle of `node`, if it has a usable one.
    ///
    /// # Errors
    /// Returns an error if the phandle property is malformed.
    pub fn phandle(&self, node: NodeOffset) -> FdtResult<Option<u32>> {
        for name in ["phandle", "linux,phandle"] {
            match self.property_u32(node, name) {
                Ok(0 | u32::MAX) => return Ok(None),
                Ok(phandle) => return Ok(Some(phandle)),
                Err(FdtError::NotFound) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Visits every node of the tree in document order.
    pub(crate) fn for_each_node(
        &self,
        mut f: impl FnMut(NodeOffset) -> FdtResult<bool>,
    ) -> FdtResult<Option<NodeOffset>> {
        let mut depth = 0;
        let mut offset = NodeOffset::ROOT.0;
        loop {
            if f(NodeOffset(offset))? {
                return Ok(Some(NodeOffset(offset)));
            }
            match self.next_node(offset, &mut depth)? {
                Some(next) => offset = next,
                None => return Ok(None),
            }
        }
    }

    /// Finds the node carrying `phandle`.
    ///
    /// # Errors
    /// Returns [`FdtError::NotFound`] if no node has it.
    pub fn node_by_phandle(&self, phandle: u32) -> FdtResult<NodeOffset> {
        self.for_each_node(|node| Ok(self.phandle(node)? == Some(phandle)))?
            .ok_or(FdtError::NotFound)
    }

    /// Largest phandle in use, 0 if none.
    ///
    /// # Errors
    /// Returns an error if the structure is corrupt.
    pub fn max_phandle(&self) -> FdtResult<u32> {
        let mut max = 0;
        self.for_each_node(|node| {
            if let Some(phandle) = self.phandle(node)? {
                max = max.max(phandle);
            }
            Ok(false)
        })?;
        Ok(max)
    }
}

fn node_name_eq(node_name: &str, name: &str) -> bool {
    if node_name == name {
        return true;
    }
    !name.contains('@') && node_name.split('@').next() == Some(name)
}

enum SubnodesState {
    Start(NodeOffset),
    After(NodeOffset),
    Done,
}

/// Iterator over the children of a node, see [`DeviceTree::subnodes`].
pub struct Subnodes<'a> {
    tree: &'a DeviceTree,
    state: SubnodesState,
}

impl Iterator for Subnodes<'_> {
    type Item = FdtResult<NodeOffset>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = match self.state {
            SubnodesState::Start(parent) => self.tree.first_subnode(parent),
            SubnodesState::After(node) => self.tree.next_subnode(node),
            SubnodesState::Done => return None,
        };
        match next {
            Ok(Some(node)) => {
                self.state = SubnodesState::After(node);
                Some(Ok(node))
            }
            Ok(None) => {
                self.state = SubnodesState::Done;
                None
            }
            Err(e) => {
                self.state = SubnodesState::Done;
                Some(Err(e))
            }
        }
    }
}
