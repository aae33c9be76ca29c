//! Removal of top-level nodes that belong to the other txslot variant.

use alloc::string::String;
use core::fmt::Display;

use board_fdt::{DeviceTree, FdtError, NodeOffset};

use crate::txslot::{TXSLOTS_PROPERTY, TxSlot};

/// The operations pruning needs from a device tree.
///
/// Deleting a node may renumber every node after it, so implementations
/// never have to keep a handle valid across [`PrunableTree::delete`].
pub trait PrunableTree {
    type Node: Copy;
    type Error: Display;

    fn first_child(&self) -> Result<Option<Self::Node>, Self::Error>;

    fn next_sibling(&self, node: Self::Node) -> Result<Option<Self::Node>, Self::Error>;

    fn node_name(&self, node: Self::Node) -> Result<&str, Self::Error>;

    /// The raw `smartsense,txslots` value, `None` if the node has none.
    fn txslots(&self, node: Self::Node) -> Result<Option<&[u8]>, Self::Error>;

    fn delete(&mut self, node: Self::Node) -> Result<(), Self::Error>;
}

impl PrunableTree for DeviceTree {
    type Node = NodeOffset;
    type Error = FdtError;

    fn first_child(&self) -> Result<Option<NodeOffset>, FdtError> {
        self.first_subnode(self.root())
    }

    fn next_sibling(&self, node: NodeOffset) -> Result<Option<NodeOffset>, FdtError> {
        self.next_subnode(node)
    }

    fn node_name(&self, node: NodeOffset) -> Result<&str, FdtError> {
        self.name(node)
    }

    fn txslots(&self, node: NodeOffset) -> Result<Option<&[u8]>, FdtError> {
        match self.property(node, TXSLOTS_PROPERTY) {
            Ok(value) => Ok(Some(value)),
            Err(FdtError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn delete(&mut self, node: NodeOffset) -> Result<(), FdtError> {
        self.delete_node(node)
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct PruneStats {
    pub examined: usize,
    pub kept: usize,
    pub deleted: usize,
    /// Nodes that should have gone but could not be deleted.
    pub failed: usize,
}

/// Deletes every child of the root whose `smartsense,txslots` does not list
/// `txslot`. Nothing is deleted for [`TxSlot::Unknown`].
///
/// The walk resumes after the last node left in place, or at the first child
/// while nothing has been left, so deletions never make it skip a node.
///
/// # Errors
/// Returns an error only when the walk itself cannot continue. Failures to
/// read or delete a single node are logged and that node is left alone.
pub fn prune_tree<T: PrunableTree + ?Sized>(
    tree: &mut T,
    txslot: TxSlot,
) -> Result<PruneStats, T::Error> {
    let mut stats = PruneStats::default();
    if txslot == TxSlot::Unknown {
        return Ok(stats);
    }

    let mut last_left = None;
    loop {
        let next = match last_left {
            Some(node) => tree.next_sibling(node)?,
            None => tree.first_child()?,
        };
        let Some(node) = next else {
            break;
        };
        stats.examined += 1;

        let keep = match tree.txslots(node) {
            Ok(Some(slots)) => txslot.is_listed_in(slots),
            Ok(None) => true,
            Err(e) => {
                log::warn!(
                    "cannot read {TXSLOTS_PROPERTY} of '{}': {e}",
                    tree.node_name(node).unwrap_or("(unnamed)")
                );
                true
            }
        };
        if keep {
            stats.kept += 1;
            last_left = Some(node);
            continue;
        }

        let name = String::from(tree.node_name(node).unwrap_or("(unnamed)"));
        match tree.delete(node) {
            Ok(()) => {
                log::debug!("removed '{name}', not used by txslot {txslot}");
                stats.deleted += 1;
            }
            Err(e) => {
                log::warn!("couldn't delete node '{name}': {e}");
                stats.failed += 1;
                last_left = Some(node);
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use vm_fdt::FdtWriter;

    use super::*;

    /// A flat tree addressed by position, so every deletion renumbers the
    /// nodes behind it.
    #[derive(Default)]
    struct FlatTree {
        nodes: Vec<(&'static str, Option<&'static str>)>,
        undeletable: Vec<&'static str>,
        unreadable: Vec<&'static str>,
    }

    impl FlatTree {
        fn new(nodes: &[(&'static str, Option<&'static str>)]) -> Self {
            Self {
                nodes: nodes.to_vec(),
                ..Self::default()
            }
        }

        fn names(&self) -> Vec<&'static str> {
            self.nodes.iter().map(|(name, _)| *name).collect()
        }
    }

    impl PrunableTree for FlatTree {
        type Node = usize;
        type Error = &'static str;

        fn first_child(&self) -> Result<Option<usize>, &'static str> {
            Ok((!self.nodes.is_empty()).then_some(0))
        }

        fn next_sibling(&self, node: usize) -> Result<Option<usize>, &'static str> {
            Ok((node + 1 < self.nodes.len()).then_some(node + 1))
        }

        fn node_name(&self, node: usize) -> Result<&str, &'static str> {
            self.nodes.get(node).map(|(name, _)| *name).ok_or("bad node")
        }

        fn txslots(&self, node: usize) -> Result<Option<&[u8]>, &'static str> {
            let (name, slots) = self.nodes[node];
            if self.unreadable.contains(&name) {
                return Err("truncated");
            }
            Ok(slots.map(str::as_bytes))
        }

        fn delete(&mut self, node: usize) -> Result<(), &'static str> {
            if self.undeletable.contains(&self.nodes[node].0) {
                return Err("busy");
            }
            self.nodes.remove(node);
            Ok(())
        }
    }

    fn sample() -> FlatTree {
        FlatTree::new(&[
            ("fan", Some("a")),
            ("display", Some("b")),
            ("common", None),
            ("both", Some("A, b")),
        ])
    }

    #[test]
    fn unknown_slot_deletes_nothing() {
        let mut tree = sample();
        let stats = prune_tree(&mut tree, TxSlot::Unknown).unwrap();
        assert_eq!(stats, PruneStats::default());
        assert_eq!(tree.names(), ["fan", "display", "common", "both"]);
    }

    #[test]
    fn slot_b_keeps_its_nodes() {
        let mut tree = sample();
        let stats = prune_tree(&mut tree, TxSlot::B).unwrap();
        assert_eq!(tree.names(), ["display", "common", "both"]);
        assert_eq!(
            stats,
            PruneStats {
                examined: 4,
                kept: 3,
                deleted: 1,
                failed: 0
            }
        );
    }

    #[test]
    fn unannotated_nodes_survive_every_slot() {
        for txslot in [TxSlot::A, TxSlot::B] {
            let mut tree = FlatTree::new(&[("x", None), ("y", Some("")), ("z", None)]);
            prune_tree(&mut tree, txslot).unwrap();
            assert_eq!(tree.names(), ["x", "z"]);
        }
    }

    #[test]
    fn consecutive_deletions() {
        let mut tree = FlatTree::new(&[
            ("b1", Some("b")),
            ("b2", Some("b")),
            ("a1", Some("a")),
            ("b3", Some("b")),
            ("b4", Some("b")),
        ]);
        let stats = prune_tree(&mut tree, TxSlot::A).unwrap();
        assert_eq!(tree.names(), ["a1"]);
        assert_eq!(stats.deleted, 4);
        assert_eq!(stats.examined, 5);
    }

    #[test]
    fn failed_deletion_does_not_stop_the_walk() {
        let mut tree = FlatTree::new(&[
            ("b1", Some("b")),
            ("b2", Some("b")),
            ("b3", Some("b")),
        ]);
        tree.undeletable.push("b2");
        let stats = prune_tree(&mut tree, TxSlot::A).unwrap();
        assert_eq!(tree.names(), ["b2"]);
        assert_eq!(
            stats,
            PruneStats {
                examined: 3,
                kept: 0,
                deleted: 2,
                failed: 1
            }
        );
    }

    #[test]
    fn unreadable_annotation_keeps_node() {
        let mut tree = sample();
        tree.unreadable.push("fan");
        prune_tree(&mut tree, TxSlot::B).unwrap();
        assert_eq!(tree.names(), ["fan", "display", "common", "both"]);
    }

    #[test]
    fn walk_errors_are_returned() {
        struct Corrupt;

        impl PrunableTree for Corrupt {
            type Node = usize;
            type Error = &'static str;

            fn first_child(&self) -> Result<Option<usize>, &'static str> {
                Err("corrupt")
            }

            fn next_sibling(&self, _: usize) -> Result<Option<usize>, &'static str> {
                Err("corrupt")
            }

            fn node_name(&self, _: usize) -> Result<&str, &'static str> {
                Err("corrupt")
            }

            fn txslots(&self, _: usize) -> Result<Option<&[u8]>, &'static str> {
                Err("corrupt")
            }

            fn delete(&mut self, _: usize) -> Result<(), &'static str> {
                Err("corrupt")
            }
        }

        assert_eq!(prune_tree(&mut Corrupt, TxSlot::A), Err("corrupt"));
        assert_eq!(prune_tree(&mut Corrupt, TxSlot::Unknown), Ok(PruneStats::default()));
    }

    fn device_tree() -> DeviceTree {
        let mut fdt = FdtWriter::new().unwrap();
        let root = fdt.begin_node("").unwrap();
        for (name, slots) in [
            ("fan", Some("a")),
            ("display", Some("b")),
            ("modem", Some("b")),
            ("common", None),
        ] {
            let node = fdt.begin_node(name).unwrap();
            if let Some(slots) = slots {
                fdt.property_string(TXSLOTS_PROPERTY, slots).unwrap();
            }
            let child = fdt.begin_node("port").unwrap();
            fdt.property_string(TXSLOTS_PROPERTY, "z").unwrap();
            fdt.end_node(child).unwrap();
            fdt.end_node(node).unwrap();
        }
        fdt.end_node(root).unwrap();
        DeviceTree::from_bytes(&fdt.finish().unwrap()).unwrap()
    }

    fn root_names(tree: &DeviceTree) -> Vec<&str> {
        tree.subnodes(tree.root())
            .map(|node| tree.name(node.unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn device_tree_slot_b() {
        let mut tree = device_tree();
        let stats = prune_tree(&mut tree, TxSlot::B).unwrap();
        assert_eq!(stats.deleted, 1);
        assert_eq!(root_names(&tree), ["display", "modem", "common"]);

        // only first-level nodes are considered
        assert!(tree.path_offset("/display/port").is_ok());
    }

    #[test]
    fn device_tree_slot_a() {
        let mut tree = device_tree();
        let stats = prune_tree(&mut tree, TxSlot::A).unwrap();
        assert_eq!(stats.deleted, 2);
        assert_eq!(root_names(&tree), ["fan", "common"]);

        let blob = tree.to_bytes();
        let fdt = fdt::Fdt::new(&blob).unwrap();
        assert!(fdt.find_node("/display").is_none());
        assert!(fdt.find_node("/modem").is_none());
        assert!(fdt.find_node("/fan/port").is_some());
    }
}
