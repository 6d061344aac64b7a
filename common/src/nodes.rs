use std::ops::Index;

use crate::common::{Level, NodeId, VarIndex};

/// Trait for a terminal node.
pub trait Terminal {
    /// The type of value stored in the terminal node.
    type Value;

    /// Returns the value stored in the terminal node.
    fn value(&self) -> Self::Value;
}

/// The trait for non-terminal node.
pub trait NonTerminal: Index<usize> {
    /// Returns the unique identifier of the node.
    fn id(&self) -> NodeId;

    /// Returns the variable index carried by the node.
    ///
    /// The index is the identity of the variable and does not change when
    /// the variable order changes.
    fn index(&self) -> VarIndex;
}

/// The trait for a decision diagram forest.
pub trait DDForest {
    type Node;

    /// Returns the node stored at the given slot, or `None` if the slot is
    /// invalid or free.
    fn get_node(&self, id: NodeId) -> Option<&Self::Node>;

    /// Returns the current level of the node's top variable, or `None` for
    /// terminals.
    fn level(&self, id: NodeId) -> Option<Level>;

    /// Returns the variable index of the node, or `None` for terminals.
    fn index(&self, id: NodeId) -> Option<VarIndex>;
}
