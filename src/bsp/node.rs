//! BSP tree node data structure

use crate::brush::{BspBrush, SideId};
use crate::contents::Contents;
use crate::context::EntityId;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::geometry::{PlaneNum, Winding};
use crate::portal::PortalId;

/// Index of a node in [`crate::bsp::Tree::nodes`].
pub type NodeId = usize;

/// A BSP tree node: either a split or a leaf.
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub bounds: Aabb,
    /// Head of the linked list of portals touching this node.
    pub portals: Option<PortalId>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Internal(Internal),
    Leaf(Leaf),
}

#[derive(Debug, Clone)]
pub struct Internal {
    /// Always the first plane of a pair.
    pub plane: PlaneNum,
    /// Front child, then back child.
    pub children: [NodeId; 2],
    /// Brush side that proposed the plane.
    pub split_side: Option<SideId>,
    /// Chosen among detail sides; clusters do not look below it.
    pub detail_separator: bool,
    /// Brush faces lying on the plane.
    pub faces: Vec<NodeFace>,
}

/// A brush face coplanar with a node's split plane.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFace {
    pub plane: PlaneNum,
    pub winding: Winding,
    pub original: Option<SideId>,
}

#[derive(Debug, Clone, Default)]
pub struct Leaf {
    /// Brush fragments inside the leaf.
    pub brushes: Vec<BspBrush>,
    pub contents: Contents,
    /// Flood distance from the nearest entity, `None` when unreached.
    pub occupied: Option<u32>,
    pub occupant: Option<EntityId>,
    pub cluster: Option<u32>,
    /// Area id; 0 for solid leaves and leaves never flooded.
    pub area: u32,
}

impl Node {
    pub fn leaf(parent: Option<NodeId>, bounds: Aabb) -> Self {
        Node {
            parent,
            bounds,
            portals: None,
            kind: NodeKind::Leaf(Leaf::default()),
        }
    }

    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    pub const fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Internal(_) => None,
        }
    }

    pub const fn as_leaf_mut(&mut self) -> Option<&mut Leaf> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Internal(_) => None,
        }
    }

    pub const fn as_internal(&self) -> Option<&Internal> {
        match &self.kind {
            NodeKind::Internal(internal) => Some(internal),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Contents of a leaf; empty for internal nodes.
    pub fn contents(&self) -> Contents {
        self.as_leaf().map(|l| l.contents).unwrap_or_default()
    }
}
