//! Portals: convex windings joining two adjacent nodes
//!
//! Every node keeps a singly linked list of the portals that touch it. A
//! portal sits in the lists of both of its nodes, so it carries one `next`
//! link per side: `next[0]` continues the list of `nodes[0]`, `next[1]` the
//! list of `nodes[1]`. The portal plane faces `nodes[0]`.

pub mod build;

pub use build::{make_tree_portals, verify_watertight};

use crate::brush::SideId;
use crate::bsp::{NodeId, Tree};
use crate::errors::CompileError;
use crate::geometry::{Plane, Winding};

/// Index of a portal in [`Tree::portals`].
pub type PortalId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct Portal {
    /// Faces `nodes[0]`.
    pub plane: Plane,
    /// Internal node whose split created the portal; `None` for the
    /// portals bounding the head node.
    pub on_node: Option<NodeId>,
    pub nodes: [NodeId; 2],
    pub next: [Option<PortalId>; 2],
    pub winding: Winding,
    /// Visible side search already ran.
    pub side_found: bool,
    /// Brush side the portal lies on, if any.
    pub side: Option<SideId>,
    /// One of the nodes is inside an area portal brush.
    pub area_boundary: bool,
}

impl Portal {
    pub fn new(plane: Plane, winding: Winding, on_node: Option<NodeId>) -> Self {
        Portal {
            plane,
            on_node,
            nodes: [0, 0],
            next: [None, None],
            winding,
            side_found: false,
            side: None,
            area_boundary: false,
        }
    }

    /// Which side of the portal `node` is on, if it is one of the two.
    pub fn side_of(&self, node: NodeId) -> Option<usize> {
        if self.nodes[0] == node {
            Some(0)
        } else if self.nodes[1] == node {
            Some(1)
        } else {
            None
        }
    }

    /// The node on the other side from `node`.
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.nodes[0] == node {
            self.nodes[1]
        } else {
            self.nodes[0]
        }
    }
}

/// Walks the portal list of one node, yielding `(portal, side)` pairs.
pub struct NodePortals<'a> {
    tree: &'a Tree,
    node: NodeId,
    current: Option<PortalId>,
}

impl Iterator for NodePortals<'_> {
    type Item = (PortalId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        let portal = self.tree.portals.get(id)?.as_ref()?;
        let side = portal.side_of(self.node)?;
        self.current = portal.next[side];
        Some((id, side))
    }
}

impl Tree {
    pub fn portal(&self, id: PortalId) -> Result<&Portal, CompileError> {
        self.portals
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(CompileError::MislinkedPortal { portal: id, node: 0 })
    }

    /// All portals still linked into the tree.
    pub fn live_portals(&self) -> impl Iterator<Item = (PortalId, &Portal)> {
        self.portals
            .iter()
            .enumerate()
            .filter_map(|(id, p)| p.as_ref().map(|p| (id, p)))
    }

    pub fn node_portals(&self, node: NodeId) -> NodePortals<'_> {
        NodePortals {
            tree: self,
            node,
            current: self.nodes[node].portals,
        }
    }

    /// Store `portal` and link it between `front` and `back`.
    pub(crate) fn add_portal(&mut self, portal: Portal, front: NodeId, back: NodeId) -> PortalId {
        let id = self.portals.len();
        self.portals.push(Some(portal));
        self.link_portal(id, front, back);
        id
    }

    /// Link an already stored portal between `front` and `back`.
    pub(crate) fn link_portal(&mut self, id: PortalId, front: NodeId, back: NodeId) {
        let heads = [self.nodes[front].portals, self.nodes[back].portals];
        if let Some(portal) = self.portals[id].as_mut() {
            portal.nodes = [front, back];
            portal.next = heads;
        }
        self.nodes[front].portals = Some(id);
        self.nodes[back].portals = Some(id);
    }

    /// Unlink portal `id` from the list of `node`.
    pub(crate) fn remove_portal_from_node(
        &mut self,
        id: PortalId,
        node: NodeId,
    ) -> Result<(), CompileError> {
        let mislinked = CompileError::MislinkedPortal { portal: id, node };
        let mut prev: Option<(PortalId, usize)> = None;
        let mut current = self.nodes[node].portals;

        loop {
            let Some(cur) = current else {
                return Err(mislinked);
            };
            let portal = self.portals[cur].as_ref().ok_or(mislinked.clone())?;
            let side = portal.side_of(node).ok_or(mislinked.clone())?;
            let next = portal.next[side];

            if cur == id {
                match prev {
                    None => self.nodes[node].portals = next,
                    Some((p, s)) => {
                        if let Some(prev_portal) = self.portals[p].as_mut() {
                            prev_portal.next[s] = next;
                        }
                    },
                }
                return Ok(());
            }
            prev = Some((cur, side));
            current = next;
        }
    }

    /// Relink portal `id` from the list of `from` into the list of `to`,
    /// keeping its orientation.
    pub(crate) fn move_portal(
        &mut self,
        id: PortalId,
        from: NodeId,
        to: NodeId,
    ) -> Result<(), CompileError> {
        self.remove_portal_from_node(id, from)?;
        let head = self.nodes[to].portals;
        let mislinked = CompileError::MislinkedPortal { portal: id, node: from };
        let portal = self.portals[id].as_mut().ok_or(mislinked.clone())?;
        let side = portal.side_of(from).ok_or(mislinked)?;
        portal.nodes[side] = to;
        portal.next[side] = head;
        self.nodes[to].portals = Some(id);
        Ok(())
    }

    /// Unlink a portal from both of its nodes and free its slot.
    pub(crate) fn take_portal(&mut self, id: PortalId) -> Result<Portal, CompileError> {
        let nodes = self.portal(id)?.nodes;
        self.remove_portal_from_node(id, nodes[0])?;
        self.remove_portal_from_node(id, nodes[1])?;
        self.portals[id]
            .take()
            .ok_or(CompileError::MislinkedPortal { portal: id, node: nodes[0] })
    }
}
