//! The compiled tree and queries over it

use crate::bsp::node::{Leaf, Node, NodeId, NodeKind};
use crate::contents::Contents;
use crate::errors::CompileError;
use crate::flood::LeakPath;
use crate::flood::areas::AreaPortal;
use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::geometry::PlaneTable;
use crate::portal::Portal;
use log::info;
use nalgebra::Point3;

/// Head node, the synthetic outside leaf and everything derived from them.
#[derive(Debug, Clone)]
pub struct Tree {
    pub nodes: Vec<Node>,
    /// Portal arena; `None` marks a slot freed while splitting.
    pub portals: Vec<Option<Portal>>,
    pub head: NodeId,
    /// Leaf standing for the unbounded space around the level.
    pub outside: NodeId,
    /// Union of the bounds of all brushes.
    pub bounds: Aabb,
    pub leaked: bool,
    pub leak: Option<LeakPath>,
    /// Areas separated by each area portal entity, ordered by entity.
    pub area_portals: Vec<AreaPortal>,
    pub num_areas: u32,
    pub num_clusters: u32,
}

impl Tree {
    /// A tree whose head is a single leaf.
    pub fn empty(bounds: Aabb) -> Self {
        Tree {
            nodes: vec![Node::leaf(None, bounds), Node::leaf(None, Aabb::new_invalid())],
            portals: Vec::new(),
            head: 0,
            outside: 1,
            bounds,
            leaked: false,
            leak: None,
            area_portals: Vec::new(),
            num_areas: 0,
            num_clusters: 0,
        }
    }

    pub fn leaf(&self, node: NodeId) -> Option<&Leaf> {
        self.nodes.get(node).and_then(Node::as_leaf)
    }

    pub fn leaf_mut(&mut self, node: NodeId) -> Option<&mut Leaf> {
        self.nodes.get_mut(node).and_then(Node::as_leaf_mut)
    }

    /// Leaves reachable from the head, in tree order. The outside leaf is not
    /// among them.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.head];
        while let Some(id) = stack.pop() {
            match &self.nodes[id].kind {
                NodeKind::Leaf(_) => leaves.push(id),
                NodeKind::Internal(internal) => {
                    stack.push(internal.children[1]);
                    stack.push(internal.children[0]);
                },
            }
        }
        leaves
    }

    /// Number of internal nodes below the head.
    pub fn internal_count(&self) -> usize {
        self.nodes[..]
            .iter()
            .enumerate()
            .filter(|(id, n)| *id != self.outside && !n.is_leaf())
            .count()
    }

    /// Descend from the head to the leaf containing `point`.
    ///
    /// Points exactly on a split plane go to the front child.
    pub fn point_in_leaf(&self, planes: &PlaneTable, point: &Point3<Real>) -> NodeId {
        let mut node = self.head;
        while let NodeKind::Internal(internal) = &self.nodes[node].kind {
            let d = planes.get(internal.plane).distance(point);
            node = if d >= 0.0 {
                internal.children[0]
            } else {
                internal.children[1]
            };
        }
        node
    }

    /// Collapse every node whose children are both solid leaves into a
    /// single solid leaf holding the brushes of both, bottom up.
    ///
    /// Portals between the two children are freed; the others move up to the
    /// merged leaf. The children stay in the arena, unlinked. Returns the
    /// number of nodes collapsed.
    pub fn prune_nodes(&mut self) -> Result<usize, CompileError> {
        let mut pruned = 0;
        self.prune_nodes_r(self.head, &mut pruned)?;
        info!("{pruned} pruned nodes");
        Ok(pruned)
    }

    fn prune_nodes_r(&mut self, node: NodeId, pruned: &mut usize) -> Result<(), CompileError> {
        let NodeKind::Internal(internal) = &self.nodes[node].kind else {
            return Ok(());
        };
        let children = internal.children;
        self.prune_nodes_r(children[0], pruned)?;
        self.prune_nodes_r(children[1], pruned)?;

        let solid = |id| {
            self.leaf(id)
                .is_some_and(|l| l.contents.contains(Contents::SOLID))
        };
        if !solid(children[0]) || !solid(children[1]) {
            return Ok(());
        }

        let mut merged = Leaf::default();
        for child in children {
            let linked: Vec<_> = self.node_portals(child).collect();
            for (id, _) in linked {
                if children.contains(&self.portal(id)?.other(child)) {
                    self.take_portal(id)?;
                } else {
                    self.move_portal(id, child, node)?;
                }
            }
            if let Some(leaf) = self.leaf_mut(child) {
                merged.contents |= leaf.contents;
                merged.brushes.append(&mut leaf.brushes);
            }
            self.nodes[child].parent = None;
        }
        self.nodes[node].kind = NodeKind::Leaf(merged);
        *pruned += 1;
        Ok(())
    }

    /// Number the leaves into clusters.
    ///
    /// Every non-solid leaf above the first detail separator is its own
    /// cluster; all non-solid leaves below a detail separator share one.
    /// Solid leaves get no cluster.
    pub fn number_clusters(&mut self) -> u32 {
        let mut next = 0;
        self.number_clusters_r(self.head, &mut next);
        self.num_clusters = next;
        info!("{next} clusters");
        next
    }

    fn number_clusters_r(&mut self, node: NodeId, next: &mut u32) {
        if let NodeKind::Internal(internal) = &self.nodes[node].kind
            && !internal.detail_separator
        {
            let children = internal.children;
            self.number_clusters_r(children[0], next);
            self.number_clusters_r(children[1], next);
            return;
        }

        let cluster = *next;
        let mut used = false;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            match &mut self.nodes[id].kind {
                NodeKind::Internal(internal) => stack.extend(internal.children),
                NodeKind::Leaf(leaf) => {
                    if leaf.contents.contains(Contents::SOLID) {
                        leaf.cluster = None;
                    } else {
                        leaf.cluster = Some(cluster);
                        used = true;
                    }
                },
            }
        }
        if used {
            *next += 1;
        }
    }
}
