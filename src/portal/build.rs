//! Portal generation and the closure check

use crate::brush::MapBrush;
use crate::bsp::{NodeId, NodeKind, Tree};
use crate::config::CompileConfig;
use crate::contents::Contents;
use crate::context::CompileStats;
use crate::errors::CompileError;
use crate::float_types::{
    BASE_WINDING_EPSILON, MAX_WORLD_COORD, ON_EPSILON, Real, SIDESPACE, SPLIT_WINDING_EPSILON,
};
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::geometry::{Plane, PlaneTable, Winding};
use crate::portal::Portal;
use log::{info, warn};
use nalgebra::Vector3;

/// Build the portals of every node, leaving them linked to the leaves.
pub fn make_tree_portals(
    tree: &mut Tree,
    planes: &PlaneTable,
    config: &CompileConfig,
    stats: &mut CompileStats,
) -> Result<(), CompileError> {
    make_headnode_portals(tree);
    let head = tree.head;
    make_tree_portals_r(tree, planes, config, stats, head)?;

    stats.portals = tree.live_portals().count();
    info!("{} portals", stats.portals);
    info!("{} tiny portals", stats.tiny_portals);
    Ok(())
}

/// Six inward-facing portals boxing in the head node, all leading to the
/// outside leaf.
fn make_headnode_portals(tree: &mut Tree) {
    let pad = Vector3::repeat(SIDESPACE);
    let bounds = [tree.bounds.mins - pad, tree.bounds.maxs + pad];
    let (head, outside) = (tree.head, tree.outside);

    let mut box_planes = Vec::with_capacity(6);
    for axis in 0..3 {
        for (j, limit) in bounds.iter().enumerate() {
            let mut normal = Vector3::zeros();
            if j == 0 {
                normal[axis] = 1.0;
                box_planes.push(Plane::new(normal, limit[axis]));
            } else {
                normal[axis] = -1.0;
                box_planes.push(Plane::new(normal, -limit[axis]));
            }
        }
    }

    for (i, plane) in box_planes.iter().enumerate() {
        let mut winding = Some(Winding::base_for_plane(&plane.normal, plane.dist));
        for (j, other) in box_planes.iter().enumerate() {
            if i == j {
                continue;
            }
            winding = winding.and_then(|w| w.chop(other, ON_EPSILON));
        }
        if let Some(winding) = winding {
            tree.add_portal(Portal::new(plane.clone(), winding, None), head, outside);
        }
    }
}

fn make_tree_portals_r(
    tree: &mut Tree,
    planes: &PlaneTable,
    config: &CompileConfig,
    stats: &mut CompileStats,
    node: NodeId,
) -> Result<(), CompileError> {
    calc_node_bounds(tree, node);
    let bounds = tree.nodes[node].bounds;
    if (0..3).any(|i| bounds.mins[i] >= bounds.maxs[i]) {
        warn!("node {node} without a volume");
    }
    if (0..3).any(|i| bounds.mins[i] < -MAX_WORLD_COORD || bounds.maxs[i] > MAX_WORLD_COORD) {
        warn!("node {node} with unbounded volume");
    }

    let children = match &tree.nodes[node].kind {
        NodeKind::Leaf(_) => return Ok(()),
        NodeKind::Internal(internal) => internal.children,
    };

    make_node_portal(tree, planes, config, stats, node)?;
    split_node_portals(tree, planes, stats, node)?;

    make_tree_portals_r(tree, planes, config, stats, children[0])?;
    make_tree_portals_r(tree, planes, config, stats, children[1])
}

fn calc_node_bounds(tree: &mut Tree, node: NodeId) {
    let mut bounds = Aabb::new_invalid();
    for (id, _) in tree.node_portals(node) {
        if let Some(portal) = tree.portals[id].as_ref() {
            for p in &portal.winding.points {
                bounds.take_point(*p);
            }
        }
    }
    tree.nodes[node].bounds = bounds;
}

/// The node plane clipped by every ancestor split.
fn base_winding_for_node(tree: &Tree, planes: &PlaneTable, node: NodeId) -> Option<Winding> {
    let internal = tree.nodes[node].as_internal()?;
    let plane = planes.get(internal.plane);
    let mut winding = Some(Winding::base_for_plane(&plane.normal, plane.dist));

    let mut child = node;
    let mut current = tree.nodes[node].parent;
    while let Some(parent) = current {
        let internal = tree.nodes[parent].as_internal()?;
        let plane = planes.get(internal.plane);
        winding = if internal.children[0] == child {
            winding?.chop(plane, BASE_WINDING_EPSILON)
        } else {
            winding?.chop(&plane.flipped(), BASE_WINDING_EPSILON)
        };
        child = parent;
        current = tree.nodes[parent].parent;
    }
    winding
}

/// Create the portal lying on the split plane of `node`, bounded by the
/// portals already around it.
fn make_node_portal(
    tree: &mut Tree,
    planes: &PlaneTable,
    config: &CompileConfig,
    stats: &mut CompileStats,
    node: NodeId,
) -> Result<(), CompileError> {
    let Some(internal) = tree.nodes[node].as_internal() else {
        return Ok(());
    };
    let (plane_num, children) = (internal.plane, internal.children);

    let mut winding = base_winding_for_node(tree, planes, node);
    for (id, side) in tree.node_portals(node) {
        let portal = tree.portal(id)?;
        let clip = if side == 0 {
            portal.plane.clone()
        } else {
            portal.plane.flipped()
        };
        winding = winding.and_then(|w| w.chop(&clip, config.on_epsilon));
    }

    let Some(winding) = winding else {
        return Ok(());
    };
    if winding.is_tiny() {
        stats.tiny_portals += 1;
        return Ok(());
    }

    let portal = Portal::new(planes.get(plane_num).clone(), winding, Some(node));
    tree.add_portal(portal, children[0], children[1]);
    Ok(())
}

/// Move the portals of `node` down to its children, splitting those that
/// cross the node plane.
fn split_node_portals(
    tree: &mut Tree,
    planes: &PlaneTable,
    stats: &mut CompileStats,
    node: NodeId,
) -> Result<(), CompileError> {
    let Some(internal) = tree.nodes[node].as_internal() else {
        return Ok(());
    };
    let plane = planes.get(internal.plane);
    let [front_child, back_child] = internal.children;

    let linked: Vec<_> = tree.node_portals(node).collect();
    for (id, side) in linked {
        let mut portal = tree.take_portal(id)?;
        let other = portal.nodes[1 - side];

        let (front, back) = portal.winding.split(plane, SPLIT_WINDING_EPSILON);
        let mut keep = |w: Option<Winding>| match w {
            Some(w) if w.is_tiny() => {
                stats.tiny_portals += 1;
                None
            },
            w => w,
        };
        let front = keep(front);
        let back = keep(back);

        // keep the portal's orientation: `node` was on `side`
        let relink = |tree: &mut Tree, portal: Portal, child: NodeId| {
            if side == 0 {
                tree.add_portal(portal, child, other)
            } else {
                tree.add_portal(portal, other, child)
            }
        };

        match (front, back) {
            (None, None) => {},
            (Some(front), None) => {
                portal.winding = front;
                relink(tree, portal, front_child);
            },
            (None, Some(back)) => {
                portal.winding = back;
                relink(tree, portal, back_child);
            },
            (Some(front), Some(back)) => {
                let mut back_portal = portal.clone();
                back_portal.winding = back;
                portal.winding = front;
                relink(tree, portal, front_child);
                relink(tree, back_portal, back_child);
            },
        }
    }

    tree.nodes[node].portals = None;
    Ok(())
}

/// Check that the portals of every leaf close up around it.
///
/// The area vectors of a closed convex cell sum to zero, which every leaf
/// must satisfy. That sum cannot see equal gaps on opposite faces, so open
/// leaves are also checked face by face: the portals on each face plane,
/// clipped to the cell, must cover the face the other planes cut out of it.
/// Solid leaves merged by [`Tree::prune_nodes`] need not be convex and only
/// get the sum check.
pub fn verify_watertight(
    tree: &Tree,
    brushes: &[MapBrush],
    config: &CompileConfig,
) -> Result<(), CompileError> {
    for leaf in tree.leaves() {
        let mut sum = Vector3::zeros();
        let mut total_area = 0.0;
        let mut faces: Vec<(Plane, Vec<&Winding>)> = Vec::new();
        for (id, side) in tree.node_portals(leaf) {
            let portal = tree.portal(id)?;
            let area = portal.winding.area_vector();
            total_area += area.norm();
            // the plane faces nodes[0], so outward is against it
            let inward = if side == 0 {
                sum -= area;
                portal.plane.clone()
            } else {
                sum += area;
                portal.plane.flipped()
            };
            match faces
                .iter_mut()
                .find(|(plane, _)| plane.matches(&inward.normal, inward.dist))
            {
                Some((_, windings)) => windings.push(&portal.winding),
                None => faces.push((inward, vec![&portal.winding])),
            }
        }
        if faces.is_empty() {
            continue;
        }

        let tolerance = config.watertight_tolerance.max(1e-4 * total_area);
        let mut residual = sum.norm();
        let open = tree.leaf(leaf).is_some_and(|l| !l.contents.contains(Contents::SOLID));
        if residual <= tolerance && open {
            residual = uncovered_face_area(&faces);
        }
        if residual > tolerance {
            let brush = tree
                .leaf(leaf)
                .and_then(|l| l.brushes.first())
                .and_then(|b| b.original)
                .and_then(|id| brushes.get(id))
                .map(|b| b.editor_id);
            return Err(CompileError::PortalGap {
                leaf,
                residual,
                brush,
            });
        }
    }
    Ok(())
}

/// Largest difference between a face of the cell bounded by `faces` and the
/// part of it its portals cover.
fn uncovered_face_area(faces: &[(Plane, Vec<&Winding>)]) -> Real {
    let clip = |winding: Winding, skip: usize| {
        faces
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != skip)
            .try_fold(winding, |w, (_, (plane, _))| w.chop(plane, BASE_WINDING_EPSILON))
    };

    let mut worst: Real = 0.0;
    for (i, (plane, windings)) in faces.iter().enumerate() {
        let expected = clip(Winding::base_for_plane(&plane.normal, plane.dist), i)
            .map_or(0.0, |w| w.area());
        let covered: Real = windings
            .iter()
            .filter_map(|w| clip((*w).clone(), i))
            .map(|w| w.area())
            .sum();
        worst = worst.max((expected - covered).abs());
    }
    worst
}
