//! Area flooding: groups of leaves separated by area portals

use crate::brush::MapBrush;
use crate::bsp::{NodeId, Tree};
use crate::contents::Contents;
use crate::context::{CompileStats, EntityId};
use crate::flood::LeakPath;
use crate::float_types::Real;
use crate::portal::PortalId;
use hashbrown::{HashMap, HashSet};
use log::{info, warn};
use nalgebra::Vector3;
use std::collections::VecDeque;

/// The areas an area portal entity separates.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaPortal {
    pub entity: EntityId,
    /// Distinct areas touching the portal, in discovery order.
    pub areas: Vec<u32>,
    /// For a portal touching a single area, how open space gets from one
    /// face of the portal to the opposite one around it.
    pub leak: Option<LeakPath>,
}

impl AreaPortal {
    /// The two areas, when the portal separates exactly two.
    pub fn pair(&self) -> Option<[u32; 2]> {
        match self.areas.as_slice() {
            [a, b] => Some([*a, *b]),
            _ => None,
        }
    }
}

/// Entity owning the brushes of an area portal leaf.
fn portal_entity(tree: &Tree, brushes: &[MapBrush], leaf: NodeId) -> Option<EntityId> {
    let brush = tree.leaf(leaf)?.brushes.first()?.original?;
    brushes.get(brush).map(|b| b.entity)
}

/// Assign an area id to every open leaf.
///
/// Areas start at 1. The flood never crosses an area portal leaf; instead the
/// area is recorded on the portal's entity. Afterwards each area portal leaf
/// takes the first area it touches. Returns the number of areas.
pub fn flood_areas(tree: &mut Tree, brushes: &[MapBrush], stats: &mut CompileStats) -> u32 {
    for node in &mut tree.nodes {
        if let Some(leaf) = node.as_leaf_mut() {
            leaf.area = 0;
        }
    }
    for portal in tree.portals.iter_mut().flatten() {
        portal.area_boundary = false;
    }

    let leaves = tree.leaves();
    let mut records: HashMap<EntityId, AreaPortal> = HashMap::new();
    let mut next_area = 1;

    for &start in &leaves {
        let Some(leaf) = tree.leaf(start) else { continue };
        if leaf.contents.contains(Contents::SOLID)
            || leaf.contents.is_area_portal()
            || leaf.area != 0
        {
            continue;
        }
        flood_area(tree, brushes, &mut records, start, next_area);
        next_area += 1;
    }
    let num_areas = next_area - 1;

    for &id in &leaves {
        if !tree.leaf(id).is_some_and(|l| l.contents.is_area_portal()) {
            continue;
        }
        let Some(entity) = portal_entity(tree, brushes, id) else {
            warn!("area portal leaf {id} has no brush");
            continue;
        };
        let first = records.get(&entity).and_then(|r| r.areas.first().copied());
        if let Some(leaf) = tree.leaf_mut(id) {
            leaf.area = first.unwrap_or(0);
        }
    }

    let mut area_portals: Vec<AreaPortal> = records.into_values().collect();
    area_portals.sort_by_key(|p| p.entity);
    for portal in &mut area_portals {
        if portal.areas.len() != 2 {
            warn!(
                "area portal entity {} touches {} areas",
                portal.entity,
                portal.areas.len()
            );
        }
        if portal.areas.len() < 2 {
            portal.leak = area_portal_leak(tree, brushes, portal.entity);
            if let Some(leak) = &portal.leak {
                warn!(
                    "area portal entity {} is bypassed through {} leaves",
                    portal.entity,
                    leak.leaves.len()
                );
            }
        }
    }

    // portals touching an area portal leaf bound an area
    let outside = tree.outside;
    let boundary: Vec<bool> = tree
        .portals
        .iter()
        .map(|p| {
            p.as_ref().is_some_and(|p| {
                p.nodes.iter().any(|&n| {
                    n != outside && tree.leaf(n).is_some_and(|l| l.contents.is_area_portal())
                })
            })
        })
        .collect();
    for (portal, flag) in tree.portals.iter_mut().zip(boundary) {
        if let Some(portal) = portal {
            portal.area_boundary = flag;
        }
    }

    tree.area_portals = area_portals;
    tree.num_areas = num_areas;
    stats.areas = num_areas as usize;
    stats.area_portals = tree.area_portals.len();
    info!("{num_areas} areas");
    info!("{} area portals", stats.area_portals);
    num_areas
}

fn flood_area(
    tree: &mut Tree,
    brushes: &[MapBrush],
    records: &mut HashMap<EntityId, AreaPortal>,
    start: NodeId,
    area: u32,
) {
    let outside = tree.outside;
    if let Some(leaf) = tree.leaf_mut(start) {
        leaf.area = area;
    }
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let links: Vec<_> = tree.node_portals(current).collect();
        for (portal, side) in links {
            let Some(other) = tree.portals[portal].as_ref().map(|p| p.nodes[1 - side]) else {
                continue;
            };
            if other == outside {
                continue;
            }
            let Some(leaf) = tree.leaf(other) else { continue };
            if leaf.contents.contains(Contents::SOLID) {
                continue;
            }
            if leaf.contents.is_area_portal() {
                let Some(entity) = portal_entity(tree, brushes, other) else {
                    continue;
                };
                let record = records.entry(entity).or_insert_with(|| AreaPortal {
                    entity,
                    areas: Vec::new(),
                    leak: None,
                });
                if !record.areas.contains(&area) {
                    record.areas.push(area);
                }
                continue;
            }
            if leaf.area != 0 {
                continue;
            }
            if let Some(leaf) = tree.leaf_mut(other) {
                leaf.area = area;
            }
            queue.push_back(other);
        }
    }
}

/// Trace the open leaves connecting two opposite faces of an area portal.
///
/// The faces are the portals from the entity's leaves into open space whose
/// outward normals point most nearly apart. The path runs from the open leaf
/// in front of one face to the open leaf in front of the other, never
/// entering an area portal leaf. Its points start and end at the centers of
/// the two faces.
fn area_portal_leak(tree: &Tree, brushes: &[MapBrush], entity: EntityId) -> Option<LeakPath> {
    let outside = tree.outside;
    let open = |n: NodeId| {
        n != outside
            && tree.leaf(n).is_some_and(|l| {
                !l.contents.contains(Contents::SOLID) && !l.contents.is_area_portal()
            })
    };

    let mut faces: Vec<(PortalId, NodeId, Vector3<Real>)> = Vec::new();
    for leaf in tree.leaves() {
        if !tree.leaf(leaf).is_some_and(|l| l.contents.is_area_portal())
            || portal_entity(tree, brushes, leaf) != Some(entity)
        {
            continue;
        }
        for (id, side) in tree.node_portals(leaf) {
            let Some(portal) = tree.portals[id].as_ref() else { continue };
            let other = portal.nodes[1 - side];
            if !open(other) {
                continue;
            }
            // the plane faces nodes[0]
            let outward = if side == 0 {
                -portal.plane.normal
            } else {
                portal.plane.normal
            };
            faces.push((id, other, outward));
        }
    }

    let mut best: Option<(usize, usize)> = None;
    let mut best_dot = Real::MAX;
    for i in 0..faces.len() {
        for j in i + 1..faces.len() {
            let dot = faces[i].2.dot(&faces[j].2);
            if dot < best_dot {
                best_dot = dot;
                best = Some((i, j));
            }
        }
    }
    let (i, j) = best?;
    let (start_portal, start, _) = faces[i];
    let (end_portal, end, _) = faces[j];

    let mut parent: HashMap<NodeId, PortalId> = HashMap::new();
    let mut seen: HashSet<NodeId> = HashSet::new();
    seen.insert(start);
    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        if current == end {
            break;
        }
        for (id, side) in tree.node_portals(current) {
            let Some(portal) = tree.portals[id].as_ref() else { continue };
            let other = portal.nodes[1 - side];
            if open(other) && seen.insert(other) {
                parent.insert(other, id);
                queue.push_back(other);
            }
        }
    }
    if !seen.contains(&end) {
        return None;
    }

    let mut leaves = vec![end];
    let mut portals = Vec::new();
    let mut current = end;
    while let Some(&portal) = parent.get(&current) {
        portals.push(portal);
        current = tree.portals[portal].as_ref()?.other(current);
        leaves.push(current);
    }
    leaves.reverse();
    portals.reverse();

    let center = |id: PortalId| tree.portals[id].as_ref().map(|p| p.winding.center());
    let mut points = Vec::with_capacity(portals.len() + 2);
    points.push(center(start_portal)?);
    for &portal in &portals {
        points.push(center(portal)?);
    }
    points.push(center(end_portal)?);

    Some(LeakPath {
        entity,
        leaves,
        portals,
        points,
    })
}
