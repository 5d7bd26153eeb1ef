//! Flood fills over the leaf/portal graph
//!
//! * [`flood_entities`] spreads occupancy from entity origins and finds leaks.
//! * [`fill_outside`] turns every unreached leaf solid.
//! * [`areas::flood_areas`] groups leaves into areas cut by area portals.
//! * [`visible::mark_visible_sides`] finds the brush sides portals lie on.

pub mod areas;
pub mod visible;

pub use areas::{AreaPortal, flood_areas};
pub use visible::mark_visible_sides;

use crate::bsp::{NodeId, Tree};
use crate::contents::Contents;
use crate::context::{CompileStats, Entity, EntityId};
use crate::float_types::Real;
use crate::geometry::PlaneTable;
use crate::portal::PortalId;
use hashbrown::HashMap;
use log::{info, warn};
use nalgebra::{Point3, Vector3};
use std::collections::VecDeque;

/// Route through open leaves that should not exist: from an entity to the
/// outside leaf, or around an area portal from one face to the other.
#[derive(Debug, Clone, PartialEq)]
pub struct LeakPath {
    /// Entity whose flood reached the outside, or the bypassed area portal.
    pub entity: EntityId,
    /// Leaves along the route, in order.
    pub leaves: Vec<NodeId>,
    /// Portals crossed between consecutive leaves.
    pub portals: Vec<PortalId>,
    /// The start point (entity origin or area portal face) followed by the
    /// centers of the crossed portals. An area portal route also ends at the
    /// center of the face it comes back in through.
    pub points: Vec<Point3<Real>>,
}

/// Entities that a player can spawn at get a little slack.
const PLAYER_START: &str = "info_player_start";

/// Mark every leaf reachable from an entity with its flood distance.
///
/// Returns `true` when the level leaks: the outside leaf was reached, or no
/// entity sits in open space at all. Previous flood results are discarded,
/// so running it twice gives the same answer.
pub fn flood_entities(tree: &mut Tree, planes: &PlaneTable, entities: &[Entity]) -> bool {
    for node in &mut tree.nodes {
        if let Some(leaf) = node.as_leaf_mut() {
            leaf.occupied = None;
            leaf.occupant = None;
        }
    }
    tree.leaked = false;
    tree.leak = None;

    let mut queue = VecDeque::new();
    let mut seed_origin: HashMap<NodeId, Point3<Real>> = HashMap::new();

    for (id, entity) in entities.iter().enumerate() {
        let Some(origin) = entity.origin else { continue };
        // keep entities sitting on the floor off the floor plane
        let origin = origin + Vector3::z();

        let candidates: Vec<Point3<Real>> = if entity.classname == PLAYER_START {
            let mut grid = Vec::with_capacity(9);
            for x in [-16.0, 0.0, 16.0] {
                for y in [-16.0, 0.0, 16.0] {
                    grid.push(origin + Vector3::new(x, y, 0.0));
                }
            }
            grid
        } else {
            vec![origin]
        };

        let placed = candidates.into_iter().find_map(|point| {
            let leaf = tree.point_in_leaf(planes, &point);
            tree.leaf(leaf)
                .is_some_and(|l| l.contents.is_passable())
                .then_some((leaf, point))
        });
        let Some((leaf, point)) = placed else {
            warn!("entity {id} ({}) is inside a solid", entity.classname);
            continue;
        };

        if let Some(l) = tree.leaf_mut(leaf)
            && l.occupied.is_none()
        {
            l.occupied = Some(0);
            l.occupant = Some(id);
            seed_origin.insert(leaf, point);
            queue.push_back(leaf);
        }
    }

    if queue.is_empty() {
        warn!("no entities in open -- no filling");
        tree.leaked = true;
        return true;
    }

    let mut parent: HashMap<NodeId, PortalId> = HashMap::new();
    while let Some(leaf) = queue.pop_front() {
        let (distance, occupant) = match tree.leaf(leaf) {
            Some(l) => (l.occupied.unwrap_or(0), l.occupant),
            None => continue,
        };
        let links: Vec<_> = tree.node_portals(leaf).collect();
        for (portal, side) in links {
            let Some(other) = tree.portals[portal].as_ref().map(|p| p.nodes[1 - side]) else {
                continue;
            };
            let Some(next) = tree.leaf_mut(other) else { continue };
            if next.occupied.is_some() || !next.contents.is_passable() {
                continue;
            }
            next.occupied = Some(distance + 1);
            next.occupant = occupant;
            parent.insert(other, portal);
            queue.push_back(other);
        }
    }

    let outside = tree.outside;
    if tree.leaf(outside).is_some_and(|l| l.occupied.is_some()) {
        tree.leaked = true;
        tree.leak = leak_path(tree, &parent, &seed_origin);
        if let Some(leak) = &tree.leak {
            warn!(
                "leak: entity {} reaches the outside through {} leaves",
                leak.entity,
                leak.leaves.len()
            );
        }
    } else {
        info!("no leaks");
    }
    tree.leaked
}

fn leak_path(
    tree: &Tree,
    parent: &HashMap<NodeId, PortalId>,
    seed_origin: &HashMap<NodeId, Point3<Real>>,
) -> Option<LeakPath> {
    let entity = tree.leaf(tree.outside)?.occupant?;

    let mut leaves = vec![tree.outside];
    let mut portals = Vec::new();
    let mut current = tree.outside;
    while let Some(&portal) = parent.get(&current) {
        portals.push(portal);
        current = tree.portals[portal].as_ref()?.other(current);
        leaves.push(current);
    }
    leaves.reverse();
    portals.reverse();

    let mut points = Vec::with_capacity(portals.len() + 1);
    points.push(*seed_origin.get(&current)?);
    for &portal in &portals {
        points.push(tree.portals[portal].as_ref()?.winding.center());
    }

    Some(LeakPath {
        entity,
        leaves,
        portals,
        points,
    })
}

/// Make every open leaf that no entity can reach solid.
///
/// Skipped when the level leaked, as every leaf would count as reachable
/// from the outside. Returns the number of leaves filled.
pub fn fill_outside(tree: &mut Tree, stats: &mut CompileStats) -> usize {
    if tree.leaked {
        warn!("level leaked, not filling outside");
        return 0;
    }

    let mut outside = 0;
    let mut inside = 0;
    for id in tree.leaves() {
        let Some(leaf) = tree.leaf_mut(id) else { continue };
        if leaf.occupied.is_none() && !leaf.contents.contains(Contents::SOLID) {
            leaf.contents = Contents::SOLID;
            leaf.brushes.retain(|b| !b.contents.contains(Contents::DETAIL));
            outside += 1;
        } else {
            inside += 1;
        }
    }

    stats.outside_filled = outside;
    info!("{outside} outside leafs");
    info!("{inside} inside leafs");
    outside
}
