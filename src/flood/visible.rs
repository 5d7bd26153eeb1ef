//! Marking the brush sides that can actually be seen

use crate::brush::{MapBrush, Side, SideId};
use crate::bsp::{NodeId, Tree};
use crate::context::CompileStats;
use crate::geometry::{PlaneTable, pair_base};
use crate::portal::PortalId;
use hashbrown::HashSet;
use log::{info, warn};

/// Flag every brush side that some portal lies on.
///
/// Only sides between leaves of differing visible contents qualify. All
/// visibility flags are cleared first. Returns the number of sides flagged.
pub fn mark_visible_sides(
    tree: &mut Tree,
    planes: &PlaneTable,
    brushes: &[MapBrush],
    sides: &mut [Side],
    stats: &mut CompileStats,
) -> usize {
    for side in sides.iter_mut() {
        side.visible = false;
    }

    let mut seen: HashSet<PortalId> = HashSet::new();
    let mut found: Vec<(PortalId, Option<SideId>)> = Vec::new();
    for leaf in tree.leaves() {
        if tree.leaf(leaf).is_none_or(|l| l.contents.is_empty()) {
            continue;
        }
        for (portal, _) in tree.node_portals(leaf) {
            let Some(p) = tree.portals[portal].as_ref() else { continue };
            if p.on_node.is_none() || !seen.insert(portal) {
                continue;
            }
            let side = if p.side_found {
                p.side
            } else {
                find_portal_side(tree, planes, brushes, sides, portal)
            };
            found.push((portal, side));
        }
    }

    let mut flagged = 0;
    for (portal, side) in found {
        if let Some(p) = tree.portals[portal].as_mut() {
            p.side_found = true;
            p.side = side;
        }
        if let Some(side) = side.and_then(|s| sides.get_mut(s))
            && !side.visible
        {
            side.visible = true;
            flagged += 1;
        }
    }

    stats.visible_sides = flagged;
    info!("{flagged} visible sides");
    flagged
}

/// The brush side a portal lies on: an exact plane match if there is one,
/// otherwise the side whose normal is closest.
fn find_portal_side(
    tree: &Tree,
    planes: &PlaneTable,
    brushes: &[MapBrush],
    sides: &[Side],
    portal: PortalId,
) -> Option<SideId> {
    let p = tree.portals[portal].as_ref()?;
    let contents = |n: NodeId| tree.nodes[n].contents();
    let viscontents = (contents(p.nodes[0]) ^ contents(p.nodes[1])).visible();
    if viscontents.is_empty() {
        return None;
    }

    let plane = pair_base(tree.nodes[p.on_node?].as_internal()?.plane);
    let normal = planes.get(plane).normal;
    let mut best: Option<SideId> = None;
    let mut best_dot = 0.0;

    for &node in &p.nodes {
        let Some(leaf) = tree.leaf(node) else { continue };
        for fragment in &leaf.brushes {
            let Some(brush) = fragment.original.and_then(|b| brushes.get(b)) else {
                continue;
            };
            if !brush.contents.intersects(viscontents) {
                continue;
            }
            for &sid in &brush.sides {
                let side = &sides[sid];
                if side.bevel {
                    continue;
                }
                if pair_base(side.plane) == plane {
                    return Some(sid);
                }
                let dot = planes.get(pair_base(side.plane)).normal.dot(&normal);
                if dot > best_dot {
                    best_dot = dot;
                    best = Some(sid);
                }
            }
        }
    }

    if best.is_none() {
        warn!("side not found for portal {portal}");
    }
    best
}
