use crate::bsp::Tree;
use crate::contents::Contents;
use crate::io::{IoError, format_coord};
use crate::portal::Portal;
use std::path::Path;

/// Portals the vis stage floods through: created by a split, open on both
/// sides and joining two different clusters.
fn is_vis_portal(tree: &Tree, portal: &Portal) -> bool {
    if portal.on_node.is_none() {
        return false;
    }
    let [a, b] = portal.nodes.map(|n| tree.leaf(n));
    match (a, b) {
        (Some(a), Some(b)) => {
            !a.contents.intersects(Contents::VIS_BLOCKING)
                && !b.contents.intersects(Contents::VIS_BLOCKING)
                && a.cluster.is_some()
                && b.cluster.is_some()
                && a.cluster != b.cluster
        },
        _ => false,
    }
}

/// Render the `PRT1` portal file.
///
/// ```text
/// PRT1
/// <clusters>
/// <portals>
/// <points> <cluster> <cluster> (x y z ) (x y z ) ...
/// ```
pub fn to_prt(tree: &Tree) -> String {
    let portals: Vec<&Portal> = tree
        .live_portals()
        .map(|(_, p)| p)
        .filter(|p| is_vis_portal(tree, p))
        .collect();

    let mut out = String::new();
    out.push_str("PRT1\n");
    out.push_str(&format!("{}\n", tree.num_clusters));
    out.push_str(&format!("{}\n", portals.len()));

    for portal in portals {
        let cluster = |n: usize| tree.leaf(portal.nodes[n]).and_then(|l| l.cluster).unwrap_or(0);
        // list the clusters in the order the winding faces
        let faces_plane = portal
            .winding
            .plane()
            .is_some_and(|w| w.normal.dot(&portal.plane.normal) >= 0.99);
        let (c0, c1) = if faces_plane {
            (cluster(0), cluster(1))
        } else {
            (cluster(1), cluster(0))
        };

        out.push_str(&format!("{} {c0} {c1} ", portal.winding.len()));
        for p in &portal.winding.points {
            out.push_str(&format!(
                "({} {} {} ) ",
                format_coord(p.x),
                format_coord(p.y),
                format_coord(p.z)
            ));
        }
        out.push('\n');
    }
    out
}

pub fn write_prt(tree: &Tree, path: impl AsRef<Path>) -> Result<(), IoError> {
    std::fs::write(path, to_prt(tree))?;
    Ok(())
}
