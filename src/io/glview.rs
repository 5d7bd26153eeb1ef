use crate::bsp::Tree;
use crate::io::IoError;
use std::path::Path;

/// Dump the portals that separate an empty leaf from a filled one.
///
/// Each face is its point count followed by one `x y z r g b` line per
/// point and a blank line. Faces are turned to look into the empty leaf.
pub fn to_glview(tree: &Tree) -> String {
    let mut out = String::new();
    let mut faces = 0usize;

    for (_, portal) in tree.live_portals() {
        let [front, back] = portal.nodes.map(|n| tree.nodes[n].contents());
        if front == back {
            continue;
        }
        let winding = if front.is_empty() {
            portal.winding.clone()
        } else if back.is_empty() {
            portal.winding.reversed()
        } else {
            continue;
        };

        let color = [faces & 1, (faces >> 1) & 1, (faces >> 2) & 1].map(|c| c as f64);
        faces += 1;

        out.push_str(&format!("{}\n", winding.len()));
        for p in &winding.points {
            out.push_str(&format!(
                "{:6.3} {:6.3} {:6.3} {:6.3} {:6.3} {:6.3}\n",
                p.x, p.y, p.z, color[0], color[1], color[2]
            ));
        }
        out.push('\n');
    }
    out
}

pub fn write_glview(tree: &Tree, path: impl AsRef<Path>) -> Result<(), IoError> {
    std::fs::write(path, to_glview(tree))?;
    Ok(())
}
