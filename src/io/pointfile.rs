use crate::bsp::Tree;
use crate::flood::{AreaPortal, LeakPath};
use crate::io::IoError;
use log::info;
use std::path::Path;

/// One `x y z` line per point of the leak path, start first.
pub fn to_pointfile(leak: &LeakPath) -> String {
    let mut out = String::new();
    for p in &leak.points {
        out.push_str(&format!("{:.6} {:.6} {:.6}\n", p.x, p.y, p.z));
    }
    out
}

/// Write the leak trace of `tree`, failing when it has none.
pub fn write_pointfile(tree: &Tree, path: impl AsRef<Path>) -> Result<(), IoError> {
    let leak = tree.leak.as_ref().ok_or(IoError::NoLeak)?;
    let path = path.as_ref();
    std::fs::write(path, to_pointfile(leak))?;
    info!("wrote {} leak points to {}", leak.points.len(), path.display());
    Ok(())
}

/// Write the route around an area portal that fails to separate two areas.
pub fn write_area_portal_pointfile(
    portal: &AreaPortal,
    path: impl AsRef<Path>,
) -> Result<(), IoError> {
    let leak = portal.leak.as_ref().ok_or(IoError::NoLeak)?;
    let path = path.as_ref();
    std::fs::write(path, to_pointfile(leak))?;
    info!(
        "wrote {} points around area portal entity {} to {}",
        leak.points.len(),
        portal.entity,
        path.display()
    );
    Ok(())
}
