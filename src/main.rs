// main.rs
//
// Compiles two small levels: a sealed room and the same room with a hole in
// one wall. Diagnostics land in the `out` folder.

use brushbsp::brush::BrushDef;
use brushbsp::contents::Contents;
use brushbsp::context::{CompilationContext, Entity};
use brushbsp::io::{write_area_portal_pointfile, write_glview, write_pointfile, write_prt};
use brushbsp::{CompileConfig, CompileError};
use log::{error, info};
use nalgebra::Point3;
use std::fs;

/// Six walls around `[0, size]^3`, `thickness` units thick.
fn room(size: f64, thickness: f64) -> Vec<BrushDef> {
    let (lo, hi) = (-thickness, size + thickness);
    let p = Point3::<f64>::new;
    vec![
        // floor and ceiling cover the full footprint
        BrushDef::cuboid(p(lo, lo, lo), p(hi, hi, 0.0), Contents::SOLID),
        BrushDef::cuboid(p(lo, lo, size), p(hi, hi, hi), Contents::SOLID),
        BrushDef::cuboid(p(lo, lo, 0.0), p(0.0, hi, size), Contents::SOLID),
        BrushDef::cuboid(p(size, lo, 0.0), p(hi, hi, size), Contents::SOLID),
        BrushDef::cuboid(p(0.0, lo, 0.0), p(size, 0.0, size), Contents::SOLID),
        BrushDef::cuboid(p(0.0, size, 0.0), p(size, hi, size), Contents::SOLID),
    ]
}

fn compile(name: &str, brushes: &[BrushDef]) -> Result<(), CompileError> {
    info!("compiling {name}");
    let mut ctx = CompilationContext::new(CompileConfig::default());
    ctx.add_entity(Entity::new("worldspawn", None));
    ctx.add_entity(Entity::new(
        "info_player_start",
        Some(Point3::new(128.0, 128.0, 32.0)),
    ));
    for (i, brush) in brushes.iter().enumerate() {
        ctx.add_brush(&brush.clone().with_editor_id(i as i32))?;
    }

    let tree = ctx.compile()?;
    info!(
        "{name}: {} nodes, {} leaves, {} areas, {} clusters",
        ctx.stats.nodes, ctx.stats.leaves, tree.num_areas, tree.num_clusters
    );

    let _ = write_prt(&tree, format!("out/{name}.prt"));
    let _ = write_glview(&tree, format!("out/{name}.gl"));
    if tree.leaked {
        let _ = write_pointfile(&tree, format!("out/{name}.pts"));
    }
    for portal in tree.area_portals.iter().filter(|p| p.leak.is_some()) {
        let path = format!("out/{name}_areaportal{}.pts", portal.entity);
        let _ = write_area_portal_pointfile(portal, path);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    // Ensure the /out folder exists
    let _ = fs::create_dir_all("out");

    let sealed = room(256.0, 16.0);
    if let Err(e) = compile("sealed", &sealed) {
        error!("sealed: {e}");
    }

    // shrink the +x wall so a one unit slot opens along its bottom edge
    let mut leaky = room(256.0, 16.0);
    leaky[3] = BrushDef::cuboid(
        Point3::new(256.0, -16.0, 1.0),
        Point3::new(272.0, 272.0, 256.0),
        Contents::SOLID,
    );
    if let Err(e) = compile("leaky", &leaky) {
        error!("leaky: {e}");
    }
}
