mod support;

use brushbsp::brush::{BrushDef, BspBrush, SideDef, split_brush};
use brushbsp::contents::Contents;
use brushbsp::context::CompilationContext;
use brushbsp::errors::{BrushError, CompileError};
use brushbsp::geometry::opposite;
use brushbsp::CompileConfig;
use nalgebra::{Point3, Vector3};

use crate::support::{approx_eq, p, solid};

/// A 64 unit cube with the +x/+y corner cut off by a diagonal face.
fn wedge() -> BrushDef {
    let diagonal = Vector3::new(1.0, 1.0, 0.0).normalize();
    BrushDef {
        editor_id: 3,
        entity: 0,
        contents: Contents::empty(),
        sides: vec![
            SideDef::from_normal(-Vector3::x(), 0.0),
            SideDef::from_normal(-Vector3::y(), 0.0),
            SideDef::from_normal(-Vector3::z(), 0.0),
            SideDef::from_normal(Vector3::z(), 64.0),
            SideDef::from_normal(Vector3::x(), 64.0),
            SideDef::from_normal(Vector3::y(), 64.0),
            SideDef::from_normal(diagonal, 96.0 * diagonal.x),
        ],
    }
}

#[test]
fn empty_contents_default_to_solid() {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    let id = ctx.add_brush(&wedge()).unwrap().unwrap();
    assert_eq!(ctx.brushes[id].contents, Contents::SOLID);
}

#[test]
fn wedge_volume_and_split_conservation() {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    let id = ctx.add_brush(&wedge()).unwrap().unwrap();
    let brush = BspBrush::from_map_brush(&ctx, id);

    // cube minus a corner prism with legs of 32
    let expected = 64.0 * 64.0 * 64.0 - 0.5 * 32.0 * 32.0 * 64.0;
    assert!(approx_eq(brush.volume(&ctx.planes), expected, 1e-6));

    let cut = ctx.planes.intern(&Vector3::new(0.6, 0.0, 0.8), 40.0).unwrap();
    let (front, back) = split_brush(&ctx.planes, &brush, cut, 1.0);
    let (front, back) = (front.unwrap(), back.unwrap());
    let total = front.volume(&ctx.planes) + back.volume(&ctx.planes);
    assert!(approx_eq(total, expected, 1e-3));

    // each fragment is closed by exactly one cap on the cut
    assert_eq!(front.sides.iter().filter(|s| s.plane == opposite(cut)).count(), 1);
    assert_eq!(back.sides.iter().filter(|s| s.plane == cut).count(), 1);
    // caps remember the side they were textured from
    assert!(front.sides.last().unwrap().original.is_some());
}

#[test]
fn coincident_split_creates_no_cap() {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    let id = ctx
        .add_brush(&solid(p(0.0, 0.0, 0.0), p(32.0, 32.0, 32.0)))
        .unwrap()
        .unwrap();
    let brush = BspBrush::from_map_brush(&ctx, id);
    let top = ctx.planes.find(&Vector3::z(), 32.0).unwrap();

    for plane in [top, opposite(top)] {
        let (front, back) = split_brush(&ctx.planes, &brush, plane, 1.0);
        let piece = front.or(back).unwrap();
        assert_eq!(piece.sides.len(), brush.sides.len());
        assert!(piece.sides.iter().all(|s| !s.on_node));
    }
}

#[test]
fn mirrored_and_open_brushes_are_dropped() {
    let mut ctx = CompilationContext::new(CompileConfig::default());

    let mut mirrored = solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0)).with_editor_id(11);
    mirrored.sides.push(SideDef::from_normal(-Vector3::x(), -8.0));
    assert_eq!(ctx.add_brush(&mirrored).unwrap(), None);

    let mut open = solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0)).with_editor_id(12);
    open.sides.truncate(3);
    assert_eq!(ctx.add_brush(&open).unwrap(), None);

    assert_eq!(
        ctx.dropped_brushes,
        vec![
            BrushError::MirroredPlane { brush: 11, entity: 0 },
            BrushError::TooFewSides { brush: 12, entity: 0, sides: 3 },
        ]
    );
    assert_eq!(ctx.stats.dropped_brushes, 2);
    assert!(ctx.brushes.is_empty());
}

#[test]
fn out_of_range_brush_is_dropped() {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    let far = solid(p(20000.0, 0.0, 0.0), p(20016.0, 16.0, 16.0)).with_editor_id(4);
    assert_eq!(ctx.add_brush(&far).unwrap(), None);
    assert_eq!(ctx.dropped_brushes, vec![BrushError::OutOfRange { brush: 4, entity: 0 }]);
}

#[test]
fn duplicate_plane_is_ignored() {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    let mut brush = solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0));
    brush.sides.push(SideDef::from_normal(Vector3::x(), 8.0));
    let id = ctx.add_brush(&brush).unwrap().unwrap();
    assert_eq!(ctx.brushes[id].sides.len(), 6);
}

#[test]
fn plane_from_points_side() {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    let mut brush = solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0));
    // the top face again, given as three clockwise points
    brush.sides[4] = SideDef::from_points([
        Point3::new(0.0, 0.0, 8.0),
        Point3::new(0.0, 8.0, 8.0),
        Point3::new(8.0, 0.0, 8.0),
    ]);
    let id = ctx.add_brush(&brush).unwrap().unwrap();
    assert_eq!(ctx.brushes[id].bounds.maxs.z, 8.0);
}

#[test]
fn fatal_conditions() {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    let mut bad = solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0)).with_editor_id(9);
    bad.sides[0] = SideDef::from_normal(Vector3::zeros(), 1.0);
    assert!(matches!(
        ctx.add_brush(&bad),
        Err(CompileError::BadPlaneNormal { brush: 9, .. })
    ));

    let mut ctx = CompilationContext::new(CompileConfig::default().with_max_brushes(1));
    ctx.add_brush(&solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0))).unwrap();
    let err = ctx
        .add_brush(&solid(p(16.0, 0.0, 0.0), p(24.0, 8.0, 8.0)).with_editor_id(2))
        .unwrap_err();
    assert_eq!(err, CompileError::TooManyBrushes { capacity: 1, brush: 2, entity: 0 });

    let mut ctx = CompilationContext::new(CompileConfig::default().with_max_planes(4));
    let err = ctx.add_brush(&solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0))).unwrap_err();
    assert_eq!(err, CompileError::PlaneTableFull { capacity: 4 });
}

#[test]
fn side_limits_report_the_limit_that_tripped() {
    let mut ctx = CompilationContext::new(CompileConfig::default().with_max_sides_per_brush(5));
    let err = ctx
        .add_brush(&solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0)).with_editor_id(3))
        .unwrap_err();
    assert_eq!(err, CompileError::TooManyBrushSides { capacity: 5, brush: 3, entity: 0 });

    let mut ctx = CompilationContext::new(CompileConfig::default().with_max_brush_sides(10));
    ctx.add_brush(&solid(p(0.0, 0.0, 0.0), p(8.0, 8.0, 8.0))).unwrap();
    let err = ctx
        .add_brush(&solid(p(16.0, 0.0, 0.0), p(24.0, 8.0, 8.0)).with_editor_id(4))
        .unwrap_err();
    assert_eq!(err, CompileError::TooManyBrushSides { capacity: 10, brush: 4, entity: 0 });
}
