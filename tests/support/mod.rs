//! Test support library
//! Level builders and small helpers shared by the integration tests.
#![allow(dead_code)]

use brushbsp::brush::BrushDef;
use brushbsp::contents::Contents;
use brushbsp::context::{CompilationContext, Entity, EntityId};
use brushbsp::float_types::Real;
use brushbsp::CompileConfig;
use nalgebra::Point3;

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

pub fn p(x: Real, y: Real, z: Real) -> Point3<Real> {
    Point3::new(x, y, z)
}

pub fn solid(mins: Point3<Real>, maxs: Point3<Real>) -> BrushDef {
    BrushDef::cuboid(mins, maxs, Contents::SOLID)
}

/// Six walls enclosing `[0, size]^3`, 16 units thick.
pub fn room_walls(size: Real) -> Vec<BrushDef> {
    thick_room_walls(size, 16.0)
}

pub fn thick_room_walls(size: Real, thickness: Real) -> Vec<BrushDef> {
    let (lo, hi) = (-thickness, size + thickness);
    vec![
        solid(p(lo, lo, lo), p(hi, hi, 0.0)),
        solid(p(lo, lo, size), p(hi, hi, hi)),
        solid(p(lo, lo, 0.0), p(0.0, hi, size)),
        solid(p(size, lo, 0.0), p(hi, hi, size)),
        solid(p(0.0, lo, 0.0), p(size, 0.0, size)),
        solid(p(0.0, size, 0.0), p(size, hi, size)),
    ]
}

/// Context holding `brushes` for the world plus the given point entities.
pub fn context_with(brushes: &[BrushDef], entities: &[(&str, Point3<Real>)]) -> CompilationContext {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    ctx.add_entity(Entity::new("worldspawn", None));
    for (classname, origin) in entities {
        ctx.add_entity(Entity::new(*classname, Some(*origin)));
    }
    for (i, brush) in brushes.iter().enumerate() {
        ctx.add_brush(&brush.clone().with_editor_id(i as i32))
            .expect("brush loads");
    }
    ctx
}

/// A closed 256 unit room with a player start in the middle.
pub fn sealed_room() -> CompilationContext {
    context_with(&room_walls(256.0), &[("info_player_start", p(128.0, 128.0, 32.0))])
}

/// The sealed room with a one unit slot under the +x wall.
pub fn leaky_room() -> CompilationContext {
    let mut walls = room_walls(256.0);
    walls[3] = solid(p(256.0, -16.0, 1.0), p(272.0, 272.0, 256.0));
    context_with(&walls, &[("info_player_start", p(128.0, 128.0, 32.0))])
}

/// Where the player starts in [`two_rooms`].
pub const WEST_ORIGIN: [Real; 3] = [128.0, 128.0, 32.0];
/// Where the light sits in [`two_rooms`].
pub const EAST_ORIGIN: [Real; 3] = [512.0, 128.0, 64.0];
/// Entity owning the area portal brush in [`two_rooms`].
pub const AREAPORTAL_ENTITY: EntityId = 1;

/// Two 256x256x128 rooms joined by a corridor along x, with an area portal
/// brush plugging the middle of the corridor.
pub fn two_rooms() -> CompilationContext {
    two_rooms_with_plug(96.0)
}

/// [`two_rooms`] with the area portal brush reaching up to `top`; the
/// corridor is 96 units high.
pub fn two_rooms_with_plug(top: Real) -> CompilationContext {
    let mut ctx = CompilationContext::new(CompileConfig::default());
    ctx.add_entity(Entity::new("worldspawn", None));
    let portal_entity = ctx.add_entity(Entity::new("func_areaportal", None));
    assert_eq!(portal_entity, AREAPORTAL_ENTITY);
    ctx.add_entity(Entity::new("info_player_start", Some(Point3::from(WEST_ORIGIN))));
    ctx.add_entity(Entity::new("light", Some(Point3::from(EAST_ORIGIN))));

    let brushes = vec![
        // shell
        solid(p(-16.0, -16.0, -16.0), p(656.0, 272.0, 0.0)),
        solid(p(-16.0, -16.0, 128.0), p(656.0, 272.0, 144.0)),
        solid(p(-16.0, -16.0, 0.0), p(0.0, 272.0, 128.0)),
        solid(p(640.0, -16.0, 0.0), p(656.0, 272.0, 128.0)),
        solid(p(0.0, -16.0, 0.0), p(640.0, 0.0, 128.0)),
        solid(p(0.0, 256.0, 0.0), p(640.0, 272.0, 128.0)),
        // block between the rooms, minus the corridor
        solid(p(256.0, 0.0, 0.0), p(384.0, 96.0, 128.0)),
        solid(p(256.0, 160.0, 0.0), p(384.0, 256.0, 128.0)),
        solid(p(256.0, 96.0, 96.0), p(384.0, 160.0, 128.0)),
    ];
    for (i, brush) in brushes.iter().enumerate() {
        ctx.add_brush(&brush.clone().with_editor_id(i as i32))
            .expect("brush loads");
    }

    let portal = BrushDef::cuboid(p(312.0, 96.0, 0.0), p(328.0, 160.0, top), Contents::AREAPORTAL)
        .with_entity(portal_entity)
        .with_editor_id(100);
    ctx.add_brush(&portal).expect("area portal loads");
    ctx
}
