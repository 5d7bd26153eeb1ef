//! Brush model: authoring brushes turned into validated, beveled solids
//!
//! An authoring brush ([`BrushDef`]) is a set of half-spaces. Loading it
//! interns every side plane, clips a winding for each side against all the
//! others, validates the result and appends axial and edge bevels. The
//! validated [`MapBrush`] and its [`Side`]s live in the
//! [`CompilationContext`] for the whole compile; tree construction works on
//! disposable [`BspBrush`] copies that point back at them.

pub mod bsp_brush;
pub mod split;

pub use bsp_brush::{BspBrush, BspSide, PlaneTest};
pub use split::split_brush;

use crate::contents::{Contents, SurfaceFlags};
use crate::context::{CompilationContext, EntityId};
use crate::errors::{BrushError, CompileError};
use crate::float_types::Real;
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::geometry::plane::snap_normal;
use crate::geometry::{Plane, PlaneNum, PlaneTable, Winding, opposite};
use log::{debug, warn};
use nalgebra::{Point3, Vector3};

/// Index of an authoring side in [`CompilationContext::sides`].
pub type SideId = usize;
/// Index of a brush in [`CompilationContext::brushes`].
pub type MapBrushId = usize;

/// How an authoring side names its plane.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaneDef {
    /// Three points, clockwise seen from outside the brush.
    Points([Point3<Real>; 3]),
    /// Outward normal and distance.
    Normal { normal: Vector3<Real>, dist: Real },
}

/// One face of an authoring brush as produced by the map loader.
#[derive(Debug, Clone, PartialEq)]
pub struct SideDef {
    pub plane: PlaneDef,
    /// Opaque texture handle resolved by the material collaborator.
    pub texinfo: Option<u32>,
    pub contents: Contents,
    pub surface: SurfaceFlags,
    pub editor_id: i32,
}

impl SideDef {
    pub fn from_normal(normal: Vector3<Real>, dist: Real) -> Self {
        SideDef {
            plane: PlaneDef::Normal { normal, dist },
            texinfo: None,
            contents: Contents::empty(),
            surface: SurfaceFlags::empty(),
            editor_id: 0,
        }
    }

    pub fn from_points(points: [Point3<Real>; 3]) -> Self {
        SideDef {
            plane: PlaneDef::Points(points),
            ..SideDef::from_normal(Vector3::zeros(), 0.0)
        }
    }

    pub fn with_surface(mut self, surface: SurfaceFlags) -> Self {
        self.surface = surface;
        self
    }

    pub fn with_texinfo(mut self, texinfo: u32) -> Self {
        self.texinfo = Some(texinfo);
        self
    }
}

/// A brush record handed over by the map loader.
#[derive(Debug, Clone, PartialEq)]
pub struct BrushDef {
    pub editor_id: i32,
    pub entity: EntityId,
    /// Empty means "derive from the sides", falling back to solid.
    pub contents: Contents,
    pub sides: Vec<SideDef>,
}

impl BrushDef {
    /// An axis-aligned box brush.
    pub fn cuboid(mins: Point3<Real>, maxs: Point3<Real>, contents: Contents) -> Self {
        let mut sides = Vec::with_capacity(6);
        for axis in 0..3 {
            let mut normal = Vector3::zeros();
            normal[axis] = 1.0;
            sides.push(SideDef::from_normal(normal, maxs[axis]));
            sides.push(SideDef::from_normal(-normal, -mins[axis]));
        }
        BrushDef {
            editor_id: 0,
            entity: 0,
            contents,
            sides,
        }
    }

    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = entity;
        self
    }

    pub fn with_editor_id(mut self, editor_id: i32) -> Self {
        self.editor_id = editor_id;
        self
    }

    fn resolved_contents(&self) -> Contents {
        if !self.contents.is_empty() {
            return self.contents;
        }
        let from_sides = self
            .sides
            .iter()
            .fold(Contents::empty(), |acc, s| acc | s.contents);
        if from_sides.is_empty() {
            Contents::SOLID
        } else {
            from_sides
        }
    }
}

/// A validated side of a [`MapBrush`]; the "original" every fragment refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    pub plane: PlaneNum,
    pub texinfo: Option<u32>,
    pub contents: Contents,
    pub surface: SurfaceFlags,
    pub winding: Option<Winding>,
    /// Drawn according to its surface flags; such sides are tried first as
    /// splitters.
    pub preferred: bool,
    /// Some portal between differing contents lies on this side. Set by
    /// [`crate::flood::mark_visible_sides`].
    pub visible: bool,
    /// Added for collision; never picked as a splitter.
    pub bevel: bool,
    pub brush: MapBrushId,
    pub editor_id: i32,
}

impl Side {
    fn new(plane: PlaneNum, def: &SideDef) -> Self {
        Side {
            plane,
            texinfo: def.texinfo,
            contents: def.contents,
            surface: def.surface,
            winding: None,
            preferred: false,
            visible: false,
            bevel: false,
            brush: 0,
            editor_id: def.editor_id,
        }
    }

    fn bevel_of(plane: PlaneNum, template: &Side) -> Self {
        Side {
            plane,
            winding: None,
            preferred: false,
            visible: false,
            bevel: true,
            editor_id: 0,
            ..template.clone()
        }
    }
}

/// A validated convex solid.
#[derive(Debug, Clone)]
pub struct MapBrush {
    pub editor_id: i32,
    pub entity: EntityId,
    pub contents: Contents,
    pub bounds: Aabb,
    pub sides: Vec<SideId>,
}

/// Validate `def` and store it in the context.
///
/// Returns `Ok(None)` when the brush is degenerate; the reason is logged and
/// kept in [`CompilationContext::dropped_brushes`].
pub fn load_brush(
    ctx: &mut CompilationContext,
    def: &BrushDef,
) -> Result<Option<MapBrushId>, CompileError> {
    if ctx.brushes.len() >= ctx.config.max_brushes {
        return Err(CompileError::TooManyBrushes {
            capacity: ctx.config.max_brushes,
            brush: def.editor_id,
            entity: def.entity,
        });
    }

    match build_sides(ctx, def)? {
        Ok((sides, bounds)) => {
            let capacity = if sides.len() > ctx.config.max_sides_per_brush {
                Some(ctx.config.max_sides_per_brush)
            } else if ctx.sides.len() + sides.len() > ctx.config.max_brush_sides {
                Some(ctx.config.max_brush_sides)
            } else {
                None
            };
            if let Some(capacity) = capacity {
                return Err(CompileError::TooManyBrushSides {
                    capacity,
                    brush: def.editor_id,
                    entity: def.entity,
                });
            }

            let id = ctx.brushes.len();
            let first = ctx.sides.len();
            ctx.sides.extend(sides.into_iter().map(|mut s| {
                s.brush = id;
                s
            }));
            ctx.brushes.push(MapBrush {
                editor_id: def.editor_id,
                entity: def.entity,
                contents: def.resolved_contents(),
                bounds,
                sides: (first..ctx.sides.len()).collect(),
            });
            Ok(Some(id))
        },
        Err(reason) => {
            warn!("dropping brush: {reason}");
            ctx.stats.dropped_brushes += 1;
            ctx.dropped_brushes.push(reason);
            Ok(None)
        },
    }
}

type BuiltSides = Result<(Vec<Side>, Aabb), BrushError>;

fn build_sides(ctx: &mut CompilationContext, def: &BrushDef) -> Result<BuiltSides, CompileError> {
    let mut sides: Vec<Side> = Vec::with_capacity(def.sides.len() + 6);

    for side_def in &def.sides {
        let (normal, dist) = match &side_def.plane {
            PlaneDef::Points([p0, p1, p2]) => match Plane::from_points(p0, p1, p2) {
                Some(plane) => (plane.normal, plane.dist),
                None => {
                    warn!(
                        "entity {}, brush {}: plane with no normal",
                        def.entity, def.editor_id
                    );
                    continue;
                },
            },
            PlaneDef::Normal { normal, dist } => {
                let len = normal.norm();
                if len < 0.5 {
                    return Err(CompileError::BadPlaneNormal {
                        normal: *normal,
                        brush: def.editor_id,
                        entity: def.entity,
                    });
                }
                (normal / len, dist / len)
            },
        };

        let plane = ctx.planes.intern(&normal, dist)?;
        if sides.iter().any(|s| s.plane == plane) {
            warn!(
                "entity {}, brush {}: duplicate plane",
                def.entity, def.editor_id
            );
            continue;
        }
        if sides.iter().any(|s| s.plane == opposite(plane)) {
            return Ok(Err(BrushError::MirroredPlane {
                brush: def.editor_id,
                entity: def.entity,
            }));
        }
        sides.push(Side::new(plane, side_def));
    }

    let bounds = make_brush_windings(&ctx.planes, &mut sides);
    let valid = sides.iter().filter(|s| s.winding.is_some()).count();
    if valid < 4 {
        return Ok(Err(BrushError::TooFewSides {
            brush: def.editor_id,
            entity: def.entity,
            sides: valid,
        }));
    }
    if (0..3).any(|i| bounds.mins[i] >= bounds.maxs[i]) {
        return Ok(Err(BrushError::InvertedBounds {
            brush: def.editor_id,
            entity: def.entity,
        }));
    }
    let limit = ctx.config.max_world_coord;
    if (0..3).any(|i| bounds.mins[i] < -limit || bounds.maxs[i] > limit) {
        return Ok(Err(BrushError::OutOfRange {
            brush: def.editor_id,
            entity: def.entity,
        }));
    }

    let (box_bevels, edge_bevels) = add_brush_bevels(&mut ctx.planes, &mut sides, &bounds)?;
    ctx.stats.box_bevels += box_bevels;
    ctx.stats.edge_bevels += edge_bevels;

    Ok(Ok((sides, bounds)))
}

/// Clip a winding for every side against all the other sides and return the
/// bounds of the result.
pub fn make_brush_windings(planes: &PlaneTable, sides: &mut [Side]) -> Aabb {
    let mut bounds = Aabb::new_invalid();
    for i in 0..sides.len() {
        let plane = planes.get(sides[i].plane);
        let mut winding = Some(Winding::base_for_plane(&plane.normal, plane.dist));
        for (j, other) in sides.iter().enumerate() {
            if i == j || other.bevel {
                continue;
            }
            let clip = planes.get(opposite(other.plane));
            winding = match winding {
                Some(w) => w.chop(clip, 0.0),
                None => break,
            };
        }

        let side = &mut sides[i];
        if let Some(w) = &winding {
            side.preferred = is_visible_surface(side.surface);
            for p in &w.points {
                bounds.take_point(*p);
            }
        }
        side.winding = winding;
    }
    bounds
}

/// Drawn surfaces, including hints, are preferred as splitters.
pub fn is_visible_surface(surface: SurfaceFlags) -> bool {
    surface.contains(SurfaceFlags::HINT)
        || !surface.intersects(SurfaceFlags::NODRAW | SurfaceFlags::SKIP)
}

/// Add axial box bevels in canonical order, then edge bevels for slanted brushes.
///
/// Returns the number of box and edge bevels added.
pub fn add_brush_bevels(
    planes: &mut PlaneTable,
    sides: &mut Vec<Side>,
    bounds: &Aabb,
) -> Result<(usize, usize), CompileError> {
    let mut box_bevels = 0;
    let mut edge_bevels = 0;

    let mut order = 0;
    for axis in 0..3 {
        for dir in [-1.0, 1.0] {
            let found = sides
                .iter()
                .position(|s| planes.get(s.plane).normal[axis] == dir);
            let index = match found {
                Some(index) => index,
                None => {
                    let mut normal = Vector3::zeros();
                    normal[axis] = dir;
                    let dist = if dir > 0.0 {
                        bounds.maxs[axis]
                    } else {
                        -bounds.mins[axis]
                    };
                    let plane = planes.intern(&normal, dist)?;
                    let bevel = Side::bevel_of(plane, &sides[0]);
                    sides.push(bevel);
                    box_bevels += 1;
                    sides.len() - 1
                },
            };
            if index != order {
                sides.swap(order, index);
            }
            order += 1;
        }
    }

    if sides.len() == 6 {
        // pure axial
        return Ok((box_bevels, edge_bevels));
    }

    // sides grows while we walk it; new bevels have no winding
    let mut i = 6;
    while i < sides.len() {
        let Some(w) = sides[i].winding.clone() else {
            i += 1;
            continue;
        };
        let n = w.len();
        for j in 0..n {
            let k = (j + 1) % n;
            let mut edge = w.points[j] - w.points[k];
            let len = edge.norm();
            if len < 0.5 {
                continue;
            }
            edge /= len;
            snap_normal(&mut edge);
            if edge.iter().any(|c| *c == 1.0 || *c == -1.0) {
                // only slanted edges
                continue;
            }

            for axis in 0..3 {
                for dir in [-1.0, 1.0] {
                    let mut axial = Vector3::zeros();
                    axial[axis] = dir;
                    let normal = edge.cross(&axial);
                    let nlen = normal.norm();
                    if nlen < 0.5 {
                        continue;
                    }
                    let normal = normal / nlen;
                    let dist = w.points[j].coords.dot(&normal);

                    // a proper edge bevel has every point of the brush behind it
                    let outer_hull = sides.iter().all(|s| {
                        if planes.get(s.plane).matches(&normal, dist) {
                            return false;
                        }
                        s.winding.as_ref().is_none_or(|w2| {
                            w2.points
                                .iter()
                                .all(|p| p.coords.dot(&normal) - dist <= 0.1)
                        })
                    });
                    if !outer_hull {
                        continue;
                    }

                    let plane = planes.intern(&normal, dist)?;
                    debug!("edge bevel on plane {plane}");
                    let bevel = Side::bevel_of(plane, &sides[0]);
                    sides.push(bevel);
                    edge_bevels += 1;
                }
            }
        }
        i += 1;
    }

    Ok((box_bevels, edge_bevels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileConfig;

    #[test]
    fn cuboid_loads_with_six_preferred_sides() {
        let mut ctx = CompilationContext::new(CompileConfig::default());
        let def = BrushDef::cuboid(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(64.0, 32.0, 16.0),
            Contents::SOLID,
        );
        let id = load_brush(&mut ctx, &def).unwrap().unwrap();
        let brush = &ctx.brushes[id];
        assert_eq!(brush.sides.len(), 6);
        assert!(brush.sides.iter().all(|&s| ctx.sides[s].preferred));
        assert!(brush.sides.iter().all(|&s| !ctx.sides[s].visible));
        assert!(brush.sides.iter().all(|&s| !ctx.sides[s].bevel));
        assert_eq!(brush.bounds.maxs, Point3::new(64.0, 32.0, 16.0));
    }

    #[test]
    fn flat_brush_is_dropped() {
        let mut ctx = CompilationContext::new(CompileConfig::default());
        // only four sides, open along z
        let def = BrushDef {
            editor_id: 7,
            entity: 0,
            contents: Contents::SOLID,
            sides: vec![
                SideDef::from_normal(Vector3::x(), 8.0),
                SideDef::from_normal(-Vector3::x(), 0.0),
                SideDef::from_normal(Vector3::y(), 8.0),
                SideDef::from_normal(-Vector3::y(), 0.0),
            ],
        };
        assert!(load_brush(&mut ctx, &def).unwrap().is_none());
        assert_eq!(ctx.dropped_brushes.len(), 1);
    }

    #[test]
    fn wedge_gets_box_and_edge_bevels() {
        let mut ctx = CompilationContext::new(CompileConfig::default());
        let mut def = BrushDef::cuboid(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(64.0, 64.0, 64.0),
            Contents::SOLID,
        );
        // replace +x and +y with one diagonal face
        def.sides.retain(|s| match &s.plane {
            PlaneDef::Normal { normal, .. } => normal.x <= 0.0 && normal.y <= 0.0,
            _ => true,
        });
        let diagonal = Vector3::new(1.0, 1.0, 0.0).normalize();
        def.sides.push(SideDef::from_normal(diagonal, 64.0 * diagonal.x));

        let id = load_brush(&mut ctx, &def).unwrap().unwrap();
        let brush = &ctx.brushes[id];
        let bevels = brush.sides.iter().filter(|&&s| ctx.sides[s].bevel).count();
        assert!(bevels >= 2);
        assert_eq!(ctx.stats.box_bevels, 2);
        // canonical order: -x, +x, -y, +y, -z, +z
        let first = ctx.planes.get(ctx.sides[brush.sides[0]].plane);
        assert_eq!(first.normal, -Vector3::x());
    }
}
