//! Working brushes consumed by tree construction

use crate::brush::{MapBrushId, SideId};
use crate::context::{CompilationContext, EntityId};
use crate::contents::{Contents, SurfaceFlags};
use crate::errors::CompileError;
use crate::float_types::{MAX_WORLD_COORD, ON_EPSILON, Real};
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::geometry::plane::{
    PlaneSides, SIDE_BACK, SIDE_BOTH, SIDE_FACING, SIDE_FRONT,
};
use crate::geometry::{Plane, PlaneNum, PlaneTable, Winding, opposite};
use nalgebra::{Point3, Vector3};

/// A side of a working brush.
#[derive(Debug, Clone, PartialEq)]
pub struct BspSide {
    pub plane: PlaneNum,
    pub winding: Option<Winding>,
    /// Authoring side this one descends from.
    pub original: Option<SideId>,
    pub contents: Contents,
    pub surface: SurfaceFlags,
    pub visible: bool,
    pub bevel: bool,
    /// Already used as a node plane above this fragment.
    pub on_node: bool,
    /// Scratch flag for split selection.
    pub tested: bool,
}

impl BspSide {
    fn plain(plane: PlaneNum) -> Self {
        BspSide {
            plane,
            winding: None,
            original: None,
            contents: Contents::empty(),
            surface: SurfaceFlags::empty(),
            visible: false,
            bevel: false,
            on_node: false,
            tested: false,
        }
    }
}

/// A convex fragment of a map brush (or a bounding volume).
#[derive(Debug, Clone)]
pub struct BspBrush {
    /// Map brush index, [`BspBrush::VOLUME_ID`] for node volumes.
    pub id: usize,
    pub original: Option<MapBrushId>,
    /// Editor id and entity of the map brush, `-1` and `0` for volumes.
    pub editor_id: i32,
    pub entity: EntityId,
    pub contents: Contents,
    pub bounds: Aabb,
    pub sides: Vec<BspSide>,
}

/// How a brush relates to a candidate plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaneTest {
    pub sides: PlaneSides,
    pub splits: usize,
    pub hint_split: bool,
    pub epsilon_brush: bool,
}

impl BspBrush {
    pub const VOLUME_ID: usize = usize::MAX;

    /// Working copy of a validated map brush.
    pub fn from_map_brush(ctx: &CompilationContext, id: MapBrushId) -> Self {
        let brush = &ctx.brushes[id];
        let sides = brush
            .sides
            .iter()
            .map(|&sid| {
                let side = &ctx.sides[sid];
                BspSide {
                    plane: side.plane,
                    winding: side.winding.clone(),
                    original: Some(sid),
                    contents: side.contents,
                    surface: side.surface,
                    visible: side.preferred,
                    bevel: side.bevel,
                    on_node: false,
                    tested: false,
                }
            })
            .collect();
        BspBrush {
            id,
            original: Some(id),
            editor_id: brush.editor_id,
            entity: brush.entity,
            contents: brush.contents,
            bounds: brush.bounds,
            sides,
        }
    }

    /// An axial box with windings, used as the volume of the head node.
    pub fn from_bounds(
        planes: &mut PlaneTable,
        mins: &Point3<Real>,
        maxs: &Point3<Real>,
    ) -> Result<Self, CompileError> {
        let mut sides = Vec::with_capacity(6);
        for axis in 0..3 {
            let mut normal = Vector3::zeros();
            normal[axis] = 1.0;
            sides.push(BspSide::plain(planes.intern(&normal, maxs[axis])?));
            normal[axis] = -1.0;
            sides.push(BspSide::plain(planes.intern(&normal, -mins[axis])?));
        }
        let mut brush = BspBrush {
            id: Self::VOLUME_ID,
            original: None,
            editor_id: -1,
            entity: 0,
            contents: Contents::empty(),
            bounds: Aabb::new_invalid(),
            sides,
        };
        brush.create_windings(planes);
        Ok(brush)
    }

    /// Clip a winding for every side against the others, then recompute bounds.
    pub fn create_windings(&mut self, planes: &PlaneTable) {
        for i in 0..self.sides.len() {
            let plane = planes.get(self.sides[i].plane);
            let mut winding = Some(Winding::base_for_plane(&plane.normal, plane.dist));
            for (j, other) in self.sides.iter().enumerate() {
                if i == j || other.bevel {
                    continue;
                }
                winding = match winding {
                    Some(w) => w.chop(planes.get(opposite(other.plane)), 0.0),
                    None => break,
                };
            }
            self.sides[i].winding = winding;
        }
        self.bound();
    }

    /// Recompute the bounds from the side windings.
    pub fn bound(&mut self) {
        let mut bounds = Aabb::new_invalid();
        for w in self.windings() {
            for p in &w.points {
                bounds.take_point(*p);
            }
        }
        self.bounds = bounds;
    }

    pub fn windings(&self) -> impl Iterator<Item = &Winding> {
        self.sides.iter().filter_map(|s| s.winding.as_ref())
    }

    /// Bounds are empty, inverted or beyond the world.
    pub fn has_bogus_bounds(&self) -> bool {
        (0..3).any(|i| {
            self.bounds.mins[i] < -MAX_WORLD_COORD
                || self.bounds.maxs[i] > MAX_WORLD_COORD
                || self.bounds.mins[i] >= self.bounds.maxs[i]
        })
    }

    /// Volume as a fan of pyramids from one corner.
    pub fn volume(&self, planes: &PlaneTable) -> Real {
        let Some(corner) = self.windings().next().map(|w| w.points[0]) else {
            return 0.0;
        };
        let mut volume = 0.0;
        for side in &self.sides {
            let Some(w) = &side.winding else { continue };
            let height = -planes.get(side.plane).distance(&corner);
            volume += height * w.area();
        }
        volume / 3.0
    }

    /// The side of `plane` holding the point farthest from it.
    pub fn mostly_on_side(&self, plane: &Plane) -> PlaneSides {
        let mut max = 0.0;
        let mut side = SIDE_FRONT;
        for w in self.windings() {
            for p in &w.points {
                let d = plane.distance(p);
                if d > max {
                    max = d;
                    side = SIDE_FRONT;
                }
                if -d > max {
                    max = -d;
                    side = SIDE_BACK;
                }
            }
        }
        side
    }

    /// Largest and smallest signed distance of the brush's points to `plane`.
    pub fn distance_range(&self, plane: &Plane) -> (Real, Real) {
        let mut d_front: Real = 0.0;
        let mut d_back: Real = 0.0;
        for w in self.windings() {
            for p in &w.points {
                let d = plane.distance(p);
                d_front = d_front.max(d);
                d_back = d_back.min(d);
            }
        }
        (d_front, d_back)
    }

    /// Classify the brush against plane `planenum` and count the visible
    /// windings it would cut.
    pub fn test_to_plane(&self, planes: &PlaneTable, planenum: PlaneNum) -> PlaneTest {
        let mut test = PlaneTest::default();

        // a side on the plane settles it
        for side in &self.sides {
            if side.plane == planenum {
                test.sides = SIDE_BACK | SIDE_FACING;
                return test;
            }
            if side.plane == opposite(planenum) {
                test.sides = SIDE_FRONT | SIDE_FACING;
                return test;
            }
        }

        let plane = planes.get(planenum);
        test.sides = plane.box_on_plane_side(&self.bounds.mins, &self.bounds.maxs);
        if test.sides != SIDE_BOTH {
            return test;
        }

        let mut d_front: Real = 0.0;
        let mut d_back: Real = 0.0;
        for side in &self.sides {
            if side.on_node || !side.visible {
                continue;
            }
            let Some(w) = &side.winding else { continue };
            let mut front = false;
            let mut back = false;
            for p in &w.points {
                let d = plane.distance(p);
                d_front = d_front.max(d);
                d_back = d_back.min(d);
                if d > ON_EPSILON {
                    front = true;
                }
                if d < -ON_EPSILON {
                    back = true;
                }
            }
            if front && back {
                test.splits += 1;
                if side.surface.contains(SurfaceFlags::HINT) {
                    test.hint_split = true;
                }
            }
        }

        test.epsilon_brush = (d_front > 0.0 && d_front < 1.0) || (d_back < 0.0 && d_back > -1.0);
        test
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(planes: &mut PlaneTable, size: Real) -> BspBrush {
        BspBrush::from_bounds(
            planes,
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(size, size, size),
        )
        .unwrap()
    }

    #[test]
    fn box_volume_and_bounds() {
        let mut planes = PlaneTable::with_capacity(64);
        let brush = cube(&mut planes, 4.0);
        assert!((brush.volume(&planes) - 64.0).abs() < 1e-9);
        assert_eq!(brush.bounds.maxs, Point3::new(4.0, 4.0, 4.0));
        assert!(!brush.has_bogus_bounds());
        assert_eq!(brush.windings().count(), 6);
    }

    #[test]
    fn facing_side_classification() {
        let mut planes = PlaneTable::with_capacity(64);
        let brush = cube(&mut planes, 4.0);
        let top = planes.find(&Vector3::z(), 4.0).unwrap();
        assert_eq!(brush.test_to_plane(&planes, top).sides, SIDE_BACK | SIDE_FACING);
        assert_eq!(
            brush.test_to_plane(&planes, opposite(top)).sides,
            SIDE_FRONT | SIDE_FACING
        );
    }

    #[test]
    fn volume_brush_sides_are_invisible() {
        let mut planes = PlaneTable::with_capacity(64);
        let brush = cube(&mut planes, 8.0);
        let mid = planes.intern(&Vector3::x(), 4.0).unwrap();
        let test = brush.test_to_plane(&planes, mid);
        assert_eq!(test.sides, SIDE_BOTH);
        assert_eq!(test.splits, 0);
        assert!(!test.epsilon_brush);
    }
}
