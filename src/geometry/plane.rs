//! Oriented planes and point/box classification

use crate::float_types::{DIST_EPSILON, NORMAL_EPSILON, PLANESIDE_EPSILON, Real};
use nalgebra::{Point3, Vector3};

/// Axial classification of a plane normal.
///
/// `X`/`Y`/`Z` are exactly axial; the `Any*` variants name the dominant axis
/// of a slanted normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaneType {
    X,
    Y,
    Z,
    AnyX,
    AnyY,
    AnyZ,
}

impl PlaneType {
    /// Classify a unit normal.
    pub fn for_normal(normal: &Vector3<Real>) -> Self {
        if normal.x == 1.0 || normal.x == -1.0 {
            return PlaneType::X;
        }
        if normal.y == 1.0 || normal.y == -1.0 {
            return PlaneType::Y;
        }
        if normal.z == 1.0 || normal.z == -1.0 {
            return PlaneType::Z;
        }

        let ax = normal.x.abs();
        let ay = normal.y.abs();
        let az = normal.z.abs();
        if ax >= ay && ax >= az {
            PlaneType::AnyX
        } else if ay >= ax && ay >= az {
            PlaneType::AnyY
        } else {
            PlaneType::AnyZ
        }
    }

    /// Index of the axis for exactly axial planes.
    pub const fn axis(self) -> Option<usize> {
        match self {
            PlaneType::X => Some(0),
            PlaneType::Y => Some(1),
            PlaneType::Z => Some(2),
            _ => None,
        }
    }

    pub const fn is_axial(self) -> bool {
        self.axis().is_some()
    }
}

/// Which side of a plane a point falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSide {
    Front,
    Back,
    On,
}

/// Bit set describing where a box or brush lies relative to a plane.
pub type PlaneSides = u8;
pub const SIDE_FRONT: PlaneSides = 1;
pub const SIDE_BACK: PlaneSides = 2;
pub const SIDE_BOTH: PlaneSides = SIDE_FRONT | SIDE_BACK;
/// The brush owns a side lying on the plane.
pub const SIDE_FACING: PlaneSides = 4;

/// A plane `normal · p = dist` with a unit normal.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub dist: Real,
    pub kind: PlaneType,
}

impl Plane {
    /// Build a plane from a unit normal and a distance.
    pub fn new(normal: Vector3<Real>, dist: Real) -> Self {
        Plane {
            kind: PlaneType::for_normal(&normal),
            normal,
            dist,
        }
    }

    /// Plane through three points, oriented so that `p0, p1, p2` wind
    /// clockwise when seen from the front.
    ///
    /// Returns `None` for collinear points.
    pub fn from_points(p0: &Point3<Real>, p1: &Point3<Real>, p2: &Point3<Real>) -> Option<Self> {
        let t1 = p0 - p1;
        let t2 = p2 - p1;
        let normal = t1.cross(&t2);
        let len = normal.norm();
        if len < NORMAL_EPSILON {
            return None;
        }
        let normal = normal / len;
        Some(Plane::new(normal, p0.coords.dot(&normal)))
    }

    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            dist: -self.dist,
            kind: self.kind,
        }
    }

    /// Signed distance from the plane to `point`.
    #[inline]
    pub fn distance(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.dist
    }

    /// Classify `point` with an explicit epsilon.
    pub fn classify_point(&self, point: &Point3<Real>, epsilon: Real) -> PointSide {
        let d = self.distance(point);
        if d > epsilon {
            PointSide::Front
        } else if d < -epsilon {
            PointSide::Back
        } else {
            PointSide::On
        }
    }

    /// Equality within the normal and distance tolerances.
    pub fn matches(&self, normal: &Vector3<Real>, dist: Real) -> bool {
        self.normal.dot(normal) >= 1.0 - NORMAL_EPSILON && (self.dist - dist).abs() <= DIST_EPSILON
    }

    /// Where an axis-aligned box lies relative to the plane.
    ///
    /// Returns a combination of [`SIDE_FRONT`] and [`SIDE_BACK`].
    pub fn box_on_plane_side(&self, mins: &Point3<Real>, maxs: &Point3<Real>) -> PlaneSides {
        if let Some(axis) = self.kind.axis() {
            // normal is +/- unit along axis
            let (lo, hi) = if self.normal[axis] > 0.0 {
                (mins[axis] - self.dist, maxs[axis] - self.dist)
            } else {
                (-maxs[axis] - self.dist, -mins[axis] - self.dist)
            };
            let mut side = 0;
            if hi > PLANESIDE_EPSILON {
                side |= SIDE_FRONT;
            }
            if lo < -PLANESIDE_EPSILON {
                side |= SIDE_BACK;
            }
            return side;
        }

        // leading and trailing corners of the box along the normal
        let mut front_corner = Point3::origin();
        let mut back_corner = Point3::origin();
        for i in 0..3 {
            if self.normal[i] < 0.0 {
                front_corner[i] = mins[i];
                back_corner[i] = maxs[i];
            } else {
                front_corner[i] = maxs[i];
                back_corner[i] = mins[i];
            }
        }

        let mut side = 0;
        if self.distance(&front_corner) >= PLANESIDE_EPSILON {
            side = SIDE_FRONT;
        }
        if self.distance(&back_corner) < PLANESIDE_EPSILON {
            side |= SIDE_BACK;
        }
        side
    }
}

/// Snap a nearly axial normal onto the axis.
pub fn snap_normal(normal: &mut Vector3<Real>) {
    for i in 0..3 {
        if (normal[i] - 1.0).abs() < NORMAL_EPSILON {
            *normal = Vector3::zeros();
            normal[i] = 1.0;
            return;
        }
        if (normal[i] + 1.0).abs() < NORMAL_EPSILON {
            *normal = Vector3::zeros();
            normal[i] = -1.0;
            return;
        }
    }
}

/// Snap the normal and round a nearly integral distance.
pub fn snap_plane(normal: &mut Vector3<Real>, dist: &mut Real) {
    snap_normal(normal);
    if (*dist - dist.round()).abs() < DIST_EPSILON {
        *dist = dist.round();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_type_detects_axes() {
        assert_eq!(PlaneType::for_normal(&Vector3::new(0.0, -1.0, 0.0)), PlaneType::Y);
        let slanted = Vector3::new(0.8, 0.6, 0.0);
        assert_eq!(PlaneType::for_normal(&slanted), PlaneType::AnyX);
        assert!(!PlaneType::AnyX.is_axial());
    }

    #[test]
    fn from_points_is_clockwise_front() {
        // clockwise seen from +z
        let plane = Plane::from_points(
            &Point3::new(0.0, 0.0, 4.0),
            &Point3::new(0.0, 1.0, 4.0),
            &Point3::new(1.0, 0.0, 4.0),
        )
        .unwrap();
        assert_eq!(plane.normal, Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(plane.dist, 4.0);
    }

    #[test]
    fn points_near_the_plane_are_on_it() {
        let plane = Plane::new(Vector3::z(), 8.0);
        assert_eq!(plane.classify_point(&Point3::new(3.0, -2.0, 8.05), 0.1), PointSide::On);
        assert_eq!(plane.classify_point(&Point3::new(0.0, 0.0, 8.2), 0.1), PointSide::Front);
        assert_eq!(plane.classify_point(&Point3::new(0.0, 0.0, 7.8), 0.1), PointSide::Back);
        assert_eq!(plane.classify_point(&Point3::new(0.0, 0.0, 8.05), 0.0), PointSide::Front);
    }

    #[test]
    fn box_sides() {
        let plane = Plane::new(Vector3::x(), 5.0);
        let mins = Point3::new(0.0, 0.0, 0.0);
        assert_eq!(plane.box_on_plane_side(&mins, &Point3::new(4.0, 1.0, 1.0)), SIDE_BACK);
        assert_eq!(plane.box_on_plane_side(&mins, &Point3::new(8.0, 1.0, 1.0)), SIDE_BOTH);

        let flipped = plane.flipped();
        assert_eq!(flipped.box_on_plane_side(&mins, &Point3::new(4.0, 1.0, 1.0)), SIDE_FRONT);

        let slanted = Plane::new(Vector3::new(1.0, 1.0, 0.0).normalize(), 100.0);
        assert_eq!(slanted.box_on_plane_side(&mins, &Point3::new(1.0, 1.0, 1.0)), SIDE_BACK);
    }

    #[test]
    fn snapping() {
        let mut n = Vector3::new(0.000_001, 0.999_999_9, 0.0);
        let mut d = 63.999;
        snap_plane(&mut n, &mut d);
        assert_eq!(n, Vector3::y());
        assert_eq!(d, 64.0);
    }
}
