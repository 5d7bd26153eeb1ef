//! Convex polygons ("windings") lying in a plane
//!
//! Points are stored in boundary order, clockwise when seen from the front of
//! the plane the winding was built for.

use crate::float_types::{EDGE_LENGTH, MAX_WORLD_COORD, MIN_POINT_SEPARATION, Real};
use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::geometry::plane::{Plane, PointSide};
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct Winding {
    pub points: Vec<Point3<Real>>,
}

impl Winding {
    /// Wrap a list of points, merging consecutive duplicates.
    ///
    /// Returns `None` when fewer than three distinct points remain.
    pub fn new(points: Vec<Point3<Real>>) -> Option<Self> {
        let mut cleaned: Vec<Point3<Real>> = Vec::with_capacity(points.len());
        for p in points {
            if cleaned
                .last()
                .is_some_and(|last| (p - last).norm() < MIN_POINT_SEPARATION)
            {
                continue;
            }
            cleaned.push(p);
        }
        while cleaned.len() > 1 {
            let first = cleaned[0];
            match cleaned.last() {
                Some(last) if (first - last).norm() < MIN_POINT_SEPARATION => {
                    cleaned.pop();
                },
                _ => break,
            }
        }

        if cleaned.len() < 3 {
            None
        } else {
            Some(Winding { points: cleaned })
        }
    }

    /// A huge quad lying in the plane, large enough to cover the whole world.
    pub fn base_for_plane(normal: &Vector3<Real>, dist: Real) -> Self {
        // major axis of the normal
        let mut axis = 0;
        let mut max = -1.0;
        for i in 0..3 {
            let v = normal[i].abs();
            if v > max {
                axis = i;
                max = v;
            }
        }

        let mut up = if axis == 2 { Vector3::x() } else { Vector3::z() };
        up -= normal * up.dot(normal);
        up.normalize_mut();

        let origin = Point3::from(normal * dist);
        let right = up.cross(normal) * MAX_WORLD_COORD;
        let up = up * MAX_WORLD_COORD;

        Winding {
            points: vec![
                origin - right + up,
                origin + right + up,
                origin + right - up,
                origin - right - up,
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Classify every point and gather the signed distances.
    fn classify(&self, plane: &Plane, epsilon: Real) -> (Vec<Real>, Vec<PointSide>, [usize; 3]) {
        let mut dists = Vec::with_capacity(self.points.len());
        let mut sides = Vec::with_capacity(self.points.len());
        let mut counts = [0usize; 3];
        for p in &self.points {
            let side = plane.classify_point(p, epsilon);
            counts[side_index(side)] += 1;
            dists.push(plane.distance(p));
            sides.push(side);
        }
        (dists, sides, counts)
    }

    /// Split the winding by `plane`.
    ///
    /// Points within `epsilon` of the plane count as on it and go to both
    /// pieces. A winding lying entirely on the plane is returned as the back
    /// piece.
    pub fn split(&self, plane: &Plane, epsilon: Real) -> (Option<Winding>, Option<Winding>) {
        let (dists, sides, counts) = self.classify(plane, epsilon);

        if counts[side_index(PointSide::Front)] == 0 {
            return (None, Some(self.clone()));
        }
        if counts[side_index(PointSide::Back)] == 0 {
            return (Some(self.clone()), None);
        }

        let n = self.points.len();
        let mut front = Vec::with_capacity(n + 4);
        let mut back = Vec::with_capacity(n + 4);

        for i in 0..n {
            let p1 = self.points[i];
            match sides[i] {
                PointSide::On => {
                    front.push(p1);
                    back.push(p1);
                    continue;
                },
                PointSide::Front => front.push(p1),
                PointSide::Back => back.push(p1),
            }

            let j = (i + 1) % n;
            if sides[j] == PointSide::On || sides[j] == sides[i] {
                continue;
            }

            let mid = split_point(&p1, &self.points[j], dists[i], dists[j], plane);
            front.push(mid);
            back.push(mid);
        }

        (Winding::new(front), Winding::new(back))
    }

    /// Keep only the part in front of `plane`.
    ///
    /// Unlike [`Winding::split`], a winding entirely on the plane is discarded.
    pub fn chop(&self, plane: &Plane, epsilon: Real) -> Option<Winding> {
        let (_, _, counts) = self.classify(plane, epsilon);
        if counts[side_index(PointSide::Front)] == 0 {
            return None;
        }
        if counts[side_index(PointSide::Back)] == 0 {
            return Some(self.clone());
        }
        self.split(plane, epsilon).0
    }

    pub fn area(&self) -> Real {
        let p0 = self.points[0];
        self.points
            .windows(2)
            .skip(1)
            .map(|w| (w[0] - p0).cross(&(w[1] - p0)).norm() * 0.5)
            .sum()
    }

    /// Area-weighted normal; its length is the area, its direction the
    /// winding's front.
    pub fn area_vector(&self) -> Vector3<Real> {
        let p0 = self.points[0];
        self.points
            .windows(2)
            .skip(1)
            .map(|w| (w[1] - p0).cross(&(w[0] - p0)) * 0.5)
            .sum()
    }

    /// Plane the winding lies in, or `None` when it is degenerate.
    pub fn plane(&self) -> Option<Plane> {
        let normal = self.area_vector();
        let len = normal.norm();
        if len <= Real::EPSILON {
            return None;
        }
        let normal = normal / len;
        Some(Plane::new(normal, self.points[0].coords.dot(&normal)))
    }

    pub fn center(&self) -> Point3<Real> {
        let sum = self
            .points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.points.len() as Real)
    }

    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::new_invalid();
        for p in &self.points {
            aabb.take_point(*p);
        }
        aabb
    }

    /// Fewer than three edges longer than [`EDGE_LENGTH`].
    pub fn is_tiny(&self) -> bool {
        let n = self.points.len();
        let mut edges = 0;
        for i in 0..n {
            let j = (i + 1) % n;
            if (self.points[j] - self.points[i]).norm() > EDGE_LENGTH {
                edges += 1;
                if edges == 3 {
                    return false;
                }
            }
        }
        true
    }

    /// Any point beyond `limit` on some axis.
    pub fn is_huge(&self, limit: Real) -> bool {
        self.points
            .iter()
            .any(|p| p.coords.iter().any(|c| c.abs() > limit))
    }

    pub fn reversed(&self) -> Winding {
        let mut points = self.points.clone();
        points.reverse();
        Winding { points }
    }
}

#[inline]
const fn side_index(side: PointSide) -> usize {
    match side {
        PointSide::Front => 0,
        PointSide::Back => 1,
        PointSide::On => 2,
    }
}

/// Intersection of the edge `p1 -> p2` with `plane`, exact on axial planes.
fn split_point(
    p1: &Point3<Real>,
    p2: &Point3<Real>,
    d1: Real,
    d2: Real,
    plane: &Plane,
) -> Point3<Real> {
    let t = d1 / (d1 - d2);
    let mut mid = Point3::origin();
    for k in 0..3 {
        mid[k] = if plane.normal[k] == 1.0 {
            plane.dist
        } else if plane.normal[k] == -1.0 {
            -plane.dist
        } else {
            p1[k] + t * (p2[k] - p1[k])
        };
    }
    mid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: Real) -> Winding {
        Winding::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, size, 0.0),
            Point3::new(size, size, 0.0),
            Point3::new(size, 0.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn base_winding_lies_in_plane() {
        let normal = Vector3::new(1.0, 2.0, 3.0).normalize();
        let w = Winding::base_for_plane(&normal, 17.0);
        let plane = Plane::new(normal, 17.0);
        for p in &w.points {
            assert!(plane.distance(p).abs() < 1e-6);
        }
        let computed = w.plane().unwrap();
        assert!(computed.normal.dot(&normal) > 0.999);
    }

    #[test]
    fn split_conserves_area() {
        let w = square(4.0);
        let plane = Plane::new(Vector3::x(), 1.0);
        let (front, back) = w.split(&plane, 0.1);
        let (front, back) = (front.unwrap(), back.unwrap());
        assert!((front.area() - 12.0).abs() < 1e-9);
        assert!((back.area() - 4.0).abs() < 1e-9);
        assert!(front.points.iter().all(|p| p.x >= 1.0));
    }

    #[test]
    fn points_within_epsilon_go_to_both_pieces() {
        // the corner at x = 1.05 counts as on the cut
        let w = Winding::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(1.05, 4.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ])
        .unwrap();
        let plane = Plane::new(Vector3::x(), 1.0);
        let (front, back) = w.split(&plane, 0.1);
        let (front, back) = (front.unwrap(), back.unwrap());
        let shared = Point3::new(1.05, 4.0, 0.0);
        assert!(front.points.contains(&shared));
        assert!(back.points.contains(&shared));
    }

    #[test]
    fn chop_drops_on_plane_winding() {
        let w = square(4.0);
        let plane = Plane::new(Vector3::z(), 0.0);
        assert!(w.chop(&plane, 0.1).is_none());
        let (front, back) = w.split(&plane, 0.1);
        assert!(front.is_none());
        assert!(back.is_some());
    }

    #[test]
    fn tiny_and_degenerate() {
        assert!(square(0.1).is_tiny());
        assert!(!square(1.0).is_tiny());
        let dup = Winding::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ]);
        assert!(dup.is_none());
    }
}
