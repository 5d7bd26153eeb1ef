//! Deduplicated plane storage
//!
//! Every plane is stored together with its opposite: entries `2k` and `2k + 1`
//! face away from each other, so `num ^ 1` flips a plane in O(1). Axial
//! planes always put the positive-facing entry first.

use crate::errors::CompileError;
use crate::float_types::Real;
use crate::geometry::plane::{Plane, snap_plane};
use hashbrown::HashMap;
use nalgebra::Vector3;

/// Index of a plane in a [`PlaneTable`].
pub type PlaneNum = usize;

/// The plane facing the other way.
#[inline]
pub const fn opposite(num: PlaneNum) -> PlaneNum {
    num ^ 1
}

/// The first entry of the pair, used for node splits.
#[inline]
pub const fn pair_base(num: PlaneNum) -> PlaneNum {
    num & !1
}

#[derive(Debug, Clone)]
pub struct PlaneTable {
    planes: Vec<Plane>,
    buckets: HashMap<i64, Vec<PlaneNum>>,
    capacity: usize,
}

impl PlaneTable {
    pub fn with_capacity(capacity: usize) -> Self {
        PlaneTable {
            planes: Vec::new(),
            buckets: HashMap::new(),
            capacity,
        }
    }

    #[inline]
    pub fn get(&self, num: PlaneNum) -> &Plane {
        &self.planes[num]
    }

    pub fn len(&self) -> usize {
        self.planes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.planes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plane> {
        self.planes.iter()
    }

    #[inline]
    fn bucket_key(dist: Real) -> i64 {
        dist.abs().floor() as i64
    }

    /// Look up a plane within tolerance without inserting it.
    pub fn find(&self, normal: &Vector3<Real>, dist: Real) -> Option<PlaneNum> {
        let mut normal = *normal;
        let mut dist = dist;
        snap_plane(&mut normal, &mut dist);

        let key = Self::bucket_key(dist);
        // neighbouring buckets too, a tolerance can straddle a boundary
        (key - 1..=key + 1)
            .filter_map(|k| self.buckets.get(&k))
            .flat_map(|bucket| bucket.iter().copied())
            .find(|&num| self.planes[num].matches(&normal, dist))
    }

    /// Return the index of a matching plane, creating the pair if needed.
    ///
    /// Fails fatally once the table is full.
    pub fn intern(&mut self, normal: &Vector3<Real>, dist: Real) -> Result<PlaneNum, CompileError> {
        if let Some(num) = self.find(normal, dist) {
            return Ok(num);
        }

        let mut normal = *normal;
        let mut dist = dist;
        snap_plane(&mut normal, &mut dist);
        self.create(normal, dist)
    }

    fn create(&mut self, normal: Vector3<Real>, dist: Real) -> Result<PlaneNum, CompileError> {
        if self.planes.len() + 2 > self.capacity {
            return Err(CompileError::PlaneTableFull {
                capacity: self.capacity,
            });
        }

        let plane = Plane::new(normal, dist);
        let flipped = plane.flipped();
        let base = self.planes.len();

        // axial planes face positive first
        let negative_axial =
            plane.kind.is_axial() && (normal.x < 0.0 || normal.y < 0.0 || normal.z < 0.0);
        let requested = if negative_axial {
            self.planes.push(flipped);
            self.planes.push(plane);
            base + 1
        } else {
            self.planes.push(plane);
            self.planes.push(flipped);
            base
        };

        for num in [base, base + 1] {
            let key = Self::bucket_key(self.planes[num].dist);
            self.buckets.entry(key).or_default().push(num);
        }

        Ok(requested)
    }
}
