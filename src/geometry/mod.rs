//! Geometry kernel: planes, the plane table and winding clipping

pub mod plane;
pub mod plane_table;
pub mod winding;

pub use plane::{Plane, PlaneType, PointSide};
pub use plane_table::{PlaneNum, PlaneTable, opposite, pair_base};
pub use winding::Winding;
