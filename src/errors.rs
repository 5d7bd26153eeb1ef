//! Compile errors

use crate::float_types::Real;
use nalgebra::Vector3;

/// Fatal conditions that abort the whole compile.
///
/// Any of these means the compiled output would be structurally unsound, so
/// the pipeline stops at the first one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// The deduplicated plane table ran out of slots
    #[error("plane table exhausted ({capacity} planes)")]
    PlaneTableFull { capacity: usize },

    /// A plane normal too short to normalize reached the plane table
    #[error("bad plane normal {normal} (brush {brush}, entity {entity})")]
    BadPlaneNormal {
        normal: Vector3<Real>,
        brush: i32,
        entity: usize,
    },

    /// Brush array capacity exceeded
    #[error("too many brushes ({capacity}) at brush {brush}, entity {entity}")]
    TooManyBrushes {
        capacity: usize,
        brush: i32,
        entity: usize,
    },

    /// Brush side array capacity exceeded
    #[error("too many brush sides ({capacity}) at brush {brush}, entity {entity}")]
    TooManyBrushSides {
        capacity: usize,
        brush: i32,
        entity: usize,
    },

    /// Node arena capacity exceeded
    #[error("too many tree nodes ({capacity})")]
    TooManyNodes { capacity: usize },

    /// Tree construction recursed deeper than the configured guard
    #[error("tree depth limit {limit} exceeded")]
    DepthLimit { limit: usize },

    /// A portal was found on a node list it does not bound
    #[error("portal {portal} is mislinked on node {node}")]
    MislinkedPortal { portal: usize, node: usize },

    /// The portals of a leaf do not close its volume
    #[error("portals of leaf {leaf} leave a gap (residual {residual:.4}, brush {brush:?})")]
    PortalGap {
        leaf: usize,
        residual: Real,
        brush: Option<i32>,
    },

    /// An ancestor node already splits on this plane
    #[error("brush {brush} (entity {entity}): plane {plane} was already used by a parent node")]
    ParentPlaneReused {
        plane: usize,
        brush: i32,
        entity: usize,
    },
}

/// Recoverable problems with a single authoring brush.
///
/// The brush is dropped and the compile continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrushError {
    /// Fewer than four sides produced a valid winding
    #[error("brush {brush} (entity {entity}) has only {sides} valid sides")]
    TooFewSides {
        brush: i32,
        entity: usize,
        sides: usize,
    },

    /// Two sides face each other on the same plane
    #[error("brush {brush} (entity {entity}) has a mirrored plane")]
    MirroredPlane { brush: i32, entity: usize },

    /// The windings produced an empty or inverted bounding box
    #[error("brush {brush} (entity {entity}) has inverted bounds")]
    InvertedBounds { brush: i32, entity: usize },

    /// The brush reaches past the world limits
    #[error("brush {brush} (entity {entity}) lies outside the world bounds")]
    OutOfRange { brush: i32, entity: usize },
}
