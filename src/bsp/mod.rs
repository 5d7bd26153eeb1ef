//! Binary space partitioning of brushes

pub mod builder;
pub mod node;
pub mod traits;
pub mod tree;

pub use builder::brush_bsp;
pub use node::{Internal, Leaf, Node, NodeFace, NodeId, NodeKind};
pub use traits::{BalancedSplittingStrategy, CandidateMetrics, SplittingStrategy};
pub use tree::Tree;
