//! Compile-wide settings: capacities, tolerances and split heuristic weights

use crate::bsp::traits::BalancedSplittingStrategy;
use crate::float_types::{Real, tolerance};

/// Settings for one compile.
///
/// ```
/// use brushbsp::config::CompileConfig;
/// let config = CompileConfig::default().with_max_planes(1024).with_microvolume(0.5);
/// assert_eq!(config.max_planes, 1024);
/// ```
#[derive(Debug, Clone)]
pub struct CompileConfig {
    pub max_planes: usize,
    pub max_brushes: usize,
    pub max_brush_sides: usize,
    pub max_sides_per_brush: usize,
    pub max_nodes: usize,
    /// Recursion guard for tree construction.
    pub max_depth: usize,
    /// Brushes reaching past this coordinate are dropped.
    pub max_world_coord: Real,
    /// Fragments with less volume are discarded while splitting.
    pub microvolume: Real,
    /// Point-on-plane tolerance for portal clipping.
    pub on_epsilon: Real,
    /// Largest allowed closure residual (in square units) of a leaf's portals.
    pub watertight_tolerance: Real,
    /// Abort the compile when a leaf's portals do not close.
    pub check_watertight: bool,
    pub split: BalancedSplittingStrategy,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_planes: 65536,
            max_brushes: 8192,
            max_brush_sides: 65536,
            max_sides_per_brush: 128,
            max_nodes: 65536,
            max_depth: 2048,
            max_world_coord: 16384.0,
            microvolume: 1.0,
            on_epsilon: tolerance(),
            watertight_tolerance: 1.0,
            check_watertight: true,
            split: BalancedSplittingStrategy::default(),
        }
    }
}

impl CompileConfig {
    pub fn with_max_planes(mut self, max_planes: usize) -> Self {
        self.max_planes = max_planes;
        self
    }

    pub fn with_max_brushes(mut self, max_brushes: usize) -> Self {
        self.max_brushes = max_brushes;
        self
    }

    pub fn with_max_brush_sides(mut self, max_brush_sides: usize) -> Self {
        self.max_brush_sides = max_brush_sides;
        self
    }

    pub fn with_max_sides_per_brush(mut self, max_sides_per_brush: usize) -> Self {
        self.max_sides_per_brush = max_sides_per_brush;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_microvolume(mut self, microvolume: Real) -> Self {
        self.microvolume = microvolume;
        self
    }

    pub fn with_watertight_check(mut self, enabled: bool) -> Self {
        self.check_watertight = enabled;
        self
    }

    pub fn with_split_strategy(mut self, split: BalancedSplittingStrategy) -> Self {
        self.split = split;
        self
    }
}
