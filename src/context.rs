//! Compilation state and the end-to-end pipeline

use crate::brush::{BrushDef, BspBrush, MapBrush, MapBrushId, Side, load_brush};
use crate::bsp::{Tree, brush_bsp};
use crate::config::CompileConfig;
use crate::errors::{BrushError, CompileError};
use crate::flood::{fill_outside, flood_areas, flood_entities, mark_visible_sides};
use crate::float_types::Real;
use crate::geometry::PlaneTable;
use crate::portal::{make_tree_portals, verify_watertight};
use log::{info, warn};
use nalgebra::Point3;

/// Index of an entity in [`CompilationContext::entities`].
pub type EntityId = usize;

/// The parts of a placed entity the compiler cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub classname: String,
    /// Brush-only entities such as the world have no origin.
    pub origin: Option<Point3<Real>>,
}

impl Entity {
    pub fn new(classname: impl Into<String>, origin: Option<Point3<Real>>) -> Self {
        Entity {
            classname: classname.into(),
            origin,
        }
    }
}

/// Counters gathered over one compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    pub box_bevels: usize,
    pub edge_bevels: usize,
    pub dropped_brushes: usize,
    pub microbrushes: usize,
    pub visible_faces: usize,
    pub nonvisible_faces: usize,
    pub brush_splits: usize,
    pub nodes: usize,
    pub leaves: usize,
    pub detail_separators: usize,
    pub portals: usize,
    pub tiny_portals: usize,
    pub outside_filled: usize,
    pub areas: usize,
    pub area_portals: usize,
    pub visible_sides: usize,
    /// Nodes collapsed into a single solid leaf.
    pub pruned: usize,
    pub clusters: usize,
}

/// Everything a compile shares: settings, the plane table, the validated
/// brushes with their sides, and the entities.
#[derive(Debug, Clone)]
pub struct CompilationContext {
    pub config: CompileConfig,
    pub planes: PlaneTable,
    pub sides: Vec<Side>,
    pub brushes: Vec<MapBrush>,
    pub entities: Vec<Entity>,
    /// Brushes rejected during loading, with the reason.
    pub dropped_brushes: Vec<BrushError>,
    pub stats: CompileStats,
}

impl CompilationContext {
    pub fn new(config: CompileConfig) -> Self {
        CompilationContext {
            planes: PlaneTable::with_capacity(config.max_planes),
            config,
            sides: Vec::new(),
            brushes: Vec::new(),
            entities: Vec::new(),
            dropped_brushes: Vec::new(),
            stats: CompileStats::default(),
        }
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Validate and store a brush. `Ok(None)` means it was dropped.
    pub fn add_brush(&mut self, def: &BrushDef) -> Result<Option<MapBrushId>, CompileError> {
        load_brush(self, def)
    }

    /// Run the whole pipeline: tree, portals, leak flood, outside fill,
    /// areas, visible sides, pruning and clusters.
    ///
    /// A leak does not fail the compile; check [`Tree::leaked`] and
    /// [`Tree::leak`] on the result.
    ///
    /// Compiling again gives the same tree and counters; only the loading
    /// counters carry over.
    pub fn compile(&mut self) -> Result<Tree, CompileError> {
        self.stats = CompileStats {
            box_bevels: self.stats.box_bevels,
            edge_bevels: self.stats.edge_bevels,
            dropped_brushes: self.stats.dropped_brushes,
            ..CompileStats::default()
        };
        let brushes: Vec<BspBrush> = (0..self.brushes.len())
            .map(|id| BspBrush::from_map_brush(self, id))
            .collect();

        let mut tree = brush_bsp(&mut self.planes, &self.config, &mut self.stats, brushes)?;
        make_tree_portals(&mut tree, &self.planes, &self.config, &mut self.stats)?;
        if self.config.check_watertight {
            verify_watertight(&tree, &self.brushes, &self.config)?;
        }

        if flood_entities(&mut tree, &self.planes, &self.entities) {
            warn!("**** leaked ****");
        } else {
            fill_outside(&mut tree, &mut self.stats);
        }
        flood_areas(&mut tree, &self.brushes, &mut self.stats);
        mark_visible_sides(
            &mut tree,
            &self.planes,
            &self.brushes,
            &mut self.sides,
            &mut self.stats,
        );
        self.stats.pruned = tree.prune_nodes()?;
        self.stats.nodes = tree.internal_count();
        self.stats.leaves = tree.leaves().len();
        info!("{} nodes, {} leaves after pruning", self.stats.nodes, self.stats.leaves);
        self.stats.clusters = tree.number_clusters() as usize;

        info!("{} planes", self.planes.len());
        Ok(tree)
    }
}
