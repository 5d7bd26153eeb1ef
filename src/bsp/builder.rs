//! Recursive tree construction from working brushes

use crate::brush::{BspBrush, SideId, split_brush};
use crate::bsp::node::{Internal, NodeFace, Node, NodeId, NodeKind};
use crate::bsp::traits::{CandidateMetrics, SplittingStrategy};
use crate::bsp::tree::Tree;
use crate::config::CompileConfig;
use crate::contents::{Contents, SurfaceFlags};
use crate::context::CompileStats;
use crate::errors::CompileError;
use crate::float_types::SIDESPACE;
use crate::float_types::parry3d::bounding_volume::{Aabb, BoundingVolume};
use crate::geometry::plane::{SIDE_BACK, SIDE_BOTH, SIDE_FACING, SIDE_FRONT};
use crate::geometry::{PlaneNum, PlaneTable, pair_base};
use log::{debug, info, trace, warn};
use nalgebra::{Point3, Vector3};

/// Score a candidate must beat to be used at all.
const MIN_SPLIT_SCORE: i64 = -99_999;

struct Selection {
    plane: PlaneNum,
    side: Option<SideId>,
    detail_separator: bool,
}

struct TreeBuilder<'a> {
    planes: &'a PlaneTable,
    config: &'a CompileConfig,
    stats: &'a mut CompileStats,
    tree: Tree,
}

/// Build a tree from `brushes`.
///
/// Brushes are partitioned until no usable split side remains in a node;
/// what is left becomes a leaf.
pub fn brush_bsp(
    planes: &mut PlaneTable,
    config: &CompileConfig,
    stats: &mut CompileStats,
    brushes: Vec<BspBrush>,
) -> Result<Tree, CompileError> {
    let mut bounds = Aabb::new_invalid();
    for brush in &brushes {
        bounds.merge(&brush.bounds);

        for side in &brush.sides {
            if side.bevel || side.winding.is_none() {
                continue;
            }
            if side.visible {
                stats.visible_faces += 1;
            } else {
                stats.nonvisible_faces += 1;
            }
        }

        let volume = brush.volume(planes);
        if volume < config.microvolume {
            warn!(
                "microbrush: brush {} has volume {volume:.3}",
                brush.original.map_or(-1, |b| b as i64)
            );
            stats.microbrushes += 1;
        }
    }
    if brushes.is_empty() {
        bounds = Aabb::new(Point3::origin(), Point3::origin());
    }

    info!("{} brushes", brushes.len());
    info!("{} visible faces", stats.visible_faces);
    info!("{} nonvisible faces", stats.nonvisible_faces);

    let pad = Vector3::repeat(SIDESPACE);
    let volume = BspBrush::from_bounds(planes, &(bounds.mins - pad), &(bounds.maxs + pad))?;

    let mut builder = TreeBuilder {
        planes,
        config,
        stats,
        tree: Tree::empty(bounds),
    };
    let head = builder.tree.head;
    builder.build_r(head, brushes, volume, 0)?;

    let leaves = builder.tree.leaves().len();
    let internal = builder.tree.internal_count();
    builder.stats.nodes = internal;
    builder.stats.leaves = leaves;
    info!("{internal} nodes, {leaves} leaves");
    info!("{} brush splits", builder.stats.brush_splits);

    Ok(builder.tree)
}

impl TreeBuilder<'_> {
    fn build_r(
        &mut self,
        node: NodeId,
        mut brushes: Vec<BspBrush>,
        volume: BspBrush,
        depth: usize,
    ) -> Result<(), CompileError> {
        if depth > self.config.max_depth {
            return Err(CompileError::DepthLimit {
                limit: self.config.max_depth,
            });
        }
        self.tree.nodes[node].bounds = volume.bounds;

        let Some(selection) = self.select_split_side(&mut brushes, node, &volume)? else {
            self.leaf_node(node, brushes);
            return Ok(());
        };

        if self.tree.nodes.len() + 2 > self.config.max_nodes {
            return Err(CompileError::TooManyNodes {
                capacity: self.config.max_nodes,
            });
        }

        let plane = selection.plane;
        trace!("node {node}: split on plane {plane} at depth {depth}");
        let (lists, faces) = self.split_brush_list(brushes, plane);

        let (front_volume, back_volume) =
            split_brush(self.planes, &volume, plane, self.config.microvolume);
        let (front_volume, back_volume) = match (front_volume, back_volume) {
            (Some(f), Some(b)) => (f, b),
            (f, b) => {
                warn!("node {node}: split plane {plane} left a side without volume");
                (f.unwrap_or_else(|| volume.clone()), b.unwrap_or(volume))
            },
        };

        let children = [self.tree.nodes.len(), self.tree.nodes.len() + 1];
        for _ in children {
            self.tree.nodes.push(Node::leaf(Some(node), Aabb::new_invalid()));
        }
        self.tree.nodes[node].kind = NodeKind::Internal(Internal {
            plane,
            children,
            split_side: selection.side,
            detail_separator: selection.detail_separator,
            faces,
        });
        if selection.detail_separator {
            self.stats.detail_separators += 1;
        }

        let [front, back] = lists;
        self.build_r(children[0], front, front_volume, depth + 1)?;
        self.build_r(children[1], back, back_volume, depth + 1)
    }

    /// Pick the best split among the sides of `brushes`.
    ///
    /// Visible structural sides are tried first, then visible detail, then
    /// invisible structural and invisible detail. A node split in any pass
    /// but the first is a detail separator.
    fn select_split_side(
        &self,
        brushes: &mut [BspBrush],
        node: NodeId,
        volume: &BspBrush,
    ) -> Result<Option<Selection>, CompileError> {
        let strategy = &self.config.split;
        let mut best: Option<Selection> = None;
        let mut best_value = MIN_SPLIT_SCORE;

        for pass in 0..4 {
            let want_detail = pass & 1 != 0;
            let want_visible = pass < 2;

            for bi in 0..brushes.len() {
                if brushes[bi].contents.contains(Contents::DETAIL) != want_detail {
                    continue;
                }
                for si in 0..brushes[bi].sides.len() {
                    let side = &brushes[bi].sides[si];
                    if side.bevel
                        || side.winding.is_none()
                        || side.on_node
                        || side.tested
                        || side.surface.contains(SurfaceFlags::SKIP)
                        || side.visible != want_visible
                    {
                        continue;
                    }
                    let is_hint = side.surface.contains(SurfaceFlags::HINT);
                    let original = side.original;
                    let pnum = pair_base(side.plane);

                    if !self.check_plane_against_volume(pnum, volume) {
                        continue;
                    }
                    self.check_plane_against_parents(pnum, node, &brushes[bi])?;

                    let mut metrics = CandidateMetrics {
                        axial: self.planes.get(pnum).kind.is_axial(),
                        ..Default::default()
                    };
                    for other in brushes.iter_mut() {
                        let test = other.test_to_plane(self.planes, pnum);
                        if test.sides & SIDE_FACING != 0 {
                            metrics.facing += 1;
                            for s in &mut other.sides {
                                if pair_base(s.plane) == pnum {
                                    s.tested = true;
                                }
                            }
                        }
                        if test.sides & SIDE_FRONT != 0 {
                            metrics.front += 1;
                        }
                        if test.sides & SIDE_BACK != 0 {
                            metrics.back += 1;
                        }
                        metrics.splits += test.splits;
                        if test.epsilon_brush {
                            metrics.epsilon_brushes += 1;
                        }
                        if test.hint_split && !is_hint {
                            metrics.hint_split = true;
                        }
                    }

                    let value = strategy.score(&metrics);
                    if value > best_value {
                        best_value = value;
                        best = Some(Selection {
                            plane: pnum,
                            side: original,
                            detail_separator: false,
                        });
                    }
                }
            }

            if let Some(selection) = best.as_mut() {
                selection.detail_separator = pass > 0;
                break;
            }
        }

        for brush in brushes.iter_mut() {
            for side in &mut brush.sides {
                side.tested = false;
            }
        }

        if let Some(selection) = &best {
            debug!(
                "node {node}: plane {} scored {best_value}{}",
                selection.plane,
                if selection.detail_separator { " (detail)" } else { "" }
            );
        }
        Ok(best)
    }

    /// The plane cuts the node volume into two non-empty pieces.
    fn check_plane_against_volume(&self, pnum: PlaneNum, volume: &BspBrush) -> bool {
        matches!(
            split_brush(self.planes, volume, pnum, self.config.microvolume),
            (Some(_), Some(_))
        )
    }

    fn check_plane_against_parents(
        &self,
        pnum: PlaneNum,
        node: NodeId,
        brush: &BspBrush,
    ) -> Result<(), CompileError> {
        let mut current = self.tree.nodes[node].parent;
        while let Some(parent) = current {
            if let Some(internal) = self.tree.nodes[parent].as_internal()
                && internal.plane == pnum
            {
                return Err(CompileError::ParentPlaneReused {
                    plane: pnum,
                    brush: brush.editor_id,
                    entity: brush.entity,
                });
            }
            current = self.tree.nodes[parent].parent;
        }
        Ok(())
    }

    /// Distribute brushes to the two children, splitting those that straddle
    /// the plane. Sides lying on the plane are marked as used and become
    /// the node's faces.
    fn split_brush_list(
        &mut self,
        brushes: Vec<BspBrush>,
        plane: PlaneNum,
    ) -> ([Vec<BspBrush>; 2], Vec<NodeFace>) {
        let mut lists: [Vec<BspBrush>; 2] = [Vec::new(), Vec::new()];
        let mut faces = Vec::new();

        for mut brush in brushes {
            let sides = brush.test_to_plane(self.planes, plane).sides;

            if sides & !SIDE_FACING == SIDE_BOTH {
                let (front, back) = split_brush(self.planes, &brush, plane, self.config.microvolume);
                if front.is_some() && back.is_some() {
                    self.stats.brush_splits += 1;
                }
                if let Some(front) = front {
                    lists[0].push(front);
                }
                if let Some(back) = back {
                    lists[1].push(back);
                }
                continue;
            }

            if sides & SIDE_FACING != 0 {
                for side in &mut brush.sides {
                    if pair_base(side.plane) != plane || side.on_node {
                        continue;
                    }
                    side.on_node = true;
                    if side.bevel {
                        continue;
                    }
                    if let Some(winding) = &side.winding {
                        faces.push(NodeFace {
                            plane: side.plane,
                            winding: winding.clone(),
                            original: side.original,
                        });
                    }
                }
            }

            if sides & SIDE_FRONT != 0 {
                lists[0].push(brush);
            } else if sides & SIDE_BACK != 0 {
                lists[1].push(brush);
            }
        }

        (lists, faces)
    }

    fn leaf_node(&mut self, node: NodeId, brushes: Vec<BspBrush>) {
        let contents = brushes
            .iter()
            .fold(Contents::empty(), |acc, b| acc | b.contents)
            .resolve_leaf();
        trace!("node {node}: leaf with {} brushes, {contents:?}", brushes.len());
        if let Some(leaf) = self.tree.leaf_mut(node) {
            leaf.contents = contents;
            leaf.brushes = brushes;
        }
    }
}
