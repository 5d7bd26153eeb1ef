//! Compiles convex brushes into a BSP tree and derives the leaf connectivity
//! that later visibility and lighting stages need.
//!
//! The pipeline runs strictly downward:
//!
//! 1. [`brush`]: authoring brushes are validated, windowed and beveled.
//! 2. [`bsp`]: brushes are recursively split into a tree of convex leaves.
//! 3. [`portal`]: every pair of touching leaves gets a portal.
//! 4. [`flood`]: occupancy flood for leaks, outside fill, areas and visible
//!    sides.
//!
//! [`context::CompilationContext`] owns the shared state and runs the whole
//! thing:
//!
//! ```
//! use brushbsp::brush::BrushDef;
//! use brushbsp::config::CompileConfig;
//! use brushbsp::contents::Contents;
//! use brushbsp::context::{CompilationContext, Entity};
//! use nalgebra::Point3;
//!
//! let mut ctx = CompilationContext::new(CompileConfig::default());
//! ctx.add_entity(Entity::new("worldspawn", None));
//! let cube = BrushDef::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(64.0, 64.0, 64.0), Contents::SOLID);
//! ctx.add_brush(&cube).unwrap();
//! let tree = ctx.compile().unwrap();
//! // nothing placed in open space
//! assert!(tree.leaked);
//! ```

#![forbid(unsafe_code)]
#![deny(unused)]
#![warn(clippy::missing_const_for_fn, clippy::approx_constant, clippy::all)]

pub mod brush;
pub mod bsp;
pub mod config;
pub mod contents;
pub mod context;
pub mod errors;
pub mod float_types;
pub mod flood;
pub mod geometry;
pub mod io;
pub mod portal;

pub use config::CompileConfig;
pub use context::CompilationContext;
pub use errors::{BrushError, CompileError};
