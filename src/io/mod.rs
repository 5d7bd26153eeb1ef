//! Text diagnostics for the visualization tools
//!
//! All writers are read-only over the compiled [`crate::bsp::Tree`]; each has
//! a `to_*` function building the text and a `write_*` helper that puts it
//! on disk.

pub mod glview;
pub mod pointfile;
pub mod prt;

pub use glview::{to_glview, write_glview};
pub use pointfile::{to_pointfile, write_area_portal_pointfile, write_pointfile};
pub use prt::{to_prt, write_prt};

use crate::float_types::Real;

/// Failures while writing diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("std::io::Error: {0}")]
    StdIo(#[from] std::io::Error),

    /// A point file was requested for a level that did not leak.
    #[error("no leak path to write")]
    NoLeak,
}

/// Integral values are written without a fraction.
pub(crate) fn format_coord(value: Real) -> String {
    let rounded = value.round();
    if (value - rounded).abs() < 0.001 {
        format!("{}", rounded as i64)
    } else {
        format!("{value:.6}")
    }
}
