//! # rasterfuse fusion
//!
//! Principal component fusion of two co-registered multi-band rasters,
//! typically an optical and a radar scene over the same area.
//!
//! The pipeline runs in a fixed order:
//! - **validate**: both inputs are usable rasters over the same extent and grid
//! - **stack**: bands of `x` then `y` in one raster
//! - **matrix**: pixels x bands table, with optional removal of incomplete pixels
//! - **pca**: centering/scaling, eigendecomposition and band statistics
//! - **reconstruct**: component scores back on the grid, NaN elsewhere
//!
//! ```ignore
//! use rasterfuse_fusion::{fuse, FusionParams};
//!
//! let result = fuse(&optical, &radar, FusionParams { drop_incomplete: true, ..Default::default() })?;
//! println!("PC1 explains {:.1}%", result.proportion[0] * 100.0);
//! ```

mod maybe_rayon;
pub mod matrix;
pub mod pca;
mod pipeline;
pub mod progress;
pub mod reconstruct;
pub mod result;
pub mod stack;
pub mod validate;

pub use pipeline::{fuse, fuse_with_progress, FusionParams, PcaFusion};
pub use matrix::{build_feature_matrix, FeatureMatrix};
pub use pca::{decompose, ComponentStatistics, PcaDecomposition};
pub use progress::{Progress, Silent, TracingProgress};
pub use reconstruct::reconstruct_components;
pub use result::{FusionResult, FusionSummary};
pub use stack::stack_bands;
pub use validate::check_compatibility;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{fuse, fuse_with_progress, FusionParams, FusionResult, PcaFusion, Progress};
    pub use rasterfuse_core::prelude::*;
}
