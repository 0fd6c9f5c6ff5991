//! The fusion pipeline: validate, stack, flatten, decompose, reconstruct

use crate::matrix::build_feature_matrix;
use crate::pca::decompose;
use crate::progress::{Progress, Silent, TracingProgress};
use crate::reconstruct::reconstruct_components;
use crate::result::FusionResult;
use crate::stack::stack_bands;
use crate::validate::check_compatibility;
use rasterfuse_core::{Algorithm, Error, MultiBandRaster, Result};
use serde::{Deserialize, Serialize};

/// Parameters for [`fuse`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionParams {
    /// Scale every band to unit variance before decomposition (default: true)
    pub standardize: bool,
    /// Leave out pixels missing any band (default: false)
    pub drop_incomplete: bool,
    /// Report checkpoints through `tracing` when calling [`fuse`] (default: false)
    pub verbose: bool,
}

impl Default for FusionParams {
    fn default() -> Self {
        Self {
            standardize: true,
            drop_incomplete: false,
            verbose: false,
        }
    }
}

/// Fuse two co-registered rasters into principal components.
///
/// Progress goes to `tracing` when `params.verbose` is set and nowhere
/// otherwise; use [`fuse_with_progress`] to supply a different sink.
///
/// # Errors
/// - `UnsupportedType` if either input is not a usable georeferenced raster
/// - `ExtentMismatch` if the inputs differ in extent, grid or CRS
/// - `MissingData` if missing pixels remain and `drop_incomplete` is off
/// - `DegenerateInput` if the valid pixels cannot support a decomposition
pub fn fuse(x: &MultiBandRaster, y: &MultiBandRaster, params: FusionParams) -> Result<FusionResult> {
    if params.verbose {
        fuse_with_progress(x, y, params, &TracingProgress)
    } else {
        fuse_with_progress(x, y, params, &Silent)
    }
}

/// [`fuse`] with an explicit progress sink; `params.verbose` is ignored.
pub fn fuse_with_progress(
    x: &MultiBandRaster,
    y: &MultiBandRaster,
    params: FusionParams,
    progress: &dyn Progress,
) -> Result<FusionResult> {
    progress.emit("Verifying raster extents");
    check_compatibility(x, y)?;

    let stack = stack_bands(x, y)?;
    let matrix = build_feature_matrix(&stack, params.drop_incomplete)?;

    progress.emit(if params.standardize {
        "Standardizing bands"
    } else {
        "Centering bands"
    });
    let pca = decompose(matrix.data(), params.standardize)?;

    progress.emit("Computing component statistics");
    let statistics = pca.statistics();

    let components = reconstruct_components(&stack, pca.scores.view(), matrix.row_index())?;

    Ok(FusionResult::assemble(
        components,
        statistics,
        matrix.band_names().to_vec(),
        matrix.n_rows(),
    ))
}

/// [`Algorithm`] wrapper around [`fuse`]
#[derive(Debug, Clone, Copy, Default)]
pub struct PcaFusion;

impl Algorithm for PcaFusion {
    type Input = (MultiBandRaster, MultiBandRaster);
    type Output = FusionResult;
    type Params = FusionParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "PcaFusion"
    }

    fn description(&self) -> &'static str {
        "Principal component fusion of two co-registered multi-band rasters"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (x, y) = input;
        fuse(&x, &y, params)
    }
}
