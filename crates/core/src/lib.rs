//! # rasterfuse core
//!
//! Core types, traits and I/O shared by the rasterfuse crates.
//!
//! This crate provides:
//! - `Raster<T>`: single-band georeferenced grid
//! - `MultiBandRaster`: named bands over one shared grid
//! - `GeoTransform` / `Extent`: georeferencing and bounding boxes
//! - `CRS`: Coordinate Reference System handling
//! - The `Algorithm` trait for a consistent algorithm API
//! - Native GeoTIFF I/O

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{Extent, GeoTransform, MultiBandRaster, Raster, RasterElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{Extent, GeoTransform, MultiBandRaster, Raster, RasterElement};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in rasterfuse.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
