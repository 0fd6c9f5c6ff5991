//! Raster data structures

mod element;
mod extent;
mod geotransform;
mod grid;
mod multiband;

pub use element::RasterElement;
pub use extent::Extent;
pub use geotransform::GeoTransform;
pub use grid::Raster;
pub use multiband::MultiBandRaster;
