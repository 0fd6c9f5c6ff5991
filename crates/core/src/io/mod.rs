//! I/O operations for reading and writing rasters

mod native;

pub use native::{
    read_geotiff, read_multiband_geotiff, read_multiband_geotiff_from_buffer, write_geotiff,
    write_multiband_geotiff, write_multiband_geotiff_to_buffer, GeoTiffOptions,
};
