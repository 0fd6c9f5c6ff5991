//! Compatibility checks between the two fusion inputs

use rasterfuse_core::{Error, MultiBandRaster, Result};

/// Fraction of the smaller pixel size tolerated when comparing extents
const EXTENT_TOLERANCE: f64 = 1e-3;

/// Check that `x` and `y` can be stacked pixel for pixel.
///
/// Both inputs must be usable georeferenced rasters (at least one band,
/// a non-degenerate transform). They must then share the same grid shape,
/// the same extent and, when both declare one, an equivalent CRS. No
/// alignment or resampling is attempted.
pub fn check_compatibility(x: &MultiBandRaster, y: &MultiBandRaster) -> Result<()> {
    let problems: Vec<(&str, String)> = [("x", x), ("y", y)]
        .into_iter()
        .filter_map(|(label, raster)| unsupported_reason(raster).map(|r| (label, r)))
        .collect();

    if !problems.is_empty() {
        let input = problems
            .iter()
            .map(|(label, _)| *label)
            .collect::<Vec<_>>()
            .join(", ");
        let reason = problems
            .iter()
            .map(|(label, reason)| format!("{}: {}", label, reason))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::UnsupportedType { input, reason });
    }

    let tolerance = EXTENT_TOLERANCE
        * x.transform()
            .min_pixel_size()
            .min(y.transform().min_pixel_size());

    let same_grid = x.shape() == y.shape();
    let same_extent = x.extent().approx_eq(&y.extent(), tolerance);
    let same_crs = match (x.crs(), y.crs()) {
        (Some(a), Some(b)) => a.is_equivalent(b),
        _ => true,
    };

    if same_grid && same_extent && same_crs {
        Ok(())
    } else {
        Err(Error::ExtentMismatch {
            x: describe(x),
            y: describe(y),
        })
    }
}

fn unsupported_reason(raster: &MultiBandRaster) -> Option<String> {
    if raster.band_count() == 0 {
        return Some("raster has no bands".into());
    }
    if raster.transform().is_degenerate() {
        return Some("geotransform is degenerate or not finite".into());
    }
    None
}

fn describe(raster: &MultiBandRaster) -> String {
    let (rows, cols) = raster.shape();
    let mut text = format!("{}x{} {}", rows, cols, raster.extent());
    if let Some(crs) = raster.crs() {
        text.push_str(&format!(" {}", crs));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rasterfuse_core::{GeoTransform, CRS};

    fn raster(bands: usize, rows: usize, cols: usize) -> MultiBandRaster {
        let names = (0..bands).map(|i| format!("b{}", i)).collect();
        let mut r = MultiBandRaster::new(names, Array3::zeros((bands, rows, cols))).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_matching_inputs_pass() {
        assert!(check_compatibility(&raster(3, 4, 4), &raster(1, 4, 4)).is_ok());
    }

    #[test]
    fn test_different_grid_is_extent_mismatch() {
        let err = check_compatibility(&raster(1, 2, 2), &raster(1, 3, 3)).unwrap_err();
        match err {
            Error::ExtentMismatch { x, y } => {
                assert!(x.starts_with("2x2"), "{}", x);
                assert!(y.starts_with("3x3"), "{}", y);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shifted_origin_is_extent_mismatch() {
        let x = raster(1, 4, 4);
        let mut y = raster(1, 4, 4);
        y.set_transform(GeoTransform::new(10.0, 4.0, 1.0, -1.0));
        assert!(matches!(
            check_compatibility(&x, &y),
            Err(Error::ExtentMismatch { .. })
        ));
    }

    #[test]
    fn test_float_noise_in_origin_is_tolerated() {
        let x = raster(1, 4, 4);
        let mut y = raster(1, 4, 4);
        y.set_transform(GeoTransform::new(1e-9, 4.0 + 1e-9, 1.0, -1.0));
        assert!(check_compatibility(&x, &y).is_ok());
    }

    #[test]
    fn test_crs_mismatch() {
        let mut x = raster(1, 4, 4);
        let mut y = raster(1, 4, 4);
        x.set_crs(Some(CRS::from_epsg(32719)));
        y.set_crs(Some(CRS::from_epsg(4326)));
        assert!(matches!(
            check_compatibility(&x, &y),
            Err(Error::ExtentMismatch { .. })
        ));
    }

    #[test]
    fn test_unsupported_inputs_are_named() {
        let x = raster(0, 4, 4);
        let mut y = raster(1, 4, 4);
        y.set_transform(GeoTransform::new(0.0, 0.0, 0.0, 0.0));
        match check_compatibility(&x, &y).unwrap_err() {
            Error::UnsupportedType { input, reason } => {
                assert_eq!(input, "x, y");
                assert!(reason.contains("no bands"));
                assert!(reason.contains("degenerate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_type_check_precedes_extent_check() {
        let x = raster(0, 2, 2);
        let y = raster(1, 3, 3);
        assert!(matches!(
            check_compatibility(&x, &y),
            Err(Error::UnsupportedType { .. })
        ));
    }
}
