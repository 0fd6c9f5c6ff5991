//! Band stacking of two compatible rasters

use ndarray::{concatenate, Array3, ArrayView3, Axis};
use rasterfuse_core::{Error, MultiBandRaster, RasterElement, Result};

/// Concatenate the bands of `x` and `y` into one raster.
///
/// Bands keep their order within each input and are prefixed `x_` / `y_`
/// so names never collide. Geometry comes from `x`; callers are expected to
/// have run [`check_compatibility`](crate::validate::check_compatibility).
/// When the inputs use different no-data sentinels, missing cells from both
/// are rewritten as NaN so one sentinel covers the whole stack.
pub fn stack_bands(x: &MultiBandRaster, y: &MultiBandRaster) -> Result<MultiBandRaster> {
    if x.shape() != y.shape() {
        let (er, ec) = x.shape();
        let (ar, ac) = y.shape();
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }

    let same_sentinel = x.nodata().map(f64::to_bits) == y.nodata().map(f64::to_bits);
    let nodata = if same_sentinel { x.nodata() } else { None };

    let data = if same_sentinel {
        concatenate(Axis(0), &[x.data(), y.data()])
            .map_err(|e| Error::Other(e.to_string()))?
    } else {
        let xs = harmonized(x.data(), x.nodata());
        let ys = harmonized(y.data(), y.nodata());
        concatenate(Axis(0), &[xs.view(), ys.view()])
            .map_err(|e| Error::Other(e.to_string()))?
    };

    let names = x
        .band_names()
        .iter()
        .map(|n| format!("x_{}", n))
        .chain(y.band_names().iter().map(|n| format!("y_{}", n)))
        .collect();

    let mut stacked = MultiBandRaster::new(names, data)?;
    stacked.set_transform(*x.transform());
    stacked.set_crs(x.crs().or(y.crs()).cloned());
    stacked.set_nodata(nodata);
    Ok(stacked)
}

fn harmonized(data: ArrayView3<'_, f64>, nodata: Option<f64>) -> Array3<f64> {
    data.mapv(|v| if v.is_nodata(nodata) { f64::NAN } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rasterfuse_core::{GeoTransform, CRS};

    fn raster(names: &[&str], values: Vec<f64>, rows: usize, cols: usize) -> MultiBandRaster {
        let data = Array3::from_shape_vec((names.len(), rows, cols), values).unwrap();
        let mut r =
            MultiBandRaster::new(names.iter().map(|s| s.to_string()).collect(), data).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_band_count_and_order() {
        let x = raster(&["red", "nir"], (0..8).map(f64::from).collect(), 2, 2);
        let y = raster(&["vv", "vh", "ratio"], (100..112).map(f64::from).collect(), 2, 2);
        let s = stack_bands(&x, &y).unwrap();

        assert_eq!(s.band_count(), 5);
        assert_eq!(
            s.band_names(),
            &["x_red", "x_nir", "y_vv", "y_vh", "y_ratio"].map(String::from)
        );
        assert_eq!(s.band(1).unwrap()[[0, 0]], 4.0);
        assert_eq!(s.band(2).unwrap()[[0, 0]], 100.0);
        assert_eq!(s.band(4).unwrap()[[1, 1]], 111.0);
    }

    #[test]
    fn test_same_band_names_do_not_collide() {
        let x = raster(&["b1"], vec![1.0; 4], 2, 2);
        let y = raster(&["b1"], vec![2.0; 4], 2, 2);
        let s = stack_bands(&x, &y).unwrap();
        assert_eq!(s.band_by_name("x_b1").unwrap()[[0, 0]], 1.0);
        assert_eq!(s.band_by_name("y_b1").unwrap()[[0, 0]], 2.0);
    }

    #[test]
    fn test_metadata_from_x() {
        let mut x = raster(&["a"], vec![1.0; 4], 2, 2);
        x.set_transform(GeoTransform::new(300.0, 900.0, 10.0, -10.0));
        let mut y = raster(&["b"], vec![1.0; 4], 2, 2);
        y.set_transform(GeoTransform::new(300.0, 900.0, 10.0, -10.0));
        y.set_crs(Some(CRS::from_epsg(32719)));

        let s = stack_bands(&x, &y).unwrap();
        assert_eq!(s.transform().origin_x, 300.0);
        assert_eq!(s.crs().and_then(|c| c.epsg()), Some(32719));
    }

    #[test]
    fn test_mixed_sentinels_become_nan() {
        let mut x = raster(&["a"], vec![-9999.0, 1.0, 2.0, 3.0], 2, 2);
        x.set_nodata(Some(-9999.0));
        let mut y = raster(&["b"], vec![4.0, 0.0, 6.0, 7.0], 2, 2);
        y.set_nodata(Some(0.0));

        let s = stack_bands(&x, &y).unwrap();
        assert_eq!(s.nodata(), None);
        assert!(s.band(0).unwrap()[[0, 0]].is_nan());
        assert!(s.band(1).unwrap()[[0, 1]].is_nan());
        assert_eq!(s.band(1).unwrap()[[0, 0]], 4.0);
    }

    #[test]
    fn test_shared_sentinel_is_kept() {
        let mut x = raster(&["a"], vec![-1.0, 1.0, 2.0, 3.0], 2, 2);
        x.set_nodata(Some(-1.0));
        let mut y = raster(&["b"], vec![4.0, 5.0, 6.0, -1.0], 2, 2);
        y.set_nodata(Some(-1.0));

        let s = stack_bands(&x, &y).unwrap();
        assert_eq!(s.nodata(), Some(-1.0));
        assert_eq!(s.valid_count(0), 3);
        assert_eq!(s.valid_count(1), 3);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let x = raster(&["a"], vec![1.0; 4], 2, 2);
        let y = raster(&["b"], vec![1.0; 9], 3, 3);
        assert!(matches!(stack_bands(&x, &y), Err(Error::SizeMismatch { .. })));
    }
}
