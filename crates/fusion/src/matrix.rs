//! Flattening a raster stack into a (pixels x bands) feature matrix

use crate::maybe_rayon::*;
use ndarray::{Array2, ArrayView2};
use rasterfuse_core::{Error, MultiBandRaster, Result};

/// Pixel-by-band table built from a [`MultiBandRaster`].
///
/// Rows follow raster scan order. Missing values are stored as NaN. When
/// incomplete rows were dropped, `row_index` maps every kept row back to its
/// original pixel position.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    data: Array2<f64>,
    valid_mask: Vec<bool>,
    row_index: Vec<usize>,
    band_names: Vec<String>,
    grid_shape: (usize, usize),
}

impl FeatureMatrix {
    /// (rows, bands) table passed to the decomposition
    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_bands(&self) -> usize {
        self.data.ncols()
    }

    /// One entry per pixel of the source grid, true when no band is missing
    pub fn valid_mask(&self) -> &[bool] {
        &self.valid_mask
    }

    /// Original pixel index of every row in [`data`](Self::data)
    pub fn row_index(&self) -> &[usize] {
        &self.row_index
    }

    pub fn band_names(&self) -> &[String] {
        &self.band_names
    }

    /// (rows, cols) of the raster the matrix was built from
    pub fn grid_shape(&self) -> (usize, usize) {
        self.grid_shape
    }

    /// Pixels with at least one missing band
    pub fn incomplete_count(&self) -> usize {
        self.valid_mask.iter().filter(|v| !**v).count()
    }

    /// Rows of the matrix that still hold a missing value
    pub fn rows_with_missing(&self) -> usize {
        self.row_index
            .iter()
            .filter(|&&pixel| !self.valid_mask[pixel])
            .count()
    }
}

/// Flatten `stack` into a feature matrix.
///
/// With `drop_incomplete` every pixel missing any band is left out;
/// otherwise all pixels are kept and missing values stay in the matrix as NaN.
pub fn build_feature_matrix(stack: &MultiBandRaster, drop_incomplete: bool) -> Result<FeatureMatrix> {
    let (rows, cols) = stack.shape();
    let n_bands = stack.band_count();
    let data = stack.data();

    // Per raster row: band values for each pixel plus its completeness
    let scanned: Vec<(Vec<f64>, Vec<bool>)> = (0..rows)
        .into_par_iter()
        .map(|row| {
            let mut values = Vec::with_capacity(cols * n_bands);
            let mut valid = Vec::with_capacity(cols);
            for col in 0..cols {
                let mut complete = true;
                for band in 0..n_bands {
                    let v = data[[band, row, col]];
                    if stack.is_nodata(v) {
                        complete = false;
                        values.push(f64::NAN);
                    } else {
                        values.push(v);
                    }
                }
                valid.push(complete);
            }
            (values, valid)
        })
        .collect();

    let mut valid_mask = Vec::with_capacity(rows * cols);
    let mut row_index = Vec::with_capacity(rows * cols);
    let mut flat = Vec::with_capacity(rows * cols * n_bands);
    for (values, valid) in scanned {
        for (pixel_values, complete) in values.chunks_exact(n_bands.max(1)).zip(valid) {
            let pixel = valid_mask.len();
            valid_mask.push(complete);
            if complete || !drop_incomplete {
                row_index.push(pixel);
                flat.extend_from_slice(pixel_values);
            }
        }
    }

    let matrix = Array2::from_shape_vec((row_index.len(), n_bands), flat)
        .map_err(|e| Error::Other(e.to_string()))?;

    tracing::debug!(
        rows = matrix.nrows(),
        bands = n_bands,
        dropped = valid_mask.len() - row_index.len(),
        "built feature matrix"
    );

    Ok(FeatureMatrix {
        data: matrix,
        valid_mask,
        row_index,
        band_names: stack.band_names().to_vec(),
        grid_shape: (rows, cols),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn stack(values: Vec<f64>, bands: usize, rows: usize, cols: usize) -> MultiBandRaster {
        let names = (0..bands).map(|i| format!("b{}", i + 1)).collect();
        let data = Array3::from_shape_vec((bands, rows, cols), values).unwrap();
        MultiBandRaster::new(names, data).unwrap()
    }

    #[test]
    fn test_row_major_pixel_by_band() {
        let s = stack(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], 2, 2, 2);
        let m = build_feature_matrix(&s, false).unwrap();

        assert_eq!(m.n_rows(), 4);
        assert_eq!(m.n_bands(), 2);
        assert_eq!(m.data().row(0).to_vec(), vec![1.0, 5.0]);
        assert_eq!(m.data().row(3).to_vec(), vec![4.0, 8.0]);
        assert_eq!(m.row_index(), &[0, 1, 2, 3]);
        assert_eq!(m.incomplete_count(), 0);
        assert_eq!(m.grid_shape(), (2, 2));
    }

    #[test]
    fn test_drop_incomplete_keeps_positions() {
        let s = stack(
            vec![1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0, 7.0, f64::NAN],
            2,
            2,
            2,
        );
        let m = build_feature_matrix(&s, true).unwrap();

        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.row_index(), &[0, 2]);
        assert_eq!(m.valid_mask(), &[true, false, true, false]);
        assert_eq!(m.data().row(1).to_vec(), vec![3.0, 7.0]);
        assert_eq!(m.rows_with_missing(), 0);
    }

    #[test]
    fn test_keep_incomplete_marks_nan() {
        let mut s = stack(vec![1.0, -9999.0, 3.0, 4.0], 1, 2, 2);
        s.set_nodata(Some(-9999.0));
        let m = build_feature_matrix(&s, false).unwrap();

        assert_eq!(m.n_rows(), 4);
        assert!(m.data()[[1, 0]].is_nan());
        assert_eq!(m.incomplete_count(), 1);
        assert_eq!(m.rows_with_missing(), 1);
    }

    #[test]
    fn test_all_missing_dropped_gives_empty_matrix() {
        let s = stack(vec![f64::NAN; 4], 1, 2, 2);
        let m = build_feature_matrix(&s, true).unwrap();
        assert_eq!(m.n_rows(), 0);
        assert_eq!(m.n_bands(), 1);
        assert_eq!(m.valid_mask().len(), 4);
    }
}
