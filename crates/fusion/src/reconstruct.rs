//! Scattering component scores back onto the raster grid

use ndarray::{ArrayView2, Axis};
use rasterfuse_core::{Error, MultiBandRaster, Result};

/// Build one band per score column on the grid of `template`.
///
/// Row `r` of `scores` lands at pixel `row_index[r]` (scan order); every
/// other cell is NaN. Bands are named `PC1..PCk`, and the transform and CRS
/// are copied from `template`.
pub fn reconstruct_components(
    template: &MultiBandRaster,
    scores: ArrayView2<'_, f64>,
    row_index: &[usize],
) -> Result<MultiBandRaster> {
    let (rows, cols) = template.shape();
    let pixels = rows * cols;
    let (n_scores, n_components) = scores.dim();

    if n_scores != row_index.len() {
        return Err(Error::InvalidParameter {
            name: "row_index",
            value: row_index.len().to_string(),
            reason: format!("expected one entry per score row ({})", n_scores),
        });
    }
    if row_index.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::InvalidParameter {
            name: "row_index",
            value: "unordered".into(),
            reason: "pixel positions must be strictly increasing".into(),
        });
    }
    if let Some(&last) = row_index.last() {
        if last >= pixels {
            return Err(Error::IndexOutOfBounds {
                row: last / cols,
                col: last % cols,
                rows,
                cols,
            });
        }
    }

    let names = (1..=n_components).map(|i| format!("PC{}", i)).collect();
    let mut raster = MultiBandRaster::filled_nodata(names, rows, cols)?;
    for (component, mut band) in raster.data_mut().axis_iter_mut(Axis(0)).enumerate() {
        for (score, &pixel) in scores.column(component).iter().zip(row_index) {
            band[[pixel / cols, pixel % cols]] = *score;
        }
    }

    raster.set_transform(*template.transform());
    raster.set_crs(template.crs().cloned());
    Ok(raster)
}
