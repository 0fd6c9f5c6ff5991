//! Fusion result aggregate

use crate::pca::ComponentStatistics;
use ndarray::Array2;
use rasterfuse_core::MultiBandRaster;
use serde::{Deserialize, Serialize};

/// Everything produced by one [`fuse`](crate::fuse) call.
///
/// Rows of `correlation` and `contribution` follow `band_names` (the stacked
/// band order); columns follow `component_names`.
#[derive(Debug, Clone)]
pub struct FusionResult {
    /// One band per component (`PC1..PCk`); unanalyzed pixels are NaN
    pub components: MultiBandRaster,
    /// Variance explained by each component
    pub variance: Vec<f64>,
    /// Proportion of total variance per component
    pub proportion: Vec<f64>,
    /// Cumulative proportion of variance
    pub cumulative: Vec<f64>,
    /// Band x component correlation
    pub correlation: Array2<f64>,
    /// Band x component contribution in percent
    pub contribution: Array2<f64>,
    /// Stacked band names (`x_*` then `y_*`)
    pub band_names: Vec<String>,
    /// Component names
    pub component_names: Vec<String>,
    /// Number of pixels that entered the decomposition
    pub analyzed_pixels: usize,
}

/// Plain, serializable copy of the statistics in a [`FusionResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionSummary {
    pub band_names: Vec<String>,
    pub component_names: Vec<String>,
    pub analyzed_pixels: usize,
    pub variance: Vec<f64>,
    pub proportion: Vec<f64>,
    pub cumulative: Vec<f64>,
    pub correlation: Vec<Vec<f64>>,
    pub contribution: Vec<Vec<f64>>,
}

impl FusionResult {
    pub(crate) fn assemble(
        components: MultiBandRaster,
        statistics: ComponentStatistics,
        band_names: Vec<String>,
        analyzed_pixels: usize,
    ) -> Self {
        let component_names = components.band_names().to_vec();
        let ComponentStatistics {
            variance,
            proportion,
            cumulative,
            correlation,
            contribution,
        } = statistics;

        Self {
            components,
            variance,
            proportion,
            cumulative,
            correlation,
            contribution,
            band_names,
            component_names,
            analyzed_pixels,
        }
    }

    pub fn n_components(&self) -> usize {
        self.variance.len()
    }

    pub fn summary(&self) -> FusionSummary {
        let rows = |m: &Array2<f64>| -> Vec<Vec<f64>> {
            m.rows().into_iter().map(|r| r.to_vec()).collect()
        };
        FusionSummary {
            band_names: self.band_names.clone(),
            component_names: self.component_names.clone(),
            analyzed_pixels: self.analyzed_pixels,
            variance: self.variance.clone(),
            proportion: self.proportion.clone(),
            cumulative: self.cumulative.clone(),
            correlation: rows(&self.correlation),
            contribution: rows(&self.contribution),
        }
    }
}
