//! Principal Component Analysis of a feature matrix
//!
//! Columns are centered (and optionally scaled to unit variance), the
//! covariance or correlation matrix is eigendecomposed with `nalgebra`, and
//! components are ordered by decreasing variance. Per-band statistics are
//! computed from the loadings in closed form:
//!
//! ```text
//! correlation[j, i]  = loading[j, i] * sdev[i] / std[j]
//! contribution[j, i] = 100 * loading[j, i]^2 / sum_j loading[j, i]^2
//! ```
//!
//! where `std[j]` is the standard deviation of band `j` as it entered the
//! decomposition (1 for standardized bands).

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rasterfuse_core::{Error, Result};

/// Output of [`decompose`]
#[derive(Debug, Clone)]
pub struct PcaDecomposition {
    /// Component scores, one row per analyzed pixel and one column per component
    pub scores: Array2<f64>,
    /// Loadings (bands x components); each column has unit length
    pub loadings: Array2<f64>,
    /// Standard deviation of each component
    pub sdev: Vec<f64>,
    /// Column means removed before decomposition
    pub center: Vec<f64>,
    /// Column divisors applied before decomposition (all 1 when unscaled)
    pub scale: Vec<f64>,
    /// Standard deviation of each original band
    pub band_sdev: Vec<f64>,
    /// Whether columns were scaled to unit variance
    pub standardized: bool,
}

/// Variance and band statistics derived from a [`PcaDecomposition`]
#[derive(Debug, Clone)]
pub struct ComponentStatistics {
    /// Variance explained by each component
    pub variance: Vec<f64>,
    /// Share of total variance per component (sums to 1)
    pub proportion: Vec<f64>,
    /// Running sum of `proportion`, ending at 1
    pub cumulative: Vec<f64>,
    /// Correlation of each band (row) with each component (column)
    pub correlation: Array2<f64>,
    /// Percentage contribution of each band (row) to each component (column)
    pub contribution: Array2<f64>,
}

/// Decompose a (rows x bands) matrix.
///
/// Fails with `MissingData` if any value is NaN or infinite, and with
/// `DegenerateInput` if fewer than two rows are present, if a constant band
/// has to be scaled to unit variance, or if the total variance is zero.
pub fn decompose(data: ArrayView2<'_, f64>, standardize: bool) -> Result<PcaDecomposition> {
    let (n, p) = data.dim();
    if p == 0 {
        return Err(Error::DegenerateInput("feature matrix has no bands".into()));
    }

    let rows_with_missing = data
        .axis_iter(Axis(0))
        .filter(|row| row.iter().any(|v| !v.is_finite()))
        .count();
    if rows_with_missing > 0 {
        return Err(Error::MissingData {
            rows: rows_with_missing,
        });
    }

    if n < 2 {
        return Err(Error::DegenerateInput(format!(
            "at least 2 valid pixels are required, got {}",
            n
        )));
    }

    let center: Array1<f64> = data
        .mean_axis(Axis(0))
        .ok_or_else(|| Error::DegenerateInput("empty feature matrix".into()))?;
    let band_sdev: Array1<f64> = data.std_axis(Axis(0), 1.0);

    let scale: Array1<f64> = if standardize {
        // Constant relative to the band's own magnitude, so small units still count
        let constant = band_sdev
            .iter()
            .zip(center.iter())
            .position(|(&s, &m)| !(s > f64::EPSILON * 1e3 * m.abs()));
        if let Some(j) = constant {
            return Err(Error::DegenerateInput(format!(
                "band {} is constant and cannot be scaled to unit variance",
                j + 1
            )));
        }
        band_sdev.clone()
    } else {
        Array1::ones(p)
    };

    let z: Array2<f64> = (&data - &center) / &scale;
    let cov: Array2<f64> = z.t().dot(&z) / (n as f64 - 1.0);

    let eigen = SymmetricEigen::new(DMatrix::from_fn(p, p, |i, j| cov[[i, j]]));

    // Descending variance, ties broken by original index
    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let variance: Vec<f64> = order
        .iter()
        .map(|&k| eigen.eigenvalues[k].max(0.0))
        .collect();
    let total: f64 = variance.iter().sum();
    if !(total > 0.0) || !total.is_finite() {
        return Err(Error::DegenerateInput(
            "total variance is zero; every band is constant".into(),
        ));
    }

    let mut loadings = Array2::zeros((p, p));
    for (i, &k) in order.iter().enumerate() {
        let vector = eigen.eigenvectors.column(k);
        let norm = vector.norm();
        let sign = dominant_sign(vector.iter().copied());
        for j in 0..p {
            loadings[[j, i]] = sign * vector[j] / norm;
        }
    }

    let scores = z.dot(&loadings);
    let sdev = variance.iter().map(|v| v.sqrt()).collect();

    tracing::debug!(rows = n, bands = p, standardize, "pca decomposition done");

    Ok(PcaDecomposition {
        scores,
        loadings,
        sdev,
        center: center.to_vec(),
        scale: scale.to_vec(),
        band_sdev: band_sdev.to_vec(),
        standardized: standardize,
    })
}

/// Sign that makes the largest-magnitude entry positive
fn dominant_sign(values: impl Iterator<Item = f64>) -> f64 {
    let mut best = 0.0f64;
    for v in values {
        if v.abs() > best.abs() {
            best = v;
        }
    }
    if best < 0.0 {
        -1.0
    } else {
        1.0
    }
}

impl PcaDecomposition {
    pub fn n_components(&self) -> usize {
        self.sdev.len()
    }

    /// Variance, proportion, cumulative, correlation and contribution tables
    pub fn statistics(&self) -> ComponentStatistics {
        let p = self.n_components();
        let variance: Vec<f64> = self.sdev.iter().map(|s| s * s).collect();
        let total: f64 = variance.iter().sum();
        let proportion: Vec<f64> = variance.iter().map(|v| v / total).collect();
        let cumulative: Vec<f64> = proportion
            .iter()
            .scan(0.0, |acc, v| {
                *acc += v;
                Some(*acc)
            })
            .collect();

        let mut correlation = Array2::zeros((p, p));
        let mut contribution = Array2::zeros((p, p));
        for i in 0..p {
            let column = self.loadings.column(i);
            let squared_sum: f64 = column.iter().map(|l| l * l).sum();
            for j in 0..p {
                let loading = column[j];
                let input_sdev = if self.standardized {
                    1.0
                } else {
                    self.band_sdev[j]
                };
                correlation[[j, i]] = if input_sdev > 0.0 {
                    (loading * self.sdev[i] / input_sdev).clamp(-1.0, 1.0)
                } else {
                    0.0
                };
                contribution[[j, i]] = 100.0 * loading * loading / squared_sum;
            }
        }

        ComponentStatistics {
            variance,
            proportion,
            cumulative,
            correlation,
            contribution,
        }
    }
}
