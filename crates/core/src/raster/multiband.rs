//! Multi-band raster: ordered named bands over one shared grid

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{Extent, GeoTransform, Raster, RasterElement};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};

/// A georeferenced raster with one or more named `f64` bands.
///
/// Band values live in a single `(bands, rows, cols)` array so every band
/// shares the grid shape, transform, CRS and no-data sentinel. NaN is always
/// treated as no-data, in addition to the configured sentinel.
#[derive(Debug, Clone)]
pub struct MultiBandRaster {
    names: Vec<String>,
    data: Array3<f64>,
    transform: GeoTransform,
    crs: Option<CRS>,
    nodata: Option<f64>,
}

impl MultiBandRaster {
    /// Build from band names and a `(bands, rows, cols)` array
    pub fn new(names: Vec<String>, data: Array3<f64>) -> Result<Self> {
        let (bands, rows, cols) = data.dim();
        if names.len() != bands {
            return Err(Error::InvalidParameter {
                name: "names",
                value: names.len().to_string(),
                reason: format!("expected one name per band ({} bands)", bands),
            });
        }
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        Ok(Self {
            names,
            data,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        })
    }

    /// Grid of `bands` layers all set to the no-data sentinel (NaN)
    pub fn filled_nodata(names: Vec<String>, rows: usize, cols: usize) -> Result<Self> {
        let data = Array3::from_elem((names.len(), rows, cols), f64::NAN);
        let mut raster = Self::new(names, data)?;
        raster.nodata = Some(f64::NAN);
        Ok(raster)
    }

    /// Stack single-band rasters into one multi-band raster.
    ///
    /// Metadata comes from the first band. Cells that are no-data under a
    /// band's own sentinel are rewritten as NaN when that sentinel differs
    /// from the first band's.
    pub fn from_bands(bands: Vec<(String, Raster<f64>)>) -> Result<Self> {
        let Some((_, first)) = bands.first() else {
            return Err(Error::InvalidParameter {
                name: "bands",
                value: "0".into(),
                reason: "at least one band is required".into(),
            });
        };

        let (rows, cols) = first.shape();
        let transform = *first.transform();
        let crs = first.crs().cloned();
        let nodata = first.nodata();

        let mut names = Vec::with_capacity(bands.len());
        let mut data = Array3::zeros((bands.len(), rows, cols));
        for (i, (name, band)) in bands.into_iter().enumerate() {
            if band.shape() != (rows, cols) {
                return Err(Error::SizeMismatch {
                    er: rows,
                    ec: cols,
                    ar: band.rows(),
                    ac: band.cols(),
                });
            }
            let band_nodata = band.nodata();
            let mut layer = data.index_axis_mut(Axis(0), i);
            layer.assign(band.data());
            if band_nodata.map(f64::to_bits) != nodata.map(f64::to_bits) {
                layer.mapv_inplace(|v| {
                    if v.is_nodata(band_nodata) {
                        f64::NAN
                    } else {
                        v
                    }
                });
            }
            names.push(name);
        }

        let mut raster = Self::new(names, data)?;
        raster.transform = transform;
        raster.crs = crs;
        raster.nodata = nodata;
        Ok(raster)
    }

    /// Convert a single-band raster of any element type.
    ///
    /// No-data cells become NaN; the result has no separate sentinel.
    pub fn from_raster<T: RasterElement>(name: impl Into<String>, raster: &Raster<T>) -> Result<Self> {
        let (rows, cols) = raster.shape();
        let values: Array2<f64> = raster.data().mapv(|v| {
            if raster.is_nodata(v) {
                f64::NAN
            } else {
                v.to_f64().unwrap_or(f64::NAN)
            }
        });
        let data = values
            .into_shape_with_order((1, rows, cols))
            .map_err(|e| Error::Other(e.to_string()))?;

        let mut out = Self::new(vec![name.into()], data)?;
        out.transform = *raster.transform();
        out.crs = raster.crs().cloned();
        Ok(out)
    }

    pub fn band_count(&self) -> usize {
        self.names.len()
    }

    pub fn band_names(&self) -> &[String] {
        &self.names
    }

    /// View of band `index`
    pub fn band(&self, index: usize) -> Option<ArrayView2<'_, f64>> {
        (index < self.band_count()).then(|| self.data.index_axis(Axis(0), index))
    }

    pub fn band_by_name(&self, name: &str) -> Option<ArrayView2<'_, f64>> {
        let index = self.names.iter().position(|n| n == name)?;
        self.band(index)
    }

    /// Extract band `index` as a standalone raster with the same metadata
    pub fn to_raster(&self, index: usize) -> Result<Raster<f64>> {
        let view = self.band(index).ok_or(Error::InvalidParameter {
            name: "band",
            value: index.to_string(),
            reason: format!("raster has {} bands", self.band_count()),
        })?;
        let mut raster = Raster::from_array(view.to_owned());
        raster.set_transform(self.transform);
        raster.set_crs(self.crs.clone());
        raster.set_nodata(self.nodata);
        Ok(raster)
    }

    /// Full `(bands, rows, cols)` view
    pub fn data(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    /// Mutable access to the band array; the shape must not change
    pub fn data_mut(&mut self) -> &mut Array3<f64> {
        &mut self.data
    }

    /// Grid dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    /// Number of pixel positions per band
    pub fn pixel_count(&self) -> usize {
        let (rows, cols) = self.shape();
        rows * cols
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.crs = crs;
    }

    pub fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<f64>) {
        self.nodata = nodata;
    }

    /// Value written to cells that hold no data
    pub fn nodata_sentinel(&self) -> f64 {
        self.nodata.unwrap_or(f64::NAN)
    }

    pub fn is_nodata(&self, value: f64) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Geographic extent covered by the grid
    pub fn extent(&self) -> Extent {
        let (rows, cols) = self.shape();
        self.transform.bounds(cols, rows)
    }

    /// Number of valid cells in band `index`
    pub fn valid_count(&self, index: usize) -> usize {
        self.band(index)
            .map(|b| b.iter().filter(|&&v| !self.is_nodata(v)).count())
            .unwrap_or(0)
    }
}

impl Raster<f64> {
    /// Wrap this single band as a one-band [`MultiBandRaster`]
    pub fn into_multiband(self, name: impl Into<String>) -> Result<MultiBandRaster> {
        MultiBandRaster::from_bands(vec![(name.into(), self)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn band(values: Vec<f64>, rows: usize, cols: usize) -> Raster<f64> {
        let mut r = Raster::from_vec(values, rows, cols).unwrap();
        r.set_transform(GeoTransform::new(0.0, rows as f64, 1.0, -1.0));
        r
    }

    #[test]
    fn test_from_bands_keeps_order_and_metadata() {
        let a = band(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let b = band(vec![5.0, 6.0, 7.0, 8.0], 2, 2);
        let mb = MultiBandRaster::from_bands(vec![("a".into(), a), ("b".into(), b)]).unwrap();

        assert_eq!(mb.band_count(), 2);
        assert_eq!(mb.band_names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(mb.shape(), (2, 2));
        assert_eq!(mb.band_by_name("b").unwrap()[[1, 0]], 7.0);
        assert_eq!(mb.transform().origin_y, 2.0);
    }

    #[test]
    fn test_from_bands_shape_mismatch() {
        let a = band(vec![1.0; 4], 2, 2);
        let b = band(vec![1.0; 6], 2, 3);
        let err = MultiBandRaster::from_bands(vec![("a".into(), a), ("b".into(), b)]).unwrap_err();
        assert!(matches!(err, Error::SizeMismatch { ac: 3, .. }));
    }

    #[test]
    fn test_from_bands_harmonizes_sentinels() {
        let mut a = band(vec![1.0, -1.0, 3.0, 4.0], 2, 2);
        a.set_nodata(Some(-1.0));
        let mut b = band(vec![0.0, 6.0, 7.0, 8.0], 2, 2);
        b.set_nodata(Some(0.0));
        let mb = MultiBandRaster::from_bands(vec![("a".into(), a), ("b".into(), b)]).unwrap();

        assert_eq!(mb.nodata(), Some(-1.0));
        assert!(mb.is_nodata(mb.band(0).unwrap()[[0, 1]]));
        assert!(mb.band(1).unwrap()[[0, 0]].is_nan());
        assert_eq!(mb.valid_count(0), 3);
        assert_eq!(mb.valid_count(1), 3);
    }

    #[test]
    fn test_from_integer_raster() {
        let mut r: Raster<u8> = Raster::from_vec(vec![0, 10, 20, 30], 2, 2).unwrap();
        r.set_nodata(Some(0));
        let mb = MultiBandRaster::from_raster("dn", &r).unwrap();
        assert!(mb.band(0).unwrap()[[0, 0]].is_nan());
        assert_eq!(mb.band(0).unwrap()[[1, 1]], 30.0);
    }

    #[test]
    fn test_new_rejects_name_count() {
        let data = Array3::zeros((2, 3, 3));
        let err = MultiBandRaster::new(vec!["only".into()], data).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "names", .. }));
    }

    #[test]
    fn test_filled_nodata() {
        let mb = MultiBandRaster::filled_nodata(vec!["a".into(), "b".into()], 2, 3).unwrap();
        assert_eq!(mb.band_count(), 2);
        assert_eq!(mb.shape(), (2, 3));
        assert_eq!(mb.valid_count(0), 0);
        assert!(mb.nodata_sentinel().is_nan());
    }

    #[test]
    fn test_nodata_sentinel() {
        let mut mb = MultiBandRaster::new(vec!["a".into()], Array3::zeros((1, 1, 1))).unwrap();
        assert!(mb.nodata_sentinel().is_nan());
        mb.set_nodata(Some(-9999.0));
        assert_eq!(mb.nodata_sentinel(), -9999.0);
    }

    #[test]
    fn test_to_raster_roundtrip() {
        let a = band(vec![1.0, 2.0, 3.0, 4.0], 2, 2);
        let mb = a.clone().into_multiband("a").unwrap();
        let back = mb.to_raster(0).unwrap();
        assert_eq!(back.data(), a.data());
        assert!(mb.to_raster(1).is_err());
    }
}
