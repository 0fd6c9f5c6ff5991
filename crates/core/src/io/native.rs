//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate. Georeferencing is limited to the pixel scale and
//! tiepoint tags; the GDAL_NODATA tag carries the no-data value.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, MultiBandRaster, Raster, RasterElement};
use ndarray::{Array3, Axis};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Write the GDAL_NODATA tag when the raster has a sentinel
    pub write_nodata: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self { write_nodata: true }
    }
}

/// Pages and samples of one file flattened into row-major bands
struct DecodedBands {
    rows: usize,
    cols: usize,
    bands: Vec<Vec<f64>>,
    transform: Option<GeoTransform>,
    nodata: Option<f64>,
}

/// Read one band of a GeoTIFF file into a Raster
///
/// `band` is 1-indexed and defaults to the first band.
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    let decoded = decode_bands(file)?;

    let index = band.unwrap_or(1);
    if index == 0 || index > decoded.bands.len() {
        return Err(Error::InvalidParameter {
            name: "band",
            value: index.to_string(),
            reason: format!("file has {} band(s)", decoded.bands.len()),
        });
    }

    let nodata: Option<T> = decoded.nodata.and_then(|v| num_traits::cast(v));
    let fill = nodata.unwrap_or_else(T::default_nodata);
    let data: Vec<T> = decoded.bands[index - 1]
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(fill))
        .collect();

    let mut raster = Raster::from_vec(data, decoded.rows, decoded.cols)?;
    raster.set_nodata(nodata);
    if let Some(transform) = decoded.transform {
        raster.set_transform(transform);
    }
    Ok(raster)
}

/// Read every band of a GeoTIFF file.
///
/// Each page contributes its samples as separate bands, named `band_1..band_n`.
pub fn read_multiband_geotiff<P: AsRef<Path>>(path: P) -> Result<MultiBandRaster> {
    let file = File::open(path.as_ref())?;
    into_multiband(decode_bands(file)?)
}

/// Same as [`read_multiband_geotiff`] but from an in-memory buffer
pub fn read_multiband_geotiff_from_buffer(data: &[u8]) -> Result<MultiBandRaster> {
    into_multiband(decode_bands(Cursor::new(data))?)
}

fn into_multiband(decoded: DecodedBands) -> Result<MultiBandRaster> {
    let DecodedBands {
        rows,
        cols,
        bands,
        transform,
        nodata,
    } = decoded;

    let names = (1..=bands.len()).map(|i| format!("band_{}", i)).collect();
    let flat: Vec<f64> = bands.into_iter().flatten().collect();
    let n_bands = flat.len() / (rows * cols);
    let data = Array3::from_shape_vec((n_bands, rows, cols), flat)
        .map_err(|e| Error::Other(e.to_string()))?;

    let mut raster = MultiBandRaster::new(names, data)?;
    raster.set_nodata(nodata);
    if let Some(transform) = transform {
        raster.set_transform(transform);
    }
    Ok(raster)
}

fn decode_bands<R: Read + Seek>(reader: R) -> Result<DecodedBands> {
    let mut decoder =
        Decoder::new(reader).map_err(|e| Error::Other(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Other(format!("Cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;
    let cells = rows * cols;
    if cells == 0 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let transform = read_geotransform(&mut decoder).ok();
    let nodata = read_nodata(&mut decoder);

    let mut bands = Vec::new();
    let mut single_precision = false;
    loop {
        // Pages with a different size are overviews or masks
        let same_size = decoder
            .dimensions()
            .map(|dims| dims == (width, height))
            .unwrap_or(false);

        if same_size {
            let result = decoder
                .read_image()
                .map_err(|e| Error::Other(format!("Cannot read image data: {}", e)))?;
            single_precision |= matches!(result, DecodingResult::F32(_));
            let values = decoding_to_f64(result)?;
            if values.len() % cells != 0 {
                return Err(Error::InvalidDimensions {
                    width: cols,
                    height: rows,
                });
            }
            let samples = values.len() / cells;
            for s in 0..samples {
                bands.push(values.iter().skip(s).step_by(samples).copied().collect());
            }
        }

        if !decoder.more_images() {
            break;
        }
        decoder
            .next_image()
            .map_err(|e| Error::Other(format!("Cannot advance to next page: {}", e)))?;
    }

    // Widened f32 pixels only compare equal to a sentinel rounded the same way
    let nodata = nodata.map(|v| if single_precision { v as f32 as f64 } else { v });

    Ok(DecodedBands {
        rows,
        cols,
        bands,
        transform,
        nodata,
    })
}

fn decoding_to_f64(result: DecodingResult) -> Result<Vec<f64>> {
    fn cast_all<V: Copy + num_traits::ToPrimitive>(buf: Vec<V>) -> Vec<f64> {
        buf.iter()
            .map(|v| v.to_f64().unwrap_or(f64::NAN))
            .collect()
    }

    Ok(match result {
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    })
}

/// Read GeoTransform from ModelPixelScaleTag + ModelTiepointTag
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE))
        .map_err(|_| Error::Other("No pixel scale tag".into()))?;

    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT))
        .map_err(|_| Error::Other("No tiepoint tag".into()))?;

    if scale.len() >= 2 && tiepoint.len() >= 6 {
        // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
        let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
        let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
        return Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
    }

    Err(Error::Other("Cannot determine geotransform".into()))
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder
        .get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA))
        .ok()?;
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .parse()
        .ok()
}

/// Write a single-band Raster to a GeoTIFF file (32-bit float)
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let values: Vec<f64> = raster
        .data()
        .iter()
        .map(|&v| v.to_f64().unwrap_or(f64::NAN))
        .collect();
    let (rows, cols) = raster.shape();
    let data = Array3::from_shape_vec((1, rows, cols), values)
        .map_err(|e| Error::Other(e.to_string()))?;

    let mut single = MultiBandRaster::new(vec!["band_1".to_string()], data)?;
    single.set_transform(*raster.transform());
    single.set_nodata(raster.nodata().and_then(|v| v.to_f64()));

    let file = File::create(path.as_ref())?;
    encode_bands(&single, file, &options.unwrap_or_default())
}

/// Write a MultiBandRaster to a GeoTIFF file, one 32-bit float page per band
pub fn write_multiband_geotiff<P: AsRef<Path>>(
    raster: &MultiBandRaster,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()> {
    let file = File::create(path.as_ref())?;
    encode_bands(raster, file, &options.unwrap_or_default())
}

/// Write a MultiBandRaster to an in-memory GeoTIFF buffer
pub fn write_multiband_geotiff_to_buffer(
    raster: &MultiBandRaster,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_bands(raster, Cursor::new(&mut buf), &options.unwrap_or_default())?;
    Ok(buf)
}

fn encode_bands<W: Write + Seek>(
    raster: &MultiBandRaster,
    writer: W,
    options: &GeoTiffOptions,
) -> Result<()> {
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| Error::Other(format!("TIFF encoder error: {}", e)))?;

    let (rows, cols) = raster.shape();
    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    // GeoKey directory v1.1.0: ModelTypeProjected, RasterPixelIsArea
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    let nodata = raster
        .nodata()
        .filter(|_| options.write_nodata)
        .map(|v| v.to_string());

    for band in raster.data().axis_iter(Axis(0)) {
        let data: Vec<f32> = band.iter().map(|&v| v as f32).collect();

        let mut image = encoder
            .new_image::<Gray32Float>(cols as u32, rows as u32)
            .map_err(|e| Error::Other(format!("Cannot create TIFF image: {}", e)))?;

        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &scale[..])
            .map_err(|e| Error::Other(format!("Cannot write scale tag: {}", e)))?;
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), &tiepoint[..])
            .map_err(|e| Error::Other(format!("Cannot write tiepoint tag: {}", e)))?;
        image
            .encoder()
            .write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), &geokeys[..])
            .map_err(|e| Error::Other(format!("Cannot write geokey tag: {}", e)))?;
        if let Some(text) = &nodata {
            image
                .encoder()
                .write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), text.as_str())
                .map_err(|e| Error::Other(format!("Cannot write nodata tag: {}", e)))?;
        }

        image
            .write_data(&data)
            .map_err(|e| Error::Other(format!("Cannot write image data: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> MultiBandRaster {
        let values: Vec<f64> = (0..12).map(|v| v as f64 * 0.5).collect();
        let data = Array3::from_shape_vec((2, 2, 3), values).unwrap();
        let mut mb = MultiBandRaster::new(vec!["a".into(), "b".into()], data).unwrap();
        mb.set_transform(GeoTransform::new(500.0, 1000.0, 30.0, -30.0));
        mb
    }

    #[test]
    fn test_multiband_buffer_roundtrip() {
        let mb = sample();
        let bytes = write_multiband_geotiff_to_buffer(&mb, None).unwrap();
        let back = read_multiband_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.band_count(), 2);
        assert_eq!(back.shape(), (2, 3));
        assert_eq!(back.band_names()[1], "band_2");
        assert_relative_eq!(back.band(1).unwrap()[[1, 2]], 5.5, epsilon = 1e-6);
        assert_relative_eq!(back.transform().origin_x, 500.0, epsilon = 1e-9);
        assert_relative_eq!(back.transform().pixel_height, -30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nodata_tag_roundtrip() {
        let mut mb = sample();
        mb.set_nodata(Some(-9999.0));
        let bytes = write_multiband_geotiff_to_buffer(&mb, None).unwrap();
        let back = read_multiband_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(back.nodata(), Some(-9999.0));

        let bytes = write_multiband_geotiff_to_buffer(&mb, Some(GeoTiffOptions { write_nodata: false })).unwrap();
        let back = read_multiband_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(back.nodata(), None);
    }

    #[test]
    fn test_fractional_nodata_detected_after_roundtrip() {
        let data = Array3::from_shape_vec((1, 2, 2), vec![0.1, 1.0, 2.0, 3.0]).unwrap();
        let mut mb = MultiBandRaster::new(vec!["a".into()], data).unwrap();
        mb.set_nodata(Some(0.1));

        let bytes = write_multiband_geotiff_to_buffer(&mb, None).unwrap();
        let back = read_multiband_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.valid_count(0), 3);
        assert!(back.is_nodata(back.band(0).unwrap()[[0, 0]]));
        assert!(!back.is_nodata(back.band(0).unwrap()[[0, 1]]));
    }

    #[test]
    fn test_nan_survives_roundtrip() {
        let mut mb = sample();
        mb.data_mut()[[0, 0, 0]] = f64::NAN;
        let bytes = write_multiband_geotiff_to_buffer(&mb, None).unwrap();
        let back = read_multiband_geotiff_from_buffer(&bytes).unwrap();
        assert!(back.band(0).unwrap()[[0, 0]].is_nan());
        assert_eq!(back.valid_count(0), 5);
    }
}
