//! GeoTIFF decoding.
//!
//! Georeferencing is read from the GeoTIFF tags:
//! - `ModelPixelScale` (33550) + `ModelTiepoint` (33922), or
//! - `ModelTransformation` (34264) for north-up rasters
//!
//! The CRS comes from the GeoKey directory (34735) and defaults to EPSG:4326.
//! Samples equal to the GDAL no-data value (42113) decode to NaN.

use std::io::{Cursor, Read, Seek};

use ntl_common::CrsCode;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::debug;

use crate::dataset::{GeoTransform, RasterDataset};
use crate::error::{RasterError, RasterResult};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;
const USER_DEFINED: u16 = 32767;

/// Decode a GeoTIFF payload into a [`RasterDataset`].
///
/// Multi-band rasters must be pixel-interleaved; every band is kept.
pub fn decode_geotiff(bytes: &[u8]) -> RasterResult<RasterDataset> {
    let mut decoder = Decoder::new(Cursor::new(bytes))?.with_limits(Limits::unlimited());

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    let transform = read_transform(&mut decoder)?;
    let crs = read_crs(&mut decoder)?;
    let no_data = read_no_data(&mut decoder)?;

    let mut samples = to_f32(decoder.read_image()?)?;
    if let Some(nd) = no_data {
        let nd = nd as f32;
        for v in samples.iter_mut().filter(|v| **v == nd) {
            *v = f32::NAN;
        }
    }

    let bands = split_bands(samples, width * height)?;
    debug!(
        width = width,
        height = height,
        bands = bands.len(),
        crs = %crs,
        no_data = ?no_data,
        "Decoded GeoTIFF"
    );

    Ok(RasterDataset::new(width, height, bands, transform, crs)?.with_no_data(no_data))
}

fn find_f64_vec<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    code: u16,
) -> RasterResult<Option<Vec<f64>>> {
    match decoder.find_tag(Tag::from_u16_exhaustive(code))? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<GeoTransform> {
    if let Some(m) = find_f64_vec(decoder, MODEL_TRANSFORMATION)? {
        if m.len() < 16 {
            return Err(RasterError::InvalidFormat(format!(
                "ModelTransformation has {} values, expected 16",
                m.len()
            )));
        }
        if m[1] != 0.0 || m[4] != 0.0 {
            return Err(RasterError::InvalidFormat(
                "rotated rasters are not supported".to_string(),
            ));
        }
        return Ok(GeoTransform {
            origin_x: m[3],
            origin_y: m[7],
            pixel_width: m[0],
            pixel_height: -m[5],
        });
    }

    let scale = find_f64_vec(decoder, MODEL_PIXEL_SCALE)?;
    let tiepoint = find_f64_vec(decoder, MODEL_TIEPOINT)?;
    match (scale, tiepoint) {
        (Some(scale), Some(tp)) if scale.len() >= 2 && tp.len() >= 6 => {
            let (sx, sy) = (scale[0], scale[1]);
            Ok(GeoTransform {
                origin_x: tp[3] - tp[0] * sx,
                origin_y: tp[4] + tp[1] * sy,
                pixel_width: sx,
                pixel_height: sy,
            })
        }
        (Some(_), Some(_)) => Err(RasterError::InvalidFormat(
            "truncated ModelPixelScale or ModelTiepoint".to_string(),
        )),
        _ => Err(RasterError::MissingGeoreference(
            "expected ModelPixelScale and ModelTiepoint, or ModelTransformation".to_string(),
        )),
    }
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<CrsCode> {
    let keys = match decoder.find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))? {
        Some(value) => value.into_u16_vec()?,
        None => return Ok(CrsCode::Epsg4326),
    };
    Ok(crs_from_geo_keys(&keys).unwrap_or(CrsCode::Epsg4326))
}

/// Resolve an EPSG code from a GeoKey directory, preferring the projected CS.
fn crs_from_geo_keys(keys: &[u16]) -> Option<CrsCode> {
    let count = *keys.get(3)? as usize;
    let mut geographic = None;
    let mut projected = None;

    for entry in keys.get(4..)?.chunks_exact(4).take(count) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        // Only inline SHORT values carry EPSG codes.
        if location != 0 || value == USER_DEFINED {
            continue;
        }
        match key {
            GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(value),
            PROJECTED_CS_TYPE_GEO_KEY => projected = Some(value),
            _ => {}
        }
    }

    projected.or(geographic).map(CrsCode::from_epsg)
}

fn read_no_data<R: Read + Seek>(decoder: &mut Decoder<R>) -> RasterResult<Option<f64>> {
    let text = match decoder.find_tag(Tag::from_u16_exhaustive(GDAL_NODATA))? {
        Some(value) => value.into_string()?,
        None => return Ok(None),
    };
    let parsed = text.trim_matches(char::from(0)).trim().parse::<f64>().ok();
    if parsed.is_none() {
        debug!(value = %text, "Ignoring unparseable GDAL_NODATA");
    }
    Ok(parsed)
}

fn to_f32(result: DecodingResult) -> RasterResult<Vec<f32>> {
    #[allow(unreachable_patterns)]
    let samples = match result {
        DecodingResult::U8(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U16(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I16(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => {
            return Err(RasterError::InvalidFormat(
                "unsupported sample format".to_string(),
            ))
        }
    };
    Ok(samples)
}

/// De-interleave chunky samples into one vector per band.
fn split_bands(samples: Vec<f32>, pixels: usize) -> RasterResult<Vec<Vec<f32>>> {
    if pixels == 0 || samples.is_empty() {
        return Err(RasterError::Empty);
    }
    if samples.len() % pixels != 0 {
        return Err(RasterError::InvalidFormat(format!(
            "{} samples do not divide into {} pixels",
            samples.len(),
            pixels
        )));
    }

    let band_count = samples.len() / pixels;
    if band_count == 1 {
        return Ok(vec![samples]);
    }

    let mut bands = vec![Vec::with_capacity(pixels); band_count];
    for pixel in samples.chunks_exact(band_count) {
        for (band, &v) in bands.iter_mut().zip(pixel) {
            band.push(v);
        }
    }
    Ok(bands)
}
