//! In-memory GeoTIFF payload builders.
//!
//! Payloads are written with the `tiff` encoder plus the GeoTIFF tags a
//! backend raster would carry (pixel scale, tiepoint, GeoKey directory and,
//! optionally, the GDAL no-data tag).

use std::io::Cursor;

use tiff::encoder::colortype::{Gray16, Gray32Float, RGB32Float};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Sample encoding of the generated payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Float32,
    UInt16,
    /// Three interleaved float bands; band `b` holds `value + b * 100`.
    Rgb32,
}

/// Builder for single-image GeoTIFF payloads.
///
/// # Example
///
/// ```
/// use test_utils::GeoTiffBuilder;
///
/// let bytes = GeoTiffBuilder::new(4, 4)
///     .origin(5.0, 48.0)
///     .pixel_size(0.5, 0.5)
///     .build();
/// assert_eq!(&bytes[0..2], b"II");
/// ```
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: u32,
    height: u32,
    samples: Vec<f32>,
    origin: (f64, f64),
    pixel_size: (f64, f64),
    epsg: Option<u16>,
    projected: bool,
    no_data: Option<String>,
    use_transformation: bool,
    georeferenced: bool,
    kind: SampleKind,
}

impl GeoTiffBuilder {
    /// A `width` x `height` raster of zeros, one degree per pixel, with its
    /// north-west corner at (0, `height`).
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            samples: vec![0.0; (width * height) as usize],
            origin: (0.0, height as f64),
            pixel_size: (1.0, 1.0),
            epsg: Some(4326),
            projected: false,
            no_data: None,
            use_transformation: false,
            georeferenced: true,
            kind: SampleKind::Float32,
        }
    }

    pub fn samples(mut self, samples: Vec<f32>) -> Self {
        self.samples = samples;
        self
    }

    /// North-west corner in CRS units.
    pub fn origin(mut self, x: f64, y: f64) -> Self {
        self.origin = (x, y);
        self
    }

    pub fn pixel_size(mut self, width: f64, height: f64) -> Self {
        self.pixel_size = (width, height);
        self
    }

    /// Geographic CRS code (GeographicTypeGeoKey).
    pub fn geographic_epsg(mut self, code: u16) -> Self {
        self.epsg = Some(code);
        self.projected = false;
        self
    }

    /// Projected CRS code (ProjectedCSTypeGeoKey).
    pub fn projected_epsg(mut self, code: u16) -> Self {
        self.epsg = Some(code);
        self.projected = true;
        self
    }

    /// Omit the GeoKey directory entirely.
    pub fn without_geo_keys(mut self) -> Self {
        self.epsg = None;
        self
    }

    /// Write a GDAL_NODATA tag with this literal text.
    pub fn no_data(mut self, value: &str) -> Self {
        self.no_data = Some(value.to_string());
        self
    }

    /// Georeference with ModelTransformation instead of scale + tiepoint.
    pub fn with_transformation(mut self) -> Self {
        self.use_transformation = true;
        self
    }

    /// Omit every georeferencing tag.
    pub fn without_georeference(mut self) -> Self {
        self.georeferenced = false;
        self
    }

    pub fn kind(mut self, kind: SampleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Encode the payload.
    pub fn build(&self) -> Vec<u8> {
        self.try_build().unwrap_or_else(|e| panic!("failed to encode test GeoTIFF: {}", e))
    }

    fn try_build(&self) -> tiff::TiffResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor)?;
            match self.kind {
                SampleKind::Float32 => {
                    let mut image = encoder.new_image::<Gray32Float>(self.width, self.height)?;
                    self.write_geo_tags(image.encoder())?;
                    image.write_data(&self.samples)?;
                }
                SampleKind::UInt16 => {
                    let data: Vec<u16> = self.samples.iter().map(|v| *v as u16).collect();
                    let mut image = encoder.new_image::<Gray16>(self.width, self.height)?;
                    self.write_geo_tags(image.encoder())?;
                    image.write_data(&data)?;
                }
                SampleKind::Rgb32 => {
                    let data: Vec<f32> = self
                        .samples
                        .iter()
                        .flat_map(|v| [*v, *v + 100.0, *v + 200.0])
                        .collect();
                    let mut image = encoder.new_image::<RGB32Float>(self.width, self.height)?;
                    self.write_geo_tags(image.encoder())?;
                    image.write_data(&data)?;
                }
            }
        }
        Ok(cursor.into_inner())
    }

    fn write_geo_tags<W: std::io::Write + std::io::Seek, K: TiffKind>(
        &self,
        dir: &mut DirectoryEncoder<W, K>,
    ) -> tiff::TiffResult<()> {
        let (x, y) = self.origin;
        let (sx, sy) = self.pixel_size;

        if self.georeferenced {
            if self.use_transformation {
                let matrix = [
                    sx, 0.0, 0.0, x, //
                    0.0, -sy, 0.0, y, //
                    0.0, 0.0, 0.0, 0.0, //
                    0.0, 0.0, 0.0, 1.0,
                ];
                dir.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), &matrix[..])?;
            } else {
                dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &[sx, sy, 0.0][..])?;
                dir.write_tag(
                    Tag::Unknown(MODEL_TIEPOINT),
                    &[0.0, 0.0, 0.0, x, y, 0.0][..],
                )?;
            }
        }

        if let Some(code) = self.epsg {
            let (model, key) = if self.projected { (1, 3072) } else { (2, 2048) };
            let keys: [u16; 12] = [
                1, 1, 0, 2, //
                1024, 0, 1, model, //
                key, 0, 1, code,
            ];
            dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &keys[..])?;
        }

        if let Some(no_data) = &self.no_data {
            dir.write_tag(Tag::Unknown(GDAL_NODATA), no_data.as_str())?;
        }
        Ok(())
    }
}
