//! GeoTIFF raster driver built on the `tiff` crate.
//!
//! Each band is stored as its own single-sample page, in band order.
//! Georeferencing and the GDAL metadata XML live on the first page:
//! north-up transforms as ModelPixelScale + ModelTiepoint, rotated ones as
//! ModelTransformation, ground control points as a list of tiepoints with
//! no pixel scale. The projection string is kept in GeoAsciiParams and
//! referenced from the GeoKey directory's citation key. Non-ASCII text in
//! either ASCII tag is stored as XML character references.

use std::fs::File;
use std::io::{BufReader, Cursor, ErrorKind, Read, Seek, Write};
use std::path::{Path, PathBuf};

use ndarray::{Array2, Array3, ArrayD, ArrayView2, Axis};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;
use tracing::{debug, info};

use crate::image_pipeline::common::error::{PipelineError, Result};
use crate::image_pipeline::image::{DataType, Gcp, GeoTransform, Tags};
use crate::image_pipeline::raster::driver::check_band_write;
use crate::image_pipeline::raster::gdal_metadata::{self, GdalMetadata};
use crate::image_pipeline::raster::{RasterDataset, RasterDriver, RasterType};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_ASCII_PARAMS: u16 = 34737;
const GDAL_METADATA: u16 = 42112;

const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GT_CITATION_GEO_KEY: u16 = 1026;
const RASTER_PIXEL_IS_AREA: u16 = 1;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

fn decode_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Decode(e.to_string())
}

fn encode_err(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Encode(e.to_string())
}

/// Driver for GeoTIFF files.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffDriver;

impl GeoTiffDriver {
    pub const NAME: &'static str = "GTiff";
}

impl RasterDriver for GeoTiffDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn open(&self, path: &Path) -> Result<Option<Box<dyn RasterDataset>>> {
        Ok(GeoTiffDataset::open(path)?.map(|ds| Box::new(ds) as Box<dyn RasterDataset>))
    }

    fn create(
        &self,
        path: &Path,
        cols: usize,
        rows: usize,
        bands: usize,
        raster_type: RasterType,
    ) -> Result<Box<dyn RasterDataset>> {
        Ok(Box::new(GeoTiffDataset::create(path, cols, rows, bands, raster_type)?))
    }
}

/// A GeoTIFF held fully in memory.
///
/// Opening decodes every page up front. A created dataset is written to
/// its path, replacing any existing file, on [`RasterDataset::flush`].
#[derive(Debug, Clone)]
pub struct GeoTiffDataset {
    path: PathBuf,
    raster_type: RasterType,
    data_type: DataType,
    pixels: Array3<f64>,
    geo_transform: Option<GeoTransform>,
    projection_ref: String,
    gcps: Vec<Gcp>,
    gcp_projection: String,
    tags: Tags,
    band_tags: Vec<Tags>,
}

#[derive(Debug, Default)]
struct Georeferencing {
    geo_transform: Option<GeoTransform>,
    gcps: Vec<Gcp>,
    citation: String,
}

impl GeoTiffDataset {
    /// `Ok(None)` when the file is missing or is not a TIFF.
    pub fn open(path: &Path) -> Result<Option<Self>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let decoder = match Decoder::new(BufReader::new(file)) {
            Ok(decoder) => decoder,
            Err(e) => {
                debug!("{} is not a TIFF: {}", path.display(), e);
                return Ok(None);
            }
        };
        Self::decode(path, decoder).map(Some)
    }

    pub fn create(path: &Path, cols: usize, rows: usize, bands: usize, raster_type: RasterType) -> Result<Self> {
        if cols == 0 || rows == 0 || bands == 0 {
            return Err(PipelineError::Encode(format!(
                "cannot create an empty raster ({} bands, {}x{})",
                bands, rows, cols
            )));
        }
        debug!("Creating GeoTIFF {}: {} bands, {}x{}, {}", path.display(), bands, rows, cols, raster_type);
        Ok(Self {
            path: path.to_path_buf(),
            raster_type,
            data_type: raster_type.data_type(),
            pixels: Array3::zeros((bands, rows, cols)),
            geo_transform: None,
            projection_ref: String::new(),
            gcps: Vec::new(),
            gcp_projection: String::new(),
            tags: Tags::new(),
            band_tags: vec![Tags::new(); bands],
        })
    }

    fn decode<R: Read + Seek>(path: &Path, mut decoder: Decoder<R>) -> Result<Self> {
        let (width, height) = decoder.dimensions().map_err(decode_err)?;
        let (cols, rows) = (width as usize, height as usize);
        if cols == 0 || rows == 0 {
            return Err(PipelineError::Decode(format!("{} has an empty first page", path.display())));
        }

        let georef = read_georeferencing(&mut decoder)?;
        let metadata = match decoder.find_tag(tag(GDAL_METADATA)).map_err(decode_err)? {
            Some(value) => gdal_metadata::parse(&value.into_string().map_err(decode_err)?)?,
            None => GdalMetadata::default(),
        };

        let mut bands: Vec<Array2<f64>> = Vec::new();
        let mut data_type: Option<DataType> = None;
        loop {
            let (w, h) = decoder.dimensions().map_err(decode_err)?;
            if (w as usize, h as usize) == (cols, rows) {
                let (page_type, values) = decode_samples(decoder.read_image().map_err(decode_err)?)?;
                data_type = Some(data_type.map_or(page_type, |dt| dt.promote(page_type)));

                let samples = (values.len() / (cols * rows)).max(1);
                for sample in 0..samples {
                    let band: Vec<f64> = values.iter().skip(sample).step_by(samples).copied().collect();
                    bands.push(Array2::from_shape_vec((rows, cols), band)?);
                }
            } else {
                debug!("Skipping {}x{} page (overview or mask)", w, h);
            }

            if !decoder.more_images() {
                break;
            }
            decoder.next_image().map_err(decode_err)?;
        }

        let views: Vec<ArrayView2<'_, f64>> = bands.iter().map(|b| b.view()).collect();
        let pixels = ndarray::stack(Axis(0), &views)?;
        let data_type = data_type.unwrap_or_default();
        let band_tags = (0..bands.len())
            .map(|i| metadata.bands.get(&i).cloned().unwrap_or_default())
            .collect();

        let (projection_ref, gcp_projection) = if georef.gcps.is_empty() {
            (georef.citation, String::new())
        } else {
            (String::new(), georef.citation)
        };

        info!(
            path = %path.display(),
            bands = bands.len(),
            rows,
            cols,
            data_type = %data_type,
            "Opened GeoTIFF"
        );

        Ok(Self {
            path: path.to_path_buf(),
            raster_type: RasterType::from_data_type(data_type).unwrap_or(RasterType::Float64),
            data_type,
            pixels,
            geo_transform: georef.geo_transform,
            projection_ref,
            gcps: georef.gcps,
            gcp_projection,
            tags: metadata.global,
            band_tags,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn page_tags(&self) -> Result<PageTags> {
        let mut page = PageTags::default();

        let citation = if !self.gcps.is_empty() {
            let tiepoints = self
                .gcps
                .iter()
                .flat_map(|g| [g.pixel, g.line, 0.0, g.x, g.y, g.z])
                .collect();
            page.tiepoints = Some(tiepoints);
            &self.gcp_projection
        } else if let Some(gt) = self.geo_transform {
            if gt.has_rotation() {
                page.transformation = Some(vec![
                    gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
                    gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
                    0.0, 0.0, 0.0, 0.0,
                    0.0, 0.0, 0.0, 1.0,
                ]);
            } else {
                page.pixel_scale = Some(vec![gt.pixel_width, -gt.pixel_height, 0.0]);
                page.tiepoints = Some(vec![0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0]);
            }
            &self.projection_ref
        } else {
            &self.projection_ref
        };

        if !citation.is_empty() {
            page.citation = Some(gdal_metadata::encode_ascii(citation));
        }
        if !self.tags.is_empty() {
            page.gdal_metadata = Some(gdal_metadata::to_xml(&self.tags)?);
        }
        Ok(page)
    }

    fn encode<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut encoder = TiffEncoder::new(writer).map_err(encode_err)?;
        let page_tags = self.page_tags()?;

        for (index, band) in self.pixels.axis_iter(Axis(0)).enumerate() {
            let tags = (index == 0).then_some(&page_tags);
            match self.raster_type {
                RasterType::Byte => write_page::<colortype::Gray8, _, _>(&mut encoder, band, tags)?,
                RasterType::Int8 => write_page::<colortype::GrayI8, _, _>(&mut encoder, band, tags)?,
                RasterType::UInt16 => write_page::<colortype::Gray16, _, _>(&mut encoder, band, tags)?,
                RasterType::Int16 => write_page::<colortype::GrayI16, _, _>(&mut encoder, band, tags)?,
                RasterType::UInt32 => write_page::<colortype::Gray32, _, _>(&mut encoder, band, tags)?,
                RasterType::Int32 => write_page::<colortype::GrayI32, _, _>(&mut encoder, band, tags)?,
                RasterType::Float32 => write_page::<colortype::Gray32Float, _, _>(&mut encoder, band, tags)?,
                RasterType::Float64 => write_page::<colortype::Gray64Float, _, _>(&mut encoder, band, tags)?,
            }
        }
        Ok(())
    }
}

impl RasterDataset for GeoTiffDataset {
    fn raster_count(&self) -> usize {
        self.pixels.len_of(Axis(0))
    }

    fn size(&self) -> (usize, usize) {
        let (_, rows, cols) = self.pixels.dim();
        (cols, rows)
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn read_all(&self) -> Result<ArrayD<f64>> {
        if self.raster_count() == 1 {
            Ok(self.pixels.index_axis(Axis(0), 0).to_owned().into_dyn())
        } else {
            Ok(self.pixels.clone().into_dyn())
        }
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn projection_ref(&self) -> String {
        self.projection_ref.clone()
    }

    fn gcps(&self) -> Vec<Gcp> {
        self.gcps.clone()
    }

    fn gcp_projection(&self) -> String {
        self.gcp_projection.clone()
    }

    fn global_tags(&self) -> Tags {
        self.tags.clone()
    }

    fn band_tags(&self, band: usize) -> Tags {
        band.checked_sub(1)
            .and_then(|i| self.band_tags.get(i))
            .cloned()
            .unwrap_or_default()
    }

    fn write_band(&mut self, band: usize, data: ArrayView2<'_, f64>) -> Result<()> {
        let (bands, rows, cols) = self.pixels.dim();
        check_band_write(band, bands, &data, rows, cols)?;
        self.pixels.index_axis_mut(Axis(0), band - 1).assign(&data);
        Ok(())
    }

    fn set_geo_transform(&mut self, geo_transform: GeoTransform) -> Result<()> {
        self.geo_transform = Some(geo_transform);
        self.gcps.clear();
        self.gcp_projection.clear();
        Ok(())
    }

    fn set_projection_ref(&mut self, projection: &str) -> Result<()> {
        self.projection_ref = projection.to_string();
        Ok(())
    }

    fn set_gcps(&mut self, gcps: &[Gcp], projection: &str) -> Result<()> {
        self.gcps = gcps.to_vec();
        self.gcp_projection = projection.to_string();
        self.geo_transform = None;
        Ok(())
    }

    fn set_global_tags(&mut self, tags: &Tags) -> Result<()> {
        self.tags = tags.clone();
        Ok(())
    }

    /// Encodes the whole file in memory first; the destination is only
    /// touched once encoding has succeeded.
    fn flush(&mut self) -> Result<()> {
        let mut buffer = Cursor::new(Vec::new());
        self.encode(&mut buffer)?;

        let mut file = File::create(&self.path)?;
        file.write_all(buffer.get_ref())?;
        file.flush()?;
        debug!("Flushed GeoTIFF {} ({} bytes)", self.path.display(), buffer.get_ref().len());
        Ok(())
    }
}

/// Tags written on the first page only.
#[derive(Debug, Default)]
struct PageTags {
    pixel_scale: Option<Vec<f64>>,
    tiepoints: Option<Vec<f64>>,
    transformation: Option<Vec<f64>>,
    citation: Option<String>,
    gdal_metadata: Option<String>,
}

impl PageTags {
    fn has_georeferencing(&self) -> bool {
        self.pixel_scale.is_some() || self.tiepoints.is_some() || self.transformation.is_some()
    }

    fn write<W: Write + Seek, K: TiffKind>(&self, dir: &mut DirectoryEncoder<'_, W, K>) -> Result<()> {
        if let Some(scale) = &self.pixel_scale {
            dir.write_tag(tag(MODEL_PIXEL_SCALE), scale.as_slice()).map_err(encode_err)?;
        }
        if let Some(tiepoints) = &self.tiepoints {
            dir.write_tag(tag(MODEL_TIEPOINT), tiepoints.as_slice()).map_err(encode_err)?;
        }
        if let Some(transformation) = &self.transformation {
            dir.write_tag(tag(MODEL_TRANSFORMATION), transformation.as_slice())
                .map_err(encode_err)?;
        }

        if self.has_georeferencing() || self.citation.is_some() {
            let mut keys: Vec<u16> = vec![GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA];
            if let Some(citation) = &self.citation {
                let count = u16::try_from(citation.len() + 1).map_err(|_| {
                    PipelineError::Encode(format!(
                        "projection string of {} bytes does not fit a GeoKey citation",
                        citation.len()
                    ))
                })?;
                keys.extend([GT_CITATION_GEO_KEY, GEO_ASCII_PARAMS, count, 0]);
            }
            let mut directory: Vec<u16> = vec![1, 1, 0, (keys.len() / 4) as u16];
            directory.extend(keys);
            dir.write_tag(tag(GEO_KEY_DIRECTORY), directory.as_slice())
                .map_err(encode_err)?;
        }
        if let Some(citation) = &self.citation {
            let ascii = format!("{}|", citation);
            dir.write_tag(tag(GEO_ASCII_PARAMS), ascii.as_str()).map_err(encode_err)?;
        }
        if let Some(xml) = &self.gdal_metadata {
            dir.write_tag(tag(GDAL_METADATA), xml.as_str()).map_err(encode_err)?;
        }
        Ok(())
    }
}

/// Storage element a band is cast to before encoding.
trait Sample: Copy {
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_sample {
    ($($t:ty),*) => {
        $(impl Sample for $t {
            fn from_f64(value: f64) -> Self {
                value as $t
            }
        })*
    };
}

impl_sample!(u8, i8, u16, i16, u32, i32, f32, f64);

fn write_page<C, T, W>(
    encoder: &mut TiffEncoder<W>,
    band: ArrayView2<'_, f64>,
    tags: Option<&PageTags>,
) -> Result<()>
where
    C: ColorType<Inner = T>,
    T: Sample,
    [T]: TiffValue,
    W: Write + Seek,
{
    let (rows, cols) = band.dim();
    let samples: Vec<T> = band.iter().map(|&v| T::from_f64(v)).collect();
    let mut image = encoder
        .new_image::<C>(cols as u32, rows as u32)
        .map_err(encode_err)?;
    if let Some(tags) = tags {
        tags.write(image.encoder())?;
    }
    image.write_data(&samples).map_err(encode_err)
}

fn decode_samples(result: DecodingResult) -> Result<(DataType, Vec<f64>)> {
    let decoded = match result {
        DecodingResult::U8(buf) => (DataType::UInt8, buf.into_iter().map(f64::from).collect()),
        DecodingResult::I8(buf) => (DataType::Int8, buf.into_iter().map(f64::from).collect()),
        DecodingResult::U16(buf) => (DataType::UInt16, buf.into_iter().map(f64::from).collect()),
        DecodingResult::I16(buf) => (DataType::Int16, buf.into_iter().map(f64::from).collect()),
        DecodingResult::U32(buf) => (DataType::UInt32, buf.into_iter().map(f64::from).collect()),
        DecodingResult::I32(buf) => (DataType::Int32, buf.into_iter().map(f64::from).collect()),
        DecodingResult::U64(buf) => (DataType::UInt64, buf.into_iter().map(|v| v as f64).collect()),
        DecodingResult::I64(buf) => (DataType::Int64, buf.into_iter().map(|v| v as f64).collect()),
        DecodingResult::F32(buf) => (DataType::Float32, buf.into_iter().map(f64::from).collect()),
        DecodingResult::F64(buf) => (DataType::Float64, buf),
        #[allow(unreachable_patterns)]
        _ => return Err(PipelineError::Decode("unsupported TIFF sample format".into())),
    };
    Ok(decoded)
}

fn read_f64_tag<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> Result<Option<Vec<f64>>> {
    match decoder.find_tag(tag(code)).map_err(decode_err)? {
        Some(value) => Ok(Some(value.into_f64_vec().map_err(decode_err)?)),
        None => Ok(None),
    }
}

fn read_georeferencing<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<Georeferencing> {
    let mut georef = Georeferencing::default();

    if let Some(value) = decoder.find_tag(tag(GEO_ASCII_PARAMS)).map_err(decode_err)? {
        let ascii = value.into_string().map_err(decode_err)?;
        georef.citation = gdal_metadata::decode_ascii(ascii.split('|').next().unwrap_or_default())?;
    }

    let transformation = read_f64_tag(decoder, MODEL_TRANSFORMATION)?;
    let scale = read_f64_tag(decoder, MODEL_PIXEL_SCALE)?;
    let tiepoints = read_f64_tag(decoder, MODEL_TIEPOINT)?;

    match (transformation, scale, tiepoints) {
        (Some(t), _, _) if t.len() >= 8 => {
            georef.geo_transform = Some(GeoTransform::from_coefficients([t[3], t[0], t[1], t[7], t[4], t[5]]));
        }
        (_, Some(s), Some(tp)) if s.len() >= 2 && tp.len() >= 6 => {
            let origin_x = tp[3] - tp[0] * s[0];
            let origin_y = tp[4] + tp[1] * s[1];
            georef.geo_transform = Some(GeoTransform::new(origin_x, origin_y, s[0], -s[1]));
        }
        (_, None, Some(tp)) => {
            georef.gcps = tp
                .chunks_exact(6)
                .enumerate()
                .map(|(i, c)| Gcp {
                    id: (i + 1).to_string(),
                    info: String::new(),
                    pixel: c[0],
                    line: c[1],
                    x: c[3],
                    y: c[4],
                    z: c[5],
                })
                .collect();
        }
        _ => {}
    }

    Ok(georef)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn decode_bytes(bytes: Vec<u8>) -> GeoTiffDataset {
        let decoder = Decoder::new(Cursor::new(bytes)).unwrap();
        GeoTiffDataset::decode(Path::new("memory.tif"), decoder).unwrap()
    }

    fn encode_bytes(dataset: &GeoTiffDataset) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        dataset.encode(&mut buffer).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_multiband_pages_round_trip() {
        let mut dataset = GeoTiffDataset::create(Path::new("unused.tif"), 3, 2, 2, RasterType::Int16).unwrap();
        dataset.write_band(1, array![[1.0, -2.0, 3.0], [4.0, 5.0, -6.0]].view()).unwrap();
        dataset.write_band(2, array![[7.0, 8.0, 9.0], [10.0, 11.0, 12.0]].view()).unwrap();

        let decoded = decode_bytes(encode_bytes(&dataset));
        assert_eq!(decoded.raster_count(), 2);
        assert_eq!(decoded.size(), (3, 2));
        assert_eq!(decoded.data_type(), DataType::Int16);
        assert_eq!(decoded.pixels, dataset.pixels);
    }

    #[test]
    fn test_north_up_transform_round_trip() {
        let mut dataset = GeoTiffDataset::create(Path::new("unused.tif"), 2, 2, 1, RasterType::Float32).unwrap();
        let gt = GeoTransform::new(440720.0, 3751320.0, 60.0, -60.0);
        dataset.set_geo_transform(gt).unwrap();
        dataset.set_projection_ref("EPSG:32611").unwrap();

        let decoded = decode_bytes(encode_bytes(&dataset));
        assert_eq!(decoded.geo_transform(), Some(gt));
        assert_eq!(decoded.projection_ref(), "EPSG:32611");
        assert!(decoded.gcps().is_empty());
    }

    #[test]
    fn test_rotated_transform_round_trip() {
        let mut dataset = GeoTiffDataset::create(Path::new("unused.tif"), 2, 2, 1, RasterType::Byte).unwrap();
        let gt = GeoTransform::from_coefficients([10.0, 1.0, 0.5, 20.0, 0.25, -1.0]);
        dataset.set_geo_transform(gt).unwrap();

        let decoded = decode_bytes(encode_bytes(&dataset));
        assert_eq!(decoded.geo_transform(), Some(gt));
    }

    #[test]
    fn test_gcps_round_trip() {
        let mut dataset = GeoTiffDataset::create(Path::new("unused.tif"), 2, 2, 1, RasterType::Byte).unwrap();
        let gcps = vec![
            Gcp::new(0.0, 0.0, 100.0, 200.0, 0.0),
            Gcp::new(2.0, 2.0, 104.0, 196.0, 1.5),
        ];
        dataset.set_gcps(&gcps, "EPSG:4326").unwrap();

        let decoded = decode_bytes(encode_bytes(&dataset));
        assert_eq!(decoded.geo_transform(), None);
        assert_eq!(decoded.gcp_projection(), "EPSG:4326");
        assert_eq!(decoded.projection_ref(), "");
        let points: Vec<_> = decoded.gcps().iter().map(|g| (g.pixel, g.line, g.x, g.y, g.z)).collect();
        assert_eq!(points, vec![(0.0, 0.0, 100.0, 200.0, 0.0), (2.0, 2.0, 104.0, 196.0, 1.5)]);
    }

    #[test]
    fn test_global_tags_round_trip() {
        let mut dataset = GeoTiffDataset::create(Path::new("unused.tif"), 1, 1, 1, RasterType::Byte).unwrap();
        let mut tags = Tags::new();
        tags.insert("SENSOR".into(), "MSI".into());
        dataset.set_global_tags(&tags).unwrap();

        let decoded = decode_bytes(encode_bytes(&dataset));
        assert_eq!(decoded.global_tags(), tags);
        assert!(decoded.band_tags(1).is_empty());
    }

    #[test]
    fn test_non_ascii_text_round_trip() {
        let mut dataset = GeoTiffDataset::create(Path::new("unused.tif"), 1, 1, 1, RasterType::Byte).unwrap();
        let mut tags = Tags::new();
        tags.insert("DESCRIPTION".into(), "Zürich Süd".into());
        dataset.set_global_tags(&tags).unwrap();
        dataset.set_geo_transform(GeoTransform::new(0.0, 0.0, 1.0, -1.0)).unwrap();
        dataset.set_projection_ref(r#"LOCAL_CS["Gauß-Krüger"]"#).unwrap();

        let decoded = decode_bytes(encode_bytes(&dataset));
        assert_eq!(decoded.global_tags(), tags);
        assert_eq!(decoded.projection_ref(), r#"LOCAL_CS["Gauß-Krüger"]"#);
    }

    #[test]
    fn test_oversized_projection_is_an_encode_error() {
        let mut dataset = GeoTiffDataset::create(Path::new("unused.tif"), 1, 1, 1, RasterType::Byte).unwrap();
        dataset.set_geo_transform(GeoTransform::default()).unwrap();
        dataset.set_projection_ref(&"X".repeat(u16::MAX as usize)).unwrap();

        let mut buffer = Cursor::new(Vec::new());
        assert!(matches!(dataset.encode(&mut buffer), Err(PipelineError::Encode(_))));
    }

    #[test]
    fn test_failed_flush_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("existing.tif");
        std::fs::write(&path, b"previous raster bytes").unwrap();

        let mut dataset = GeoTiffDataset::create(&path, 1, 1, 1, RasterType::Byte).unwrap();
        dataset.set_geo_transform(GeoTransform::default()).unwrap();
        dataset.set_projection_ref(&"X".repeat(70_000)).unwrap();

        assert!(matches!(dataset.flush(), Err(PipelineError::Encode(_))));
        assert_eq!(std::fs::read(&path).unwrap(), b"previous raster bytes");
    }

    #[test]
    fn test_flush_writes_readable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("written.tif");
        let mut dataset = GeoTiffDataset::create(&path, 2, 1, 1, RasterType::UInt16).unwrap();
        dataset.write_band(1, array![[300.0, 7.0]].view()).unwrap();
        dataset.flush().unwrap();

        let reopened = GeoTiffDataset::open(&path).unwrap().unwrap();
        assert_eq!(reopened.pixels, dataset.pixels);
    }

    #[test]
    fn test_create_rejects_empty_raster() {
        let result = GeoTiffDataset::create(Path::new("unused.tif"), 0, 2, 1, RasterType::Byte);
        assert!(matches!(result, Err(PipelineError::Encode(_))));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = GeoTiffDataset::open(&dir.path().join("missing.tif")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_open_non_tiff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.tif");
        std::fs::write(&path, b"not a tiff at all").unwrap();
        assert!(GeoTiffDataset::open(&path).unwrap().is_none());
    }
}
