//! Normalisation of heterogeneous pixel inputs into image descriptors

use crate::buffer_pool::BufferPool;
use crate::config::TextureSetConfig;
use crate::error::{Result, TextureError};
use crate::flags::FlagState;
use crate::format_table::FormatTable;
use crate::formats::ComponentType;
use crate::options::ImageSource;
use crate::pixel_data::{ElementKind, ExternalImage, PixelData, StridedView, TypedBuffer};
use std::rc::Rc;

/// Pixel source of a parsed image
#[derive(Debug, Default)]
pub enum Payload {
    #[default]
    None,
    Buffer(TypedBuffer),
    External(Rc<dyn ExternalImage>),
    /// Deferred read from the current framebuffer at the image offset
    Copy,
}

/// One parsed image: flags, level offset and payload
#[derive(Debug, Default)]
pub struct ImageDescriptor {
    pub flags: FlagState,
    pub x_offset: i32,
    pub y_offset: i32,
    pub payload: Payload,
    /// The buffer came from the [`BufferPool`] and goes back to it
    pub needs_free: bool,
    /// The host poll hook must run before uploading
    pub needs_poll: bool,
}

impl ImageDescriptor {
    /// Returns a pooled buffer to `buffers`, leaving the payload empty
    pub fn release_buffer(&mut self, buffers: &mut BufferPool) {
        if let Payload::Buffer(buffer) = std::mem::take(&mut self.payload) {
            if self.needs_free {
                buffers.free(buffer);
            }
        }
        self.needs_free = false;
    }

    pub fn has_payload(&self) -> bool {
        !matches!(self.payload, Payload::None)
    }
}

/// Turns [`ImageSource`]s into [`ImageDescriptor`]s
///
/// The parser writes into a descriptor whose flags were already seeded by the caller
/// (from the mip chain, or from the texture for sub-image uploads).
pub struct ImageParser<'a> {
    pub formats: &'a FormatTable,
    pub config: &'a TextureSetConfig,
    pub buffers: &'a mut BufferPool,
    /// Framebuffer extent used to size copy uploads
    pub viewport: (u32, u32),
}

impl ImageParser<'_> {
    /// Parses `source` into `image`
    ///
    /// On error, any pooled buffer already attached to `image` is still marked `needs_free`
    /// so the caller's cleanup returns it.
    pub fn parse(&mut self, image: &mut ImageDescriptor, source: ImageSource) -> Result<()> {
        let mut type_given = false;
        let mut channels_given = false;
        let mut copy = false;

        let data = match source {
            ImageSource::Data(data) => Some(data),
            ImageSource::Options(options) => {
                image.flags.apply_options(&options, self.formats, self.config)?;
                if let Some(x) = options.x {
                    image.x_offset = x;
                }
                if let Some(y) = options.y {
                    image.y_offset = y;
                }
                type_given = options.ty.is_some();
                channels_given = options.channels.is_some() || options.shape.as_ref().is_some_and(|shape| shape.len() == 3);
                copy = options.copy;
                options.data
            }
        };

        if copy {
            if data.is_some() {
                return Err(TextureError::config("can not specify copy and data field for the same texture"));
            }
            self.parse_copy(image)?;
        } else {
            match data {
                None => {
                    if image.flags.width == 0 {
                        image.flags.width = 1;
                    }
                    if image.flags.height == 0 {
                        image.flags.height = 1;
                    }
                }
                Some(PixelData::Buffer(buffer)) => {
                    if image.flags.compressed && !matches!(buffer, TypedBuffer::U8(_)) {
                        return Err(TextureError::InvalidCompressedData);
                    }
                    if !type_given && image.flags.ty == ComponentType::Uint8 {
                        image.flags.ty = buffer.component_type();
                    }
                    image.payload = Payload::Buffer(buffer);
                }
                Some(_) if image.flags.compressed => return Err(TextureError::InvalidCompressedData),
                Some(PixelData::Numbers(values)) => {
                    let flags = &image.flags;
                    let expected = flags.width as usize * flags.height as usize * flags.channels as usize;
                    if values.len() != expected {
                        return Err(TextureError::LengthMismatch { expected, actual: values.len() });
                    }
                    let buffer = self.convert(image.flags.ty, values.len(), |i| values[i])?;
                    image.payload = Payload::Buffer(buffer);
                    image.flags.unpack_alignment = 1;
                    image.needs_free = true;
                }
                Some(PixelData::Rows(rows)) => {
                    let width = rows.first().map_or(0, Vec::len);
                    if let Some(row) = rows.iter().find(|row| row.len() != width) {
                        return Err(TextureError::LengthMismatch { expected: width, actual: row.len() });
                    }
                    let channels = if channels_given { image.flags.channels } else { 1 };
                    let height = rows.len();
                    let values: Vec<f64> = rows.into_iter().flatten().collect();
                    self.store_rect(image, &values, width, height, channels)?;
                }
                Some(PixelData::Pixels(pixels)) => {
                    let width = pixels.first().map_or(0, Vec::len);
                    let depth = pixels.first().and_then(|row| row.first()).map_or(0, Vec::len);
                    for row in &pixels {
                        if row.len() != width {
                            return Err(TextureError::LengthMismatch { expected: width, actual: row.len() });
                        }
                        if let Some(pixel) = row.iter().find(|pixel| pixel.len() != depth) {
                            return Err(TextureError::LengthMismatch { expected: depth, actual: pixel.len() });
                        }
                    }
                    let channels = if channels_given { image.flags.channels } else { depth as u32 };
                    let height = pixels.len();
                    let values: Vec<f64> = pixels.into_iter().flatten().flatten().collect();
                    self.store_rect(image, &values, width, height, channels)?;
                }
                Some(PixelData::View(view)) => self.parse_view(image, &view, type_given)?,
                Some(PixelData::External(source)) => {
                    image.flags.width = source.width();
                    image.flags.height = source.height();
                    image.needs_poll = source.is_streaming();
                    image.payload = Payload::External(source);
                }
            }
        }

        match image.flags.ty {
            ComponentType::Float if !self.config.extensions.oes_texture_float => Err(TextureError::CapabilityMissing("oes_texture_float")),
            ComponentType::HalfFloat if !self.config.extensions.oes_texture_half_float => Err(TextureError::CapabilityMissing("oes_texture_half_float")),
            _ => Ok(()),
        }
    }

    fn parse_copy(&mut self, image: &mut ImageDescriptor) -> Result<()> {
        let (view_width, view_height) = (i64::from(self.viewport.0), i64::from(self.viewport.1));
        let (x, y) = (i64::from(image.x_offset), i64::from(image.y_offset));
        let width = if image.flags.width == 0 { view_width - x } else { i64::from(image.flags.width) };
        let height = if image.flags.height == 0 { view_height - y } else { i64::from(image.flags.height) };

        if x < 0 || y < 0 || width <= 0 || height <= 0 || x + width > view_width || y + height > view_height {
            return Err(TextureError::OutOfBounds(format!(
                "copy texture read of {width}x{height} at ({x}, {y}) from {view_width}x{view_height} viewport"
            )));
        }

        image.flags.width = width as u32;
        image.flags.height = height as u32;
        image.payload = Payload::Copy;
        Ok(())
    }

    /// Flattened nested arrays: width and height always come from the array extent
    fn store_rect(&mut self, image: &mut ImageDescriptor, values: &[f64], width: usize, height: usize, channels: u32) -> Result<()> {
        let buffer = self.convert(image.flags.ty, values.len(), |i| values[i])?;
        let flags = &mut image.flags;
        flags.width = width as u32;
        flags.height = height as u32;
        flags.channels = channels;
        if let Some(format) = self.formats.channels_format(channels) {
            flags.format = format;
            flags.internal_format = format;
        }
        flags.unpack_alignment = 1;
        image.payload = Payload::Buffer(buffer);
        image.needs_free = true;
        Ok(())
    }

    fn parse_view(&mut self, image: &mut ImageDescriptor, view: &StridedView, type_given: bool) -> Result<()> {
        let (height, width, channels) = match view.shape.as_slice() {
            &[height, width] => (height, width, 1),
            &[height, width, channels] => (height, width, channels),
            shape => return Err(TextureError::UnsupportedRank(shape.len())),
        };

        if !type_given && image.flags.ty == ComponentType::Uint8 {
            if let Some(ty) = view.component_type() {
                image.flags.ty = ty;
            }
        }

        let max_size = self.config.limits.max_texture_size as usize;
        if width == 0 || height == 0 || width > max_size || height > max_size {
            return Err(TextureError::shape(format!("array view of {width}x{height} exceeds 1..={max_size}")));
        }
        if !(1..=4).contains(&channels) {
            return Err(TextureError::shape(format!("array view with {channels} channels")));
        }
        let len = width
            .checked_mul(height)
            .and_then(|len| len.checked_mul(channels))
            .ok_or_else(|| TextureError::shape(format!("array view of {width}x{height}x{channels} is too large")))?;

        // Gather into a packed row-major staging array first so a bad index leaves nothing allocated
        let mut values = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    let value = view
                        .get(&[y, x, c])
                        .ok_or_else(|| TextureError::OutOfBounds(format!("array view element ({y}, {x}, {c})")))?;
                    values.push(value);
                }
            }
        }

        let buffer = self.convert(image.flags.ty, values.len(), |i| values[i])?;
        let flags = &mut image.flags;
        flags.width = width as u32;
        flags.height = height as u32;
        flags.channels = channels as u32;
        if let Some(format) = self.formats.channels_format(channels as u32) {
            flags.format = format;
            flags.internal_format = format;
        }
        flags.unpack_alignment = 1;
        image.payload = Payload::Buffer(buffer);
        image.needs_free = true;
        Ok(())
    }

    /// Converts `len` values into a pooled buffer of component type `ty`
    ///
    /// Half floats are staged through a pooled `f32` buffer and then encoded.
    fn convert(&mut self, ty: ComponentType, len: usize, value: impl Fn(usize) -> f64) -> Result<TypedBuffer> {
        match ty {
            ComponentType::Uint8 | ComponentType::Uint16 | ComponentType::Uint32 | ComponentType::Float => {
                let mut buffer = self.buffers.alloc(ElementKind::for_component_type(ty), len);
                for i in 0..len {
                    buffer.store(i, value(i));
                }
                Ok(buffer)
            }
            ComponentType::HalfFloat => {
                let mut staging = self.buffers.alloc(ElementKind::F32, len);
                for i in 0..len {
                    staging.store(i, value(i));
                }
                let encoded = match &staging {
                    TypedBuffer::F32(floats) => self.buffers.to_half_float(floats),
                    _ => unreachable!("staging buffer is always f32"),
                };
                self.buffers.free(staging);
                Ok(encoded)
            }
            packed => Err(TextureError::config(format!("unsupported texture type {packed:?}, must specify a typed buffer"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Extensions;
    use crate::formats::TextureFormat;
    use crate::options::TextureOptions;
    use crate::pixel_data::ViewStorage;

    struct Harness {
        formats: FormatTable,
        config: TextureSetConfig,
        buffers: BufferPool,
        viewport: (u32, u32),
    }

    impl Harness {
        fn new() -> Self {
            let config = TextureSetConfig {
                extensions: Extensions {
                    oes_texture_float: true,
                    oes_texture_half_float: true,
                    ..Default::default()
                },
                ..Default::default()
            };
            Self {
                formats: FormatTable::new(&config.extensions, &[]),
                config,
                buffers: BufferPool::new(),
                viewport: (64, 32),
            }
        }

        fn parse(&mut self, source: impl Into<ImageSource>) -> Result<ImageDescriptor> {
            let mut image = ImageDescriptor::default();
            let mut parser = ImageParser {
                formats: &self.formats,
                config: &self.config,
                buffers: &mut self.buffers,
                viewport: self.viewport,
            };
            match parser.parse(&mut image, source.into()) {
                Ok(()) => Ok(image),
                Err(error) => {
                    image.release_buffer(&mut self.buffers);
                    Err(error)
                }
            }
        }

        fn bytes(image: &ImageDescriptor) -> &[u8] {
            match &image.payload {
                Payload::Buffer(buffer) => buffer.as_bytes(),
                other => panic!("expected buffer payload, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_flat_numbers_layout() {
        let mut harness = Harness::new();
        let (w, h, c) = (3usize, 2usize, 2usize);
        let values: Vec<f64> = (0..w * h * c).map(|i| i as f64).collect();
        let options = TextureOptions::new().with_shape(w as u32, h as u32).with_channels(c as u32).with_data(values);
        let image = harness.parse(options).unwrap();

        let bytes = Harness::bytes(&image);
        assert_eq!(bytes.len(), w * h * c);
        for y in 0..h {
            for x in 0..w {
                for ch in 0..c {
                    assert_eq!(bytes[(y * w + x) * c + ch] as usize, (y * w + x) * c + ch);
                }
            }
        }
        assert!(image.needs_free);
        assert_eq!(image.flags.unpack_alignment, 1);
        assert_eq!(image.flags.format, TextureFormat::LuminanceAlpha);
    }

    #[test]
    fn test_flat_numbers_length_mismatch() {
        let mut harness = Harness::new();
        let options = TextureOptions::new().with_shape(2, 2).with_data(vec![0.0; 15]);
        let error = harness.parse(options).unwrap_err();
        assert!(matches!(error, TextureError::LengthMismatch { expected: 16, actual: 15 }));
        assert_eq!(harness.buffers.outstanding(), 0);
    }

    #[test]
    fn test_packed_type_rejects_numbers() {
        let mut harness = Harness::new();
        let options = TextureOptions::new().with_shape(1, 1).with_format("rgba4").with_data(vec![0.0; 4]);
        assert!(matches!(harness.parse(options), Err(TextureError::Configuration(_))));
        assert_eq!(harness.buffers.outstanding(), 0);
    }

    #[test]
    fn test_half_float_numbers() {
        let mut harness = Harness::new();
        let options = TextureOptions::new().with_shape(1, 1).with_type("half float").with_data(vec![1.0, 0.5, 0.25, 0.0]);
        let image = harness.parse(options).unwrap();
        let expected: Vec<half::f16> = [1.0f32, 0.5, 0.25, 0.0].into_iter().map(half::f16::from_f32).collect();
        assert!(matches!(&image.payload, Payload::Buffer(TypedBuffer::F16(values)) if *values == expected));
        // Staging buffer went back, encoded buffer is still out
        assert_eq!(harness.buffers.outstanding(), 1);
    }

    #[test]
    fn test_nested_rows_flatten_row_major() {
        let mut harness = Harness::new();
        let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let image = harness.parse(PixelData::from(rows)).unwrap();
        assert_eq!(Harness::bytes(&image), &[1, 2, 3, 4, 5, 6]);
        assert_eq!((image.flags.width, image.flags.height, image.flags.channels), (3, 2, 1));
        assert_eq!(image.flags.format, TextureFormat::Luminance);
        assert_eq!(image.flags.internal_format, TextureFormat::Luminance);
    }

    #[test]
    fn test_nested_pixels() {
        let mut harness = Harness::new();
        let pixels = vec![vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]];
        let image = harness.parse(PixelData::from(pixels)).unwrap();
        assert_eq!(Harness::bytes(&image), &[1, 2, 3, 4, 5, 6]);
        assert_eq!((image.flags.width, image.flags.height, image.flags.channels), (2, 1, 3));
        assert_eq!(image.flags.format, TextureFormat::Rgb);
    }

    #[test]
    fn test_ragged_rows() {
        let mut harness = Harness::new();
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(matches!(harness.parse(PixelData::from(rows)), Err(TextureError::LengthMismatch { expected: 2, actual: 1 })));

        let pixels = vec![vec![vec![1.0, 2.0], vec![3.0]]];
        assert!(matches!(harness.parse(PixelData::from(pixels)), Err(TextureError::LengthMismatch { expected: 2, actual: 1 })));
    }

    #[test]
    fn test_strided_views_pack_identically() {
        let mut harness = Harness::new();
        // 2 rows x 3 columns x 2 channels, row-major
        let logical: Vec<f64> = (0..12).map(f64::from).collect();
        let row_major = StridedView::new(ViewStorage::Numbers(logical.clone()), vec![2, 3, 2]);

        // Same logical data stored column-major with a leading pad element
        let mut column_major = vec![99.0; 13];
        for y in 0..2 {
            for x in 0..3 {
                for c in 0..2 {
                    column_major[1 + c * 6 + x * 2 + y] = logical[(y * 3 + x) * 2 + c];
                }
            }
        }
        let transposed = StridedView::with_strides(ViewStorage::Numbers(column_major), vec![2, 3, 2], vec![1, 2, 6], 1);

        let a = harness.parse(PixelData::from(row_major)).unwrap();
        let b = harness.parse(PixelData::from(transposed)).unwrap();
        assert_eq!(Harness::bytes(&a), Harness::bytes(&b));
        assert_eq!((a.flags.width, a.flags.height, a.flags.channels), (3, 2, 2));
        assert_eq!(a.flags.format, TextureFormat::LuminanceAlpha);
    }

    #[test]
    fn test_view_rank_and_bounds() {
        let mut harness = Harness::new();
        let view = StridedView::new(ViewStorage::Numbers(vec![0.0; 4]), vec![4]);
        assert!(matches!(harness.parse(PixelData::from(view)), Err(TextureError::UnsupportedRank(1))));

        let view = StridedView::with_strides(ViewStorage::Numbers(vec![0.0; 4]), vec![2, 2], vec![2, 1], 1);
        assert!(matches!(harness.parse(PixelData::from(view)), Err(TextureError::OutOfBounds(_))));
        assert_eq!(harness.buffers.outstanding(), 0);
    }

    #[test]
    fn test_view_extent_limits() {
        let mut harness = Harness::new();
        let huge = StridedView::with_strides(ViewStorage::Numbers(vec![0.0]), vec![1 << 31, 1 << 31, 4], vec![0, 0, 0], 0);
        assert!(matches!(harness.parse(PixelData::from(huge)), Err(TextureError::Shape(_))));

        let empty = StridedView::new(ViewStorage::Numbers(Vec::new()), vec![0, 3]);
        assert!(matches!(harness.parse(PixelData::from(empty)), Err(TextureError::Shape(_))));

        let wide = StridedView::with_strides(ViewStorage::Numbers(vec![0.0]), vec![2, 2, 5], vec![0, 0, 0], 0);
        assert!(matches!(harness.parse(PixelData::from(wide)), Err(TextureError::Shape(_))));

        // Zero strides broadcast one element over the whole extent
        let flat = StridedView::with_strides(ViewStorage::Numbers(vec![7.0]), vec![2, 3], vec![0, 0], 0);
        let image = harness.parse(PixelData::from(flat)).unwrap();
        assert_eq!(Harness::bytes(&image), &[7; 6]);
        assert_eq!(harness.buffers.outstanding(), 1);
    }

    #[test]
    fn test_nested_rows_override_preset_extent() {
        let mut harness = Harness::new();
        let mut image = ImageDescriptor::default();
        image.flags.width = 4;
        image.flags.height = 4;
        let mut parser = ImageParser {
            formats: &harness.formats,
            config: &harness.config,
            buffers: &mut harness.buffers,
            viewport: harness.viewport,
        };
        parser.parse(&mut image, PixelData::from(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).into()).unwrap();
        assert_eq!((image.flags.width, image.flags.height), (2, 2));
        image.release_buffer(&mut harness.buffers);
    }

    #[test]
    fn test_view_infers_type() {
        let mut harness = Harness::new();
        let view = StridedView::new(ViewStorage::Typed(TypedBuffer::F32(vec![0.5; 4])), vec![2, 2]);
        let image = harness.parse(PixelData::from(view)).unwrap();
        assert_eq!(image.flags.ty, ComponentType::Float);
        assert!(matches!(&image.payload, Payload::Buffer(TypedBuffer::F32(values)) if values.len() == 4));
    }

    #[test]
    fn test_typed_buffer_adopted() {
        let mut harness = Harness::new();
        let image = harness.parse(PixelData::from(vec![0u16; 4])).unwrap();
        assert_eq!(image.flags.ty, ComponentType::Uint16);
        assert!(!image.needs_free);

        let options = TextureOptions::new().with_type("uint8").with_data(vec![0.0f32; 4]);
        let image = harness.parse(options).unwrap();
        assert_eq!(image.flags.ty, ComponentType::Uint8);
    }

    #[test]
    fn test_placeholder() {
        let mut harness = Harness::new();
        let image = harness.parse(TextureOptions::new()).unwrap();
        assert_eq!((image.flags.width, image.flags.height), (1, 1));
        assert!(!image.has_payload());

        let image = harness.parse(TextureOptions::new().with_shape(8, 4)).unwrap();
        assert_eq!((image.flags.width, image.flags.height), (8, 4));
    }

    #[test]
    fn test_copy_bounds() {
        let mut harness = Harness::new();
        let image = harness.parse(TextureOptions::new().with_copy().with_offset(4, 2)).unwrap();
        assert_eq!((image.flags.width, image.flags.height), (60, 30));
        assert!(matches!(image.payload, Payload::Copy));

        let options = TextureOptions::new().with_copy().with_shape(16, 16).with_offset(50, 0);
        assert!(matches!(harness.parse(options), Err(TextureError::OutOfBounds(_))));
        let options = TextureOptions::new().with_copy().with_offset(-1, 0);
        assert!(matches!(harness.parse(options), Err(TextureError::OutOfBounds(_))));
        assert_eq!(harness.buffers.outstanding(), 0);

        let options = TextureOptions::new().with_copy().with_data(vec![0u8; 4]);
        assert!(matches!(harness.parse(options), Err(TextureError::Configuration(_))));
    }

    #[test]
    fn test_compressed_requires_bytes() {
        let extensions = Extensions {
            webgl_compressed_texture_s3tc: true,
            ..Default::default()
        };
        let mut harness = Harness::new();
        harness.formats = FormatTable::new(&extensions, &[crate::formats::CompressedFormat::RgbaS3tcDxt5]);

        let options = TextureOptions::new().with_shape(4, 4).with_format("rgba s3tc dxt5").with_data(vec![0u16; 8]);
        assert!(matches!(harness.parse(options), Err(TextureError::InvalidCompressedData)));

        let options = TextureOptions::new().with_shape(4, 4).with_format("rgba s3tc dxt5").with_data(vec![0.0f64; 16]);
        assert!(matches!(harness.parse(options), Err(TextureError::InvalidCompressedData)));

        let options = TextureOptions::new().with_shape(4, 4).with_format("rgba s3tc dxt5").with_data(vec![0u8; 16]);
        let image = harness.parse(options).unwrap();
        assert!(image.flags.compressed);
    }

    #[test]
    fn test_float_requires_extension() {
        let mut harness = Harness::new();
        harness.config.extensions.oes_texture_float = false;
        let error = harness.parse(PixelData::from(vec![0.0f32; 4])).unwrap_err();
        assert!(matches!(error, TextureError::CapabilityMissing("oes_texture_float")));
    }
}
