//! Per-level image sets

use crate::buffer_pool::BufferPool;
use crate::error::{Result, TextureError};
use crate::flags::FlagState;
use crate::formats::{CompressedFormat, TextureFormat};
use crate::image::{ImageDescriptor, ImageParser};
use crate::options::{ImageSource, MipmapOption};
use crate::pools::FreeList;

/// Maximum number of mip levels a texture may carry
pub const MAX_MIP_LEVELS: usize = 16;

/// Images of one texture (or one cube face) indexed by mip level
#[derive(Debug, Default)]
pub struct MipmapSet {
    pub flags: FlagState,
    pub images: [Option<ImageDescriptor>; MAX_MIP_LEVELS],
    /// Bit `i` is set when level `i` was provided
    pub mipmask: u32,
}

impl MipmapSet {
    /// Seeds level 0 with a bare `width × height` placeholder
    pub fn parse_shape(&mut self, images: &mut FreeList<ImageDescriptor>, width: u32, height: u32) {
        let mut image = images.take();
        image.flags = self.flags;
        image.flags.width = width;
        image.flags.height = height;
        self.flags.width = width;
        self.flags.height = height;
        self.images[0] = Some(image);
        self.mipmask = 1;
    }

    /// Populates the set from a data argument or a configuration object
    ///
    /// A configuration object whose `mipmap` is a level list fills one level per entry,
    /// each expecting the base shape shifted right by its level. Anything else fills
    /// level 0. The set's flags are copied from level 0 afterwards.
    pub fn parse_source(&mut self, parser: &mut ImageParser<'_>, images: &mut FreeList<ImageDescriptor>, source: ImageSource) -> Result<()> {
        match source {
            ImageSource::Data(data) => {
                self.parse_level(parser, images, 0, ImageSource::Data(data))?;
                self.mipmask = 1;
            }
            ImageSource::Options(mut options) => {
                self.flags.apply_options(&options, parser.formats, parser.config)?;
                match options.mipmap.take() {
                    Some(MipmapOption::Levels(levels)) => {
                        if levels.len() > MAX_MIP_LEVELS {
                            return Err(TextureError::config(format!("at most {MAX_MIP_LEVELS} mipmap levels are supported, got {}", levels.len())));
                        }
                        for (level, source) in levels.into_iter().enumerate() {
                            self.parse_level(parser, images, level, source)?;
                            self.mipmask |= 1 << level;
                        }
                    }
                    other => {
                        options.mipmap = other;
                        self.parse_level(parser, images, 0, ImageSource::Options(options))?;
                        self.mipmask = 1;
                    }
                }
            }
        }

        if let Some(base) = &self.images[0] {
            self.flags = base.flags;
        }

        if let TextureFormat::Compressed(format) = self.flags.internal_format {
            let block_based = matches!(
                format,
                CompressedFormat::RgbS3tcDxt1 | CompressedFormat::RgbaS3tcDxt1 | CompressedFormat::RgbaS3tcDxt3 | CompressedFormat::RgbaS3tcDxt5
            );
            if block_based && (self.flags.width % 4 != 0 || self.flags.height % 4 != 0) {
                return Err(TextureError::shape(format!(
                    "compressed level 0 must have width and height that are a multiple of 4, got {}x{}",
                    self.flags.width, self.flags.height
                )));
            }
        }

        Ok(())
    }

    fn parse_level(&mut self, parser: &mut ImageParser<'_>, images: &mut FreeList<ImageDescriptor>, level: usize, source: ImageSource) -> Result<()> {
        let mut image = images.take();
        image.flags = self.flags;
        image.flags.width = shift_extent(self.flags.width, level);
        image.flags.height = shift_extent(self.flags.height, level);
        let result = parser.parse(&mut image, source);
        // Store before propagating so the caller's recycle returns the image and its buffer
        self.images[level] = Some(image);
        result
    }

    /// Number of leading populated levels
    pub fn level_count(&self) -> usize {
        self.images.iter().take_while(|image| image.is_some()).count()
    }

    /// Returns every pooled buffer held by the set's images
    pub fn release_buffers(&mut self, buffers: &mut BufferPool) {
        for image in self.images.iter_mut().flatten() {
            image.release_buffer(buffers);
        }
    }
}

/// Extent of `level` for a base extent, `0` meaning "not yet known"
pub(crate) fn shift_extent(extent: u32, level: usize) -> u32 {
    if extent == 0 { 0 } else { extent.checked_shr(level as u32).unwrap_or(0).max(1) }
}
