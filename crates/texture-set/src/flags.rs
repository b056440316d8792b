//! Format and unpack state shared by images, mip chains and texture resources

use crate::config::TextureSetConfig;
use crate::device::PixelStore;
use crate::error::{Result, TextureError};
use crate::format_table::FormatTable;
use crate::formats::{ColorSpace, ComponentType, TextureFormat};
use crate::options::TextureOptions;

/// Format, type, unpack and shape settings of an image
///
/// Copied by value between descriptors: images start from their mip chain's flags, mip
/// chains start from the texture's flags, and the texture snapshots level 0 after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagState {
    pub internal_format: TextureFormat,
    /// Transfer format used while uploading
    pub format: TextureFormat,
    pub ty: ComponentType,
    pub compressed: bool,
    pub premultiply_alpha: bool,
    pub flip_y: bool,
    pub unpack_alignment: u32,
    pub color_space: ColorSpace,
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl Default for FlagState {
    fn default() -> Self {
        Self {
            internal_format: TextureFormat::Rgba,
            format: TextureFormat::Rgba,
            ty: ComponentType::Uint8,
            compressed: false,
            premultiply_alpha: false,
            flip_y: false,
            unpack_alignment: 1,
            color_space: ColorSpace::None,
            width: 0,
            height: 0,
            channels: 4,
        }
    }
}

impl FlagState {
    /// Applies the flag-related keys of `options`
    ///
    /// Unpack settings and the type are applied first, then the shape, then the format.
    /// Channels and format are reconciled last: an explicit format derives the channel
    /// count, explicit channels derive the format, and both together must agree.
    ///
    /// # Arguments
    /// * `options` - Configuration object to read
    /// * `formats` - Name vocabularies of the owning texture set
    /// * `config` - Device limits and extensions
    pub fn apply_options(&mut self, options: &TextureOptions, formats: &FormatTable, config: &TextureSetConfig) -> Result<()> {
        let extensions = &config.extensions;
        let max_size = config.limits.max_texture_size;

        if let Some(premultiply_alpha) = options.premultiply_alpha {
            self.premultiply_alpha = premultiply_alpha;
        }
        if let Some(flip_y) = options.flip_y {
            self.flip_y = flip_y;
        }
        if let Some(alignment) = options.alignment {
            if !matches!(alignment, 1 | 2 | 4 | 8) {
                return Err(TextureError::config(format!("invalid texture unpack alignment {alignment}, must be one of 1, 2, 4, 8")));
            }
            self.unpack_alignment = alignment;
        }
        if let Some(color_space) = &options.color_space {
            self.color_space = formats.color_space(color_space)?;
        }
        if let Some(ty) = &options.ty {
            match ty.as_str() {
                "float" if !extensions.oes_texture_float => return Err(TextureError::CapabilityMissing("oes_texture_float")),
                "float16" | "half float" if !extensions.oes_texture_half_float => {
                    return Err(TextureError::CapabilityMissing("oes_texture_half_float"));
                }
                _ => {}
            }
            self.ty = formats.component_type(ty)?;
        }

        let (mut width, mut height, mut channels) = (self.width, self.height, self.channels);
        let mut has_channels = false;
        if let Some(shape) = &options.shape {
            match shape.as_slice() {
                [w, h] => (width, height) = (*w, *h),
                [w, h, c] => {
                    (width, height, channels) = (*w, *h, *c);
                    has_channels = true;
                }
                _ => return Err(TextureError::shape(format!("shape must have 2 or 3 entries, got {}", shape.len()))),
            }
            check_extent(width, height, max_size)?;
        } else {
            if let Some(radius) = options.radius {
                (width, height) = (radius, radius);
            }
            if let Some(w) = options.width {
                width = w;
            }
            if let Some(h) = options.height {
                height = h;
            }
            if options.radius.is_some() || options.width.is_some() || options.height.is_some() {
                check_extent(width, height, max_size)?;
            }
            if let Some(c) = options.channels {
                channels = c;
                has_channels = true;
            }
        }
        if has_channels && !(1..=4).contains(&channels) {
            return Err(TextureError::shape(format!("invalid number of channels {channels}, must be between 1 and 4")));
        }
        (self.width, self.height, self.channels) = (width, height, channels);

        let mut has_format = false;
        if let Some(name) = &options.format {
            if matches!(name.as_str(), "depth" | "depth stencil") && !extensions.webgl_depth_texture {
                return Err(TextureError::CapabilityMissing("webgl_depth_texture"));
            }
            if matches!(name.as_str(), "srgb" | "srgba") && !extensions.ext_srgb {
                return Err(TextureError::CapabilityMissing("ext_srgb"));
            }
            let internal_format = formats.format(name)?;
            self.internal_format = internal_format;
            self.format = formats.color_format(internal_format);
            self.compressed = internal_format.is_compressed();
            if options.ty.is_none() {
                if let Some(implied) = internal_format.implied_type() {
                    self.ty = implied;
                }
            }
            has_format = true;
        }

        match (has_format, has_channels) {
            (true, false) => {
                if let Some(channels) = formats.format_channels(self.format) {
                    self.channels = channels;
                }
            }
            (false, true) => {
                if formats.format_channels(self.format) != Some(self.channels) {
                    if let Some(format) = formats.channels_format(self.channels) {
                        self.format = format;
                        self.internal_format = format;
                    }
                }
            }
            (true, true) => {
                if formats.format_channels(self.format) != Some(self.channels) {
                    return Err(TextureError::ChannelFormatConflict {
                        channels: self.channels,
                        format: self.internal_format,
                    });
                }
            }
            (false, false) => {}
        }

        Ok(())
    }

    /// Unpack settings sent to the device before each upload
    pub fn pixel_store(&self) -> PixelStore {
        PixelStore {
            flip_y: self.flip_y,
            premultiply_alpha: self.premultiply_alpha,
            color_space: self.color_space,
            unpack_alignment: self.unpack_alignment,
        }
    }

    /// Returns true when format, transfer format and type all match
    pub fn same_format(&self, other: &FlagState) -> bool {
        self.internal_format == other.internal_format && self.format == other.format && self.ty == other.ty
    }
}

fn check_extent(width: u32, height: u32, max_size: u32) -> Result<()> {
    if width == 0 || height == 0 || width > max_size || height > max_size {
        return Err(TextureError::shape(format!("{width}x{height} must be within 1..={max_size} on both axes")));
    }
    Ok(())
}
