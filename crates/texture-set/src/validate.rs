//! Completeness and consistency checks run before any device upload

use crate::config::TextureSetConfig;
use crate::error::{Result, TextureError};
use crate::flags::FlagState;
use crate::formats::{ComponentType, CompressedFormat, MagFilter, MinFilter, TextureFormat, WrapMode};
use crate::image::Payload;
use crate::mipmap::{MAX_MIP_LEVELS, MipmapSet, shift_extent};
use crate::sampler::SamplerState;

/// Mask with one bit per level of a complete chain for a `width × height` base
pub fn full_mip_mask(width: u32, height: u32) -> u32 {
    let levels = u32::BITS - width.max(height).max(1).leading_zeros();
    ((1u64 << levels) - 1) as u32
}

/// Bytes of one compressed image
pub fn compressed_size(format: CompressedFormat, width: u32, height: u32) -> usize {
    let (width, height) = (width as usize, height as usize);
    match format {
        CompressedFormat::RgbPvrtc4bppv1 | CompressedFormat::RgbaPvrtc4bppv1 => width.max(8) * height.max(8) / 2,
        CompressedFormat::RgbPvrtc2bppv1 | CompressedFormat::RgbaPvrtc2bppv1 => width.max(16) * height.max(8) / 4,
        _ => {
            let (block_width, block_height, block_bytes) = format.block_layout();
            width.div_ceil(block_width as usize) * height.div_ceil(block_height as usize) * block_bytes as usize
        }
    }
}

/// Validates a 2D mip chain against the sampler and device limits
///
/// `mipmap.mipmask` must already include generated levels when generation is on.
pub fn check_texture_2d(sampler: &SamplerState, mipmap: &MipmapSet, config: &TextureSetConfig) -> Result<()> {
    let FlagState { width, height, .. } = mipmap.flags;
    check_extent(width, height, config.limits.max_texture_size)?;

    if (sampler.wrap_s != WrapMode::ClampToEdge || sampler.wrap_t != WrapMode::ClampToEdge) && !(width.is_power_of_two() && height.is_power_of_two()) {
        return Err(TextureError::shape(format!(
            "incompatible wrap mode for {width}x{height} texture, both width and height must be power of 2"
        )));
    }

    if mipmap.mipmask == 1 {
        if width != 1 && height != 1 && sampler.min_filter.uses_mipmaps() {
            return Err(TextureError::config(format!("min filter {:?} requires mipmap data", sampler.min_filter)));
        }
    } else {
        if !(width.is_power_of_two() && height.is_power_of_two()) {
            return Err(TextureError::shape(format!("{width}x{height} texture must be a power of 2 to support mipmapping")));
        }
        if mipmap.mipmask != full_mip_mask(width, height) {
            return Err(TextureError::config("missing or incomplete mipmap data"));
        }
    }

    check_float_filtering(sampler, &mipmap.flags, config)?;
    check_levels(mipmap, &mipmap.flags, sampler.generate_mipmaps)?;

    if mipmap.flags.compressed && sampler.generate_mipmaps {
        return Err(TextureError::config("mipmap generation for compressed images not supported"));
    }
    Ok(())
}

/// Validates six cube faces; `base` is the texture's flags taken from face 0
pub fn check_texture_cube(sampler: &SamplerState, base: &FlagState, faces: &[MipmapSet], config: &TextureSetConfig) -> Result<()> {
    let FlagState { width, height, .. } = *base;
    check_extent(width, height, config.limits.max_texture_size)?;

    if width != height {
        return Err(TextureError::shape(format!("cube map must be square, got {width}x{height}")));
    }
    if sampler.wrap_s != WrapMode::ClampToEdge || sampler.wrap_t != WrapMode::ClampToEdge {
        return Err(TextureError::config("wrap mode not supported by cube map"));
    }
    check_float_filtering(sampler, base, config)?;

    for (index, face) in faces.iter().enumerate() {
        if face.flags.width != width || face.flags.height != height {
            return Err(TextureError::shape(format!(
                "inconsistent cube map face shape: face {index} is {}x{}, expected {width}x{height}",
                face.flags.width, face.flags.height
            )));
        }
        if sampler.generate_mipmaps {
            if face.flags.compressed {
                return Err(TextureError::config("can not generate mipmap for compressed textures"));
            }
            if face.mipmask != 1 {
                return Err(TextureError::config("can not specify mipmaps and generate mipmaps"));
            }
        }
        check_levels(face, base, sampler.generate_mipmaps)?;
    }
    Ok(())
}

fn check_extent(width: u32, height: u32, max_size: u32) -> Result<()> {
    if width == 0 || height == 0 || width > max_size || height > max_size {
        return Err(TextureError::shape(format!("{width}x{height} must be within 1..={max_size} on both axes")));
    }
    Ok(())
}

fn check_float_filtering(sampler: &SamplerState, flags: &FlagState, config: &TextureSetConfig) -> Result<()> {
    if flags.ty != ComponentType::Float {
        return Ok(());
    }
    if !config.extensions.oes_texture_float_linear && (sampler.min_filter != MinFilter::Nearest || sampler.mag_filter != MagFilter::Nearest) {
        return Err(TextureError::CapabilityMissing("oes_texture_float_linear"));
    }
    if sampler.generate_mipmaps {
        return Err(TextureError::config("mipmap generation not supported with float textures"));
    }
    Ok(())
}

/// Every present level must be flagged, sized for its level and match `base`
fn check_levels(mipmap: &MipmapSet, base: &FlagState, generate: bool) -> Result<()> {
    for level in 0..MAX_MIP_LEVELS {
        let Some(image) = &mipmap.images[level] else {
            if !generate && mipmap.mipmask & (1 << level) != 0 {
                return Err(TextureError::config(format!("extra mipmap data at level {level}")));
            }
            continue;
        };

        if mipmap.mipmask & (1 << level) == 0 {
            return Err(TextureError::MissingLevel(level as u32));
        }

        let (expected_width, expected_height) = (shift_extent(base.width, level), shift_extent(base.height, level));
        if image.flags.width != expected_width || image.flags.height != expected_height {
            return Err(TextureError::shape(format!(
                "invalid shape for mip image {level}: got {}x{}, expected {expected_width}x{expected_height}",
                image.flags.width, image.flags.height
            )));
        }

        if !image.flags.same_format(base) {
            return Err(TextureError::config(format!(
                "incompatible type for mip image {level}: {:?}/{:?} vs {:?}/{:?}",
                image.flags.internal_format, image.flags.ty, base.internal_format, base.ty
            )));
        }

        if let Payload::Buffer(buffer) = &image.payload {
            let expected = match image.flags.internal_format {
                TextureFormat::Compressed(format) => compressed_size(format, expected_width, expected_height),
                _ => {
                    let pixel_bytes = image.flags.ty.bytes_per_pixel(base.channels) as usize;
                    let alignment = image.flags.unpack_alignment.max(1) as usize;
                    let row_bytes = (pixel_bytes * expected_width as usize).div_ceil(alignment) * alignment;
                    row_bytes * expected_height as usize
                }
            };
            if buffer.byte_len() != expected {
                return Err(TextureError::LengthMismatch {
                    expected,
                    actual: buffer.byte_len(),
                });
            }
        }
    }
    Ok(())
}
