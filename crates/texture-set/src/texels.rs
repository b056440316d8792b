//! CPU expansion of uploaded pixels into RGBA storage texels
//!
//! wgpu has no luminance, alpha-only or packed 16-bit formats, and it does not apply unpack
//! state. Uploads are therefore expanded here into the four-channel storage format picked by
//! [`storage_format`], honouring row alignment, vertical flip and alpha premultiplication.

use crate::device::PixelStore;
use crate::formats::{ComponentType, CompressedFormat, TextureFormat};
use half::f16;

/// Storage format for textures with the given internal format and component type
///
/// Returns `None` for compressed families wgpu cannot sample (ATC and PVRTC).
pub fn storage_format(internal_format: TextureFormat, ty: ComponentType) -> Option<wgpu::TextureFormat> {
    let format = match internal_format {
        TextureFormat::Compressed(format) => match format {
            CompressedFormat::RgbS3tcDxt1 | CompressedFormat::RgbaS3tcDxt1 => wgpu::TextureFormat::Bc1RgbaUnorm,
            CompressedFormat::RgbaS3tcDxt3 => wgpu::TextureFormat::Bc2RgbaUnorm,
            CompressedFormat::RgbaS3tcDxt5 => wgpu::TextureFormat::Bc3RgbaUnorm,
            CompressedFormat::RgbEtc1 => wgpu::TextureFormat::Etc2Rgb8Unorm,
            _ => return None,
        },
        TextureFormat::Depth if ty == ComponentType::Uint16 => wgpu::TextureFormat::Depth16Unorm,
        TextureFormat::Depth => wgpu::TextureFormat::Depth32Float,
        TextureFormat::DepthStencil => wgpu::TextureFormat::Depth24PlusStencil8,
        TextureFormat::Srgb | TextureFormat::Srgba => wgpu::TextureFormat::Rgba8UnormSrgb,
        _ => match ty {
            ComponentType::Float => wgpu::TextureFormat::Rgba32Float,
            ComponentType::HalfFloat => wgpu::TextureFormat::Rgba16Float,
            _ => wgpu::TextureFormat::Rgba8Unorm,
        },
    };
    Some(format)
}

/// Storage component encoded from a normalised value
trait Texel: bytemuck::Pod {
    fn encode(value: f32) -> Self;
}

impl Texel for u8 {
    fn encode(value: f32) -> Self {
        (value.clamp(0.0, 1.0) * 255.0).round() as u8
    }
}

impl Texel for f16 {
    fn encode(value: f32) -> Self {
        f16::from_f32(value)
    }
}

impl Texel for f32 {
    fn encode(value: f32) -> Self {
        value
    }
}

/// Source rows as laid out by the unpack alignment
struct SourceRows<'a> {
    bytes: &'a [u8],
    width: usize,
    height: usize,
    pixel_bytes: usize,
    row_bytes: usize,
}

impl<'a> SourceRows<'a> {
    fn new(bytes: &'a [u8], width: u32, height: u32, pixel_bytes: u32, alignment: u32) -> Self {
        let (pixel_bytes, alignment) = (pixel_bytes as usize, alignment.max(1) as usize);
        Self {
            bytes,
            width: width as usize,
            height: height as usize,
            pixel_bytes,
            row_bytes: (pixel_bytes * width as usize).div_ceil(alignment) * alignment,
        }
    }

    /// Byte offsets of each pixel in output order, top row first
    fn pixel_offsets(&self, flip_y: bool) -> impl Iterator<Item = usize> + '_ {
        (0..self.height).flat_map(move |y| {
            let row = if flip_y { self.height - 1 - y } else { y };
            (0..self.width).map(move |x| row * self.row_bytes + x * self.pixel_bytes)
        })
    }

    fn read<T: bytemuck::Pod>(&self, offset: usize) -> Option<T> {
        self.bytes.get(offset..offset + std::mem::size_of::<T>()).map(bytemuck::pod_read_unaligned)
    }
}

fn expand<T: Texel>(source: &SourceRows<'_>, store: &PixelStore, texel: impl Fn(usize) -> [f32; 4]) -> Vec<u8> {
    let mut out = Vec::with_capacity(source.width * source.height * 4 * std::mem::size_of::<T>());
    for offset in source.pixel_offsets(store.flip_y) {
        let mut rgba = texel(offset);
        if store.premultiply_alpha {
            let alpha = rgba[3];
            for channel in &mut rgba[..3] {
                *channel *= alpha;
            }
        }
        out.extend_from_slice(bytemuck::bytes_of(&rgba.map(T::encode)));
    }
    out
}

/// Places `components` read for `format` into RGBA order
fn arrange(format: TextureFormat, c: [f32; 4]) -> [f32; 4] {
    match format {
        TextureFormat::Alpha => [0.0, 0.0, 0.0, c[0]],
        TextureFormat::Luminance => [c[0], c[0], c[0], 1.0],
        TextureFormat::LuminanceAlpha => [c[0], c[0], c[0], c[1]],
        TextureFormat::Rgb | TextureFormat::Srgb => [c[0], c[1], c[2], 1.0],
        _ => c,
    }
}

fn unpack_16(ty: ComponentType, v: u16) -> [f32; 4] {
    let bits = |shift: u16, mask: u16| f32::from((v >> shift) & mask) / f32::from(mask);
    match ty {
        ComponentType::Rgba4 => [bits(12, 0xF), bits(8, 0xF), bits(4, 0xF), bits(0, 0xF)],
        ComponentType::Rgb565 => [bits(11, 0x1F), bits(5, 0x3F), bits(0, 0x1F), 1.0],
        _ => [bits(11, 0x1F), bits(6, 0x1F), bits(1, 0x1F), bits(0, 0x1)],
    }
}

/// Expands pixels into rows of `storage`
///
/// # Arguments
/// * `format` - Transfer format of the source pixels
/// * `ty` - Component type of the source pixels
/// * `bytes` - Source bytes, rows padded to the unpack alignment
/// * `store` - Unpack state in effect for the upload
/// * `storage` - Format the texels are written into
///
/// # Returns
/// Tightly packed storage texels, or `None` when the combination has no CPU conversion
pub fn decode_pixels(format: TextureFormat, ty: ComponentType, width: u32, height: u32, bytes: &[u8], store: &PixelStore, storage: wgpu::TextureFormat) -> Option<Vec<u8>> {
    let channels = format.channels().unwrap_or(4);
    let source = SourceRows::new(bytes, width, height, ty.bytes_per_pixel(channels), store.unpack_alignment);

    if storage == wgpu::TextureFormat::Depth16Unorm {
        if ty != ComponentType::Uint16 {
            return None;
        }
        let mut out = Vec::with_capacity(source.width * source.height * 2);
        for offset in source.pixel_offsets(store.flip_y) {
            out.extend_from_slice(&source.read::<u16>(offset).unwrap_or(0).to_ne_bytes());
        }
        return Some(out);
    }

    let channels = channels as usize;
    let texel = |offset: usize| -> [f32; 4] {
        if ty.is_packed() {
            return unpack_16(ty, source.read::<u16>(offset).unwrap_or(0));
        }
        let components = std::array::from_fn(|i| {
            if i >= channels {
                return 0.0;
            }
            match ty {
                ComponentType::Uint8 => source.read::<u8>(offset + i).map_or(0.0, |v| f32::from(v) / 255.0),
                ComponentType::Uint16 => source.read::<u16>(offset + i * 2).map_or(0.0, |v| f32::from(v) / 65535.0),
                ComponentType::Uint32 => source.read::<u32>(offset + i * 4).map_or(0.0, |v| (f64::from(v) / f64::from(u32::MAX)) as f32),
                ComponentType::HalfFloat => source.read::<u16>(offset + i * 2).map_or(0.0, |v| f16::from_bits(v).to_f32()),
                _ => source.read::<f32>(offset + i * 4).unwrap_or(0.0),
            }
        });
        arrange(format, components)
    };

    match storage {
        _ if ty == ComponentType::Uint24_8 => None,
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => Some(expand::<u8>(&source, store, texel)),
        wgpu::TextureFormat::Rgba16Float => Some(expand::<f16>(&source, store, texel)),
        wgpu::TextureFormat::Rgba32Float => Some(expand::<f32>(&source, store, texel)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PixelStore {
        PixelStore::default()
    }

    #[test]
    fn test_storage_format() {
        assert_eq!(storage_format(TextureFormat::Luminance, ComponentType::Uint8), Some(wgpu::TextureFormat::Rgba8Unorm));
        assert_eq!(storage_format(TextureFormat::Rgba, ComponentType::HalfFloat), Some(wgpu::TextureFormat::Rgba16Float));
        assert_eq!(storage_format(TextureFormat::Srgba, ComponentType::Uint8), Some(wgpu::TextureFormat::Rgba8UnormSrgb));
        assert_eq!(storage_format(TextureFormat::Depth, ComponentType::Uint16), Some(wgpu::TextureFormat::Depth16Unorm));
        assert_eq!(
            storage_format(TextureFormat::Compressed(CompressedFormat::RgbaS3tcDxt5), ComponentType::Uint8),
            Some(wgpu::TextureFormat::Bc3RgbaUnorm)
        );
        assert_eq!(storage_format(TextureFormat::Compressed(CompressedFormat::RgbPvrtc4bppv1), ComponentType::Uint8), None);
    }

    #[test]
    fn test_luminance_alpha_expansion() {
        let out = decode_pixels(TextureFormat::LuminanceAlpha, ComponentType::Uint8, 2, 1, &[10, 20, 30, 40], &store(), wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(out, vec![10, 10, 10, 20, 30, 30, 30, 40]);

        let out = decode_pixels(TextureFormat::Alpha, ComponentType::Uint8, 1, 1, &[99], &store(), wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(out, vec![0, 0, 0, 99]);
    }

    #[test]
    fn test_row_alignment_and_flip() {
        // 1x2 RGB rows padded to 4 bytes
        let bytes = [1, 2, 3, 0, 4, 5, 6, 0];
        let mut unpack = store();
        unpack.unpack_alignment = 4;
        let out = decode_pixels(TextureFormat::Rgb, ComponentType::Uint8, 1, 2, &bytes, &unpack, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(out, vec![1, 2, 3, 255, 4, 5, 6, 255]);

        unpack.flip_y = true;
        let out = decode_pixels(TextureFormat::Rgb, ComponentType::Uint8, 1, 2, &bytes, &unpack, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(out, vec![4, 5, 6, 255, 1, 2, 3, 255]);
    }

    #[test]
    fn test_premultiply_alpha() {
        let mut unpack = store();
        unpack.premultiply_alpha = true;
        let out = decode_pixels(TextureFormat::Rgba, ComponentType::Uint8, 1, 1, &[255, 128, 0, 51], &unpack, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(out, vec![51, 26, 0, 51]);
    }

    #[test]
    fn test_packed_types() {
        let white = 0xFFFFu16.to_ne_bytes();
        let out = decode_pixels(TextureFormat::Rgb, ComponentType::Rgb565, 1, 1, &white, &store(), wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(out, vec![255, 255, 255, 255]);

        let red = 0xF000u16.to_ne_bytes();
        let out = decode_pixels(TextureFormat::Rgba, ComponentType::Rgba4, 1, 1, &red, &store(), wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(out, vec![255, 0, 0, 0]);
    }

    #[test]
    fn test_half_float_storage() {
        let bytes: Vec<u8> = [0.5f32, 1.0].iter().flat_map(|v| f16::from_f32(*v).to_bits().to_ne_bytes()).collect();
        let out = decode_pixels(TextureFormat::LuminanceAlpha, ComponentType::HalfFloat, 1, 1, &bytes, &store(), wgpu::TextureFormat::Rgba16Float).unwrap();
        let texels: Vec<f32> = out.chunks_exact(2).map(|b| f16::from_bits(u16::from_ne_bytes([b[0], b[1]])).to_f32()).collect();
        assert_eq!(texels, vec![0.5, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn test_short_source_reads_zero() {
        let out = decode_pixels(TextureFormat::Rgba, ComponentType::Uint8, 2, 1, &[1, 2, 3, 4], &store(), wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn test_depth_stencil_has_no_conversion() {
        assert!(decode_pixels(TextureFormat::DepthStencil, ComponentType::Uint24_8, 1, 1, &[0; 4], &store(), wgpu::TextureFormat::Depth24PlusStencil8).is_none());
    }
}
