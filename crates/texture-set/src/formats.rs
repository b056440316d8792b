//! Texture format, component type and sampler vocabularies
//!
//! These enums are the typed counterparts of the names accepted in [`TextureOptions`](crate::TextureOptions).
//! Name resolution (and capability gating) lives in [`FormatTable`](crate::FormatTable).

use serde::{Deserialize, Serialize};

/// Storage or transfer format of a texture image
///
/// The same enum describes both the device-side internal format and the transfer format
/// used while uploading. Transfer formats are always one of the base colour formats,
/// `Depth` or `DepthStencil`; see [`TextureFormat::color_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    Alpha,
    Luminance,
    LuminanceAlpha,
    Rgb,
    Rgba,
    Rgba4,
    Rgb5A1,
    Rgb565,
    Srgb,
    Srgba,
    Depth,
    DepthStencil,
    Compressed(CompressedFormat),
}

impl TextureFormat {
    /// Returns the transfer format used when uploading data for this internal format
    pub fn color_format(self) -> TextureFormat {
        match self {
            Self::Alpha | Self::Luminance | Self::LuminanceAlpha | Self::Depth | Self::DepthStencil => self,
            Self::Rgba | Self::Rgba4 | Self::Rgb5A1 | Self::Srgba => Self::Rgba,
            Self::Rgb | Self::Rgb565 | Self::Srgb => Self::Rgb,
            Self::Compressed(compressed) => {
                if compressed.has_alpha() {
                    Self::Rgba
                } else {
                    Self::Rgb
                }
            }
        }
    }

    /// Number of channels carried by a transfer format
    ///
    /// Returns `None` for internal-only formats; map them through [`color_format`](Self::color_format) first.
    pub fn channels(self) -> Option<u32> {
        match self {
            Self::Alpha | Self::Luminance | Self::Depth => Some(1),
            Self::LuminanceAlpha | Self::DepthStencil => Some(2),
            Self::Rgb => Some(3),
            Self::Rgba => Some(4),
            _ => None,
        }
    }

    /// Default transfer format for a channel count
    pub fn from_channels(channels: u32) -> Option<TextureFormat> {
        match channels {
            1 => Some(Self::Luminance),
            2 => Some(Self::LuminanceAlpha),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Component type implied by the format when no explicit type is requested
    pub fn implied_type(self) -> Option<ComponentType> {
        match self {
            Self::Rgba4 => Some(ComponentType::Rgba4),
            Self::Rgb565 => Some(ComponentType::Rgb565),
            Self::Rgb5A1 => Some(ComponentType::Rgb5A1),
            Self::Depth => Some(ComponentType::Uint32),
            Self::DepthStencil => Some(ComponentType::Uint24_8),
            _ => None,
        }
    }

    pub fn is_compressed(self) -> bool {
        matches!(self, Self::Compressed(_))
    }
}

/// Block-compressed formats, grouped by the extension that exposes them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressedFormat {
    RgbS3tcDxt1,
    RgbaS3tcDxt1,
    RgbaS3tcDxt3,
    RgbaS3tcDxt5,
    RgbAtc,
    RgbaAtcExplicitAlpha,
    RgbaAtcInterpolatedAlpha,
    RgbPvrtc4bppv1,
    RgbPvrtc2bppv1,
    RgbaPvrtc4bppv1,
    RgbaPvrtc2bppv1,
    RgbEtc1,
}

impl CompressedFormat {
    pub fn has_alpha(self) -> bool {
        !matches!(self, Self::RgbS3tcDxt1 | Self::RgbAtc | Self::RgbPvrtc4bppv1 | Self::RgbPvrtc2bppv1 | Self::RgbEtc1)
    }

    /// Name under which the format is exposed in texture options
    pub fn name(self) -> &'static str {
        match self {
            Self::RgbS3tcDxt1 => "rgb s3tc dxt1",
            Self::RgbaS3tcDxt1 => "rgba s3tc dxt1",
            Self::RgbaS3tcDxt3 => "rgba s3tc dxt3",
            Self::RgbaS3tcDxt5 => "rgba s3tc dxt5",
            Self::RgbAtc => "rgb atc",
            Self::RgbaAtcExplicitAlpha => "rgba atc explicit alpha",
            Self::RgbaAtcInterpolatedAlpha => "rgba atc interpolated alpha",
            Self::RgbPvrtc4bppv1 => "rgb pvrtc 4bppv1",
            Self::RgbPvrtc2bppv1 => "rgb pvrtc 2bppv1",
            Self::RgbaPvrtc4bppv1 => "rgba pvrtc 4bppv1",
            Self::RgbaPvrtc2bppv1 => "rgba pvrtc 2bppv1",
            Self::RgbEtc1 => "rgb etc1",
        }
    }

    /// Block dimensions and bytes per block
    pub fn block_layout(self) -> (u32, u32, u32) {
        match self {
            Self::RgbS3tcDxt1 | Self::RgbaS3tcDxt1 | Self::RgbAtc | Self::RgbEtc1 => (4, 4, 8),
            Self::RgbaS3tcDxt3 | Self::RgbaS3tcDxt5 | Self::RgbaAtcExplicitAlpha | Self::RgbaAtcInterpolatedAlpha => (4, 4, 16),
            Self::RgbPvrtc4bppv1 | Self::RgbaPvrtc4bppv1 => (4, 4, 8),
            Self::RgbPvrtc2bppv1 | Self::RgbaPvrtc2bppv1 => (8, 4, 8),
        }
    }
}

/// Per-component storage type of uploaded pixel data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Uint8,
    Uint16,
    Uint32,
    Float,
    HalfFloat,
    /// Packed 16-bit RGBA, 4 bits per channel
    Rgba4,
    /// Packed 16-bit RGB, 5/6/5 bits
    Rgb565,
    /// Packed 16-bit RGBA, 5/5/5/1 bits
    Rgb5A1,
    /// Packed 32-bit depth + stencil
    Uint24_8,
}

impl ComponentType {
    /// Bytes occupied by one pixel with `channels` components
    pub fn bytes_per_pixel(self, channels: u32) -> u32 {
        match self {
            Self::Uint8 => channels,
            Self::Uint16 | Self::HalfFloat => 2 * channels,
            Self::Uint32 | Self::Float => 4 * channels,
            Self::Rgba4 | Self::Rgb565 | Self::Rgb5A1 => 2,
            Self::Uint24_8 => 4,
        }
    }

    /// Returns true for types whose components are packed into a single integer
    pub fn is_packed(self) -> bool {
        matches!(self, Self::Rgba4 | Self::Rgb565 | Self::Rgb5A1 | Self::Uint24_8)
    }
}

/// Binding target of a texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureTarget {
    Texture2D,
    CubeMap,
}

/// Image slot an upload writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageTarget {
    Texture2D,
    /// Cube face in +X, -X, +Y, -Y, +Z, -Z order
    CubeFace(u32),
}

impl ImageTarget {
    pub fn texture_target(self) -> TextureTarget {
        match self {
            Self::Texture2D => TextureTarget::Texture2D,
            Self::CubeFace(_) => TextureTarget::CubeMap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MagFilter {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    /// Returns true when sampling reads from more than the base level
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, Self::Nearest | Self::Linear)
    }
}

/// Quality hint for automatic mipmap generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MipmapHint {
    #[default]
    DontCare,
    Fastest,
    Nicest,
}

/// Colorspace conversion applied by the device while unpacking external images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorSpace {
    #[default]
    None,
    Browser,
}
