//! Name vocabularies for texture options, gated by device capabilities
//!
//! The table is built once per [`TextureSet`](crate::TextureSet). Base entries are always
//! present; extension entries are merged in when the matching capability flag is set, and
//! compressed formats are additionally intersected with the formats the device reports.

use crate::config::Extensions;
use crate::error::{Result, TextureError};
use crate::formats::{ColorSpace, ComponentType, CompressedFormat, MagFilter, MinFilter, MipmapHint, TextureFormat, WrapMode};
use std::collections::HashMap;

const S3TC_FORMATS: &[CompressedFormat] = &[
    CompressedFormat::RgbS3tcDxt1,
    CompressedFormat::RgbaS3tcDxt1,
    CompressedFormat::RgbaS3tcDxt3,
    CompressedFormat::RgbaS3tcDxt5,
];

const ATC_FORMATS: &[CompressedFormat] = &[
    CompressedFormat::RgbAtc,
    CompressedFormat::RgbaAtcExplicitAlpha,
    CompressedFormat::RgbaAtcInterpolatedAlpha,
];

const PVRTC_FORMATS: &[CompressedFormat] = &[
    CompressedFormat::RgbPvrtc4bppv1,
    CompressedFormat::RgbPvrtc2bppv1,
    CompressedFormat::RgbaPvrtc4bppv1,
    CompressedFormat::RgbaPvrtc2bppv1,
];

const ETC1_FORMATS: &[CompressedFormat] = &[CompressedFormat::RgbEtc1];

/// Name → value maps for every option vocabulary, plus the derived channel tables
#[derive(Debug, Clone)]
pub struct FormatTable {
    texture_formats: HashMap<&'static str, TextureFormat>,
    texture_types: HashMap<&'static str, ComponentType>,
    wrap_modes: HashMap<&'static str, WrapMode>,
    mag_filters: HashMap<&'static str, MagFilter>,
    min_filters: HashMap<&'static str, MinFilter>,
    mipmap_hints: HashMap<&'static str, MipmapHint>,
    color_spaces: HashMap<&'static str, ColorSpace>,
    /// internal format → transfer format
    color_formats: HashMap<TextureFormat, TextureFormat>,
    /// transfer format → channel count
    format_channels: HashMap<TextureFormat, u32>,
    /// channel count → default transfer format, indexed by count
    channel_formats: [Option<TextureFormat>; 5],
}

impl FormatTable {
    /// Builds the vocabularies from capability flags
    ///
    /// # Arguments
    /// * `extensions` - Enabled device extensions
    /// * `supported_compressed` - Compressed formats the device reports as uploadable
    pub fn new(extensions: &Extensions, supported_compressed: &[CompressedFormat]) -> Self {
        let mut texture_formats = HashMap::from([
            ("alpha", TextureFormat::Alpha),
            ("luminance", TextureFormat::Luminance),
            ("luminance alpha", TextureFormat::LuminanceAlpha),
            ("rgb", TextureFormat::Rgb),
            ("rgba", TextureFormat::Rgba),
            ("rgba4", TextureFormat::Rgba4),
            ("rgb5 a1", TextureFormat::Rgb5A1),
            ("rgb565", TextureFormat::Rgb565),
        ]);

        let mut texture_types = HashMap::from([
            ("uint8", ComponentType::Uint8),
            ("rgba4", ComponentType::Rgba4),
            ("rgb565", ComponentType::Rgb565),
            ("rgb5 a1", ComponentType::Rgb5A1),
        ]);

        if extensions.ext_srgb {
            texture_formats.insert("srgb", TextureFormat::Srgb);
            texture_formats.insert("srgba", TextureFormat::Srgba);
        }

        if extensions.oes_texture_float {
            texture_types.insert("float", ComponentType::Float);
        }

        if extensions.oes_texture_half_float {
            texture_types.insert("float16", ComponentType::HalfFloat);
            texture_types.insert("half float", ComponentType::HalfFloat);
        }

        if extensions.webgl_depth_texture {
            texture_formats.insert("depth", TextureFormat::Depth);
            texture_formats.insert("depth stencil", TextureFormat::DepthStencil);

            texture_types.insert("uint16", ComponentType::Uint16);
            texture_types.insert("uint32", ComponentType::Uint32);
            texture_types.insert("depth stencil", ComponentType::Uint24_8);
        }

        let families = [
            (extensions.webgl_compressed_texture_s3tc, S3TC_FORMATS),
            (extensions.webgl_compressed_texture_atc, ATC_FORMATS),
            (extensions.webgl_compressed_texture_pvrtc, PVRTC_FORMATS),
            (extensions.webgl_compressed_texture_etc1, ETC1_FORMATS),
        ];
        for (enabled, formats) in families {
            if !enabled {
                continue;
            }
            // Only expose what the device actually accepts
            for &format in formats.iter().filter(|format| supported_compressed.contains(format)) {
                texture_formats.insert(format.name(), TextureFormat::Compressed(format));
            }
        }

        let color_formats = texture_formats.values().map(|&format| (format, format.color_format())).collect();

        let format_channels = [
            TextureFormat::Alpha,
            TextureFormat::Luminance,
            TextureFormat::LuminanceAlpha,
            TextureFormat::Rgb,
            TextureFormat::Rgba,
            TextureFormat::Depth,
            TextureFormat::DepthStencil,
        ]
        .into_iter()
        .filter_map(|format| format.channels().map(|channels| (format, channels)))
        .collect();

        let channel_formats = std::array::from_fn(|channels| TextureFormat::from_channels(channels as u32));

        Self {
            texture_formats,
            texture_types,
            wrap_modes: HashMap::from([("repeat", WrapMode::Repeat), ("clamp", WrapMode::ClampToEdge), ("mirror", WrapMode::MirroredRepeat)]),
            mag_filters: HashMap::from([("nearest", MagFilter::Nearest), ("linear", MagFilter::Linear)]),
            min_filters: HashMap::from([
                ("nearest", MinFilter::Nearest),
                ("linear", MinFilter::Linear),
                ("nearest mipmap nearest", MinFilter::NearestMipmapNearest),
                ("linear mipmap nearest", MinFilter::LinearMipmapNearest),
                ("nearest mipmap linear", MinFilter::NearestMipmapLinear),
                ("linear mipmap linear", MinFilter::LinearMipmapLinear),
                ("mipmap", MinFilter::LinearMipmapLinear),
            ]),
            mipmap_hints: HashMap::from([
                ("don't care", MipmapHint::DontCare),
                ("dont care", MipmapHint::DontCare),
                ("nice", MipmapHint::Nicest),
                ("fast", MipmapHint::Fastest),
            ]),
            color_spaces: HashMap::from([("none", ColorSpace::None), ("browser", ColorSpace::Browser)]),
            color_formats,
            format_channels,
            channel_formats,
        }
    }

    pub fn format(&self, name: &str) -> Result<TextureFormat> {
        lookup(&self.texture_formats, name, "texture format")
    }

    pub fn component_type(&self, name: &str) -> Result<ComponentType> {
        lookup(&self.texture_types, name, "texture type")
    }

    /// Returns true when `name` is both a format and a type name (e.g. `rgba4`)
    pub fn is_type_name(&self, name: &str) -> bool {
        self.texture_types.contains_key(name)
    }

    pub fn wrap_mode(&self, name: &str) -> Result<WrapMode> {
        lookup(&self.wrap_modes, name, "wrap mode")
    }

    pub fn mag_filter(&self, name: &str) -> Result<MagFilter> {
        lookup(&self.mag_filters, name, "mag filter")
    }

    pub fn min_filter(&self, name: &str) -> Result<MinFilter> {
        lookup(&self.min_filters, name, "min filter")
    }

    pub fn mipmap_hint(&self, name: &str) -> Result<MipmapHint> {
        lookup(&self.mipmap_hints, name, "mipmap hint")
    }

    pub fn color_space(&self, name: &str) -> Result<ColorSpace> {
        lookup(&self.color_spaces, name, "colorSpace")
    }

    /// Transfer format for an internal format
    pub fn color_format(&self, internal_format: TextureFormat) -> TextureFormat {
        self.color_formats.get(&internal_format).copied().unwrap_or_else(|| internal_format.color_format())
    }

    /// Channel count for a transfer format
    pub fn format_channels(&self, format: TextureFormat) -> Option<u32> {
        self.format_channels.get(&self.color_format(format)).copied()
    }

    /// Default transfer format for a channel count in `1..=4`
    pub fn channels_format(&self, channels: u32) -> Option<TextureFormat> {
        self.channel_formats.get(channels as usize).copied().flatten()
    }

    /// Names of every format the device accepts, sorted
    pub fn supported_formats(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.texture_formats.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

fn lookup<T: Copy>(map: &HashMap<&'static str, T>, name: &str, what: &str) -> Result<T> {
    map.get(name).copied().ok_or_else(|| {
        let mut accepted: Vec<_> = map.keys().copied().collect();
        accepted.sort_unstable();
        TextureError::config(format!("invalid {what} '{name}', must be one of: {}", accepted.join(", ")))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_vocabulary() {
        let table = FormatTable::new(&Extensions::default(), &[]);

        assert_eq!(table.format("rgba").unwrap(), TextureFormat::Rgba);
        assert_eq!(table.format("rgb5 a1").unwrap(), TextureFormat::Rgb5A1);
        assert!(table.format("srgb").is_err());
        assert!(table.format("depth").is_err());
        assert!(table.component_type("float").is_err());
        assert_eq!(table.min_filter("mipmap").unwrap(), MinFilter::LinearMipmapLinear);
        assert_eq!(table.wrap_mode("clamp").unwrap(), WrapMode::ClampToEdge);
        assert_eq!(table.supported_formats().len(), 8);
    }

    #[test]
    fn test_extension_entries() {
        let extensions = Extensions {
            ext_srgb: true,
            oes_texture_float: true,
            oes_texture_half_float: true,
            webgl_depth_texture: true,
            ..Default::default()
        };
        let table = FormatTable::new(&extensions, &[]);

        assert_eq!(table.format("srgba").unwrap(), TextureFormat::Srgba);
        assert_eq!(table.component_type("half float").unwrap(), ComponentType::HalfFloat);
        assert_eq!(table.component_type("float16").unwrap(), ComponentType::HalfFloat);
        assert_eq!(table.component_type("float").unwrap(), ComponentType::Float);
        assert_eq!(table.component_type("depth stencil").unwrap(), ComponentType::Uint24_8);
        assert!(table.is_type_name("depth stencil"));
    }

    #[test]
    fn test_compressed_formats_intersect_device_support() {
        let extensions = Extensions {
            webgl_compressed_texture_s3tc: true,
            webgl_compressed_texture_etc1: true,
            ..Default::default()
        };
        let table = FormatTable::new(&extensions, &[CompressedFormat::RgbaS3tcDxt5, CompressedFormat::RgbPvrtc2bppv1]);

        assert_eq!(table.format("rgba s3tc dxt5").unwrap(), TextureFormat::Compressed(CompressedFormat::RgbaS3tcDxt5));
        // Extension enabled but device does not report the format
        assert!(table.format("rgb s3tc dxt1").is_err());
        assert!(table.format("rgb etc1").is_err());
        // Device reports the format but the extension is disabled
        assert!(table.format("rgb pvrtc 2bppv1").is_err());
    }

    #[test]
    fn test_channel_tables() {
        let extensions = Extensions {
            ext_srgb: true,
            ..Default::default()
        };
        let table = FormatTable::new(&extensions, &[]);

        assert_eq!(table.color_format(TextureFormat::Rgba4), TextureFormat::Rgba);
        assert_eq!(table.color_format(TextureFormat::Rgb565), TextureFormat::Rgb);
        assert_eq!(table.color_format(TextureFormat::Srgb), TextureFormat::Rgb);
        assert_eq!(table.format_channels(TextureFormat::LuminanceAlpha), Some(2));
        assert_eq!(table.format_channels(TextureFormat::Srgba), Some(4));
        assert_eq!(table.channels_format(1), Some(TextureFormat::Luminance));
        assert_eq!(table.channels_format(3), Some(TextureFormat::Rgb));
        assert_eq!(table.channels_format(0), None);
        assert_eq!(table.channels_format(5), None);
    }

    #[test]
    fn test_unknown_name_lists_accepted_values() {
        let table = FormatTable::new(&Extensions::default(), &[]);
        let error = table.wrap_mode("wrap").unwrap_err();
        assert_eq!(error.to_string(), "invalid texture configuration: invalid wrap mode 'wrap', must be one of: clamp, mirror, repeat");
    }
}
