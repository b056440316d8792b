//! Texture creation inputs
//!
//! [`TextureOptions`] mirrors the keyed configuration object accepted by texture creation.
//! It derives `Deserialize` with camelCase keys so sampler and format settings can be
//! described in YAML; pixel payloads (`data`, `faces`, mipmap level lists) are attached in code.

use crate::pixel_data::PixelData;
use serde::Deserialize;

/// `wrap` option: one mode for both axes or an `[s, t]` pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WrapOption {
    Both(String),
    Pair([String; 2]),
}

/// `mipmap` option
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MipmapOption {
    /// Enable or disable automatic generation
    Enabled(bool),
    /// Enable automatic generation with a quality hint
    Hint(String),
    /// Explicit per-level sources; disables generation
    #[serde(skip)]
    Levels(Vec<ImageSource>),
}

/// Keyed texture configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextureOptions {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub radius: Option<u32>,
    /// `[width, height]` or `[width, height, channels]`
    pub shape: Option<Vec<u32>>,
    pub channels: Option<u32>,
    pub format: Option<String>,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    pub min: Option<String>,
    pub mag: Option<String>,
    pub wrap: Option<WrapOption>,
    pub wrap_s: Option<String>,
    pub wrap_t: Option<String>,
    pub anisotropic: Option<f32>,
    pub mipmap: Option<MipmapOption>,
    pub flip_y: Option<bool>,
    pub premultiply_alpha: Option<bool>,
    pub alignment: Option<u32>,
    pub color_space: Option<String>,
    /// Read the pixels from the current framebuffer instead of `data`
    pub copy: bool,
    pub x: Option<i32>,
    pub y: Option<i32>,
    #[serde(skip)]
    pub data: Option<PixelData>,
    /// Six cube faces in +X, -X, +Y, -Y, +Z, -Z order
    #[serde(skip)]
    pub faces: Option<Vec<ImageSource>>,
}

impl TextureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(yaml_content: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(yaml_content)
    }

    pub fn with_shape(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_channels(mut self, channels: u32) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_owned());
        self
    }

    pub fn with_type(mut self, ty: &str) -> Self {
        self.ty = Some(ty.to_owned());
        self
    }

    pub fn with_filters(mut self, min: &str, mag: &str) -> Self {
        self.min = Some(min.to_owned());
        self.mag = Some(mag.to_owned());
        self
    }

    pub fn with_wrap(mut self, wrap: &str) -> Self {
        self.wrap = Some(WrapOption::Both(wrap.to_owned()));
        self
    }

    pub fn with_mipmap(mut self, mipmap: MipmapOption) -> Self {
        self.mipmap = Some(mipmap);
        self
    }

    pub fn with_data(mut self, data: impl Into<PixelData>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_copy(mut self) -> Self {
        self.copy = true;
        self
    }

    pub fn with_faces(mut self, faces: Vec<ImageSource>) -> Self {
        self.faces = Some(faces);
        self
    }
}

/// A single image input: raw pixels or a configuration object
#[derive(Debug, Clone)]
pub enum ImageSource {
    Data(PixelData),
    Options(Box<TextureOptions>),
}

impl From<PixelData> for ImageSource {
    fn from(data: PixelData) -> Self {
        Self::Data(data)
    }
}

impl From<TextureOptions> for ImageSource {
    fn from(options: TextureOptions) -> Self {
        Self::Options(Box::new(options))
    }
}

/// Input accepted by 2D texture creation and re-initialisation
#[derive(Debug, Clone, Default)]
pub enum Texture2DInput {
    /// 1×1 placeholder
    #[default]
    Empty,
    /// Bare `width × height` shape
    Shape(u32, u32),
    Data(PixelData),
    Options(TextureOptions),
}

impl From<u32> for Texture2DInput {
    fn from(size: u32) -> Self {
        Self::Shape(size, size)
    }
}

impl From<(u32, u32)> for Texture2DInput {
    fn from((width, height): (u32, u32)) -> Self {
        Self::Shape(width, height)
    }
}

impl From<PixelData> for Texture2DInput {
    fn from(data: PixelData) -> Self {
        Self::Data(data)
    }
}

impl From<TextureOptions> for Texture2DInput {
    fn from(options: TextureOptions) -> Self {
        Self::Options(options)
    }
}

/// Input accepted by cube texture creation and re-initialisation
#[derive(Debug, Clone, Default)]
pub enum CubeInput {
    /// 1×1 faces
    #[default]
    Empty,
    /// Square faces of the given edge length
    Radius(u32),
    Options(TextureOptions),
    /// Six separate face sources
    Faces(Box<[ImageSource; 6]>),
}

impl From<u32> for CubeInput {
    fn from(radius: u32) -> Self {
        Self::Radius(radius)
    }
}

impl From<TextureOptions> for CubeInput {
    fn from(options: TextureOptions) -> Self {
        Self::Options(options)
    }
}

impl From<[ImageSource; 6]> for CubeInput {
    fn from(faces: [ImageSource; 6]) -> Self {
        Self::Faces(Box::new(faces))
    }
}
