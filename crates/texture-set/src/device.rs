//! Synchronous command surface of the graphics device
//!
//! The texture set drives the device through a small GL-like state machine: select an
//! active unit, bind a texture to a target on it, then issue uploads and parameter
//! changes against whatever is bound. Implementations are [`RecordingDevice`](crate::RecordingDevice)
//! and [`WgpuDevice`](crate::WgpuDevice).

use crate::formats::{ColorSpace, ComponentType, CompressedFormat, ImageTarget, MagFilter, MinFilter, MipmapHint, TextureFormat, TextureTarget, WrapMode};
use crate::pixel_data::{ExternalImage, TypedBuffer};
use std::fmt::Debug;

/// Unpack state applied to subsequent uploads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelStore {
    pub flip_y: bool,
    pub premultiply_alpha: bool,
    pub color_space: ColorSpace,
    pub unpack_alignment: u32,
}

impl Default for PixelStore {
    fn default() -> Self {
        Self {
            flip_y: false,
            premultiply_alpha: false,
            color_space: ColorSpace::None,
            unpack_alignment: 1,
        }
    }
}

/// Sampler parameter of the texture bound to a target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureParameter {
    MinFilter(MinFilter),
    MagFilter(MagFilter),
    WrapS(WrapMode),
    WrapT(WrapMode),
    MaxAnisotropy(f32),
}

/// Pixel source of a single image upload
#[derive(Debug, Clone, Copy)]
pub enum Upload<'a> {
    /// Typed pixels, or storage allocation only when `data` is `None`
    Pixels {
        internal_format: TextureFormat,
        format: TextureFormat,
        ty: ComponentType,
        width: u32,
        height: u32,
        data: Option<&'a TypedBuffer>,
    },
    Compressed {
        format: CompressedFormat,
        width: u32,
        height: u32,
        data: &'a [u8],
    },
    External {
        internal_format: TextureFormat,
        format: TextureFormat,
        ty: ComponentType,
        source: &'a dyn ExternalImage,
    },
    /// Rectangle read from the current framebuffer at `(x, y)`
    CopyFramebuffer {
        format: TextureFormat,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

impl Upload<'_> {
    /// Extent of the uploaded rectangle
    pub fn size(&self) -> (u32, u32) {
        match self {
            Self::Pixels { width, height, .. } | Self::Compressed { width, height, .. } | Self::CopyFramebuffer { width, height, .. } => (*width, *height),
            Self::External { source, .. } => (source.width(), source.height()),
        }
    }
}

/// Texture commands consumed by a [`TextureSet`](crate::TextureSet)
pub trait Device {
    /// Opaque texture object handle
    type Texture: Copy + Debug + PartialEq;

    /// Compressed formats the device can upload
    fn compressed_texture_formats(&self) -> Vec<CompressedFormat>;

    fn create_texture(&mut self) -> Self::Texture;
    fn delete_texture(&mut self, texture: Self::Texture);

    /// Selects the unit subsequent binds apply to
    fn active_texture(&mut self, unit: u32);
    /// Binds `texture` (or nothing) to `target` on the active unit
    fn bind_texture(&mut self, target: TextureTarget, texture: Option<Self::Texture>);

    fn pixel_store(&mut self, store: PixelStore);

    /// Replaces level `level` of the image bound at `target`
    fn tex_image_2d(&mut self, target: ImageTarget, level: u32, upload: Upload<'_>);
    /// Updates a rectangle at `(x, y)` of level `level`
    fn tex_sub_image_2d(&mut self, target: ImageTarget, level: u32, x: u32, y: u32, upload: Upload<'_>);

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter);
    /// Fills every level below the base from level 0
    fn generate_mipmap(&mut self, target: TextureTarget, hint: MipmapHint);
}

/// Host-side collaborators outside the texture subsystem
pub trait HostHooks {
    /// Current framebuffer viewport, used to size copy uploads
    fn viewport_size(&self) -> (u32, u32);

    /// Called before reading from the framebuffer or a streaming source
    fn poll(&mut self) {}
}

/// Hooks for hosts without a framebuffer: zero viewport, no-op poll
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHost;

impl HostHooks for NoHost {
    fn viewport_size(&self) -> (u32, u32) {
        (0, 0)
    }
}
