//! GPU texture management with GL-style semantics
//!
//! This crate creates, uploads, re-initialises, binds and destroys 2D and cube textures on
//! top of a small [`Device`] command surface. Texture creation accepts a shape, raw pixel data
//! or a keyed [`TextureOptions`] object. Inputs are normalised into per-level image
//! descriptors, validated against the device's [`Limits`] and [`Extensions`], and only then
//! uploaded. Binding assigns textures to a fixed number of texture units and evicts idle
//! occupants when every unit is taken.
//!
//! Two devices are provided: [`WgpuDevice`] drives a real `wgpu` device, and
//! [`RecordingDevice`] records the command stream for inspection.

mod buffer_pool;
pub mod config;
mod device;
pub mod error;
mod flags;
mod format_table;
pub mod formats;
mod image;
mod mipmap;
mod options;
mod pixel_data;
mod pools;
mod recording;
mod resource;
mod sampler;
mod stats;
mod texels;
mod texture_set;
mod units;
mod validate;
mod wgpu_device;

pub use buffer_pool::BufferPool;
pub use config::{Extensions, Limits, TextureSetConfig};
pub use device::{Device, HostHooks, NoHost, PixelStore, TextureParameter, Upload};
pub use error::{ConfigError, Result, TextureError};
pub use flags::FlagState;
pub use format_table::FormatTable;
pub use image::{ImageDescriptor, ImageParser, Payload};
pub use mipmap::{MAX_MIP_LEVELS, MipmapSet};
pub use options::{CubeInput, ImageSource, MipmapOption, Texture2DInput, TextureOptions, WrapOption};
pub use pixel_data::{ElementKind, ExternalImage, PixelData, StridedView, TypedBuffer, ViewStorage};
pub use pools::{FreeList, ObjectPools, PoolStats, Reusable};
pub use recording::{DeviceCommand, RecordedTexture, RecordingDevice, UploadRecord};
pub use resource::{TextureId, TextureResource};
pub use sampler::SamplerState;
pub use stats::{TextureStats, TextureStatsSnapshot};
pub use texture_set::{Texture2D, TextureCube, TextureSet};
pub use units::UnitAllocator;
pub use validate::{check_texture_2d, check_texture_cube, compressed_size, full_mip_mask};
pub use wgpu_device::{WgpuDevice, WgpuTexture};
