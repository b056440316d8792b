//! GPU verification for texture-set
//!
//! This crate drives a [`texture_set::TextureSet`] on a headless wgpu device, reads the
//! resulting textures back and compares them against the pixels the uploads should produce.

pub mod compare;
pub mod scenarios;
pub mod wgpu_helpers;

/// Errors raised while setting up the device or reading textures back
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("failed to find a suitable adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create a device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("device poll failed: {0}")]
    Poll(#[from] wgpu::PollError),
    #[error("failed to map readback buffer: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("readback channel closed before the buffer was mapped")]
    MapChannelClosed,
    #[error("unsupported texture format for readback: {0:?}")]
    UnsupportedFormat(wgpu::TextureFormat),
    #[error("texture has no device storage")]
    MissingStorage,
    #[error(transparent)]
    Texture(#[from] texture_set::TextureError),
}
