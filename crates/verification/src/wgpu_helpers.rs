//! wgpu utility functions for verification runs
//!
//! Device creation follows the usual headless setup. Readback copies a single level and
//! layer into a mappable buffer and strips the row padding wgpu requires.

use crate::VerificationError;

/// Creates a device and queue without a surface
///
/// Optional features the texture set can use (float filtering, BC and ETC2 compression)
/// are requested only when the adapter offers them.
pub async fn create_headless_device() -> Result<(wgpu::Device, wgpu::Queue), VerificationError> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await?;

    let optional = wgpu::Features::FLOAT32_FILTERABLE | wgpu::Features::TEXTURE_COMPRESSION_BC | wgpu::Features::TEXTURE_COMPRESSION_ETC2;
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Texture Set Verification"),
            required_features: adapter.features() & optional,
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            trace: Default::default(),
        })
        .await?;

    tracing::debug!("Using adapter {:?} with features {:?}", adapter.get_info().name, device.features());
    Ok((device, queue))
}

/// Reads one level of one layer of an `Rgba8Unorm` texture back to the CPU
///
/// # Arguments
/// * `device` - The wgpu device
/// * `queue` - The wgpu command queue
/// * `texture` - The texture to read from
/// * `mip_level` - Level to read
/// * `layer` - Array layer to read (the cube face for cube textures)
///
/// # Returns
/// The level as an RGBA8 image
pub fn read_texture_rgba8(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture, mip_level: u32, layer: u32) -> Result<image::RgbaImage, VerificationError> {
    let format = texture.format();
    if !matches!(format, wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb) {
        return Err(VerificationError::UnsupportedFormat(format));
    }

    let size = texture.size().mip_level_size(mip_level, wgpu::TextureDimension::D2);
    let (width, height) = (size.width, size.height);
    let unpadded_row = width * 4;
    let padded_row = unpadded_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: u64::from(padded_row * height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Readback Encoder") });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        // The receiver only goes away when the reader gave up
        let _ = sender.send(result);
    });

    device.poll(wgpu::PollType::Wait)?;
    pollster::block_on(receiver.receive()).ok_or(VerificationError::MapChannelClosed)??;

    let data = buffer_slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded_row * height) as usize);
    for row in data.chunks_exact(padded_row as usize) {
        pixels.extend_from_slice(&row[..unpadded_row as usize]);
    }
    drop(data);
    buffer.unmap();

    image::RgbaImage::from_raw(width, height, pixels).ok_or(VerificationError::UnsupportedFormat(format))
}
