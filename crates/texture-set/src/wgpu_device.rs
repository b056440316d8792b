//! wgpu implementation of the device command surface
//!
//! wgpu has no bind points, so [`WgpuDevice`] keeps the GL-style state itself: a table of
//! texture objects, the texture bound to each target on each unit, and the unpack state.
//! Storage is allocated lazily on the first level 0 upload and re-created whenever a level 0
//! upload changes the size or format. Sampler parameters are recorded per texture and turned
//! into a [`wgpu::Sampler`] by [`WgpuDevice::create_sampler`].
//!
//! Device commands cannot fail from the texture set's point of view. Uploads the backend can
//! not express are logged with `tracing::warn!` and skipped.

use crate::config::{Extensions, Limits, TextureSetConfig};
use crate::device::{Device, PixelStore, TextureParameter, Upload};
use crate::formats::{ComponentType, CompressedFormat, ImageTarget, MagFilter, MinFilter, MipmapHint, TextureFormat, TextureTarget, WrapMode};
use crate::texels::{decode_pixels, storage_format};
use std::collections::HashMap;

/// Texture object issued by [`WgpuDevice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WgpuTexture(u32);

/// Sampler parameters recorded for one texture
#[derive(Debug, Clone, Copy)]
struct SamplerParams {
    min_filter: MinFilter,
    mag_filter: MagFilter,
    wrap_s: WrapMode,
    wrap_t: WrapMode,
    max_anisotropy: f32,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            min_filter: MinFilter::NearestMipmapLinear,
            mag_filter: MagFilter::Linear,
            wrap_s: WrapMode::Repeat,
            wrap_t: WrapMode::Repeat,
            max_anisotropy: 1.0,
        }
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Fixed by the first bind
    target: Option<TextureTarget>,
    storage: Option<wgpu::Texture>,
    sampler: SamplerParams,
}

/// wgpu backed [`Device`]
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    slots: HashMap<u32, Slot>,
    next_texture: u32,
    /// Bound 2D and cube texture per unit
    bindings: Vec<[Option<WgpuTexture>; 2]>,
    active_unit: usize,
    pixel_store: PixelStore,
    read_framebuffer: Option<wgpu::Texture>,
    blitter: Option<MipmapBlitter>,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            slots: HashMap::new(),
            next_texture: 0,
            bindings: Vec::new(),
            active_unit: 0,
            pixel_store: PixelStore::default(),
            read_framebuffer: None,
            blitter: None,
        }
    }

    /// Limits and extensions of the underlying device
    pub fn config(&self) -> TextureSetConfig {
        let limits = self.device.limits();
        let features = self.device.features();
        TextureSetConfig {
            limits: Limits {
                max_texture_size: limits.max_texture_dimension_2d,
                max_texture_units: limits.max_sampled_textures_per_shader_stage,
                max_anisotropic: 16.0,
            },
            extensions: Extensions {
                ext_srgb: true,
                oes_texture_float: true,
                oes_texture_float_linear: features.contains(wgpu::Features::FLOAT32_FILTERABLE),
                oes_texture_half_float: true,
                webgl_depth_texture: true,
                webgl_compressed_texture_s3tc: features.contains(wgpu::Features::TEXTURE_COMPRESSION_BC),
                webgl_compressed_texture_etc1: features.contains(wgpu::Features::TEXTURE_COMPRESSION_ETC2),
                ext_texture_filter_anisotropic: true,
                ..Default::default()
            },
        }
    }

    /// Sets the framebuffer copy uploads read from
    ///
    /// The texture needs `COPY_SRC` usage and a format matching the copied textures.
    pub fn set_read_framebuffer(&mut self, framebuffer: Option<wgpu::Texture>) {
        self.read_framebuffer = framebuffer;
    }

    /// Storage of a texture, once level 0 has been specified
    pub fn texture(&self, texture: WgpuTexture) -> Option<&wgpu::Texture> {
        self.slots.get(&texture.0)?.storage.as_ref()
    }

    /// Creates a view covering every level, as a cube view for cube textures
    pub fn create_view(&self, texture: WgpuTexture) -> Option<wgpu::TextureView> {
        let slot = self.slots.get(&texture.0)?;
        let storage = slot.storage.as_ref()?;
        let dimension = match slot.target {
            Some(TextureTarget::CubeMap) => wgpu::TextureViewDimension::Cube,
            _ => wgpu::TextureViewDimension::D2,
        };
        Some(storage.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Texture set view"),
            dimension: Some(dimension),
            ..Default::default()
        }))
    }

    /// Creates a sampler from the parameters last set on a texture
    pub fn create_sampler(&self, texture: WgpuTexture) -> Option<wgpu::Sampler> {
        let params = self.slots.get(&texture.0)?.sampler;
        let (min_filter, mipmap_filter, mipmapped) = match params.min_filter {
            MinFilter::Nearest => (wgpu::FilterMode::Nearest, wgpu::FilterMode::Nearest, false),
            MinFilter::Linear => (wgpu::FilterMode::Linear, wgpu::FilterMode::Nearest, false),
            MinFilter::NearestMipmapNearest => (wgpu::FilterMode::Nearest, wgpu::FilterMode::Nearest, true),
            MinFilter::LinearMipmapNearest => (wgpu::FilterMode::Linear, wgpu::FilterMode::Nearest, true),
            MinFilter::NearestMipmapLinear => (wgpu::FilterMode::Nearest, wgpu::FilterMode::Linear, true),
            MinFilter::LinearMipmapLinear => (wgpu::FilterMode::Linear, wgpu::FilterMode::Linear, true),
        };
        let mag_filter = match params.mag_filter {
            MagFilter::Nearest => wgpu::FilterMode::Nearest,
            MagFilter::Linear => wgpu::FilterMode::Linear,
        };
        // Anisotropic filtering requires every filter to be linear
        let all_linear = [min_filter, mag_filter, mipmap_filter].iter().all(|filter| *filter == wgpu::FilterMode::Linear);
        let anisotropy_clamp = if all_linear { params.max_anisotropy.round().clamp(1.0, 16.0) as u16 } else { 1 };

        Some(self.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture set sampler"),
            address_mode_u: address_mode(params.wrap_s),
            address_mode_v: address_mode(params.wrap_t),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter,
            min_filter,
            mipmap_filter,
            lod_max_clamp: if mipmapped { 32.0 } else { 0.0 },
            anisotropy_clamp,
            ..Default::default()
        }))
    }

    fn bound(&self, target: TextureTarget) -> Option<WgpuTexture> {
        self.bindings.get(self.active_unit)?[target_index(target)]
    }

    /// Makes sure the bound texture has storage that can take `level` at `width × height`
    fn ensure_storage(&mut self, texture: WgpuTexture, target: ImageTarget, level: u32, format: wgpu::TextureFormat, width: u32, height: u32) -> bool {
        let Some(slot) = self.slots.get_mut(&texture.0) else {
            return false;
        };
        if let Some(storage) = &slot.storage {
            let fits = storage.format() == format
                && level < storage.mip_level_count()
                && level_extent(storage.width(), level) == width
                && level_extent(storage.height(), level) == height;
            if fits {
                return true;
            }
            if level > 0 {
                tracing::warn!("Level {level} upload of {width}x{height} {format:?} does not match the storage of texture {}", texture.0);
                return false;
            }
        }

        let (block_width, block_height) = format.block_dimensions();
        let (base_width, base_height) = (width.checked_shl(level).unwrap_or(width), height.checked_shl(level).unwrap_or(height));
        if base_width % block_width != 0 || base_height % block_height != 0 {
            tracing::warn!("{base_width}x{base_height} is not a multiple of the {format:?} block size");
            return false;
        }

        let size = wgpu::Extent3d {
            width: base_width,
            height: base_height,
            depth_or_array_layers: if target.texture_target() == TextureTarget::CubeMap { 6 } else { 1 },
        };
        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::COPY_SRC;
        if !format.is_compressed() {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        usage &= format.guaranteed_format_features(self.device.features()).allowed_usages;

        let storage = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("Texture set storage {}", texture.0)),
            size,
            mip_level_count: size.max_mips(wgpu::TextureDimension::D2),
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        tracing::debug!("Allocated {base_width}x{base_height}x{} {format:?} storage for texture {}", size.depth_or_array_layers, texture.0);
        if let Some(previous) = slot.storage.replace(storage) {
            previous.destroy();
        }
        true
    }

    /// Writes an upload into the bound texture at `(x, y)` of `level`
    fn write(&mut self, texture: WgpuTexture, target: ImageTarget, level: u32, x: u32, y: u32, upload: Upload<'_>) {
        let Some(storage) = self.texture(texture).cloned() else {
            tracing::warn!("Texture {} has no storage to write to", texture.0);
            return;
        };
        let layer = match target {
            ImageTarget::Texture2D => 0,
            ImageTarget::CubeFace(face) => face,
        };
        let (width, height) = upload.size();
        if x + width > level_extent(storage.width(), level) || y + height > level_extent(storage.height(), level) {
            tracing::warn!("Write of {width}x{height} at ({x}, {y}) exceeds level {level} of texture {}", texture.0);
            return;
        }
        let origin = wgpu::Origin3d { x, y, z: layer };

        match upload {
            Upload::Pixels { data: None, .. } => {}
            Upload::Pixels {
                format,
                ty,
                data: Some(buffer),
                ..
            } => match decode_pixels(format, ty, width, height, buffer.as_bytes(), &self.pixel_store, storage.format()) {
                Some(texels) => self.write_texels(&storage, level, origin, width, height, &texels),
                None => tracing::warn!("No conversion from {format:?}/{ty:?} pixels into {:?} storage", storage.format()),
            },
            Upload::Compressed { data, .. } => self.write_texels(&storage, level, origin, width, height, data),
            Upload::External { source, .. } => {
                let pixels = source.rgba8();
                let store = PixelStore {
                    unpack_alignment: 1,
                    ..self.pixel_store
                };
                match decode_pixels(TextureFormat::Rgba, ComponentType::Uint8, width, height, &pixels, &store, storage.format()) {
                    Some(texels) => self.write_texels(&storage, level, origin, width, height, &texels),
                    None => tracing::warn!("No conversion from external images into {:?} storage", storage.format()),
                }
            }
            Upload::CopyFramebuffer { x: source_x, y: source_y, .. } => self.copy_framebuffer(&storage, level, origin, source_x, source_y, width, height),
        }
    }

    fn write_texels(&self, storage: &wgpu::Texture, level: u32, origin: wgpu::Origin3d, width: u32, height: u32, texels: &[u8]) {
        let format = storage.format();
        let Some(block_bytes) = format.block_copy_size(None) else {
            tracing::warn!("{format:?} storage can not be written from the host");
            return;
        };
        let (block_width, block_height) = format.block_dimensions();
        let bytes_per_row = width.div_ceil(block_width) * block_bytes;
        let rows = height.div_ceil(block_height);
        let expected = bytes_per_row as usize * rows as usize;
        if texels.len() < expected {
            tracing::warn!("Upload of {} bytes is short of the {expected} bytes a {width}x{height} {format:?} image needs", texels.len());
            return;
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: storage,
                mip_level: level,
                origin,
                aspect: wgpu::TextureAspect::All,
            },
            &texels[..expected],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(rows),
            },
            size.physical_size(format),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn copy_framebuffer(&self, storage: &wgpu::Texture, level: u32, origin: wgpu::Origin3d, x: i32, y: i32, width: u32, height: u32) {
        let Some(framebuffer) = &self.read_framebuffer else {
            tracing::warn!("Framebuffer copy requested without a read framebuffer");
            return;
        };
        if framebuffer.format().remove_srgb_suffix() != storage.format().remove_srgb_suffix() {
            tracing::warn!("Framebuffer format {:?} can not be copied into {:?} storage", framebuffer.format(), storage.format());
            return;
        }
        let (Ok(x), Ok(y)) = (u32::try_from(x), u32::try_from(y)) else {
            tracing::warn!("Negative framebuffer copy origin ({x}, {y})");
            return;
        };
        if x + width > framebuffer.width() || y + height > framebuffer.height() {
            tracing::warn!("Framebuffer copy of {width}x{height} at ({x}, {y}) exceeds the framebuffer");
            return;
        }

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Framebuffer copy") });
        encoder.copy_texture_to_texture(
            wgpu::TexelCopyTextureInfo {
                texture: framebuffer,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyTextureInfo {
                texture: storage,
                mip_level: level,
                origin,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl Device for WgpuDevice {
    type Texture = WgpuTexture;

    fn compressed_texture_formats(&self) -> Vec<CompressedFormat> {
        let features = self.device.features();
        let mut formats = Vec::new();
        if features.contains(wgpu::Features::TEXTURE_COMPRESSION_BC) {
            formats.extend([
                CompressedFormat::RgbS3tcDxt1,
                CompressedFormat::RgbaS3tcDxt1,
                CompressedFormat::RgbaS3tcDxt3,
                CompressedFormat::RgbaS3tcDxt5,
            ]);
        }
        if features.contains(wgpu::Features::TEXTURE_COMPRESSION_ETC2) {
            formats.push(CompressedFormat::RgbEtc1);
        }
        formats
    }

    fn create_texture(&mut self) -> WgpuTexture {
        self.next_texture += 1;
        self.slots.insert(self.next_texture, Slot::default());
        WgpuTexture(self.next_texture)
    }

    fn delete_texture(&mut self, texture: WgpuTexture) {
        if let Some(storage) = self.slots.remove(&texture.0).and_then(|slot| slot.storage) {
            storage.destroy();
        }
        for binding in self.bindings.iter_mut().flatten() {
            if *binding == Some(texture) {
                *binding = None;
            }
        }
    }

    fn active_texture(&mut self, unit: u32) {
        self.active_unit = unit as usize;
        if self.bindings.len() <= self.active_unit {
            self.bindings.resize(self.active_unit + 1, [None; 2]);
        }
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<WgpuTexture>) {
        if let Some(texture) = texture {
            if let Some(slot) = self.slots.get_mut(&texture.0) {
                slot.target.get_or_insert(target);
            }
        }
        if self.bindings.len() <= self.active_unit {
            self.bindings.resize(self.active_unit + 1, [None; 2]);
        }
        self.bindings[self.active_unit][target_index(target)] = texture;
    }

    fn pixel_store(&mut self, store: PixelStore) {
        self.pixel_store = store;
    }

    fn tex_image_2d(&mut self, target: ImageTarget, level: u32, upload: Upload<'_>) {
        let Some(texture) = self.bound(target.texture_target()) else {
            tracing::warn!("Image upload to {target:?} with no texture bound");
            return;
        };
        let format = match upload {
            Upload::Pixels { internal_format, ty, .. } => storage_format(internal_format, ty),
            Upload::Compressed { format, .. } => storage_format(TextureFormat::Compressed(format), ComponentType::Uint8),
            Upload::External { internal_format, .. } => storage_format(internal_format, ComponentType::Uint8),
            Upload::CopyFramebuffer { format, .. } => storage_format(format, ComponentType::Uint8),
        };
        let Some(format) = format else {
            tracing::warn!("Upload to texture {} has no wgpu storage format", texture.0);
            return;
        };
        let (width, height) = upload.size();
        if self.ensure_storage(texture, target, level, format, width, height) {
            self.write(texture, target, level, 0, 0, upload);
        }
    }

    fn tex_sub_image_2d(&mut self, target: ImageTarget, level: u32, x: u32, y: u32, upload: Upload<'_>) {
        let Some(texture) = self.bound(target.texture_target()) else {
            tracing::warn!("Sub-image upload to {target:?} with no texture bound");
            return;
        };
        self.write(texture, target, level, x, y, upload);
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
        let Some(slot) = self.bound(target).and_then(|texture| self.slots.get_mut(&texture.0)) else {
            return;
        };
        match parameter {
            TextureParameter::MinFilter(filter) => slot.sampler.min_filter = filter,
            TextureParameter::MagFilter(filter) => slot.sampler.mag_filter = filter,
            TextureParameter::WrapS(wrap) => slot.sampler.wrap_s = wrap,
            TextureParameter::WrapT(wrap) => slot.sampler.wrap_t = wrap,
            TextureParameter::MaxAnisotropy(value) => slot.sampler.max_anisotropy = value,
        }
    }

    fn generate_mipmap(&mut self, target: TextureTarget, hint: MipmapHint) {
        let Some(storage) = self.bound(target).and_then(|texture| self.texture(texture)).cloned() else {
            tracing::warn!("Mipmap generation for {target:?} with no storage bound");
            return;
        };
        let format = storage.format();
        let features = format.guaranteed_format_features(self.device.features());
        if !features.allowed_usages.contains(wgpu::TextureUsages::RENDER_ATTACHMENT) || !features.flags.contains(wgpu::TextureFormatFeatureFlags::FILTERABLE) {
            tracing::warn!("Mipmaps can not be generated for {format:?} storage");
            return;
        }
        let blitter = self.blitter.get_or_insert_with(|| MipmapBlitter::new(&self.device));
        blitter.generate(&self.device, &self.queue, &storage, hint);
    }
}

/// Render pipelines that downsample one level into the next
struct MipmapBlitter {
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl MipmapBlitter {
    fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::include_wgsl!("mipmap_blit.wgsl"));
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mipmap bind group layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                },
                wgpu::BindGroupLayoutEntry {
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mipmap pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let sampler = |filter: wgpu::FilterMode| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Mipmap sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            })
        };

        Self {
            shader,
            bind_group_layout,
            pipeline_layout,
            linear_sampler: sampler(wgpu::FilterMode::Linear),
            nearest_sampler: sampler(wgpu::FilterMode::Nearest),
            pipelines: HashMap::new(),
        }
    }

    fn create_pipeline(device: &wgpu::Device, shader: &wgpu::ShaderModule, layout: &wgpu::PipelineLayout, format: wgpu::TextureFormat) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("Mipmap pipeline {format:?}")),
            layout: Some(layout),
            cache: None,
            vertex: wgpu::VertexState {
                module: shader,
                buffers: &[],
                compilation_options: Default::default(),
                entry_point: Some("vs_main"),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
                entry_point: Some("fs_main"),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                cull_mode: None,
                front_face: wgpu::FrontFace::Ccw,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
                unclipped_depth: false,
            },
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
            depth_stencil: None,
        })
    }

    /// Regenerates every level below 0 on every layer of `texture`
    fn generate(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture, hint: MipmapHint) {
        let format = texture.format();
        let pipeline = self
            .pipelines
            .entry(format)
            .or_insert_with(|| Self::create_pipeline(device, &self.shader, &self.pipeline_layout, format));
        let sampler = match hint {
            MipmapHint::Fastest => &self.nearest_sampler,
            MipmapHint::DontCare | MipmapHint::Nicest => &self.linear_sampler,
        };

        let level_view = |level: u32, layer: u32| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Mipmap level view"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_mip_level: level,
                mip_level_count: Some(1),
                base_array_layer: layer,
                array_layer_count: Some(1),
                ..Default::default()
            })
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Mipmap encoder") });
        for layer in 0..texture.depth_or_array_layers() {
            for level in 1..texture.mip_level_count() {
                let source = level_view(level - 1, layer);
                let destination = level_view(level, layer);
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Mipmap bind group"),
                    layout: &self.bind_group_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(&source),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                });

                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Mipmap pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &destination,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    ..Default::default()
                });
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.draw(0..3, 0..1);
            }
        }
        queue.submit(std::iter::once(encoder.finish()));
        tracing::trace!("Generated {} levels for {format:?} texture", texture.mip_level_count());
    }
}

fn target_index(target: TextureTarget) -> usize {
    match target {
        TextureTarget::Texture2D => 0,
        TextureTarget::CubeMap => 1,
    }
}

fn level_extent(extent: u32, level: u32) -> u32 {
    extent.checked_shr(level).unwrap_or(0).max(1)
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_extent() {
        assert_eq!(level_extent(16, 0), 16);
        assert_eq!(level_extent(16, 3), 2);
        assert_eq!(level_extent(16, 9), 1);
        assert_eq!(level_extent(16, 40), 1);
    }

    #[test]
    fn test_address_mode() {
        assert_eq!(address_mode(WrapMode::MirroredRepeat), wgpu::AddressMode::MirrorRepeat);
        assert_eq!(address_mode(WrapMode::ClampToEdge), wgpu::AddressMode::ClampToEdge);
    }
}
