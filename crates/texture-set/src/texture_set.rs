//! Texture creation, upload and unit scheduling
//!
//! A [`TextureSet`] owns the device, the format vocabulary, the unit table, the resource
//! registry and the descriptor pools. Texture handles share that context through an
//! `Rc<RefCell<..>>`, so every operation is single-threaded and synchronous. Hooks and device
//! commands must not call back into the set while an operation is running.

use crate::buffer_pool::BufferPool;
use crate::config::{Limits, TextureSetConfig};
use crate::device::{Device, HostHooks, NoHost, TextureParameter, Upload};
use crate::error::{Result, TextureError};
use crate::flags::FlagState;
use crate::format_table::FormatTable;
use crate::formats::{ImageTarget, TextureFormat, TextureTarget};
use crate::image::{ImageDescriptor, ImageParser, Payload};
use crate::mipmap::{MipmapSet, shift_extent};
use crate::options::{CubeInput, ImageSource, Texture2DInput};
use crate::pools::{ObjectPools, PoolStats};
use crate::resource::{TextureId, TextureResource};
use crate::sampler::SamplerState;
use crate::stats::TextureStats;
use crate::units::UnitAllocator;
use crate::validate::{check_texture_2d, check_texture_cube, full_mip_mask};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

const CUBE_FACES: usize = 6;

/// State shared by a texture set and all of its handles
struct Context<D: Device> {
    device: D,
    hooks: Box<dyn HostHooks>,
    config: TextureSetConfig,
    formats: FormatTable,
    units: UnitAllocator,
    registry: HashMap<TextureId, TextureResource<D::Texture>>,
    next_id: u64,
    pools: ObjectPools,
    buffers: BufferPool,
    stats: Arc<TextureStats>,
}

impl<D: Device> Context<D> {
    /// Creates the device texture and registers a resource with ref count 1
    fn allocate(&mut self, target: TextureTarget) -> TextureId {
        self.next_id += 1;
        let id = TextureId(self.next_id);
        let handle = self.device.create_texture();
        self.registry.insert(id, TextureResource::new(id, target, handle));
        self.stats.inc(target);
        id
    }

    fn resource(&self, id: TextureId) -> Result<&TextureResource<D::Texture>> {
        self.registry.get(&id).ok_or(TextureError::Destroyed(id))
    }

    fn resource_mut(&mut self, id: TextureId) -> Result<&mut TextureResource<D::Texture>> {
        self.registry.get_mut(&id).ok_or(TextureError::Destroyed(id))
    }

    fn parser(&mut self) -> (ImageParser<'_>, &mut ObjectPools) {
        let viewport = self.hooks.viewport_size();
        (
            ImageParser {
                formats: &self.formats,
                config: &self.config,
                buffers: &mut self.buffers,
                viewport,
            },
            &mut self.pools,
        )
    }

    /// (Re)initialises a 2D texture; descriptors are returned to their pools on every path
    fn init_texture_2d(&mut self, id: TextureId, input: Texture2DInput) -> Result<(u32, u32)> {
        let mut sampler = self.pools.samplers.take();
        let mut mipmap = self.pools.mipmaps.take();
        let result = self.build_texture_2d(id, input, &mut sampler, &mut mipmap);
        self.pools.recycle_mipmap(mipmap, &mut self.buffers);
        self.pools.samplers.give_back(sampler);
        result
    }

    fn build_texture_2d(&mut self, id: TextureId, input: Texture2DInput, sampler: &mut SamplerState, mipmap: &mut MipmapSet) -> Result<(u32, u32)> {
        match input {
            Texture2DInput::Empty => mipmap.parse_shape(&mut self.pools.images, 1, 1),
            Texture2DInput::Shape(width, height) => mipmap.parse_shape(&mut self.pools.images, width, height),
            Texture2DInput::Data(data) => {
                let (mut parser, pools) = self.parser();
                mipmap.parse_source(&mut parser, &mut pools.images, ImageSource::Data(data))?;
            }
            Texture2DInput::Options(options) => {
                sampler.apply_options(&options, &self.formats, &self.config)?;
                let (mut parser, pools) = self.parser();
                mipmap.parse_source(&mut parser, &mut pools.images, ImageSource::Options(Box::new(options)))?;
            }
        }

        let FlagState { width, height, .. } = mipmap.flags;
        if sampler.generate_mipmaps {
            mipmap.mipmask = full_mip_mask(width, height);
        }
        check_texture_2d(sampler, mipmap, &self.config)?;

        let resource = self.resource_mut(id)?;
        resource.flags = mipmap.flags;
        resource.mipmask = mipmap.mipmask;
        let handle = resource.handle;

        self.temp_bind(TextureTarget::Texture2D, handle);
        self.upload_mipmap(mipmap, ImageTarget::Texture2D);
        self.apply_sampler(TextureTarget::Texture2D, sampler);
        self.temp_restore();

        tracing::debug!("Initialized 2D texture {id}: {width}x{height} {:?}/{:?}, mipmask={:#b}", mipmap.flags.internal_format, mipmap.flags.ty, mipmap.mipmask);
        Ok((width, height))
    }

    fn init_texture_cube(&mut self, id: TextureId, input: CubeInput) -> Result<(u32, u32)> {
        let mut sampler = self.pools.samplers.take();
        let mut faces: Vec<MipmapSet> = (0..CUBE_FACES).map(|_| self.pools.mipmaps.take()).collect();
        let result = self.build_texture_cube(id, input, &mut sampler, &mut faces);
        for face in faces {
            self.pools.recycle_mipmap(face, &mut self.buffers);
        }
        self.pools.samplers.give_back(sampler);
        result
    }

    fn build_texture_cube(&mut self, id: TextureId, input: CubeInput, sampler: &mut SamplerState, faces: &mut [MipmapSet]) -> Result<(u32, u32)> {
        match input {
            CubeInput::Empty => {
                for face in faces.iter_mut() {
                    face.parse_shape(&mut self.pools.images, 1, 1);
                }
            }
            CubeInput::Radius(radius) => {
                let radius = radius.max(1);
                for face in faces.iter_mut() {
                    face.parse_shape(&mut self.pools.images, radius, radius);
                }
            }
            CubeInput::Faces(sources) => {
                let (mut parser, pools) = self.parser();
                for (face, source) in faces.iter_mut().zip(*sources) {
                    face.parse_source(&mut parser, &mut pools.images, source)?;
                }
            }
            CubeInput::Options(mut options) => {
                sampler.apply_options(&options, &self.formats, &self.config)?;
                let mut base = FlagState::default();
                base.apply_options(&options, &self.formats, &self.config)?;

                let face_sources = options.faces.take();
                let (mut parser, pools) = self.parser();
                match face_sources {
                    Some(sources) => {
                        if sources.len() != CUBE_FACES {
                            return Err(TextureError::config(format!("cube faces must be a length 6 array, got {}", sources.len())));
                        }
                        for (face, source) in faces.iter_mut().zip(sources) {
                            face.flags = base;
                            face.parse_source(&mut parser, &mut pools.images, source)?;
                        }
                    }
                    None => {
                        for face in faces.iter_mut() {
                            face.parse_source(&mut parser, &mut pools.images, ImageSource::Options(Box::new(options.clone())))?;
                        }
                    }
                }
            }
        }

        let base = faces[0].flags;
        let mipmask = if sampler.generate_mipmaps { full_mip_mask(base.width, base.height) } else { faces[0].mipmask };
        check_texture_cube(sampler, &base, faces, &self.config)?;

        let resource = self.resource_mut(id)?;
        resource.flags = base;
        resource.mipmask = mipmask;
        let handle = resource.handle;

        self.temp_bind(TextureTarget::CubeMap, handle);
        for (index, face) in faces.iter().enumerate() {
            self.upload_mipmap(face, ImageTarget::CubeFace(index as u32));
        }
        self.apply_sampler(TextureTarget::CubeMap, sampler);
        self.temp_restore();

        tracing::debug!("Initialized cube texture {id}: {}x{} {:?}/{:?}, mipmask={mipmask:#b}", base.width, base.height, base.internal_format, base.ty);
        Ok((base.width, base.height))
    }

    /// Binds `handle` on unit 0 for an upload
    fn temp_bind(&mut self, target: TextureTarget, handle: D::Texture) {
        self.device.active_texture(0);
        self.device.bind_texture(target, Some(handle));
    }

    /// Rebinds whatever occupies unit 0 after [`temp_bind`](Self::temp_bind)
    fn temp_restore(&mut self) {
        match self.units.occupant(0).and_then(|id| self.registry.get(&id)) {
            Some(previous) => {
                let (target, handle) = (previous.target, previous.handle);
                self.device.bind_texture(target, Some(handle));
            }
            None => self.device.bind_texture(TextureTarget::Texture2D, None),
        }
    }

    /// Uploads levels in order until the first missing one
    fn upload_mipmap(&mut self, mipmap: &MipmapSet, target: ImageTarget) {
        for (level, image) in mipmap.images.iter().map_while(Option::as_ref).enumerate() {
            self.prepare_upload(image);
            tracing::trace!("Uploading {target:?} level {level}: {}x{}", image.flags.width, image.flags.height);
            self.device.tex_image_2d(target, level as u32, image_upload(image));
        }
    }

    fn prepare_upload(&mut self, image: &ImageDescriptor) {
        self.device.pixel_store(image.flags.pixel_store());
        if image.needs_poll || matches!(image.payload, Payload::Copy) {
            self.hooks.poll();
        }
    }

    fn apply_sampler(&mut self, target: TextureTarget, sampler: &SamplerState) {
        self.device.tex_parameter(target, TextureParameter::MinFilter(sampler.min_filter));
        self.device.tex_parameter(target, TextureParameter::MagFilter(sampler.mag_filter));
        self.device.tex_parameter(target, TextureParameter::WrapS(sampler.wrap_s));
        self.device.tex_parameter(target, TextureParameter::WrapT(sampler.wrap_t));
        if self.config.extensions.ext_texture_filter_anisotropic {
            self.device.tex_parameter(target, TextureParameter::MaxAnisotropy(sampler.anisotropic));
        }
        if sampler.generate_mipmaps {
            self.device.generate_mipmap(target, sampler.mipmap_hint);
        }
    }

    fn subimage(&mut self, id: TextureId, target: ImageTarget, source: ImageSource, x: i32, y: i32, level: u32) -> Result<()> {
        let resource = self.resource(id)?;
        let (flags, has_level, texture_target, handle) = (resource.flags, resource.has_level(level), resource.target, resource.handle);

        let mut image = self.pools.images.take();
        let result = self.write_subimage(&mut image, flags, has_level, source, x, y, level);
        if result.is_ok() {
            self.temp_bind(texture_target, handle);
            self.prepare_upload(&image);
            tracing::trace!("Uploading {target:?} level {level} region {}x{} at ({x}, {y})", image.flags.width, image.flags.height);
            self.device.tex_sub_image_2d(target, level, x as u32, y as u32, image_upload(&image));
            self.temp_restore();
        }
        self.pools.recycle_image(image, &mut self.buffers);
        result
    }

    /// Parses and checks a sub-image; nothing is sent to the device here
    #[allow(clippy::too_many_arguments)]
    fn write_subimage(&mut self, image: &mut ImageDescriptor, flags: FlagState, has_level: bool, source: ImageSource, x: i32, y: i32, level: u32) -> Result<()> {
        let level_width = i64::from(shift_extent(flags.width, level as usize));
        let level_height = i64::from(shift_extent(flags.height, level as usize));

        image.flags = flags;
        image.flags.width = (level_width - i64::from(x)).clamp(0, i64::from(u32::MAX)) as u32;
        image.flags.height = (level_height - i64::from(y)).clamp(0, i64::from(u32::MAX)) as u32;

        let (mut parser, _) = self.parser();
        parser.parse(image, source)?;

        if !image.flags.same_format(&flags) {
            return Err(TextureError::FormatMismatch {
                expected: (flags.internal_format, flags.ty),
                actual: (image.flags.internal_format, image.flags.ty),
            });
        }

        let (width, height) = (i64::from(image.flags.width), i64::from(image.flags.height));
        if x < 0 || y < 0 || i64::from(x) + width > level_width || i64::from(y) + height > level_height {
            return Err(TextureError::OutOfBounds(format!(
                "subimage write of {width}x{height} at ({x}, {y}) into {level_width}x{level_height} level {level}"
            )));
        }

        if !has_level {
            return Err(TextureError::MissingLevel(level));
        }

        if !image.has_payload() {
            return Err(TextureError::NoData);
        }
        Ok(())
    }

    /// Reallocates every populated level at a new size, discarding contents
    fn resize(&mut self, id: TextureId, width: u32, height: u32) -> Result<bool> {
        let max_size = self.config.limits.max_texture_size;
        if width == 0 || height == 0 || width > max_size || height > max_size {
            return Err(TextureError::shape(format!("{width}x{height} must be within 1..={max_size} on both axes")));
        }

        let resource = self.resource_mut(id)?;
        if resource.flags.compressed {
            return Err(TextureError::config("compressed textures can not be resized"));
        }
        if (resource.flags.width, resource.flags.height) == (width, height) {
            return Ok(false);
        }
        resource.flags.width = width;
        resource.flags.height = height;
        let (flags, mipmask, target, handle) = (resource.flags, resource.mipmask, resource.target, resource.handle);

        let image_targets: Vec<ImageTarget> = match target {
            TextureTarget::Texture2D => vec![ImageTarget::Texture2D],
            TextureTarget::CubeMap => (0..CUBE_FACES as u32).map(ImageTarget::CubeFace).collect(),
        };

        self.temp_bind(target, handle);
        for image_target in image_targets {
            for level in 0..u32::BITS {
                if mipmask >> level == 0 {
                    break;
                }
                let (level_width, level_height) = (width >> level, height >> level);
                if level_width == 0 || level_height == 0 {
                    break;
                }
                let upload = Upload::Pixels {
                    internal_format: flags.internal_format,
                    format: flags.format,
                    ty: flags.ty,
                    width: level_width,
                    height: level_height,
                    data: None,
                };
                self.device.tex_image_2d(image_target, level, upload);
            }
        }
        self.temp_restore();

        tracing::debug!("Resized texture {id} to {width}x{height}");
        Ok(true)
    }

    /// Assigns a unit, evicting the first idle occupant when every unit is taken
    fn bind(&mut self, id: TextureId) -> Result<u32> {
        let resource = self.resource_mut(id)?;
        if let Some(unit) = resource.unit {
            resource.bind_count += 1;
            return Ok(unit);
        }

        let registry = &self.registry;
        let Some((unit, evicted)) = self.units.first_available(|occupant| registry.get(&occupant).is_none_or(TextureResource::is_idle)) else {
            return Err(TextureError::UnitExhausted(self.units.len()));
        };

        if let Some(evicted) = evicted {
            if let Some(previous) = self.registry.get_mut(&evicted) {
                previous.unit = None;
            }
            tracing::debug!("Evicted texture {evicted} from unit {unit}");
        }

        self.units.assign(unit, id);
        let resource = self.resource_mut(id)?;
        resource.unit = Some(unit);
        resource.bind_count += 1;
        let (target, handle) = (resource.target, resource.handle);
        self.device.active_texture(unit);
        self.device.bind_texture(target, Some(handle));
        Ok(unit)
    }

    fn unbind(&mut self, id: TextureId) -> Result<()> {
        let resource = self.resource_mut(id)?;
        resource.bind_count = resource.bind_count.saturating_sub(1);
        Ok(())
    }

    fn inc_ref(&mut self, id: TextureId) -> Result<()> {
        self.resource_mut(id)?.ref_count += 1;
        Ok(())
    }

    fn dec_ref(&mut self, id: TextureId) -> Result<()> {
        let resource = self.registry.get_mut(&id).ok_or(TextureError::DoubleDestroy(id))?;
        resource.ref_count = resource.ref_count.saturating_sub(1);
        if resource.ref_count == 0 {
            self.release(id);
        }
        Ok(())
    }

    /// Physically releases a resource: unit, registry entry, device handle, counters
    fn release(&mut self, id: TextureId) {
        let Some(resource) = self.registry.remove(&id) else {
            return;
        };
        if let Some(unit) = resource.unit {
            self.device.active_texture(unit);
            self.device.bind_texture(resource.target, None);
            self.units.release(unit);
        }
        self.device.delete_texture(resource.handle);
        self.stats.dec(resource.target);
        tracing::debug!("Destroyed texture {id}");
    }

    fn clear_all(&mut self) {
        for unit in 0..self.units.len() {
            let target = self
                .units
                .occupant(unit)
                .and_then(|id| self.registry.get(&id))
                .map_or(TextureTarget::Texture2D, |resource| resource.target);
            self.device.active_texture(unit);
            self.device.bind_texture(target, None);
        }
        self.units.clear();

        let mut ids: Vec<TextureId> = self.registry.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(resource) = self.registry.get_mut(&id) {
                resource.unit = None;
            }
            self.release(id);
        }
        self.stats.reset();
        tracing::debug!("Cleared all textures");
    }
}

impl<D: Device> Drop for Context<D> {
    fn drop(&mut self) {
        for (_, resource) in self.registry.drain() {
            self.device.delete_texture(resource.handle);
        }
    }
}

/// Builds the device upload for a parsed image
fn image_upload(image: &ImageDescriptor) -> Upload<'_> {
    let flags = &image.flags;
    match (&image.payload, flags.internal_format) {
        (Payload::External(source), _) => Upload::External {
            internal_format: flags.internal_format,
            format: flags.format,
            ty: flags.ty,
            source: &**source,
        },
        (Payload::Copy, _) => Upload::CopyFramebuffer {
            format: flags.format,
            x: image.x_offset,
            y: image.y_offset,
            width: flags.width,
            height: flags.height,
        },
        (Payload::Buffer(buffer), TextureFormat::Compressed(format)) => Upload::Compressed {
            format,
            width: flags.width,
            height: flags.height,
            data: buffer.as_bytes(),
        },
        (payload, _) => Upload::Pixels {
            internal_format: flags.internal_format,
            format: flags.format,
            ty: flags.ty,
            width: flags.width,
            height: flags.height,
            data: match payload {
                Payload::Buffer(buffer) => Some(buffer),
                _ => None,
            },
        },
    }
}

/// Owner of all textures created against one device
///
/// # Example
/// ```
/// use texture_set::{RecordingDevice, TextureOptions, TextureSet, TextureSetConfig};
///
/// let textures = TextureSet::new(RecordingDevice::new(), TextureSetConfig::default());
/// let texture = textures
///     .create_texture_2d(TextureOptions::new().with_shape(2, 2).with_data(vec![255u8; 16]))
///     .unwrap();
/// assert_eq!((texture.width(), texture.height()), (2, 2));
/// assert_eq!(texture.bind().unwrap(), 0);
/// ```
pub struct TextureSet<D: Device> {
    shared: Rc<RefCell<Context<D>>>,
}

impl<D: Device> TextureSet<D> {
    /// Creates a texture set without a framebuffer host
    pub fn new(device: D, config: TextureSetConfig) -> Self {
        Self::with_hooks(device, config, NoHost)
    }

    /// Creates a texture set
    ///
    /// # Arguments
    /// * `device` - Device that executes texture commands
    /// * `config` - Limits and extensions of the device
    /// * `hooks` - Viewport provider and poll callback of the host
    pub fn with_hooks(device: D, config: TextureSetConfig, hooks: impl HostHooks + 'static) -> Self {
        let formats = FormatTable::new(&config.extensions, &device.compressed_texture_formats());
        let units = UnitAllocator::new(config.limits.max_texture_units);
        tracing::debug!(
            "Texture set ready: {} units, max size {}, formats [{}]",
            config.limits.max_texture_units,
            config.limits.max_texture_size,
            formats.supported_formats().join(", ")
        );
        let context = Context {
            device,
            hooks: Box::new(hooks),
            config,
            formats,
            units,
            registry: HashMap::new(),
            next_id: 0,
            pools: ObjectPools::default(),
            buffers: BufferPool::new(),
            stats: Arc::new(TextureStats::new()),
        };
        Self {
            shared: Rc::new(RefCell::new(context)),
        }
    }

    /// Creates a 2D texture from a shape, pixel data or a configuration object
    pub fn create_texture_2d(&self, input: impl Into<Texture2DInput>) -> Result<Texture2D<D>> {
        let mut context = self.shared.borrow_mut();
        let id = context.allocate(TextureTarget::Texture2D);
        match context.init_texture_2d(id, input.into()) {
            Ok(size) => Ok(Texture2D {
                shared: Rc::clone(&self.shared),
                id,
                size: Cell::new(size),
            }),
            Err(error) => {
                context.release(id);
                Err(error)
            }
        }
    }

    /// Creates a cube texture from a radius, six face sources or a configuration object
    pub fn create_texture_cube(&self, input: impl Into<CubeInput>) -> Result<TextureCube<D>> {
        let mut context = self.shared.borrow_mut();
        let id = context.allocate(TextureTarget::CubeMap);
        match context.init_texture_cube(id, input.into()) {
            Ok(size) => Ok(TextureCube {
                shared: Rc::clone(&self.shared),
                id,
                size: Cell::new(size),
            }),
            Err(error) => {
                context.release(id);
                Err(error)
            }
        }
    }

    /// Unbinds every unit and releases every live texture
    pub fn clear_all(&self) {
        self.shared.borrow_mut().clear_all();
    }

    pub fn stats(&self) -> Arc<TextureStats> {
        Arc::clone(&self.shared.borrow().stats)
    }

    pub fn limits(&self) -> Limits {
        self.shared.borrow().config.limits.clone()
    }

    /// Names of the formats accepted by `format`
    pub fn supported_formats(&self) -> Vec<&'static str> {
        self.shared.borrow().formats.supported_formats()
    }

    pub fn device(&self) -> Ref<'_, D> {
        Ref::map(self.shared.borrow(), |context| &context.device)
    }

    pub fn device_mut(&self) -> RefMut<'_, D> {
        RefMut::map(self.shared.borrow_mut(), |context| &mut context.device)
    }

    /// Descriptors and buffers currently borrowed from the pools
    pub fn pool_stats(&self) -> PoolStats {
        let context = self.shared.borrow();
        context.pools.stats(&context.buffers)
    }

    /// Number of textures not yet physically released
    pub fn live_textures(&self) -> usize {
        self.shared.borrow().registry.len()
    }

    pub fn unit_occupant(&self, unit: u32) -> Option<TextureId> {
        self.shared.borrow().units.occupant(unit)
    }
}

macro_rules! texture_handle_methods {
    () => {
        pub fn id(&self) -> TextureId {
            self.id
        }

        pub fn width(&self) -> u32 {
            self.size.get().0
        }

        pub fn height(&self) -> u32 {
            self.size.get().1
        }

        /// Device handle of the texture
        pub fn handle(&self) -> Result<D::Texture> {
            Ok(self.shared.borrow().resource(self.id)?.handle)
        }

        /// Flags of level 0
        pub fn flags(&self) -> Result<FlagState> {
            Ok(self.shared.borrow().resource(self.id)?.flags)
        }

        /// Binds the texture to a unit and marks it in use
        ///
        /// # Returns
        /// The unit the texture occupies
        pub fn bind(&self) -> Result<u32> {
            self.shared.borrow_mut().bind(self.id)
        }

        /// Marks one use as finished; the unit stays assigned until evicted
        pub fn unbind(&self) -> Result<()> {
            self.shared.borrow_mut().unbind(self.id)
        }

        /// Unit the texture occupies, if any
        pub fn unit(&self) -> Result<Option<u32>> {
            Ok(self.shared.borrow().resource(self.id)?.unit)
        }

        /// Adds a reference; each holder calls [`destroy`](Self::destroy) once
        pub fn inc_ref(&self) -> Result<()> {
            self.shared.borrow_mut().inc_ref(self.id)
        }

        /// Drops a reference, releasing the texture when none remain
        pub fn destroy(&self) -> Result<()> {
            self.shared.borrow_mut().dec_ref(self.id)
        }
    };
}

/// Handle to a 2D texture
pub struct Texture2D<D: Device> {
    shared: Rc<RefCell<Context<D>>>,
    id: TextureId,
    size: Cell<(u32, u32)>,
}

impl<D: Device> Texture2D<D> {
    texture_handle_methods!();

    /// Writes a rectangle into level `level` at `(x, y)`
    ///
    /// The data must match the texture's format and type. Without an explicit shape the
    /// rectangle extends to the level's right and bottom edges.
    pub fn subimage(&self, data: impl Into<ImageSource>, x: i32, y: i32, level: u32) -> Result<()> {
        self.shared.borrow_mut().subimage(self.id, ImageTarget::Texture2D, data.into(), x, y, level)
    }

    /// Re-creates the texture contents keeping its identity, references and unit
    pub fn reinitialize(&self, input: impl Into<Texture2DInput>) -> Result<()> {
        let size = self.shared.borrow_mut().init_texture_2d(self.id, input.into())?;
        self.size.set(size);
        Ok(())
    }

    /// Reallocates storage at a new size; contents become undefined
    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        if self.shared.borrow_mut().resize(self.id, width, height)? {
            self.size.set((width, height));
        }
        Ok(())
    }
}

/// Handle to a cube texture
pub struct TextureCube<D: Device> {
    shared: Rc<RefCell<Context<D>>>,
    id: TextureId,
    size: Cell<(u32, u32)>,
}

impl<D: Device> TextureCube<D> {
    texture_handle_methods!();

    /// Writes a rectangle into level `level` of face `face` (+X, -X, +Y, -Y, +Z, -Z)
    pub fn subimage(&self, face: u32, data: impl Into<ImageSource>, x: i32, y: i32, level: u32) -> Result<()> {
        if face as usize >= CUBE_FACES {
            return Err(TextureError::config(format!("invalid cube face {face}, must be 0..6")));
        }
        self.shared.borrow_mut().subimage(self.id, ImageTarget::CubeFace(face), data.into(), x, y, level)
    }

    pub fn reinitialize(&self, input: impl Into<CubeInput>) -> Result<()> {
        let size = self.shared.borrow_mut().init_texture_cube(self.id, input.into())?;
        self.size.set(size);
        Ok(())
    }

    /// Reallocates every face at `radius × radius`; contents become undefined
    pub fn resize(&self, radius: u32) -> Result<()> {
        if self.shared.borrow_mut().resize(self.id, radius, radius)? {
            self.size.set((radius, radius));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TextureOptions;
    use crate::pixel_data::PixelData;
    use crate::recording::{DeviceCommand, RecordedTexture, RecordingDevice, UploadRecord};

    fn texture_set(units: u32) -> TextureSet<RecordingDevice> {
        let mut config = TextureSetConfig::default();
        config.limits.max_texture_units = units;
        TextureSet::new(RecordingDevice::new(), config)
    }

    fn assert_pools_idle(textures: &TextureSet<RecordingDevice>) {
        assert!(textures.pool_stats().is_idle(), "pools still hold {:?}", textures.pool_stats());
    }

    #[test]
    fn test_create_shape_command_stream() {
        let textures = texture_set(4);
        let texture = textures.create_texture_2d((4, 2)).unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 2));

        let commands = textures.device_mut().take_commands();
        assert_eq!(commands[0], DeviceCommand::CreateTexture(RecordedTexture(1)));
        assert_eq!(commands[1], DeviceCommand::ActiveTexture(0));
        assert_eq!(
            commands[2],
            DeviceCommand::BindTexture {
                target: TextureTarget::Texture2D,
                texture: Some(RecordedTexture(1))
            }
        );
        assert!(matches!(commands[3], DeviceCommand::PixelStore(_)));
        assert!(matches!(
            &commands[4],
            DeviceCommand::TexImage {
                level: 0,
                upload: UploadRecord::Pixels { width: 4, height: 2, data: None, .. },
                ..
            }
        ));
        // min, mag, wrap s, wrap t
        assert_eq!(commands[5..9].iter().filter(|command| matches!(command, DeviceCommand::TexParameter { .. })).count(), 4);
        assert_eq!(
            commands[9],
            DeviceCommand::BindTexture {
                target: TextureTarget::Texture2D,
                texture: None
            }
        );
        assert_eq!(commands.len(), 10);
        assert_pools_idle(&textures);
    }

    #[test]
    fn test_failed_creation_releases_resource() {
        let textures = texture_set(4);
        let error = textures.create_texture_2d(TextureOptions::new().with_shape(2, 2).with_data(vec![0.0f64; 3])).err().unwrap();
        assert!(matches!(error, TextureError::LengthMismatch { .. }));
        assert_eq!(textures.live_textures(), 0);
        assert_eq!(textures.device().live_textures(), 0);
        assert_eq!(textures.stats().texture_count(), 0);
        assert!(!textures.device().commands().iter().any(DeviceCommand::is_upload));
        assert_pools_idle(&textures);
    }

    #[test]
    fn test_temp_restore_rebinds_unit_zero() {
        let textures = texture_set(2);
        let first = textures.create_texture_2d(1).unwrap();
        assert_eq!(first.bind().unwrap(), 0);
        textures.device_mut().take_commands();

        let _second = textures.create_texture_2d(1).unwrap();
        let commands = textures.device().commands().to_vec();
        assert_eq!(
            commands.last(),
            Some(&DeviceCommand::BindTexture {
                target: TextureTarget::Texture2D,
                texture: Some(first.handle().unwrap())
            })
        );
    }

    #[test]
    fn test_anisotropy_needs_extension() {
        let mut config = TextureSetConfig::default();
        config.limits.max_anisotropic = 16.0;
        let options = TextureOptions {
            anisotropic: Some(8.0),
            ..Default::default()
        };

        let textures = TextureSet::new(RecordingDevice::new(), config.clone());
        textures.create_texture_2d(options.clone()).unwrap();
        let has_anisotropy = |textures: &TextureSet<RecordingDevice>| {
            textures.device().commands().iter().any(|command| {
                matches!(
                    command,
                    DeviceCommand::TexParameter {
                        parameter: TextureParameter::MaxAnisotropy(_),
                        ..
                    }
                )
            })
        };
        assert!(!has_anisotropy(&textures));

        config.extensions.ext_texture_filter_anisotropic = true;
        let textures = TextureSet::new(RecordingDevice::new(), config);
        textures.create_texture_2d(options).unwrap();
        assert!(has_anisotropy(&textures));
    }

    #[test]
    fn test_generate_mipmaps() {
        let textures = texture_set(4);
        let texture = textures.create_texture_2d(TextureOptions::new().with_shape(8, 8).with_filters("mipmap", "linear")).unwrap();
        assert_eq!(texture.flags().unwrap().width, 8);

        let commands = textures.device().commands().to_vec();
        let generate = commands.iter().position(|command| matches!(command, DeviceCommand::GenerateMipmap { .. })).unwrap();
        let upload = commands.iter().position(DeviceCommand::is_upload).unwrap();
        assert!(upload < generate);
        assert_eq!(commands.iter().filter(|command| command.is_upload()).count(), 1);

        // Generated levels count as populated for sub-image uploads
        texture.subimage(PixelData::from(vec![0u8; 4]), 0, 0, 3).unwrap();
    }

    #[test]
    fn test_mipmap_generation_needs_power_of_two() {
        let textures = texture_set(4);
        let error = textures.create_texture_2d(TextureOptions::new().with_shape(6, 6).with_filters("mipmap", "linear")).err().unwrap();
        assert!(matches!(error, TextureError::Shape(_)));
    }

    #[test]
    fn test_reinitialize_keeps_identity() {
        let textures = texture_set(4);
        let texture = textures.create_texture_2d(2).unwrap();
        let unit = texture.bind().unwrap();
        let handle = texture.handle().unwrap();

        texture.reinitialize(TextureOptions::new().with_shape(8, 4).with_format("luminance")).unwrap();
        assert_eq!((texture.width(), texture.height()), (8, 4));
        assert_eq!(texture.handle().unwrap(), handle);
        assert_eq!(texture.unit().unwrap(), Some(unit));
        assert_eq!(texture.flags().unwrap().internal_format, TextureFormat::Luminance);
        assert_eq!(textures.stats().texture_count(), 1);

        // A failed re-initialisation leaves the previous state intact
        assert!(texture.reinitialize(TextureOptions::new().with_shape(0, 4)).is_err());
        assert_eq!((texture.width(), texture.height()), (8, 4));
        assert_eq!(texture.flags().unwrap().internal_format, TextureFormat::Luminance);
        assert_pools_idle(&textures);
    }

    #[test]
    fn test_resize() {
        let textures = texture_set(4);
        let texture = textures.create_texture_2d(TextureOptions::new().with_shape(8, 8).with_filters("mipmap", "nearest")).unwrap();
        textures.device_mut().take_commands();

        texture.resize(4, 4).unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 4));
        let sizes: Vec<_> = textures
            .device()
            .commands()
            .iter()
            .filter_map(|command| match command {
                DeviceCommand::TexImage {
                    level,
                    upload: UploadRecord::Pixels { width, height, data: None, .. },
                    ..
                } => Some((*level, *width, *height)),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![(0, 4, 4), (1, 2, 2), (2, 1, 1)]);

        textures.device_mut().take_commands();
        texture.resize(4, 4).unwrap();
        assert!(textures.device().commands().is_empty());
        assert!(matches!(texture.resize(0, 4), Err(TextureError::Shape(_))));
    }

    #[test]
    fn test_inc_ref_requires_matching_destroys() {
        let textures = texture_set(4);
        let texture = textures.create_texture_2d(1).unwrap();
        texture.inc_ref().unwrap();

        texture.destroy().unwrap();
        assert_eq!(textures.live_textures(), 1);
        texture.destroy().unwrap();
        assert_eq!(textures.live_textures(), 0);
        assert!(matches!(texture.destroy(), Err(TextureError::DoubleDestroy(_))));
        assert!(matches!(texture.bind(), Err(TextureError::Destroyed(_))));
    }

    #[test]
    fn test_destroy_unbinds_unit() {
        let textures = texture_set(2);
        let texture = textures.create_texture_2d(1).unwrap();
        let unit = texture.bind().unwrap();
        let handle = texture.handle().unwrap();
        textures.device_mut().take_commands();

        texture.destroy().unwrap();
        assert_eq!(textures.unit_occupant(unit), None);
        assert_eq!(
            textures.device().commands(),
            &[
                DeviceCommand::ActiveTexture(unit),
                DeviceCommand::BindTexture {
                    target: TextureTarget::Texture2D,
                    texture: None
                },
                DeviceCommand::DeleteTexture(handle),
            ]
        );
    }

    #[test]
    fn test_drop_releases_device_textures() {
        let textures = texture_set(2);
        let texture = textures.create_texture_2d(1).unwrap();
        let _cube = textures.create_texture_cube(1).unwrap();
        assert_eq!(textures.device().live_textures(), 2);
        drop(textures);
        // The handle keeps the context alive
        assert_eq!(texture.width(), 1);
        texture.destroy().unwrap();
    }
}
