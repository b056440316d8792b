//! Free lists for transient descriptors
//!
//! Every public call borrows its descriptors here and hands them back before returning,
//! on success and on error alike. After a call completes nothing is outstanding.

use crate::buffer_pool::BufferPool;
use crate::image::ImageDescriptor;
use crate::mipmap::MipmapSet;
use crate::sampler::SamplerState;

/// Pooled value that can be cleared in place for reuse
pub trait Reusable: Default {
    /// Restores the default state, keeping the value's own storage
    fn reset(&mut self);
}

impl Reusable for ImageDescriptor {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl Reusable for MipmapSet {
    fn reset(&mut self) {
        self.flags = Default::default();
        self.images.iter_mut().for_each(|slot| *slot = None);
        self.mipmask = 0;
    }
}

impl Reusable for SamplerState {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Free list of reusable values that are reset in place when returned
#[derive(Debug)]
pub struct FreeList<T> {
    free: Vec<T>,
    outstanding: usize,
}

impl<T> Default for FreeList<T> {
    fn default() -> Self {
        Self { free: Vec::new(), outstanding: 0 }
    }
}

impl<T: Reusable> FreeList<T> {
    /// Borrows a value in its default state
    pub fn take(&mut self) -> T {
        self.outstanding += 1;
        self.free.pop().unwrap_or_default()
    }

    /// Returns a borrowed value; it is reset and handed out again by the next `take`
    pub fn give_back(&mut self, mut value: T) {
        self.outstanding = self.outstanding.saturating_sub(1);
        value.reset();
        self.free.push(value);
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Number of values ready for reuse
    pub fn available(&self) -> usize {
        self.free.len()
    }
}

/// Outstanding counts across all pools
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub images: usize,
    pub mipmaps: usize,
    pub samplers: usize,
    pub buffers: usize,
}

impl PoolStats {
    /// Returns true when nothing is borrowed
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Per-kind descriptor pools owned by a texture set
#[derive(Debug, Default)]
pub struct ObjectPools {
    pub images: FreeList<ImageDescriptor>,
    pub mipmaps: FreeList<MipmapSet>,
    pub samplers: FreeList<SamplerState>,
}

impl ObjectPools {
    /// Returns an image and its pooled buffer
    pub fn recycle_image(&mut self, mut image: ImageDescriptor, buffers: &mut BufferPool) {
        image.release_buffer(buffers);
        self.images.give_back(image);
    }

    /// Returns a mip set together with every image and buffer it holds
    pub fn recycle_mipmap(&mut self, mut mipmap: MipmapSet, buffers: &mut BufferPool) {
        for slot in mipmap.images.iter_mut() {
            if let Some(image) = slot.take() {
                self.recycle_image(image, buffers);
            }
        }
        self.mipmaps.give_back(mipmap);
    }

    pub fn stats(&self, buffers: &BufferPool) -> PoolStats {
        PoolStats {
            images: self.images.outstanding(),
            mipmaps: self.mipmaps.outstanding(),
            samplers: self.samplers.outstanding(),
            buffers: buffers.outstanding(),
        }
    }
}
