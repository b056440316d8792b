use crate::flags::FlagState;
use crate::formats::TextureTarget;
use std::fmt;

/// Monotonic texture identifier, unique within a texture set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Device texture together with its format snapshot and scheduling state
#[derive(Debug)]
pub struct TextureResource<T> {
    pub id: TextureId,
    pub target: TextureTarget,
    /// Flags of level 0 at the last (re)initialisation
    pub flags: FlagState,
    /// Bit `i` is set when level `i` holds data
    pub mipmask: u32,
    pub handle: T,
    pub ref_count: u32,
    /// Unit the texture currently occupies
    pub unit: Option<u32>,
    /// Active-use counter; non-zero pins the texture to its unit
    pub bind_count: u32,
}

impl<T> TextureResource<T> {
    pub fn new(id: TextureId, target: TextureTarget, handle: T) -> Self {
        Self {
            id,
            target,
            flags: FlagState::default(),
            mipmask: 0,
            handle,
            ref_count: 1,
            unit: None,
            bind_count: 0,
        }
    }

    /// Returns true when the unit it holds may be reassigned
    pub fn is_idle(&self) -> bool {
        self.bind_count == 0
    }

    pub fn has_level(&self, level: u32) -> bool {
        level < 32 && self.mipmask & (1 << level) != 0
    }
}
