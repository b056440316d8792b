use crate::formats::TextureTarget;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of [`TextureStats`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextureStatsSnapshot {
    pub texture_count: u64,
    pub cube_count: u64,
}

/// Live texture counters of a texture set
///
/// Incremented when a texture is created, decremented when it is physically released.
#[derive(Debug, Default)]
pub struct TextureStats {
    texture_count: AtomicU64,
    cube_count: AtomicU64,
}

impl TextureStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, target: TextureTarget) -> &AtomicU64 {
        match target {
            TextureTarget::Texture2D => &self.texture_count,
            TextureTarget::CubeMap => &self.cube_count,
        }
    }

    pub fn inc(&self, target: TextureTarget) {
        self.counter(target).fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self, target: TextureTarget) {
        // Saturate so a release after `reset` cannot wrap
        let _ = self.counter(target).fetch_update(Ordering::Relaxed, Ordering::Relaxed, |count| Some(count.saturating_sub(1)));
    }

    pub fn reset(&self) {
        self.texture_count.store(0, Ordering::Relaxed);
        self.cube_count.store(0, Ordering::Relaxed);
    }

    pub fn texture_count(&self) -> u64 {
        self.texture_count.load(Ordering::Relaxed)
    }

    pub fn cube_count(&self) -> u64 {
        self.cube_count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> TextureStatsSnapshot {
        TextureStatsSnapshot {
            texture_count: self.texture_count(),
            cube_count: self.cube_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = TextureStats::new();
        stats.inc(TextureTarget::Texture2D);
        stats.inc(TextureTarget::Texture2D);
        stats.inc(TextureTarget::CubeMap);
        stats.dec(TextureTarget::Texture2D);
        assert_eq!(stats.snapshot(), TextureStatsSnapshot { texture_count: 1, cube_count: 1 });

        stats.reset();
        stats.dec(TextureTarget::CubeMap);
        assert_eq!(stats.snapshot(), TextureStatsSnapshot::default());
    }
}
