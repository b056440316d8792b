//! Texture unit occupancy table

use crate::resource::TextureId;

/// Which texture occupies each binding unit
#[derive(Debug, Clone)]
pub struct UnitAllocator {
    slots: Vec<Option<TextureId>>,
}

impl UnitAllocator {
    pub fn new(units: u32) -> Self {
        Self { slots: vec![None; units as usize] }
    }

    pub fn len(&self) -> u32 {
        self.slots.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn occupant(&self, unit: u32) -> Option<TextureId> {
        self.slots.get(unit as usize).copied().flatten()
    }

    /// First unit that is free or held by an idle texture, in unit order
    ///
    /// # Arguments
    /// * `is_idle` - Returns true when the occupant may be evicted
    ///
    /// # Returns
    /// The unit and the occupant to evict, if any
    pub fn first_available(&self, mut is_idle: impl FnMut(TextureId) -> bool) -> Option<(u32, Option<TextureId>)> {
        self.slots.iter().enumerate().find_map(|(unit, slot)| match *slot {
            None => Some((unit as u32, None)),
            Some(occupant) if is_idle(occupant) => Some((unit as u32, Some(occupant))),
            Some(_) => None,
        })
    }

    pub fn assign(&mut self, unit: u32, texture: TextureId) {
        if let Some(slot) = self.slots.get_mut(unit as usize) {
            *slot = Some(texture);
        }
    }

    pub fn release(&mut self, unit: u32) {
        if let Some(slot) = self.slots.get_mut(unit as usize) {
            *slot = None;
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fit() {
        let mut units = UnitAllocator::new(3);
        assert_eq!(units.first_available(|_| false), Some((0, None)));

        units.assign(0, TextureId(1));
        units.assign(1, TextureId(2));
        assert_eq!(units.first_available(|_| false), Some((2, None)));

        units.assign(2, TextureId(3));
        assert_eq!(units.first_available(|_| false), None);
        assert_eq!(units.first_available(|id| id != TextureId(1)), Some((1, Some(TextureId(2)))));
    }

    #[test]
    fn test_release_and_clear() {
        let mut units = UnitAllocator::new(2);
        units.assign(1, TextureId(7));
        assert_eq!(units.occupant(1), Some(TextureId(7)));
        units.release(1);
        assert_eq!(units.occupant(1), None);

        units.assign(0, TextureId(8));
        units.clear();
        assert_eq!(units.occupant(0), None);
        assert_eq!(units.occupant(5), None);
        assert_eq!(units.len(), 2);
    }
}
