//! Reusable scratch buffers for converted pixel data

use crate::pixel_data::{ElementKind, TypedBuffer};
use half::slice::HalfFloatSliceExt;
use std::collections::HashMap;

/// Free lists of typed buffers keyed by element kind and power-of-two capacity class
///
/// Buffers handed out by [`alloc`](Self::alloc) must come back through [`free`](Self::free);
/// [`outstanding`](Self::outstanding) counts the ones still out.
#[derive(Debug, Default)]
pub struct BufferPool {
    free: HashMap<(ElementKind, u32), Vec<TypedBuffer>>,
    outstanding: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows a zero-filled buffer of exactly `len` elements
    pub fn alloc(&mut self, kind: ElementKind, len: usize) -> TypedBuffer {
        self.outstanding += 1;
        let class = len.max(1).next_power_of_two().trailing_zeros();
        match self.free.get_mut(&(kind, class)).and_then(Vec::pop) {
            Some(mut buffer) => {
                buffer.reset(len);
                buffer
            }
            None => {
                let mut buffer = TypedBuffer::zeroed(kind, 1 << class);
                buffer.reset(len);
                buffer
            }
        }
    }

    /// Returns a buffer obtained from [`alloc`](Self::alloc)
    pub fn free(&mut self, buffer: TypedBuffer) {
        self.outstanding = self.outstanding.saturating_sub(1);
        let capacity = buffer.capacity();
        if capacity == 0 {
            return;
        }
        // Class by the largest power of two the capacity covers
        let class = usize::BITS - 1 - capacity.leading_zeros();
        self.free.entry((buffer.kind(), class)).or_default().push(buffer);
    }

    /// Encodes `values` to half precision in a pooled buffer
    pub fn to_half_float(&mut self, values: &[f32]) -> TypedBuffer {
        let mut buffer = self.alloc(ElementKind::F16, values.len());
        if let TypedBuffer::F16(halves) = &mut buffer {
            halves.convert_from_f32_slice(values);
        }
        buffer
    }

    /// Number of buffers currently borrowed
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_and_reuse() {
        let mut pool = BufferPool::new();
        let mut buffer = pool.alloc(ElementKind::U8, 5);
        assert_eq!(buffer.len(), 5);
        assert_eq!(pool.outstanding(), 1);
        buffer.store(0, 7.0);
        pool.free(buffer);
        assert_eq!(pool.outstanding(), 0);

        let buffer = pool.alloc(ElementKind::U8, 6);
        assert_eq!(buffer, TypedBuffer::U8(vec![0; 6]));
        assert!(buffer.capacity() >= 8);
        pool.free(buffer);
    }

    #[test]
    fn test_kinds_are_separate() {
        let mut pool = BufferPool::new();
        let buffer = pool.alloc(ElementKind::U16, 4);
        pool.free(buffer);
        let buffer = pool.alloc(ElementKind::F32, 4);
        assert_eq!(buffer.kind(), ElementKind::F32);
        pool.free(buffer);
    }

    #[test]
    fn test_half_float_encoding() {
        let mut pool = BufferPool::new();
        let buffer = pool.to_half_float(&[0.0, 1.0, -2.5, 65504.0]);
        let expected: Vec<half::f16> = [0.0f32, 1.0, -2.5, 65504.0].into_iter().map(half::f16::from_f32).collect();
        assert_eq!(buffer, TypedBuffer::F16(expected));
        pool.free(buffer);
        assert_eq!(pool.outstanding(), 0);
    }
}
