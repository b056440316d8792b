//! Pixel payload inputs accepted by texture creation and sub-image uploads

use crate::formats::ComponentType;
use std::borrow::Cow;
use std::fmt::Debug;
use std::rc::Rc;

/// Element kind of a [`TypedBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    U8,
    U16,
    U32,
    F16,
    F32,
}

impl ElementKind {
    /// Element kind that stores components of the given type
    ///
    /// Packed 16-bit types share `U16`, depth-stencil shares `U32`.
    pub fn for_component_type(ty: ComponentType) -> Self {
        match ty {
            ComponentType::Uint8 => Self::U8,
            ComponentType::Uint16 | ComponentType::Rgba4 | ComponentType::Rgb565 | ComponentType::Rgb5A1 => Self::U16,
            ComponentType::Uint32 | ComponentType::Uint24_8 => Self::U32,
            ComponentType::HalfFloat => Self::F16,
            ComponentType::Float => Self::F32,
        }
    }
}

/// Contiguous buffer of typed elements
#[derive(Debug, Clone, PartialEq)]
pub enum TypedBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F16(Vec<half::f16>),
    F32(Vec<f32>),
}

impl TypedBuffer {
    /// Creates a zero-filled buffer
    pub fn zeroed(kind: ElementKind, len: usize) -> Self {
        match kind {
            ElementKind::U8 => Self::U8(vec![0; len]),
            ElementKind::U16 => Self::U16(vec![0; len]),
            ElementKind::U32 => Self::U32(vec![0; len]),
            ElementKind::F16 => Self::F16(vec![half::f16::ZERO; len]),
            ElementKind::F32 => Self::F32(vec![0.0; len]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U8(values) => values.len(),
            Self::U16(values) => values.len(),
            Self::U32(values) => values.len(),
            Self::F16(values) => values.len(),
            Self::F32(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn capacity(&self) -> usize {
        match self {
            Self::U8(values) => values.capacity(),
            Self::U16(values) => values.capacity(),
            Self::U32(values) => values.capacity(),
            Self::F16(values) => values.capacity(),
            Self::F32(values) => values.capacity(),
        }
    }

    /// Clears the buffer and refills it with `len` zeroes, keeping the allocation
    pub(crate) fn reset(&mut self, len: usize) {
        match self {
            Self::U8(values) => {
                values.clear();
                values.resize(len, 0);
            }
            Self::U16(values) => {
                values.clear();
                values.resize(len, 0);
            }
            Self::U32(values) => {
                values.clear();
                values.resize(len, 0);
            }
            Self::F16(values) => {
                values.clear();
                values.resize(len, half::f16::ZERO);
            }
            Self::F32(values) => {
                values.clear();
                values.resize(len, 0.0);
            }
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Self::U8(_) => ElementKind::U8,
            Self::U16(_) => ElementKind::U16,
            Self::U32(_) => ElementKind::U32,
            Self::F16(_) => ElementKind::F16,
            Self::F32(_) => ElementKind::F32,
        }
    }

    /// Component type inferred from the element kind
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::U8(_) => ComponentType::Uint8,
            Self::U16(_) => ComponentType::Uint16,
            Self::U32(_) => ComponentType::Uint32,
            Self::F16(_) => ComponentType::HalfFloat,
            Self::F32(_) => ComponentType::Float,
        }
    }

    /// Raw bytes in native endianness
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U8(values) => values,
            Self::U16(values) => bytemuck::cast_slice(values),
            Self::U32(values) => bytemuck::cast_slice(values),
            Self::F16(values) => bytemuck::cast_slice(values),
            Self::F32(values) => bytemuck::cast_slice(values),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Reads element `index` as a double, `None` when out of range
    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            Self::U8(values) => values.get(index).map(|&v| f64::from(v)),
            Self::U16(values) => values.get(index).map(|&v| f64::from(v)),
            Self::U32(values) => values.get(index).map(|&v| f64::from(v)),
            Self::F16(values) => values.get(index).map(|&v| v.to_f64()),
            Self::F32(values) => values.get(index).map(|&v| f64::from(v)),
        }
    }

    /// Writes element `index`, saturating integer targets
    pub(crate) fn store(&mut self, index: usize, value: f64) {
        match self {
            Self::U8(values) => values[index] = value as u8,
            Self::U16(values) => values[index] = value as u16,
            Self::U32(values) => values[index] = value as u32,
            Self::F16(values) => values[index] = half::f16::from_f64(value),
            Self::F32(values) => values[index] = value as f32,
        }
    }
}

/// Backing store of a [`StridedView`]
#[derive(Debug, Clone, PartialEq)]
pub enum ViewStorage {
    Typed(TypedBuffer),
    Numbers(Vec<f64>),
}

impl ViewStorage {
    fn get(&self, index: usize) -> Option<f64> {
        match self {
            Self::Typed(buffer) => buffer.get(index),
            Self::Numbers(values) => values.get(index).copied(),
        }
    }
}

/// N-dimensional view over flat storage with per-axis strides and a base offset
///
/// Axes are ordered `(height, width)` or `(height, width, channel)`.
#[derive(Debug, Clone, PartialEq)]
pub struct StridedView {
    pub data: ViewStorage,
    pub shape: Vec<usize>,
    pub stride: Vec<isize>,
    pub offset: usize,
}

impl StridedView {
    /// Creates a row-major view with no offset
    pub fn new(data: ViewStorage, shape: Vec<usize>) -> Self {
        let mut stride = vec![0isize; shape.len()];
        let mut step = 1isize;
        for axis in (0..shape.len()).rev() {
            stride[axis] = step;
            step *= shape[axis] as isize;
        }
        Self { data, shape, stride, offset: 0 }
    }

    pub fn with_strides(data: ViewStorage, shape: Vec<usize>, stride: Vec<isize>, offset: usize) -> Self {
        Self { data, shape, stride, offset }
    }

    /// Reads the element at `offset + Σ index[i] * stride[i]`
    ///
    /// Returns `None` when the position overflows or falls outside the storage.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        let mut position = isize::try_from(self.offset).ok()?;
        for (&i, &stride) in index.iter().zip(&self.stride) {
            position = isize::try_from(i).ok()?.checked_mul(stride)?.checked_add(position)?;
        }
        usize::try_from(position).ok().and_then(|position| self.data.get(position))
    }

    /// Component type of a typed backing store
    pub fn component_type(&self) -> Option<ComponentType> {
        match &self.data {
            ViewStorage::Typed(buffer) => Some(buffer.component_type()),
            ViewStorage::Numbers(_) => None,
        }
    }
}

/// Externally owned raster source such as a decoded image or a video frame
pub trait ExternalImage: Debug {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Streaming sources (video) need the host poll hook before each upload
    fn is_streaming(&self) -> bool {
        false
    }

    /// Tightly packed RGBA8 pixels, top row first
    fn rgba8(&self) -> Cow<'_, [u8]>;
}

impl ExternalImage for image::RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn rgba8(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(self.as_raw())
    }
}

impl ExternalImage for image::DynamicImage {
    fn width(&self) -> u32 {
        image::GenericImageView::width(self)
    }

    fn height(&self) -> u32 {
        image::GenericImageView::height(self)
    }

    fn rgba8(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.to_rgba8().into_raw())
    }
}

/// Classified pixel payload
#[derive(Debug, Clone)]
pub enum PixelData {
    /// Typed buffer adopted as-is
    Buffer(TypedBuffer),
    /// Flat numeric array of `width * height * channels` values
    Numbers(Vec<f64>),
    /// `height` rows of `width` single-channel values
    Rows(Vec<Vec<f64>>),
    /// `height` rows of `width` pixels of `channels` values
    Pixels(Vec<Vec<Vec<f64>>>),
    View(StridedView),
    External(Rc<dyn ExternalImage>),
}

impl From<TypedBuffer> for PixelData {
    fn from(buffer: TypedBuffer) -> Self {
        Self::Buffer(buffer)
    }
}

impl From<Vec<u8>> for PixelData {
    fn from(values: Vec<u8>) -> Self {
        Self::Buffer(TypedBuffer::U8(values))
    }
}

impl From<Vec<u16>> for PixelData {
    fn from(values: Vec<u16>) -> Self {
        Self::Buffer(TypedBuffer::U16(values))
    }
}

impl From<Vec<u32>> for PixelData {
    fn from(values: Vec<u32>) -> Self {
        Self::Buffer(TypedBuffer::U32(values))
    }
}

impl From<Vec<half::f16>> for PixelData {
    fn from(values: Vec<half::f16>) -> Self {
        Self::Buffer(TypedBuffer::F16(values))
    }
}

impl From<Vec<f32>> for PixelData {
    fn from(values: Vec<f32>) -> Self {
        Self::Buffer(TypedBuffer::F32(values))
    }
}

impl From<Vec<f64>> for PixelData {
    fn from(values: Vec<f64>) -> Self {
        Self::Numbers(values)
    }
}

impl From<Vec<Vec<f64>>> for PixelData {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        Self::Rows(rows)
    }
}

impl From<Vec<Vec<Vec<f64>>>> for PixelData {
    fn from(pixels: Vec<Vec<Vec<f64>>>) -> Self {
        Self::Pixels(pixels)
    }
}

impl From<StridedView> for PixelData {
    fn from(view: StridedView) -> Self {
        Self::View(view)
    }
}

impl From<Rc<dyn ExternalImage>> for PixelData {
    fn from(image: Rc<dyn ExternalImage>) -> Self {
        Self::External(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_strides() {
        let view = StridedView::new(ViewStorage::Numbers((0..24).map(f64::from).collect()), vec![2, 3, 4]);
        assert_eq!(view.stride, vec![12, 4, 1]);
        assert_eq!(view.get(&[1, 2, 3]), Some(23.0));
        assert_eq!(view.get(&[0, 1, 0]), Some(4.0));
    }

    #[test]
    fn test_view_out_of_range() {
        let view = StridedView::with_strides(ViewStorage::Numbers(vec![1.0, 2.0]), vec![2, 2], vec![2, 1], 1);
        assert_eq!(view.get(&[0, 0]), Some(2.0));
        assert_eq!(view.get(&[1, 0]), None);

        let negative = StridedView::with_strides(ViewStorage::Numbers(vec![1.0, 2.0]), vec![2, 1], vec![-1, 1], 0);
        assert_eq!(negative.get(&[1, 0]), None);
    }

    #[test]
    fn test_view_index_overflow() {
        let view = StridedView::with_strides(ViewStorage::Numbers(vec![1.0]), vec![2, 2], vec![isize::MAX, 2], 0);
        assert_eq!(view.get(&[0, 0]), Some(1.0));
        assert_eq!(view.get(&[1, 1]), None);
        assert_eq!(view.get(&[usize::MAX, 0]), None);
    }

    #[test]
    fn test_typed_buffer_bytes() {
        let buffer = TypedBuffer::U16(vec![0x0102, 0x0304]);
        assert_eq!(buffer.byte_len(), 4);
        assert_eq!(buffer.component_type(), ComponentType::Uint16);

        let half = TypedBuffer::F16(vec![half::f16::from_f32(1.0)]);
        assert_eq!(half.as_bytes(), &half::f16::from_f32(1.0).to_ne_bytes());
        assert_eq!(half.component_type(), ComponentType::HalfFloat);
    }

    #[test]
    fn test_store_saturates() {
        let mut buffer = TypedBuffer::zeroed(ElementKind::U8, 2);
        buffer.store(0, 300.0);
        buffer.store(1, -5.0);
        assert_eq!(buffer, TypedBuffer::U8(vec![255, 0]));
    }

    #[test]
    fn test_external_rgba_image() {
        let image = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 4]));
        assert_eq!(ExternalImage::width(&image), 3);
        assert_eq!(ExternalImage::height(&image), 2);
        assert!(!image.is_streaming());
        assert_eq!(image.rgba8().len(), 24);
    }
}
