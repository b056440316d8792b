//! Error types for texture creation, upload and unit scheduling

use crate::resource::TextureId;
use crate::formats::{ComponentType, TextureFormat};

/// Errors raised while configuring, uploading or binding textures
///
/// Every variant aborts the current call. Transient descriptors borrowed by the call are
/// returned to their pools before the error reaches the caller.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    /// An option had an unknown name or an illegal value
    #[error("invalid texture configuration: {0}")]
    Configuration(String),
    /// Width, height or channel count outside the supported range
    #[error("invalid texture shape: {0}")]
    Shape(String),
    /// The requested feature needs a device extension that is not enabled
    #[error("{0} extension not enabled")]
    CapabilityMissing(&'static str),
    /// Strided views must be rank 2 (height, width) or rank 3 (height, width, channel)
    #[error("invalid array view pixel data, rank must be 2 or 3 (got {0})")]
    UnsupportedRank(usize),
    /// The pixel payload does not hold the number of elements the shape requires
    #[error("inconsistent array length for texture: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// Compressed formats can only be uploaded from unsigned byte buffers
    #[error("compressed texture data must be stored in an unsigned byte buffer")]
    InvalidCompressedData,
    /// A read or write region leaves the viewport, the texture level or the source view
    #[error("{0} out of bounds")]
    OutOfBounds(String),
    /// Sub-image data does not match the texture's format, type and internal format
    #[error("incompatible format for texture subimage: texture is {expected:?}, data is {actual:?}")]
    FormatMismatch {
        expected: (TextureFormat, ComponentType),
        actual: (TextureFormat, ComponentType),
    },
    /// Sub-image upload into a level that holds no data
    #[error("missing mipmap data for level {0}")]
    MissingLevel(u32),
    /// Sub-image call without any pixel payload
    #[error("missing image data")]
    NoData,
    /// Explicit channel count disagrees with the channel count of the explicit format
    #[error("number of channels ({channels}) inconsistent with specified format {format:?}")]
    ChannelFormatConflict { channels: u32, format: TextureFormat },
    /// Every texture unit is held by a texture that is in active use
    #[error("insufficient number of texture units ({0} available)")]
    UnitExhausted(u32),
    /// `destroy` was called on a texture whose references were already released
    #[error("must not double destroy texture {0}")]
    DoubleDestroy(TextureId),
    /// The texture was released and can no longer be used
    #[error("texture {0} has been destroyed")]
    Destroyed(TextureId),
}

impl TextureError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }
}

/// Errors raised while loading a [`TextureSetConfig`](crate::TextureSetConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read texture set config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse texture set config: {0}")]
    Yaml(#[from] serde_norway::Error),
}

pub type Result<T, E = TextureError> = std::result::Result<T, E>;
