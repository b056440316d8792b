//! Device capability and limit configuration
//!
//! A [`TextureSetConfig`] describes what the device behind a [`TextureSet`](crate::TextureSet)
//! can do. It is normally filled from the host's capability discovery, but it can also be
//! loaded from a YAML manifest:
//!
//! ```yaml
//! limits:
//!   max_texture_size: 4096
//!   max_texture_units: 16
//!   max_anisotropic: 16
//! extensions:
//!   oes_texture_float: true
//!   ext_texture_filter_anisotropic: true
//! ```

use crate::error::ConfigError;
use serde::Deserialize;

/// Numeric device limits consulted during validation and unit allocation
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest accepted width or height
    pub max_texture_size: u32,
    /// Number of texture binding units
    pub max_texture_units: u32,
    /// Largest accepted anisotropy level
    pub max_anisotropic: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_texture_size: 4096,
            max_texture_units: 16,
            max_anisotropic: 1.0,
        }
    }
}

/// Optional device extensions that widen the accepted formats and types
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Extensions {
    pub ext_srgb: bool,
    pub oes_texture_float: bool,
    pub oes_texture_float_linear: bool,
    pub oes_texture_half_float: bool,
    pub webgl_depth_texture: bool,
    pub webgl_compressed_texture_s3tc: bool,
    pub webgl_compressed_texture_atc: bool,
    pub webgl_compressed_texture_pvrtc: bool,
    pub webgl_compressed_texture_etc1: bool,
    pub ext_texture_filter_anisotropic: bool,
}

/// Complete capability description for a texture set
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TextureSetConfig {
    pub limits: Limits,
    pub extensions: Extensions,
}

impl TextureSetConfig {
    /// Parses a configuration from YAML content
    ///
    /// # Arguments
    /// * `yaml_content` - YAML string containing the configuration
    pub fn from_yaml(yaml_content: &str) -> Result<Self, serde_norway::Error> {
        serde_norway::from_str(yaml_content)
    }

    /// Parses a configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the YAML configuration file
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&content)?)
    }
}
