//! Sampler and mipmap-generation settings

use crate::config::TextureSetConfig;
use crate::error::{Result, TextureError};
use crate::format_table::FormatTable;
use crate::formats::{MagFilter, MinFilter, MipmapHint, WrapMode};
use crate::options::{MipmapOption, TextureOptions, WrapOption};

/// Filtering, wrapping and mipmap generation of a texture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerState {
    pub min_filter: MinFilter,
    pub mag_filter: MagFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub anisotropic: f32,
    pub generate_mipmaps: bool,
    pub mipmap_hint: MipmapHint,
}

impl Default for SamplerState {
    fn default() -> Self {
        Self {
            min_filter: MinFilter::Nearest,
            mag_filter: MagFilter::Nearest,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            anisotropic: 1.0,
            generate_mipmaps: false,
            mipmap_hint: MipmapHint::DontCare,
        }
    }
}

impl SamplerState {
    /// Applies the sampler-related keys of `options`
    ///
    /// A mipmap min filter turns generation on (except for explicit cube faces).
    /// `mipmap` accepts a flag, a hint name (which also enables generation) or a level list
    /// (which disables it); when given without `min`, the min filter becomes
    /// nearest-mipmap-nearest. `wrap` takes precedence over `wrapS`/`wrapT`.
    pub fn apply_options(&mut self, options: &TextureOptions, formats: &FormatTable, config: &TextureSetConfig) -> Result<()> {
        if let Some(min) = &options.min {
            self.min_filter = formats.min_filter(min)?;
            if self.min_filter.uses_mipmaps() && options.faces.is_none() {
                self.generate_mipmaps = true;
            }
        }
        if let Some(mag) = &options.mag {
            self.mag_filter = formats.mag_filter(mag)?;
        }

        match &options.wrap {
            Some(WrapOption::Both(mode)) => {
                let mode = formats.wrap_mode(mode)?;
                (self.wrap_s, self.wrap_t) = (mode, mode);
            }
            Some(WrapOption::Pair([s, t])) => {
                (self.wrap_s, self.wrap_t) = (formats.wrap_mode(s)?, formats.wrap_mode(t)?);
            }
            None => {
                if let Some(s) = &options.wrap_s {
                    self.wrap_s = formats.wrap_mode(s)?;
                }
                if let Some(t) = &options.wrap_t {
                    self.wrap_t = formats.wrap_mode(t)?;
                }
            }
        }

        if let Some(anisotropic) = options.anisotropic {
            let max = config.limits.max_anisotropic;
            if !(1.0..=max).contains(&anisotropic) {
                return Err(TextureError::config(format!("anisotropic filtering {anisotropic} must be between 1 and {max}")));
            }
            self.anisotropic = anisotropic;
        }

        if let Some(mipmap) = &options.mipmap {
            let has_mipmap = match mipmap {
                MipmapOption::Hint(hint) => {
                    self.mipmap_hint = formats.mipmap_hint(hint)?;
                    self.generate_mipmaps = true;
                    true
                }
                MipmapOption::Enabled(enabled) => {
                    self.generate_mipmaps = *enabled;
                    *enabled
                }
                MipmapOption::Levels(_) => {
                    self.generate_mipmaps = false;
                    true
                }
            };
            if has_mipmap && options.min.is_none() {
                self.min_filter = MinFilter::NearestMipmapNearest;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Limits;
    use crate::options::ImageSource;

    fn parse(options: &TextureOptions) -> Result<SamplerState> {
        let config = TextureSetConfig {
            limits: Limits {
                max_anisotropic: 8.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let formats = FormatTable::new(&config.extensions, &[]);
        let mut sampler = SamplerState::default();
        sampler.apply_options(options, &formats, &config)?;
        Ok(sampler)
    }

    #[test]
    fn test_defaults() {
        let sampler = parse(&TextureOptions::new()).unwrap();
        assert_eq!(sampler, SamplerState::default());
        assert_eq!(sampler.min_filter, MinFilter::Nearest);
        assert_eq!(sampler.wrap_s, WrapMode::ClampToEdge);
        assert!(!sampler.generate_mipmaps);
    }

    #[test]
    fn test_mipmap_min_filter_enables_generation() {
        let sampler = parse(&TextureOptions::new().with_filters("mipmap", "linear")).unwrap();
        assert_eq!(sampler.min_filter, MinFilter::LinearMipmapLinear);
        assert_eq!(sampler.mag_filter, MagFilter::Linear);
        assert!(sampler.generate_mipmaps);

        let options = TextureOptions::new().with_filters("linear mipmap nearest", "nearest").with_faces(Vec::<ImageSource>::new());
        assert!(!parse(&options).unwrap().generate_mipmaps);
    }

    #[test]
    fn test_mipmap_option_forms() {
        let sampler = parse(&TextureOptions::new().with_mipmap(MipmapOption::Hint("nice".to_owned()))).unwrap();
        assert!(sampler.generate_mipmaps);
        assert_eq!(sampler.mipmap_hint, MipmapHint::Nicest);
        assert_eq!(sampler.min_filter, MinFilter::NearestMipmapNearest);

        let sampler = parse(&TextureOptions::new().with_mipmap(MipmapOption::Enabled(false))).unwrap();
        assert!(!sampler.generate_mipmaps);
        assert_eq!(sampler.min_filter, MinFilter::Nearest);

        let sampler = parse(&TextureOptions::new().with_filters("linear", "linear").with_mipmap(MipmapOption::Levels(Vec::new()))).unwrap();
        assert!(!sampler.generate_mipmaps);
        assert_eq!(sampler.min_filter, MinFilter::Linear);
    }

    #[test]
    fn test_wrap_precedence() {
        let options = TextureOptions {
            wrap: Some(WrapOption::Pair(["repeat".to_owned(), "mirror".to_owned()])),
            wrap_s: Some("clamp".to_owned()),
            ..Default::default()
        };
        let sampler = parse(&options).unwrap();
        assert_eq!((sampler.wrap_s, sampler.wrap_t), (WrapMode::Repeat, WrapMode::MirroredRepeat));

        let options = TextureOptions {
            wrap_t: Some("repeat".to_owned()),
            ..Default::default()
        };
        let sampler = parse(&options).unwrap();
        assert_eq!((sampler.wrap_s, sampler.wrap_t), (WrapMode::ClampToEdge, WrapMode::Repeat));
    }

    #[test]
    fn test_anisotropy_range() {
        let options = TextureOptions {
            anisotropic: Some(4.0),
            ..Default::default()
        };
        assert_eq!(parse(&options).unwrap().anisotropic, 4.0);

        for bad in [0.5, 16.0] {
            let options = TextureOptions {
                anisotropic: Some(bad),
                ..Default::default()
            };
            assert!(matches!(parse(&options), Err(TextureError::Configuration(_))));
        }
    }

    #[test]
    fn test_unknown_filter() {
        assert!(matches!(parse(&TextureOptions::new().with_filters("cubic", "linear")), Err(TextureError::Configuration(_))));
    }
}
