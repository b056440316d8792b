//! Device backend that records commands instead of executing them

use crate::device::{Device, PixelStore, TextureParameter, Upload};
use crate::formats::{ComponentType, CompressedFormat, ImageTarget, MipmapHint, TextureFormat, TextureTarget};
use std::collections::BTreeSet;

/// Handle issued by [`RecordingDevice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordedTexture(pub u32);

/// Owned copy of an [`Upload`]
#[derive(Debug, Clone, PartialEq)]
pub enum UploadRecord {
    Pixels {
        internal_format: TextureFormat,
        format: TextureFormat,
        ty: ComponentType,
        width: u32,
        height: u32,
        data: Option<Vec<u8>>,
    },
    Compressed {
        format: CompressedFormat,
        width: u32,
        height: u32,
        data: Vec<u8>,
    },
    External {
        format: TextureFormat,
        ty: ComponentType,
        width: u32,
        height: u32,
    },
    CopyFramebuffer {
        format: TextureFormat,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

impl From<Upload<'_>> for UploadRecord {
    fn from(upload: Upload<'_>) -> Self {
        match upload {
            Upload::Pixels {
                internal_format,
                format,
                ty,
                width,
                height,
                data,
            } => Self::Pixels {
                internal_format,
                format,
                ty,
                width,
                height,
                data: data.map(|buffer| buffer.as_bytes().to_vec()),
            },
            Upload::Compressed { format, width, height, data } => Self::Compressed {
                format,
                width,
                height,
                data: data.to_vec(),
            },
            Upload::External { format, ty, source, .. } => Self::External {
                format,
                ty,
                width: source.width(),
                height: source.height(),
            },
            Upload::CopyFramebuffer { format, x, y, width, height } => Self::CopyFramebuffer { format, x, y, width, height },
        }
    }
}

/// One recorded device command
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateTexture(RecordedTexture),
    DeleteTexture(RecordedTexture),
    ActiveTexture(u32),
    BindTexture {
        target: TextureTarget,
        texture: Option<RecordedTexture>,
    },
    PixelStore(PixelStore),
    TexImage {
        target: ImageTarget,
        level: u32,
        upload: UploadRecord,
    },
    TexSubImage {
        target: ImageTarget,
        level: u32,
        x: u32,
        y: u32,
        upload: UploadRecord,
    },
    TexParameter {
        target: TextureTarget,
        parameter: TextureParameter,
    },
    GenerateMipmap {
        target: TextureTarget,
        hint: MipmapHint,
    },
}

impl DeviceCommand {
    /// Returns true for image and sub-image uploads
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::TexImage { .. } | Self::TexSubImage { .. })
    }
}

/// Records every command in order; used by tests and for inspecting command streams
#[derive(Debug, Default)]
pub struct RecordingDevice {
    commands: Vec<DeviceCommand>,
    compressed_formats: Vec<CompressedFormat>,
    next_texture: u32,
    live: BTreeSet<RecordedTexture>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports `formats` as uploadable compressed formats
    pub fn with_compressed_formats(mut self, formats: &[CompressedFormat]) -> Self {
        self.compressed_formats = formats.to_vec();
        self
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    /// Drains the recorded commands
    pub fn take_commands(&mut self) -> Vec<DeviceCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Textures created and not yet deleted
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, texture: RecordedTexture) -> bool {
        self.live.contains(&texture)
    }
}

impl Device for RecordingDevice {
    type Texture = RecordedTexture;

    fn compressed_texture_formats(&self) -> Vec<CompressedFormat> {
        self.compressed_formats.clone()
    }

    fn create_texture(&mut self) -> RecordedTexture {
        self.next_texture += 1;
        let texture = RecordedTexture(self.next_texture);
        self.live.insert(texture);
        self.commands.push(DeviceCommand::CreateTexture(texture));
        texture
    }

    fn delete_texture(&mut self, texture: RecordedTexture) {
        self.live.remove(&texture);
        self.commands.push(DeviceCommand::DeleteTexture(texture));
    }

    fn active_texture(&mut self, unit: u32) {
        self.commands.push(DeviceCommand::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, target: TextureTarget, texture: Option<RecordedTexture>) {
        self.commands.push(DeviceCommand::BindTexture { target, texture });
    }

    fn pixel_store(&mut self, store: PixelStore) {
        self.commands.push(DeviceCommand::PixelStore(store));
    }

    fn tex_image_2d(&mut self, target: ImageTarget, level: u32, upload: Upload<'_>) {
        self.commands.push(DeviceCommand::TexImage {
            target,
            level,
            upload: upload.into(),
        });
    }

    fn tex_sub_image_2d(&mut self, target: ImageTarget, level: u32, x: u32, y: u32, upload: Upload<'_>) {
        self.commands.push(DeviceCommand::TexSubImage {
            target,
            level,
            x,
            y,
            upload: upload.into(),
        });
    }

    fn tex_parameter(&mut self, target: TextureTarget, parameter: TextureParameter) {
        self.commands.push(DeviceCommand::TexParameter { target, parameter });
    }

    fn generate_mipmap(&mut self, target: TextureTarget, hint: MipmapHint) {
        self.commands.push(DeviceCommand::GenerateMipmap { target, hint });
    }
}
