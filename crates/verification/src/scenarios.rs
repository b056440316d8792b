//! Upload scenarios run against a real device
//!
//! Each scenario creates textures through a [`TextureSet`] backed by [`WgpuDevice`], reads the
//! result back and compares it with the pixels the inputs describe.

use crate::VerificationError;
use crate::compare::{CompareResult, compare_images};
use crate::wgpu_helpers::{create_headless_device, read_texture_rgba8};
use texture_set::{ImageSource, PixelData, TextureOptions, TextureSet, WgpuDevice, WgpuTexture};

/// A texture set on a headless device plus the handles needed for readback
pub struct Harness {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: TextureSet<WgpuDevice>,
}

impl Harness {
    pub async fn new() -> Result<Self, VerificationError> {
        let (device, queue) = create_headless_device().await?;
        let backend = WgpuDevice::new(device.clone(), queue.clone());
        let config = backend.config();
        Ok(Self {
            device,
            queue,
            textures: TextureSet::new(backend, config),
        })
    }

    pub fn textures(&self) -> &TextureSet<WgpuDevice> {
        &self.textures
    }

    fn read(&self, handle: WgpuTexture, mip_level: u32, layer: u32) -> Result<image::RgbaImage, VerificationError> {
        let storage = self.textures.device().texture(handle).cloned().ok_or(VerificationError::MissingStorage)?;
        read_texture_rgba8(&self.device, &self.queue, &storage, mip_level, layer)
    }
}

pub type Scenario = fn(&Harness) -> Result<CompareResult, VerificationError>;

/// Every scenario with its name, in run order
pub fn all() -> Vec<(&'static str, Scenario)> {
    vec![
        ("rgba upload", upload_rgba),
        ("sub-image write", subimage_region),
        ("flip y", flip_y),
        ("luminance expansion", luminance_rows),
        ("generated mipmaps", generated_mipmaps),
        ("cube faces", cube_faces),
        ("resize then write", resize_then_write),
    ]
}

fn gradient(width: u32, height: u32) -> image::RgbaImage {
    image::RgbaImage::from_fn(width, height, |x, y| image::Rgba([(x * 60) as u8, (y * 60) as u8, 128, 255]))
}

fn options_from(image: &image::RgbaImage) -> TextureOptions {
    TextureOptions::new().with_shape(image.width(), image.height()).with_data(image.as_raw().clone())
}

fn upload_rgba(harness: &Harness) -> Result<CompareResult, VerificationError> {
    let expected = gradient(4, 4);
    let texture = harness.textures.create_texture_2d(options_from(&expected))?;
    let actual = harness.read(texture.handle()?, 0, 0)?;
    texture.destroy()?;
    Ok(compare_images(&expected, &actual, 0))
}

fn subimage_region(harness: &Harness) -> Result<CompareResult, VerificationError> {
    let mut expected = gradient(4, 4);
    let texture = harness.textures.create_texture_2d(options_from(&expected))?;

    let red: [u8; 4] = [255, 0, 0, 255];
    texture.subimage(TextureOptions::new().with_shape(2, 2).with_data(red.repeat(4)), 1, 2, 0)?;
    for (x, y) in [(1, 2), (2, 2), (1, 3), (2, 3)] {
        expected.put_pixel(x, y, image::Rgba(red));
    }

    let actual = harness.read(texture.handle()?, 0, 0)?;
    texture.destroy()?;
    Ok(compare_images(&expected, &actual, 0))
}

fn flip_y(harness: &Harness) -> Result<CompareResult, VerificationError> {
    let source = gradient(2, 4);
    let options = TextureOptions {
        flip_y: Some(true),
        ..options_from(&source)
    };
    let texture = harness.textures.create_texture_2d(options)?;
    let expected = image::imageops::flip_vertical(&source);
    let actual = harness.read(texture.handle()?, 0, 0)?;
    texture.destroy()?;
    Ok(compare_images(&expected, &actual, 0))
}

fn luminance_rows(harness: &Harness) -> Result<CompareResult, VerificationError> {
    let rows = vec![vec![0.0, 128.0, 255.0], vec![64.0, 32.0, 16.0]];
    let expected = image::RgbaImage::from_fn(3, 2, |x, y| {
        let value = rows[y as usize][x as usize] as u8;
        image::Rgba([value, value, value, 255])
    });
    let texture = harness.textures.create_texture_2d(PixelData::from(rows))?;
    let actual = harness.read(texture.handle()?, 0, 0)?;
    texture.destroy()?;
    Ok(compare_images(&expected, &actual, 0))
}

fn generated_mipmaps(harness: &Harness) -> Result<CompareResult, VerificationError> {
    let color = image::Rgba([200, 100, 50, 255]);
    let base = image::RgbaImage::from_pixel(8, 8, color);
    let texture = harness.textures.create_texture_2d(options_from(&base).with_filters("mipmap", "linear"))?;
    let actual = harness.read(texture.handle()?, 3, 0)?;
    texture.destroy()?;
    Ok(compare_images(&image::RgbaImage::from_pixel(1, 1, color), &actual, 1))
}

fn cube_faces(harness: &Harness) -> Result<CompareResult, VerificationError> {
    let colors: [image::Rgba<u8>; 6] = std::array::from_fn(|face| image::Rgba([face as u8 * 40, 255 - face as u8 * 40, 7, 255]));
    let faces: [ImageSource; 6] = colors.map(|color| options_from(&image::RgbaImage::from_pixel(2, 2, color)).into());
    let cube = harness.textures.create_texture_cube(faces)?;
    let handle = cube.handle()?;

    let mut result = CompareResult::Match;
    for (face, color) in colors.into_iter().enumerate() {
        let actual = harness.read(handle, 0, face as u32)?;
        result = compare_images(&image::RgbaImage::from_pixel(2, 2, color), &actual, 0);
        if !result.is_match() {
            break;
        }
    }
    cube.destroy()?;
    Ok(result)
}

fn resize_then_write(harness: &Harness) -> Result<CompareResult, VerificationError> {
    let texture = harness.textures.create_texture_2d(options_from(&gradient(4, 4)))?;
    texture.resize(2, 2)?;

    let expected = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 255, 255]));
    texture.subimage(PixelData::from(expected.as_raw().clone()), 0, 0, 0)?;
    let actual = harness.read(texture.handle()?, 0, 0)?;
    texture.destroy()?;
    Ok(compare_images(&expected, &actual, 0))
}
