use texture_set::{DeviceCommand, PixelData, RecordingDevice, StridedView, TextureOptions, TextureSet, TextureSetConfig, TypedBuffer, UploadRecord, ViewStorage};

fn texture_set() -> TextureSet<RecordingDevice> {
    TextureSet::new(RecordingDevice::new(), TextureSetConfig::default())
}

/// Bytes of the single level 0 upload recorded so far
fn uploaded_bytes(textures: &TextureSet<RecordingDevice>) -> Vec<u8> {
    let device = textures.device();
    let uploads: Vec<_> = device
        .commands()
        .iter()
        .filter_map(|command| match command {
            DeviceCommand::TexImage {
                level: 0,
                upload: UploadRecord::Pixels { data: Some(data), .. },
                ..
            } => Some(data.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(uploads.len(), 1);
    uploads.into_iter().next().unwrap_or_default()
}

#[test]
fn test_flat_array_layout() {
    let (width, height, channels) = (3usize, 2usize, 2usize);
    let values: Vec<f64> = (0..width * height * channels).map(|i| i as f64).collect();
    let textures = texture_set();
    let texture = textures
        .create_texture_2d(TextureOptions {
            width: Some(width as u32),
            height: Some(height as u32),
            channels: Some(channels as u32),
            data: Some(values.into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(texture.flags().unwrap().channels, 2);

    let bytes = uploaded_bytes(&textures);
    assert_eq!(bytes.len(), width * height * channels);
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let index = (y * width + x) * channels + c;
                assert_eq!(usize::from(bytes[index]), index, "pixel ({x}, {y}) channel {c}");
            }
        }
    }
}

#[test]
fn test_nested_rows_flatten_row_major() {
    let rows = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
    let textures = texture_set();
    let texture = textures.create_texture_2d(PixelData::from(rows)).unwrap();
    assert_eq!((texture.width(), texture.height()), (3, 2));
    assert_eq!(uploaded_bytes(&textures), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_nested_pixels_carry_channels() {
    let pixels = vec![vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]];
    let textures = texture_set();
    let texture = textures.create_texture_2d(PixelData::from(pixels)).unwrap();
    let flags = texture.flags().unwrap();
    assert_eq!((texture.width(), texture.height(), flags.channels), (2, 1, 3));
    assert_eq!(uploaded_bytes(&textures), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_strided_views_pack_identically() {
    // Logical 2x3 image: value(y, x) = 10 * y + x
    let logical = |y: usize, x: usize| (10 * y + x) as u8;

    let row_major: Vec<u8> = (0..2).flat_map(|y| (0..3).map(move |x| logical(y, x))).collect();
    let row_view = StridedView::new(ViewStorage::Typed(TypedBuffer::U8(row_major)), vec![2, 3]);

    let column_major: Vec<u8> = (0..3).flat_map(|x| (0..2).map(move |y| logical(y, x))).collect();
    let column_view = StridedView::with_strides(ViewStorage::Typed(TypedBuffer::U8(column_major)), vec![2, 3], vec![1, 2], 0);

    let mut packed = Vec::new();
    for view in [row_view, column_view] {
        let textures = texture_set();
        textures.create_texture_2d(PixelData::from(view)).unwrap();
        packed.push(uploaded_bytes(&textures));
    }
    assert_eq!(packed[0], vec![0, 1, 2, 10, 11, 12]);
    assert_eq!(packed[0], packed[1]);
}

#[test]
fn test_view_with_offset_and_negative_stride() {
    // Rows stored bottom-up; a negative row stride reads them top-down
    let storage = ViewStorage::Numbers(vec![4.0, 5.0, 6.0, 1.0, 2.0, 3.0]);
    let view = StridedView::with_strides(storage, vec![2, 3], vec![-3, 1], 3);
    let textures = texture_set();
    textures.create_texture_2d(PixelData::from(view)).unwrap();
    assert_eq!(uploaded_bytes(&textures), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn test_half_float_staging() {
    let mut config = TextureSetConfig::default();
    config.extensions.oes_texture_half_float = true;
    let textures = TextureSet::new(RecordingDevice::new(), config);
    textures
        .create_texture_2d(TextureOptions {
            width: Some(2),
            height: Some(1),
            channels: Some(1),
            ty: Some("float16".to_string()),
            data: Some(vec![0.5f64, 2.0].into()),
            ..Default::default()
        })
        .unwrap();

    let bytes = uploaded_bytes(&textures);
    let halves: Vec<f32> = bytes.chunks_exact(2).map(|b| half::f16::from_bits(u16::from_ne_bytes([b[0], b[1]])).to_f32()).collect();
    assert_eq!(halves, vec![0.5, 2.0]);
    assert!(textures.pool_stats().is_idle());
}
