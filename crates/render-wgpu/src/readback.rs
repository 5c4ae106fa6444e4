use glview_render::{RenderError, Thumbnail};

/// Bytes per row of a `width`-pixel RGBA8 row, padded for buffer copies.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strip row padding and swizzle to RGBA.
pub(crate) fn unpad_rows(data: &[u8], width: u32, height: u32, bgra: bool) -> Vec<u8> {
    let padded = padded_bytes_per_row(width) as usize;
    let row_len = width as usize * 4;
    let mut rgba = Vec::with_capacity(row_len * height as usize);
    for row in data.chunks(padded).take(height as usize) {
        let row = &row[..row_len.min(row.len())];
        if bgra {
            for px in row.chunks_exact(4) {
                rgba.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
        } else {
            rgba.extend_from_slice(row);
        }
    }
    rgba
}

/// Copy a square colour texture back to the CPU. Submits `encoder`.
pub(crate) fn read_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    mut encoder: wgpu::CommandEncoder,
    texture: &wgpu::Texture,
    format: wgpu::TextureFormat,
    size: u32,
) -> Result<Thumbnail, RenderError> {
    let bgra = match format {
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        other => {
            return Err(RenderError::Capture(format!(
                "unsupported capture format {other:?}"
            )));
        }
    };

    let bytes_per_row = padded_bytes_per_row(size);
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("capture_readback"),
        size: u64::from(bytes_per_row) * u64::from(size),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(size),
            },
        },
        wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);
    receiver
        .recv()
        .map_err(|_| RenderError::Capture("readback callback dropped".into()))?
        .map_err(|e| RenderError::Capture(e.to_string()))?;

    let rgba = {
        let data = slice.get_mapped_range();
        unpad_rows(&data, size, size, bgra)
    };
    buffer.unmap();

    Ok(Thumbnail {
        width: size,
        height: size,
        rgba,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(256), 1024);
        assert_eq!(padded_bytes_per_row(10), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }

    #[test]
    fn unpad_strips_padding_and_swizzles() {
        let mut data = vec![0u8; 256 * 2];
        data[..4].copy_from_slice(&[3, 2, 1, 255]);
        data[256..260].copy_from_slice(&[30, 20, 10, 128]);
        let rgba = unpad_rows(&data, 1, 2, true);
        assert_eq!(rgba, vec![1, 2, 3, 255, 10, 20, 30, 128]);

        let rgba = unpad_rows(&data, 1, 2, false);
        assert_eq!(rgba, vec![3, 2, 1, 255, 30, 20, 10, 128]);
    }
}
