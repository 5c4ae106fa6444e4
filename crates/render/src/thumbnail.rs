/// Edge length of captured thumbnails in pixels.
pub const THUMBNAIL_SIZE: u32 = 256;

/// Raw RGBA8 image, rows top to bottom, no padding.
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Thumbnail {
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba.get(i..i + 4)?.try_into().ok()
    }
}

impl std::fmt::Debug for Thumbnail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thumbnail")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Linear `[0, 1]` colour to RGBA8.
pub(crate) fn to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_thumbnail_layout() {
        let thumb = Thumbnail::filled(4, 2, [1, 2, 3, 4]);
        assert_eq!(thumb.rgba.len(), 32);
        assert_eq!(thumb.pixel(3, 1), Some([1, 2, 3, 4]));
        assert_eq!(thumb.pixel(4, 0), None);
    }

    #[test]
    fn colour_conversion_clamps() {
        assert_eq!(to_rgba8([0.0, 1.0, 2.0, -1.0]), [0, 255, 255, 0]);
    }
}
