use std::io::Write;

use geometry::{Extent, ScreenPx, Viewport};

use crate::{surface_rect, Color, Error};

/// Describes the binary representation of a pixel in a pixel buffer.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
}

impl PixelFormat {
    #[must_use]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8 => 4,
        }
    }

    #[must_use]
    pub fn read_color(self, bytes: &[u8]) -> Color {
        match self {
            Self::Rgba8 => Color::new(
                f32::from(bytes[0]) / 255.0,
                f32::from(bytes[1]) / 255.0,
                f32::from(bytes[2]) / 255.0,
                f32::from(bytes[3]) / 255.0,
            ),
        }
    }

    #[must_use]
    pub fn encode_color(self, color: Color) -> [u8; 4] {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;

        match self {
            Self::Rgba8 => [
                channel(color.r),
                channel(color.g),
                channel(color.b),
                channel(color.a),
            ],
        }
    }
}

/// A CPU-side image with the origin in the top-left corner.
#[derive(Clone)]
pub struct PixelBuffer {
    format: PixelFormat,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Creates a buffer of the given size filled with `color`.
    #[must_use]
    pub fn new(extent: Extent<u32, ScreenPx>, color: Color) -> Self {
        let format = PixelFormat::Rgba8;
        let pixel = format.encode_color(color);
        let count = extent.width as usize * extent.height as usize;

        Self {
            format,
            width: extent.width,
            height: extent.height,
            bytes: pixel.repeat(count),
        }
    }

    #[inline]
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn extent(&self) -> Extent<u32, ScreenPx> {
        Extent::new(self.width, self.height)
    }

    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> RowIter {
        RowIter {
            row_pitch: self.row_pitch(),
            cursor: 0,
            bytes: &self.bytes,
        }
    }

    /// Returns the color at the given pixel, or `None` if it lies outside the
    /// buffer.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = self.offset(x, y);
        Some(
            self.format
                .read_color(&self.bytes[offset..offset + self.format.bytes_per_pixel()]),
        )
    }

    /// Fills the part of `rect` that lies within the buffer with `color`. The
    /// color is stored as is, without blending.
    pub fn fill_rect(&mut self, rect: Viewport, color: Color) {
        let Some(rect) = rect.intersection(&surface_rect(self.extent())) else {
            return;
        };

        let pixel = self.format.encode_color(color);

        // The intersection is within the buffer, so coordinates are positive.
        #[allow(clippy::cast_sign_loss)]
        let (x0, y0, x1, y1) = (
            rect.x() as u32,
            rect.y() as u32,
            rect.bottom_right().x as u32,
            rect.bottom_right().y as u32,
        );

        for y in y0..y1 {
            let start = self.offset(x0, y);
            let end = self.offset(x1, y);
            for dst in self.bytes[start..end].chunks_exact_mut(pixel.len()) {
                dst.copy_from_slice(&pixel);
            }
        }
    }

    /// Fills the whole buffer with `color`.
    pub fn fill(&mut self, color: Color) {
        let pixel = self.format.encode_color(color);
        for dst in self.bytes.chunks_exact_mut(pixel.len()) {
            dst.copy_from_slice(&pixel);
        }
    }

    /// Encodes the buffer as a PNG image.
    pub fn write_png(&self, writer: impl Write) -> Result<(), Error> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.bytes)?;
        Ok(())
    }

    fn row_pitch(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.row_pitch() + x as usize * self.format.bytes_per_pixel()
    }
}

pub struct RowIter<'a> {
    row_pitch: usize,
    cursor: usize,
    bytes: &'a [u8],
}

impl<'a> Iterator for RowIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.row_pitch == 0 || self.cursor >= self.bytes.len() {
            return None;
        }

        let row = &self.bytes[self.cursor..self.cursor + self.row_pitch];
        self.cursor += self.row_pitch;
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_rect_clips() {
        let mut buffer = PixelBuffer::new(Extent::new(2, 2), Color::BLACK);
        buffer.fill_rect(Viewport::from_xywh(1, -5, 10, 6), Color::RED);

        let mut it = buffer.rows();
        assert_eq!(
            it.next(),
            Some([0u8, 0, 0, 255, 255, 0, 0, 255].as_slice())
        );
        assert_eq!(it.next(), Some([0u8, 0, 0, 255, 0, 0, 0, 255].as_slice()));
        assert_eq!(it.next(), None);
    }

    #[test]
    fn pixel_lookup() {
        let mut buffer = PixelBuffer::new(Extent::new(4, 3), Color::WHITE);
        buffer.fill_rect(Viewport::from_xywh(3, 2, 1, 1), Color::BLUE);

        assert_eq!(buffer.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(buffer.pixel(3, 2), Some(Color::BLUE));
        assert_eq!(buffer.pixel(4, 0), None);
    }

    #[test]
    fn png_header() {
        let buffer = PixelBuffer::new(Extent::new(3, 3), Color::GREEN);
        let mut out = Vec::new();
        buffer.write_png(&mut out).unwrap();

        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn empty_buffer_has_no_rows() {
        let buffer = PixelBuffer::new(Extent::new(0, 0), Color::BLACK);
        assert_eq!(buffer.rows().count(), 0);
    }
}
