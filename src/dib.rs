//! Device independent bitmaps
//!
//! Header parsing, RLE4/RLE8 expansion and conversion of uncompressed DIB
//! pixel data to top-down RGBA.

use crate::bounds::RecordReader;
use crate::device_context::Color;
use crate::error::{ConvertError, Result};

pub const BI_RGB: u32 = 0;
pub const BI_RLE8: u32 = 1;
pub const BI_RLE4: u32 = 2;
pub const BI_BITFIELDS: u32 = 3;
pub const BI_JPEG: u32 = 4;
pub const BI_PNG: u32 = 5;

pub const MAX_BITMAP_WIDTH: u32 = 4096;
pub const MAX_BITMAP_HEIGHT: u32 = 4096;

pub const BITMAPINFOHEADER_SIZE: usize = 40;

/// BITMAPINFOHEADER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

impl BitmapInfoHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = RecordReader::new(data);
        r.require(BITMAPINFOHEADER_SIZE)?;
        Ok(Self {
            size: r.read_u32()?,
            width: r.read_i32()?,
            height: r.read_i32()?,
            planes: r.read_u16()?,
            bit_count: r.read_u16()?,
            compression: r.read_u32()?,
            size_image: r.read_u32()?,
            x_pels_per_meter: r.read_i32()?,
            y_pels_per_meter: r.read_i32()?,
            clr_used: r.read_u32()?,
            clr_important: r.read_u32()?,
        })
    }

    pub fn pixel_width(&self) -> u32 {
        self.width.unsigned_abs()
    }

    pub fn pixel_height(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Rows are stored top row first.
    pub fn is_top_down(&self) -> bool {
        self.height < 0
    }

    /// Number of palette entries following the header.
    pub fn color_count(&self) -> usize {
        if self.compression != BI_RGB && self.compression != BI_RLE8 && self.compression != BI_RLE4 {
            return 0;
        }
        if self.clr_used != 0 {
            return self.clr_used as usize;
        }
        let max = match self.bit_count {
            1 => 2,
            4 => 16,
            8 => 256,
            _ => return 0,
        };
        let area = self.pixel_width() as u64 * self.pixel_height() as u64;
        max.min(area) as usize
    }

    /// Fails unless both dimensions are in `1..=MAX`.
    pub fn check_dimensions(&self) -> Result<()> {
        let (w, h) = (self.pixel_width(), self.pixel_height());
        if w == 0 || h == 0 || w > MAX_BITMAP_WIDTH || h > MAX_BITMAP_HEIGHT {
            return Err(ConvertError::ImageDecode(format!(
                "unsupported bitmap dimensions {}x{}",
                w, h
            )));
        }
        Ok(())
    }
}

/// A decoded bitmap, RGBA, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Read the RGBQUAD palette that follows the header in `bmi`.
pub fn read_palette(bmi: &[u8], header: &BitmapInfoHeader) -> Result<Vec<Color>> {
    let count = header.color_count();
    let start = (header.size as usize).max(BITMAPINFOHEADER_SIZE);
    let mut r = RecordReader::at(bmi, start)?;
    r.require(count.saturating_mul(4))?;
    let mut palette = Vec::with_capacity(count);
    for _ in 0..count {
        let quad = r.read_bytes(4)?;
        palette.push(Color::new(quad[2], quad[1], quad[0]));
    }
    Ok(palette)
}

/// Cursor over the RLE output: one byte per pixel, bottom row first.
struct RleCanvas {
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    out: Vec<u8>,
}

impl RleCanvas {
    fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self { width, height, x: 0, y: 0, out: vec![0; width * height] }
    }

    fn put(&mut self, value: u8) {
        if self.x < self.width && self.y < self.height {
            self.out[self.y * self.width + self.x] = value;
        }
        self.x += 1;
    }

    fn end_of_line(&mut self) {
        self.x = 0;
        self.y += 1;
    }

    fn delta(&mut self, dx: u8, dy: u8) {
        self.x += dx as usize;
        self.y += dy as usize;
    }

    fn done(&self) -> bool {
        self.y >= self.height
    }
}

fn check_rle_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_BITMAP_WIDTH || height > MAX_BITMAP_HEIGHT {
        return Err(ConvertError::ImageDecode(format!(
            "unsupported RLE bitmap dimensions {}x{}",
            width, height
        )));
    }
    Ok(())
}

fn rle_truncated() -> ConvertError {
    ConvertError::ImageDecode("truncated RLE data".to_string())
}

/// Expand RLE8 data into `width * height` palette indices, bottom row first.
///
/// Pixels not covered by the encoded runs stay 0.
pub fn rle8_decode(src: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    check_rle_dimensions(width, height)?;
    let mut canvas = RleCanvas::new(width, height);
    let mut pos = 0usize;
    while pos + 1 < src.len() && !canvas.done() {
        let (count, value) = (src[pos], src[pos + 1]);
        pos += 2;
        if count > 0 {
            for _ in 0..count {
                canvas.put(value);
            }
            continue;
        }
        match value {
            0 => canvas.end_of_line(),
            1 => break,
            2 => {
                let delta = src.get(pos..pos + 2).ok_or_else(rle_truncated)?;
                canvas.delta(delta[0], delta[1]);
                pos += 2;
            }
            n => {
                let n = n as usize;
                let run = src.get(pos..pos + n).ok_or_else(rle_truncated)?;
                for &v in run {
                    canvas.put(v);
                }
                // absolute runs are padded to a 16-bit boundary
                pos += n + (n & 1);
            }
        }
    }
    Ok(canvas.out)
}

/// Expand RLE4 data into `width * height` palette indices (one per byte),
/// bottom row first.
pub fn rle4_decode(src: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    check_rle_dimensions(width, height)?;
    let mut canvas = RleCanvas::new(width, height);
    let mut pos = 0usize;
    while pos + 1 < src.len() && !canvas.done() {
        let (count, value) = (src[pos], src[pos + 1]);
        pos += 2;
        if count > 0 {
            let nibbles = [value >> 4, value & 0x0F];
            for i in 0..count as usize {
                canvas.put(nibbles[i & 1]);
            }
            continue;
        }
        match value {
            0 => canvas.end_of_line(),
            1 => break,
            2 => {
                let delta = src.get(pos..pos + 2).ok_or_else(rle_truncated)?;
                canvas.delta(delta[0], delta[1]);
                pos += 2;
            }
            n => {
                let n = n as usize;
                let bytes = (n + 1) / 2;
                let run = src.get(pos..pos + bytes).ok_or_else(rle_truncated)?;
                for i in 0..n {
                    let byte = run[i / 2];
                    canvas.put(if i & 1 == 0 { byte >> 4 } else { byte & 0x0F });
                }
                pos += bytes + (bytes & 1);
            }
        }
    }
    Ok(canvas.out)
}

/// Row size in bytes, padded to 32 bits.
pub fn dib_stride(width: u32, bit_count: u16) -> usize {
    (((width as usize) * (bit_count as usize) + 31) / 32) * 4
}

/// Map RLE output (one index per byte, bottom row first) through a palette.
pub fn indices_to_bitmap(indices: &[u8], width: u32, height: u32, palette: &[Color]) -> Result<Bitmap> {
    if palette.is_empty() {
        return Err(ConvertError::ImageDecode("indexed bitmap without palette".to_string()));
    }
    let (w, h) = (width as usize, height as usize);
    if indices.len() < w * h {
        return Err(ConvertError::ImageDecode("indexed bitmap too short".to_string()));
    }
    let mut rgba = Vec::with_capacity(w * h * 4);
    for row in (0..h).rev() {
        for &index in &indices[row * w..row * w + w] {
            let c = palette.get(index as usize).copied().unwrap_or_default();
            rgba.extend_from_slice(&[c.r, c.g, c.b, 0xFF]);
        }
    }
    Ok(Bitmap { width, height, rgba })
}

/// Convert uncompressed DIB pixels (1, 4, 8, 16, 24 or 32 bits) to RGBA.
pub fn dib_to_bitmap(header: &BitmapInfoHeader, palette: &[Color], bits: &[u8]) -> Result<Bitmap> {
    header.check_dimensions()?;
    let (width, height) = (header.pixel_width(), header.pixel_height());
    let bit_count = header.bit_count;
    if bit_count <= 8 && palette.is_empty() {
        return Err(ConvertError::ImageDecode(format!(
            "{}-bit bitmap without palette",
            bit_count
        )));
    }
    if !matches!(bit_count, 1 | 4 | 8 | 16 | 24 | 32) {
        return Err(ConvertError::ImageDecode(format!("unsupported bit depth {}", bit_count)));
    }
    let stride = dib_stride(width, bit_count);
    let (w, h) = (width as usize, height as usize);
    if bits.len() < stride * h {
        return Err(ConvertError::ImageDecode(format!(
            "bitmap data holds {} bytes, {} needed",
            bits.len(),
            stride * h
        )));
    }

    let mut rgba = vec![0u8; w * h * 4];
    for src_row in 0..h {
        let row = &bits[src_row * stride..src_row * stride + stride];
        let dst_row = if header.is_top_down() { src_row } else { h - 1 - src_row };
        let dst = &mut rgba[dst_row * w * 4..(dst_row + 1) * w * 4];
        for x in 0..w {
            let px = match bit_count {
                1 => {
                    let bit = (row[x / 8] >> (7 - (x % 8))) & 1;
                    indexed(palette, bit)
                }
                4 => {
                    let byte = row[x / 2];
                    indexed(palette, if x & 1 == 0 { byte >> 4 } else { byte & 0x0F })
                }
                8 => indexed(palette, row[x]),
                16 => {
                    let v = u16::from_le_bytes([row[x * 2], row[x * 2 + 1]]);
                    let five = |s: u16| (((v >> s) & 0x1F) as u32 * 255 / 31) as u8;
                    [five(10), five(5), five(0), 0xFF]
                }
                24 => [row[x * 3 + 2], row[x * 3 + 1], row[x * 3], 0xFF],
                _ => [row[x * 4 + 2], row[x * 4 + 1], row[x * 4], row[x * 4 + 3]],
            };
            dst[x * 4..x * 4 + 4].copy_from_slice(&px);
        }
    }

    // 32-bit DIBs with an all-zero alpha channel are opaque
    if bit_count == 32 && rgba.chunks_exact(4).all(|p| p[3] == 0) {
        for p in rgba.chunks_exact_mut(4) {
            p[3] = 0xFF;
        }
    }
    Ok(Bitmap { width, height, rgba })
}

fn indexed(palette: &[Color], index: u8) -> [u8; 4] {
    let c = palette.get(index as usize).copied().unwrap_or_default();
    [c.r, c.g, c.b, 0xFF]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: i32, height: i32, bit_count: u16, compression: u32) -> BitmapInfoHeader {
        BitmapInfoHeader {
            size: 40,
            width,
            height,
            planes: 1,
            bit_count,
            compression,
            size_image: 0,
            x_pels_per_meter: 0,
            y_pels_per_meter: 0,
            clr_used: 0,
            clr_important: 0,
        }
    }

    #[test]
    fn test_parse_header() {
        let mut data = Vec::new();
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&3i32.to_le_bytes());
        data.extend_from_slice(&(-2i32).to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&24u16.to_le_bytes());
        data.extend_from_slice(&[0u8; 24]);
        let h = BitmapInfoHeader::parse(&data).unwrap();
        assert_eq!((h.pixel_width(), h.pixel_height()), (3, 2));
        assert!(h.is_top_down());
        assert!(BitmapInfoHeader::parse(&data[..39]).is_err());
    }

    #[test]
    fn test_color_count_defaults() {
        assert_eq!(header(16, 16, 8, BI_RGB).color_count(), 256);
        assert_eq!(header(2, 2, 8, BI_RGB).color_count(), 4);
        assert_eq!(header(16, 16, 24, BI_RGB).color_count(), 0);
    }

    #[test]
    fn test_rle8_output_size_is_exact() {
        // encoded runs, absolute block, delta, end of line and end of bitmap
        let patterns: [&[u8]; 4] = [
            &[3, 7, 0, 0, 0, 1],
            &[0, 3, 1, 2, 3, 0, 0, 2, 1, 1, 2, 9],
            &[255, 1, 255, 2],
            &[],
        ];
        for src in patterns {
            let out = rle8_decode(src, 5, 4).unwrap();
            assert_eq!(out.len(), 5 * 4);
        }
    }

    #[test]
    fn test_rle8_runs_and_absolute() {
        let src = [2, 9, 0, 3, 1, 2, 3, 0, 0, 0, 1];
        let out = rle8_decode(&src, 5, 2).unwrap();
        assert_eq!(&out[..5], &[9, 9, 1, 2, 3]);
        assert_eq!(&out[5..], &[0; 5]);
    }

    #[test]
    fn test_rle4_output_size_is_exact() {
        let patterns: [&[u8]; 3] = [&[5, 0x12, 0, 0, 0, 1], &[0, 5, 0x12, 0x34, 0x50, 0], &[200, 0xFF]];
        for src in patterns {
            let out = rle4_decode(src, 7, 3).unwrap();
            assert_eq!(out.len(), 7 * 3);
        }
    }

    #[test]
    fn test_rle4_alternates_nibbles() {
        let out = rle4_decode(&[5, 0x12, 0, 1], 5, 1).unwrap();
        assert_eq!(out, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    fn test_rle_truncated_absolute_run() {
        assert!(rle8_decode(&[0, 5, 1, 2], 8, 1).is_err());
        assert!(rle8_decode(&[1, 1], 0, 1).is_err());
    }

    #[test]
    fn test_24bit_bottom_up() {
        let h = header(1, 2, 24, BI_RGB);
        // bottom row blue, top row red; rows padded to 4 bytes
        let bits = [0xFF, 0, 0, 0, 0, 0, 0xFF, 0];
        let bmp = dib_to_bitmap(&h, &[], &bits).unwrap();
        assert_eq!(&bmp.rgba[..4], &[0xFF, 0, 0, 0xFF]);
        assert_eq!(&bmp.rgba[4..], &[0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn test_monochrome_uses_palette() {
        let h = header(8, 1, 1, BI_RGB);
        let palette = [Color::BLACK, Color::WHITE];
        let bmp = dib_to_bitmap(&h, &palette, &[0b1000_0000, 0, 0, 0]).unwrap();
        assert_eq!(&bmp.rgba[..4], &[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bmp.rgba[4..8], &[0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_short_pixel_data_fails() {
        let h = header(4, 4, 32, BI_RGB);
        assert!(matches!(dib_to_bitmap(&h, &[], &[0; 10]), Err(ConvertError::ImageDecode(_))));
    }

    #[test]
    fn test_indices_to_bitmap_flips_rows() {
        let palette = [Color::BLACK, Color::WHITE];
        let bmp = indices_to_bitmap(&[1, 0], 1, 2, &palette).unwrap();
        assert_eq!(&bmp.rgba[..4], &[0, 0, 0, 0xFF]);
        assert_eq!(&bmp.rgba[4..], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }
}
