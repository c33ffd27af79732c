//! Bitmap records and DIB embedding
//!
//! Decoded bitmaps are embedded as `data:` URIs. Anything that fails to
//! decode is replaced by the placeholder image; only offsets pointing
//! outside the record stop the walk.

use log::warn;

use super::Renderer;
use crate::bounds::{slice_at, RecordReader};
use crate::device_context::{Color, BS_MONOPATTERN, BS_NULL};
use crate::dib::*;
use crate::error::{ConvertError, Result};
use crate::geometry::{PointD, PointL};
use crate::image_codec::placeholder_uri;
use crate::svg_writer::{data_uri, fmt_point, set};

const BLACKNESS: u32 = 0x0000_0042;
const WHITENESS: u32 = 0x00FF_0062;
const NOOP: u32 = 0x00AA_0029;

/// Destination and bitmap location shared by the blit records.
struct Blit {
    dest: PointL,
    size: PointL,
    rop: u32,
    off_bmi: usize,
    cb_bmi: usize,
    off_bits: usize,
    cb_bits: usize,
    /// SourceConstantAlpha of ALPHABLEND.
    alpha: Option<u8>,
}

impl Blit {
    /// BITBLT, STRETCHBLT and ALPHABLEND share their first 100 bytes.
    fn read_blt(rec: &[u8]) -> Result<Self> {
        let mut reader = RecordReader::at(rec, 24)?;
        let dest = reader.read_point_l()?;
        let size = reader.read_point_l()?;
        let rop = reader.read_u32()?;
        reader.seek(84)?;
        Ok(Self {
            dest,
            size,
            rop,
            off_bmi: reader.read_u32()? as usize,
            cb_bmi: reader.read_u32()? as usize,
            off_bits: reader.read_u32()? as usize,
            cb_bits: reader.read_u32()? as usize,
            alpha: None,
        })
    }

    fn read_stretchdibits(rec: &[u8]) -> Result<Self> {
        let mut reader = RecordReader::at(rec, 24)?;
        let dest = reader.read_point_l()?;
        reader.seek(48)?;
        let off_bmi = reader.read_u32()? as usize;
        let cb_bmi = reader.read_u32()? as usize;
        let off_bits = reader.read_u32()? as usize;
        let cb_bits = reader.read_u32()? as usize;
        let _usage = reader.read_u32()?;
        let rop = reader.read_u32()?;
        let size = reader.read_point_l()?;
        Ok(Self { dest, size, rop, off_bmi, cb_bmi, off_bits, cb_bits, alpha: None })
    }
}

pub(crate) fn bitblt(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let blit = Blit::read_blt(rec)?;
    r.blit(rec, &blit)
}

pub(crate) fn stretchblt(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let blit = Blit::read_blt(rec)?;
    r.blit(rec, &blit)
}

pub(crate) fn stretchdibits(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let blit = Blit::read_stretchdibits(rec)?;
    r.blit(rec, &blit)
}

pub(crate) fn alphablend(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut blit = Blit::read_blt(rec)?;
    // BLENDFUNCTION: op, flags, SourceConstantAlpha, AlphaFormat
    blit.alpha = Some(RecordReader::at(rec, 42)?.read_u8()?);
    r.blit(rec, &blit)
}

impl Renderer<'_> {
    fn blit(&mut self, rec: &[u8], blit: &Blit) -> Result<()> {
        if blit.cb_bits == 0 || blit.cb_bmi == 0 {
            self.outside_path(|r| r.paint_rect(blit));
            return Ok(());
        }
        let bmi = slice_at(rec, blit.off_bmi, blit.cb_bmi)?;
        let bits = slice_at(rec, blit.off_bits, blit.cb_bits)?;
        let (uri, _, _) = self.bitmap_uri(bmi, bits, None);

        let p1 = self.map_l(blit.dest);
        let p2 = self.map_l(PointL {
            x: blit.dest.x.saturating_add(blit.size.x),
            y: blit.dest.y.saturating_add(blit.size.y),
        });
        let mut image = self.w.element("image");
        set(&mut image, "width", (p2.x - p1.x).abs());
        set(&mut image, "height", (p2.y - p1.y).abs());
        set(&mut image, "x", p1.x.min(p2.x));
        set(&mut image, "y", p1.y.min(p2.y));
        if let Some(alpha) = blit.alpha {
            set(&mut image, "fill-opacity", alpha as f64 / 255.0);
        }
        if let Some(clip) = self.clip_url() {
            set(&mut image, "clip-path", clip);
        }
        set(&mut image, "preserveAspectRatio", "none");
        set(&mut image, "xlink:href", uri);
        self.outside_path(|r| r.w.node(image));
        Ok(())
    }

    /// Blit without a source bitmap: paint the destination with the
    /// current brush or the colour implied by the raster operation.
    fn paint_rect(&mut self, blit: &Blit) {
        let style = match blit.rop {
            NOOP => return,
            BLACKNESS => format!("fill:{};", Color::BLACK.hex()),
            WHITENESS => format!("fill:{};", Color::WHITE.hex()),
            _ => match self.dc.fill.style {
                BS_NULL => return,
                BS_MONOPATTERN if self.dc.fill.pattern != 0 => {
                    format!("fill:url(#img-{}-ref);", self.dc.fill.pattern)
                }
                _ => format!("fill:{};", self.dc.fill.color.hex()),
            },
        };
        let d = self.map_l(blit.dest);
        let w = self.scale_x(blit.size.x as f64);
        let h = self.scale_y(blit.size.y as f64);
        self.w.open("path");
        self.clip_attr();
        self.w.attr("style", &style);
        let corners = [
            d,
            d.offset(PointD::new(w, 0.0)),
            d.offset(PointD::new(w, h)),
            d.offset(PointD::new(0.0, h)),
        ];
        let mut data = String::from("M ");
        data.push_str(&fmt_point(corners[0]));
        for c in &corners[1..] {
            data.push_str("L ");
            data.push_str(&fmt_point(*c));
        }
        data.push('Z');
        self.w.attr("d", &data);
        self.w.raw("/>\n");
    }

    /// Data URI and pixel size of a DIB. Decode failures give the
    /// placeholder image.
    pub(crate) fn bitmap_uri(&self, bmi: &[u8], bits: &[u8], palette: Option<Vec<Color>>) -> (String, u32, u32) {
        match self.encode_dib(bmi, bits, palette) {
            Ok(found) => found,
            Err(err) => {
                warn!("bitmap replaced by placeholder: {}", err);
                let size = BitmapInfoHeader::parse(bmi)
                    .map(|h| (h.pixel_width(), h.pixel_height()))
                    .unwrap_or((1, 1));
                (placeholder_uri(), size.0, size.1)
            }
        }
    }

    fn encode_dib(&self, bmi: &[u8], bits: &[u8], palette: Option<Vec<Color>>) -> Result<(String, u32, u32)> {
        let header = BitmapInfoHeader::parse(bmi).map_err(as_decode)?;
        let (width, height) = (header.pixel_width(), header.pixel_height());
        let bitmap = match header.compression {
            BI_JPEG => return Ok((data_uri("image/jpeg", bits), width, height)),
            BI_PNG => return Ok((data_uri("image/png", bits), width, height)),
            BI_RLE8 | BI_RLE4 => {
                let palette = match palette {
                    Some(p) => p,
                    None => read_palette(bmi, &header).map_err(as_decode)?,
                };
                let indices = if header.compression == BI_RLE8 {
                    rle8_decode(bits, width, height)?
                } else {
                    rle4_decode(bits, width, height)?
                };
                indices_to_bitmap(&indices, width, height, &palette)?
            }
            _ => {
                let palette = match palette {
                    Some(p) => p,
                    None => read_palette(bmi, &header).map_err(as_decode)?,
                };
                dib_to_bitmap(&header, &palette, bits)?
            }
        };
        let png = self.codec.encode_png(&bitmap)?;
        Ok((data_uri("image/png", &png), width, height))
    }
}

fn as_decode(err: ConvertError) -> ConvertError {
    match err {
        ConvertError::Bounds(msg) => ConvertError::ImageDecode(msg),
        other => other,
    }
}
