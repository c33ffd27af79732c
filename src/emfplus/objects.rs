//! EMF+ object definitions: brushes, pens, paths and fonts

use crate::bounds::RecordReader;
use crate::error::{ConvertError, Result};
use crate::svg_writer::color_hex;

// EMF+ Object Types
pub const OBJECT_TYPE_BRUSH: u8 = 0x01;
pub const OBJECT_TYPE_PEN: u8 = 0x02;
pub const OBJECT_TYPE_PATH: u8 = 0x03;
pub const OBJECT_TYPE_REGION: u8 = 0x04;
pub const OBJECT_TYPE_IMAGE: u8 = 0x05;
pub const OBJECT_TYPE_FONT: u8 = 0x06;
pub const OBJECT_TYPE_STRING_FORMAT: u8 = 0x07;
pub const OBJECT_TYPE_IMAGE_ATTRIBUTES: u8 = 0x08;
pub const OBJECT_TYPE_CUSTOM_LINE_CAP: u8 = 0x09;

// Brush Types
const BRUSH_TYPE_SOLID_COLOR: u32 = 0;
const BRUSH_TYPE_HATCH_FILL: u32 = 1;
const BRUSH_TYPE_TEXTURE_FILL: u32 = 2;
const BRUSH_TYPE_PATH_GRADIENT: u32 = 3;
const BRUSH_TYPE_LINEAR_GRADIENT: u32 = 4;

// Pen data flags
const PEN_DATA_TRANSFORM: u32 = 0x0001;
const PEN_DATA_DASHED_LINE: u32 = 0x0100;
const PEN_DATA_NON_CENTER: u32 = 0x0200;
const PEN_DATA_COMPOUND_LINE: u32 = 0x0400;
const PEN_DATA_CUSTOM_START_CAP: u32 = 0x0800;
const PEN_DATA_CUSTOM_END_CAP: u32 = 0x1000;
/// StartCap, EndCap, Join, MiterLimit, LineStyle, DashedLineCap, DashOffset.
const PEN_DATA_SCALARS: [u32; 7] = [0x0002, 0x0004, 0x0008, 0x0010, 0x0020, 0x0040, 0x0080];

// Path point flags
const PATH_COMPRESSED: u32 = 0x4000;
const PATH_RELATIVE: u32 = 0x0800;
const PATH_RLE_TYPES: u32 = 0x1000;

// Path point types
pub const POINT_TYPE_START: u8 = 0x00;
pub const POINT_TYPE_LINE: u8 = 0x01;
pub const POINT_TYPE_BEZIER: u8 = 0x03;
pub const POINT_TYPE_MASK: u8 = 0x07;
pub const POINT_TYPE_CLOSE: u8 = 0x80;

// Font style flags
pub const FONT_STYLE_BOLD: u32 = 0x01;
pub const FONT_STYLE_ITALIC: u32 = 0x02;
pub const FONT_STYLE_UNDERLINE: u32 = 0x04;
pub const FONT_STYLE_STRIKEOUT: u32 = 0x08;

/// Brush representation
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    SolidColor(u32), // ARGB
    Hatch {
        fore_color: u32,
        back_color: u32,
    },
    PathGradient {
        center_color: u32,
    },
    LinearGradient {
        start_color: u32,
        end_color: u32,
        rect: (f32, f32, f32, f32), // x, y, width, height
    },
}

/// Pen representation
#[derive(Debug, Clone, PartialEq)]
pub struct Pen {
    pub brush: Brush,
    pub width: f32,
    pub unit: u32,
}

/// Path representation: raw points and their point types.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlusPath {
    pub points: Vec<(f32, f32)>,
    pub types: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlusFont {
    pub em_size: f32,
    pub unit: u32,
    pub style: u32,
    pub family: String,
}

/// One slot of the EMF+ object table.
#[derive(Debug, Clone, PartialEq)]
pub enum PlusObject {
    Brush(Brush),
    Pen(Pen),
    Path(PlusPath),
    Font(PlusFont),
    /// Objects kept only so their slot is known to be in use.
    Opaque(u8),
}

/// Interpret a complete object payload of `object_type`.
pub fn parse_object(object_type: u8, payload: &[u8]) -> Result<PlusObject> {
    let mut reader = RecordReader::new(payload);
    Ok(match object_type {
        OBJECT_TYPE_BRUSH => PlusObject::Brush(parse_brush(&mut reader)?),
        OBJECT_TYPE_PEN => PlusObject::Pen(parse_pen(&mut reader)?),
        OBJECT_TYPE_PATH => PlusObject::Path(parse_path(&mut reader)?),
        OBJECT_TYPE_FONT => PlusObject::Font(parse_font(&mut reader)?),
        OBJECT_TYPE_REGION
        | OBJECT_TYPE_IMAGE
        | OBJECT_TYPE_STRING_FORMAT
        | OBJECT_TYPE_IMAGE_ATTRIBUTES
        | OBJECT_TYPE_CUSTOM_LINE_CAP => PlusObject::Opaque(object_type),
        other => {
            return Err(ConvertError::bounds(format!("unknown EMF+ object type {}", other)));
        }
    })
}

/// Parse brush object
pub fn parse_brush(reader: &mut RecordReader<'_>) -> Result<Brush> {
    let _version = reader.read_u32()?;
    let brush_type = reader.read_u32()?;

    match brush_type {
        BRUSH_TYPE_SOLID_COLOR => Ok(Brush::SolidColor(reader.read_u32()?)),
        BRUSH_TYPE_HATCH_FILL => {
            let _hatch_style = reader.read_u32()?;
            let fore_color = reader.read_u32()?;
            let back_color = reader.read_u32()?;
            Ok(Brush::Hatch { fore_color, back_color })
        }
        BRUSH_TYPE_PATH_GRADIENT => {
            let _brush_flags = reader.read_u32()?;
            let _wrap_mode = reader.read_u32()?;
            let center_color = reader.read_u32()?;
            Ok(Brush::PathGradient { center_color })
        }
        BRUSH_TYPE_LINEAR_GRADIENT => {
            let _brush_flags = reader.read_u32()?;
            let _wrap_mode = reader.read_u32()?;
            let rect_x = reader.read_f32()?;
            let rect_y = reader.read_f32()?;
            let rect_width = reader.read_f32()?;
            let rect_height = reader.read_f32()?;
            let start_color = reader.read_u32()?;
            let end_color = reader.read_u32()?;
            Ok(Brush::LinearGradient {
                start_color,
                end_color,
                rect: (rect_x, rect_y, rect_width, rect_height),
            })
        }
        // texture brushes carry an image; paint them opaque black
        BRUSH_TYPE_TEXTURE_FILL => Ok(Brush::SolidColor(0xFF00_0000)),
        other => Err(ConvertError::bounds(format!("unknown EMF+ brush type {}", other))),
    }
}

/// Parse pen object
///
/// Optional pen data announced by the flags is skipped; only the width,
/// unit and brush are kept.
pub fn parse_pen(reader: &mut RecordReader<'_>) -> Result<Pen> {
    let _version = reader.read_u32()?;
    let _type = reader.read_u32()?;
    let flags = reader.read_u32()?;
    let unit = reader.read_u32()?;
    let width = reader.read_f32()?;

    if flags & PEN_DATA_TRANSFORM != 0 {
        reader.skip(24)?;
    }
    for flag in PEN_DATA_SCALARS {
        if flags & flag != 0 {
            reader.skip(4)?;
        }
    }
    if flags & PEN_DATA_DASHED_LINE != 0 {
        let count = reader.read_u32()? as usize;
        reader.skip(count.saturating_mul(4))?;
    }
    if flags & PEN_DATA_NON_CENTER != 0 {
        reader.skip(4)?;
    }
    if flags & PEN_DATA_COMPOUND_LINE != 0 {
        let count = reader.read_u32()? as usize;
        reader.skip(count.saturating_mul(4))?;
    }
    for flag in [PEN_DATA_CUSTOM_START_CAP, PEN_DATA_CUSTOM_END_CAP] {
        if flags & flag != 0 {
            let size = reader.read_u32()? as usize;
            reader.skip(size)?;
        }
    }

    let brush = parse_brush(reader)?;
    Ok(Pen { brush, width, unit })
}

/// Parse path object
pub fn parse_path(reader: &mut RecordReader<'_>) -> Result<PlusPath> {
    let _version = reader.read_u32()?;
    let count = reader.read_u32()? as usize;
    let flags = reader.read_u32()?;

    let points = read_plus_points(reader, count, flags & PATH_COMPRESSED != 0, flags & PATH_RELATIVE != 0)?;
    let types = if flags & PATH_RLE_TYPES != 0 {
        read_rle_types(reader, count)?
    } else {
        reader.read_bytes(count)?.to_vec()
    };
    Ok(PlusPath { points, types })
}

/// Parse font object
pub fn parse_font(reader: &mut RecordReader<'_>) -> Result<PlusFont> {
    let _version = reader.read_u32()?;
    let em_size = reader.read_f32()?;
    let unit = reader.read_u32()?;
    let style = reader.read_u32()?;
    let _reserved = reader.read_u32()?;
    let length = reader.read_u32()? as usize;
    let family = reader.read_utf16(length)?;
    Ok(PlusFont { em_size, unit, style, family })
}

/// Points stored as f32 pairs, i16 pairs (`compressed`) or relative
/// variable-length offsets (`relative`).
pub fn read_plus_points(
    reader: &mut RecordReader<'_>,
    count: usize,
    compressed: bool,
    relative: bool,
) -> Result<Vec<(f32, f32)>> {
    if relative {
        let mut points = Vec::with_capacity(count.min(reader.remaining()));
        let (mut x, mut y) = (0i32, 0i32);
        for _ in 0..count {
            x = x.saturating_add(read_relative(reader)?);
            y = y.saturating_add(read_relative(reader)?);
            points.push((x as f32, y as f32));
        }
        return Ok(points);
    }
    let width = if compressed { 4 } else { 8 };
    reader.require(count.saturating_mul(width))?;
    (0..count)
        .map(|_| {
            if compressed {
                Ok((reader.read_i16()? as f32, reader.read_i16()? as f32))
            } else {
                Ok((reader.read_f32()?, reader.read_f32()?))
            }
        })
        .collect()
}

/// One EmfPlusInteger7 or EmfPlusInteger15 value.
fn read_relative(reader: &mut RecordReader<'_>) -> Result<i32> {
    let first = reader.read_u8()?;
    if first & 0x80 == 0 {
        let v = (first & 0x7F) as i32;
        return Ok(if v & 0x40 != 0 { v - 0x80 } else { v });
    }
    let second = reader.read_u8()?;
    let v = (((first & 0x7F) as i32) << 8) | second as i32;
    Ok(if v & 0x4000 != 0 { v - 0x8000 } else { v })
}

/// Run-length encoded point types: (run count, type) byte pairs.
fn read_rle_types(reader: &mut RecordReader<'_>, count: usize) -> Result<Vec<u8>> {
    let mut types = Vec::with_capacity(count.min(reader.remaining()));
    while types.len() < count {
        let run = (reader.read_u8()? & 0x3F) as usize;
        let point_type = reader.read_u8()?;
        if run == 0 {
            return Err(ConvertError::bounds("empty run in EMF+ point types"));
        }
        types.extend(std::iter::repeat(point_type).take(run.min(count - types.len())));
    }
    Ok(types)
}

/// SVG colour and opacity of an ARGB value.
pub fn argb_to_color(argb: u32) -> (String, f64) {
    let a = ((argb >> 24) & 0xFF) as u8;
    let r = ((argb >> 16) & 0xFF) as u8;
    let g = ((argb >> 8) & 0xFF) as u8;
    let b = (argb & 0xFF) as u8;
    (color_hex(r, g, b), a as f64 / 255.0)
}

/// Convert brush to SVG colour and opacity. Gradients and hatches use a
/// single representative colour.
pub fn brush_to_color(brush: &Brush) -> (String, f64) {
    match brush {
        Brush::SolidColor(argb) => argb_to_color(*argb),
        Brush::Hatch { fore_color, .. } => argb_to_color(*fore_color),
        Brush::PathGradient { center_color } => argb_to_color(*center_color),
        Brush::LinearGradient { start_color, .. } => argb_to_color(*start_color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_parse_solid_brush() {
        let data = words(&[0xDBC0_1002, BRUSH_TYPE_SOLID_COLOR, 0xFF11_2233]);
        let obj = parse_object(OBJECT_TYPE_BRUSH, &data).unwrap();
        assert_eq!(obj, PlusObject::Brush(Brush::SolidColor(0xFF11_2233)));
    }

    #[test]
    fn test_parse_pen_skips_optional_data() {
        let mut data = words(&[0xDBC0_1002, 0, 0x0008 | 0x0100, 2]);
        data.extend_from_slice(&2.5f32.to_le_bytes());
        // line join, then a dash array of two floats
        data.extend(words(&[1, 2]));
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend_from_slice(&1.0f32.to_le_bytes());
        data.extend(words(&[0xDBC0_1002, BRUSH_TYPE_SOLID_COLOR, 0xFF00_00FF]));
        let pen = parse_pen(&mut RecordReader::new(&data)).unwrap();
        assert_eq!(pen.width, 2.5);
        assert_eq!(pen.unit, 2);
        assert_eq!(pen.brush, Brush::SolidColor(0xFF00_00FF));
    }

    #[test]
    fn test_parse_compressed_path() {
        let mut data = words(&[0xDBC0_1002, 2, PATH_COMPRESSED]);
        for v in [1i16, 2, 3, 4] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.extend_from_slice(&[POINT_TYPE_START, POINT_TYPE_LINE | POINT_TYPE_CLOSE]);
        let path = parse_path(&mut RecordReader::new(&data)).unwrap();
        assert_eq!(path.points, vec![(1.0, 2.0), (3.0, 4.0)]);
        assert_eq!(path.types, vec![0x00, 0x81]);
    }

    #[test]
    fn test_relative_points_accumulate() {
        // (+1, -1) then (+0x100, 0)
        let data = [0x01, 0x7F, 0x81, 0x00, 0x00];
        let points = read_plus_points(&mut RecordReader::new(&data), 2, false, true).unwrap();
        assert_eq!(points, vec![(1.0, -1.0), (257.0, -1.0)]);
    }

    #[test]
    fn test_parse_font() {
        let mut data = words(&[0xDBC0_1002]);
        data.extend_from_slice(&12.0f32.to_le_bytes());
        data.extend(words(&[3, FONT_STYLE_BOLD, 0, 2]));
        data.extend_from_slice(&[b'A', 0, b'B', 0]);
        let font = parse_font(&mut RecordReader::new(&data)).unwrap();
        assert_eq!(font.family, "AB");
        assert_eq!(font.style, FONT_STYLE_BOLD);
    }

    #[test]
    fn test_brush_to_color_alpha() {
        let (color, opacity) = brush_to_color(&Brush::SolidColor(0x80FF_0000));
        assert_eq!(color, "#FF0000");
        assert!((opacity - 128.0 / 255.0).abs() < 1e-9);
    }
}
