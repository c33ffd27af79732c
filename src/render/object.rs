//! Object lifecycle: CREATE*, SELECTOBJECT, DELETEOBJECT

use log::debug;

use super::Renderer;
use crate::bounds::{slice_at, RecordReader};
use crate::device_context::*;
use crate::emf_records::EMR_CREATEMONOBRUSH;
use crate::error::Result;
use crate::object_table::GdiObject;
use crate::svg_writer::set;

/// Size from which EXTCREATEFONTINDIRECTW carries the full face name.
const ENUMLOGFONTEXW_MIN_SIZE: usize = 332;

pub(crate) fn create_pen(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let index = reader.read_u32()?;
    let mut style = reader.read_u32()?;
    let width = reader.read_i32()?;
    reader.seek(24)?;
    let color = Color::from_colorref(reader.read_u32()?);
    // LOGPEN has no pen type; widths above one behave as geometric pens
    if width > 1 {
        style |= PS_GEOMETRIC;
    }
    let stroke = Stroke { style, width: width as f64, color };
    r.objects.set(index, GdiObject::Pen(stroke))
}

pub(crate) fn ext_create_pen(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let index = reader.read_u32()?;
    reader.seek(28)?;
    let mut style = reader.read_u32()?;
    let width = reader.read_u32()?;
    let brush_style = reader.read_u32()?;
    let color = Color::from_colorref(reader.read_u32()?);
    if brush_style == BS_NULL {
        style = (style & !PS_STYLE_MASK) | PS_NULL;
    }
    let stroke = Stroke { style, width: width as f64, color };
    r.objects.set(index, GdiObject::Pen(stroke))
}

pub(crate) fn create_brush_indirect(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let index = reader.read_u32()?;
    let style = reader.read_u32()?;
    let color = Color::from_colorref(reader.read_u32()?);
    let hatch = reader.read_u32()?;
    let fill = Fill { style, color, hatch, pattern: 0 };
    r.objects.set(index, GdiObject::Brush(fill))
}

/// CREATEMONOBRUSH and CREATEDIBPATTERNBRUSHPT.
///
/// The bitmap goes to the image library and is emitted once as a
/// `<pattern>` definition. While a path is open no definition can be
/// written, so the brush falls back to the current fill colour.
pub(crate) fn create_pattern_brush(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::new(rec);
    let kind = reader.read_u32()?;
    reader.seek(8)?;
    let index = reader.read_u32()?;
    let _usage = reader.read_u32()?;
    let off_bmi = reader.read_u32()? as usize;
    let cb_bmi = reader.read_u32()? as usize;
    let off_bits = reader.read_u32()? as usize;
    let cb_bits = reader.read_u32()? as usize;
    let bmi = slice_at(rec, off_bmi, cb_bmi)?;
    let bits = slice_at(rec, off_bits, cb_bits)?;

    let pattern = if r.in_path {
        0
    } else {
        match r.images.find(bmi, bits) {
            Some(id) => id,
            None => {
                let id = r.images.add(bmi, bits);
                let palette = (kind == EMR_CREATEMONOBRUSH).then(|| vec![r.dc.text_color, r.dc.bk_color]);
                r.pattern_defs(id, bmi, bits, palette);
                id
            }
        }
    };
    debug!("pattern brush {} -> img-{}", index, pattern);
    let fill = Fill { style: BS_MONOPATTERN, color: r.dc.fill.color, hatch: 0, pattern };
    r.objects.set(index, GdiObject::Brush(fill))
}

pub(crate) fn ext_create_font(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let index = reader.read_u32()?;
    let height = reader.read_i32()?;
    let width = reader.read_i32()?;
    let escapement = reader.read_i32()?;
    let orientation = reader.read_i32()?;
    let weight = reader.read_i32()?;
    let italic = reader.read_u8()? != 0;
    let underline = reader.read_u8()? != 0;
    let strikeout = reader.read_u8()? != 0;
    reader.seek(40)?;
    let family = reader.read_utf16(32)?;
    let name = if rec.len() >= ENUMLOGFONTEXW_MIN_SIZE {
        reader.seek(104)?;
        Some(reader.read_utf16(64)?).filter(|n| !n.is_empty())
    } else {
        None
    };

    let font = Font {
        name,
        family: Some(family).filter(|f| !f.is_empty()),
        height: height.saturating_abs(),
        width: width.saturating_abs(),
        weight,
        italic,
        underline,
        strikeout,
        escapement: escapement % 3600,
        orientation,
    };
    r.objects.set(index, GdiObject::Font(font))
}

pub(crate) fn select_object(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let index = RecordReader::at(rec, 8)?.read_u32()?;
    if index & STOCK_OBJECT != 0 {
        if !r.dc.select_stock(index) {
            debug!("stock object {:#x} ignored", index);
        }
        return Ok(());
    }
    r.objects.select(index, &mut r.dc)
}

pub(crate) fn delete_object(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let index = RecordReader::at(rec, 8)?.read_u32()?;
    if index & STOCK_OBJECT != 0 {
        return Ok(());
    }
    r.objects.delete(index)
}

impl Renderer<'_> {
    /// `<defs>` holding the image `img-N` and the pattern `img-N-ref` that
    /// tiles it.
    fn pattern_defs(&mut self, id: u32, bmi: &[u8], bits: &[u8], palette: Option<Vec<Color>>) {
        let (uri, width, height) = self.bitmap_uri(bmi, bits, palette);
        let (width, height) = (width as f64 * self.page.scaling, height as f64 * self.page.scaling);

        let mut image = self.w.element("image");
        set(&mut image, "id", format!("img-{}", id));
        set(&mut image, "x", 0);
        set(&mut image, "y", 0);
        set(&mut image, "width", width);
        set(&mut image, "height", height);
        set(&mut image, "xlink:href", uri);
        set(&mut image, "preserveAspectRatio", "none");

        let mut tile = self.w.element("use");
        set(&mut tile, "id", format!("img-{}-ign", id));
        set(&mut tile, "xlink:href", format!("#img-{}", id));

        let mut pattern = self.w.element("pattern");
        set(&mut pattern, "id", format!("img-{}-ref", id));
        set(&mut pattern, "x", 0);
        set(&mut pattern, "y", 0);
        set(&mut pattern, "width", width);
        set(&mut pattern, "height", height);
        set(&mut pattern, "patternUnits", "userSpaceOnUse");
        svg::Node::append(&mut pattern, tile);

        let mut defs = self.w.element("defs");
        svg::Node::append(&mut defs, image);
        svg::Node::append(&mut defs, pattern);
        self.w.node(defs);
    }
}
