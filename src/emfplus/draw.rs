//! EMF+ drawing records
//!
//! Every shape becomes one `<path>` in output pixels. In a dual-mode file
//! the GDI records already draw the picture, so these handlers only read
//! their records there.

use super::objects::{
    brush_to_color, read_plus_points, Brush, Pen, PlusObject, PlusPath, FONT_STYLE_BOLD,
    FONT_STYLE_ITALIC, FONT_STYLE_STRIKEOUT, FONT_STYLE_UNDERLINE, POINT_TYPE_BEZIER,
    POINT_TYPE_CLOSE, POINT_TYPE_LINE, POINT_TYPE_MASK, POINT_TYPE_START,
};
use super::EmfPlusPlayer;
use crate::bounds::RecordReader;
use crate::error::{ConvertError, Result};
use crate::render::clean_text;
use crate::svg_writer::{cdata, fmt_num, fmt_point, set, SvgWriter};

// Drawing record flags
const FLAG_BRUSH_IS_COLOR: u16 = 0x8000;
const FLAG_COMPRESSED: u16 = 0x4000;
const FLAG_RELATIVE: u16 = 0x0800;
const FLAG_CLOSED: u16 = 0x0400;

/// Control point distance for a quarter ellipse.
const KAPPA: f64 = 0.552_284_75;

/// Baseline offset from the top of the layout rectangle, in em.
const ASCENT: f64 = 0.9;

type RectF = (f64, f64, f64, f64);

impl EmfPlusPlayer {
    /// Handle FILL_RECTS record
    pub(super) fn handle_fill_rects(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let brush_token = reader.read_u32()?;
        let count = reader.read_u32()? as usize;
        let rects = read_rects(&mut reader, count, flags & FLAG_COMPRESSED != 0)?;
        let Some(brush) = self.resolve_brush(flags, brush_token) else {
            return Ok(());
        };
        if self.dual_mode {
            return Ok(());
        }
        for rect in rects {
            let d = self.rect_data(rect, scaling);
            self.fill(out, &d, &brush);
        }
        Ok(())
    }

    /// Handle DRAW_RECTS record
    pub(super) fn handle_draw_rects(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let count = reader.read_u32()? as usize;
        let rects = read_rects(&mut reader, count, flags & FLAG_COMPRESSED != 0)?;
        let Some(pen) = self.pen(flags) else {
            return Ok(());
        };
        if self.dual_mode {
            return Ok(());
        }
        for rect in rects {
            let d = self.rect_data(rect, scaling);
            self.stroke(out, &d, &pen, scaling);
        }
        Ok(())
    }

    /// Handle FILL_POLYGON record
    pub(super) fn handle_fill_polygon(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let brush_token = reader.read_u32()?;
        let count = reader.read_u32()? as usize;
        let points = read_plus_points(
            &mut reader,
            count,
            flags & FLAG_COMPRESSED != 0,
            flags & FLAG_RELATIVE != 0,
        )?;
        let Some(brush) = self.resolve_brush(flags, brush_token) else {
            return Ok(());
        };
        if self.dual_mode || points.is_empty() {
            return Ok(());
        }
        let d = self.polyline_data(&points, true, scaling);
        self.fill(out, &d, &brush);
        Ok(())
    }

    /// Handle DRAW_LINES record
    pub(super) fn handle_draw_lines(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let count = reader.read_u32()? as usize;
        let points = read_plus_points(
            &mut reader,
            count,
            flags & FLAG_COMPRESSED != 0,
            flags & FLAG_RELATIVE != 0,
        )?;
        let Some(pen) = self.pen(flags) else {
            return Ok(());
        };
        if self.dual_mode || points.is_empty() {
            return Ok(());
        }
        let d = self.polyline_data(&points, flags & FLAG_CLOSED != 0, scaling);
        self.stroke(out, &d, &pen, scaling);
        Ok(())
    }

    /// Handle FILL_ELLIPSE record
    pub(super) fn handle_fill_ellipse(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let brush_token = reader.read_u32()?;
        let rect = read_rect(&mut reader, flags & FLAG_COMPRESSED != 0)?;
        let Some(brush) = self.resolve_brush(flags, brush_token) else {
            return Ok(());
        };
        if self.dual_mode {
            return Ok(());
        }
        let d = self.ellipse_data(rect, scaling);
        self.fill(out, &d, &brush);
        Ok(())
    }

    /// Handle DRAW_ELLIPSE record
    pub(super) fn handle_draw_ellipse(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let rect = read_rect(&mut reader, flags & FLAG_COMPRESSED != 0)?;
        let Some(pen) = self.pen(flags) else {
            return Ok(());
        };
        if self.dual_mode {
            return Ok(());
        }
        let d = self.ellipse_data(rect, scaling);
        self.stroke(out, &d, &pen, scaling);
        Ok(())
    }

    /// Handle FILL_PATH record
    pub(super) fn handle_fill_path(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let brush_token = RecordReader::new(payload).read_u32()?;
        let (Some(path), Some(brush)) = (self.path(flags), self.resolve_brush(flags, brush_token))
        else {
            return Ok(());
        };
        if self.dual_mode {
            return Ok(());
        }
        let d = self.path_data(&path, scaling);
        if !d.is_empty() {
            self.fill(out, &d, &brush);
        }
        Ok(())
    }

    /// Handle DRAW_PATH record
    pub(super) fn handle_draw_path(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let pen_id = RecordReader::new(payload).read_u32()?;
        let pen = match self.object((pen_id & 0xFF) as u8) {
            Some(PlusObject::Pen(pen)) => pen.clone(),
            _ => return Ok(()),
        };
        let Some(path) = self.path(flags) else {
            return Ok(());
        };
        if self.dual_mode {
            return Ok(());
        }
        let d = self.path_data(&path, scaling);
        if !d.is_empty() {
            self.stroke(out, &d, &pen, scaling);
        }
        Ok(())
    }

    /// Handle DRAW_BEZIERS record
    pub(super) fn handle_draw_beziers(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let count = reader.read_u32()? as usize;
        let points = read_plus_points(
            &mut reader,
            count,
            flags & FLAG_COMPRESSED != 0,
            flags & FLAG_RELATIVE != 0,
        )?;
        let Some(pen) = self.pen(flags) else {
            return Ok(());
        };
        if self.dual_mode || points.is_empty() {
            return Ok(());
        }
        let mut d = format!("M {}", self.point_text(points[0], scaling));
        for curve in points[1..].chunks_exact(3) {
            d.push_str("C ");
            for &p in curve {
                d.push_str(&self.point_text(p, scaling));
            }
        }
        self.stroke(out, d.trim_end(), &pen, scaling);
        Ok(())
    }

    /// Handle DRAW_STRING record
    pub(super) fn handle_draw_string(
        &mut self,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let brush_token = reader.read_u32()?;
        let _format_id = reader.read_u32()?;
        let length = reader.read_u32()? as usize;
        let rect = read_rect(&mut reader, false)?;
        let text = clean_text(reader.read_utf16(length)?.chars());

        let font = match self.object((flags & 0xFF) as u8) {
            Some(PlusObject::Font(font)) => font.clone(),
            _ => return Ok(()),
        };
        let Some(brush) = self.resolve_brush(flags, brush_token) else {
            return Ok(());
        };
        if self.dual_mode || text.is_empty() {
            return Ok(());
        }

        let size = self.device_length(font.em_size as f64, font.unit, scaling);
        let origin = self.device_point(rect.0, rect.1, scaling);
        let (color, opacity) = brush_to_color(&brush);

        out.open("text");
        out.attr_num("x", origin.x);
        out.attr_num("y", origin.y + size * ASCENT);
        if !font.family.is_empty() {
            out.attr("font-family", &font.family);
        }
        out.attr_num("font-size", size);
        out.attr("fill", &color);
        if opacity < 1.0 {
            out.attr_num("fill-opacity", opacity);
        }
        if font.style & FONT_STYLE_BOLD != 0 {
            out.attr("font-weight", "bold");
        }
        if font.style & FONT_STYLE_ITALIC != 0 {
            out.attr("font-style", "italic");
        }
        match (
            font.style & FONT_STYLE_UNDERLINE != 0,
            font.style & FONT_STYLE_STRIKEOUT != 0,
        ) {
            (true, true) => out.attr("text-decoration", "underline line-through"),
            (true, false) => out.attr("text-decoration", "underline"),
            (false, true) => out.attr("text-decoration", "line-through"),
            (false, false) => {}
        }
        out.attr("style", "white-space:pre;");
        out.trim_trailing_space();
        out.raw(">");
        out.raw(&cdata(&text));
        out.close("text");
        out.raw("\n");
        Ok(())
    }

    /// Brush from the record: a colour when flagged, an object id otherwise.
    fn resolve_brush(&self, flags: u16, token: u32) -> Option<Brush> {
        if flags & FLAG_BRUSH_IS_COLOR != 0 {
            return Some(Brush::SolidColor(token));
        }
        match self.object((token & 0xFF) as u8) {
            Some(PlusObject::Brush(brush)) => Some(brush.clone()),
            _ => None,
        }
    }

    /// Pen whose id is in the low byte of the flags.
    fn pen(&self, flags: u16) -> Option<Pen> {
        match self.object((flags & 0xFF) as u8) {
            Some(PlusObject::Pen(pen)) => Some(pen.clone()),
            _ => None,
        }
    }

    fn path(&self, flags: u16) -> Option<PlusPath> {
        match self.object((flags & 0xFF) as u8) {
            Some(PlusObject::Path(path)) => Some(path.clone()),
            _ => None,
        }
    }

    fn point_text(&self, (x, y): (f32, f32), scaling: f64) -> String {
        fmt_point(self.device_point(x as f64, y as f64, scaling))
    }

    fn rect_data(&self, (x, y, w, h): RectF, scaling: f64) -> String {
        let corners = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        let mut d = String::new();
        for (i, (cx, cy)) in corners.into_iter().enumerate() {
            d.push_str(if i == 0 { "M " } else { "L " });
            d.push_str(&fmt_point(self.device_point(cx, cy, scaling)));
        }
        d.push('Z');
        d
    }

    fn polyline_data(&self, points: &[(f32, f32)], closed: bool, scaling: f64) -> String {
        let mut d = String::new();
        for (i, &p) in points.iter().enumerate() {
            d.push_str(if i == 0 { "M " } else { "L " });
            d.push_str(&self.point_text(p, scaling));
        }
        if closed {
            d.push('Z');
        }
        d.trim_end().to_string()
    }

    /// Four cubic curves around the bounding rectangle.
    fn ellipse_data(&self, (x, y, w, h): RectF, scaling: f64) -> String {
        let (rx, ry) = (w / 2.0, h / 2.0);
        let (cx, cy) = (x + rx, y + ry);
        let (kx, ky) = (rx * KAPPA, ry * KAPPA);
        let p = |px: f64, py: f64| fmt_point(self.device_point(px, py, scaling));
        format!(
            "M {}C {}{}{}C {}{}{}C {}{}{}C {}{}{}Z",
            p(cx + rx, cy),
            p(cx + rx, cy + ky),
            p(cx + kx, cy + ry),
            p(cx, cy + ry),
            p(cx - kx, cy + ry),
            p(cx - rx, cy + ky),
            p(cx - rx, cy),
            p(cx - rx, cy - ky),
            p(cx - kx, cy - ry),
            p(cx, cy - ry),
            p(cx + kx, cy - ry),
            p(cx + rx, cy - ky),
            p(cx + rx, cy),
        )
    }

    /// Path data of a path object. Bezier points come in threes; a
    /// trailing incomplete curve is dropped.
    fn path_data(&self, path: &PlusPath, scaling: f64) -> String {
        let mut d = String::new();
        let mut pending: Vec<(f32, f32)> = Vec::with_capacity(3);
        for (&point, &point_type) in path.points.iter().zip(path.types.iter()) {
            match point_type & POINT_TYPE_MASK {
                POINT_TYPE_START => {
                    pending.clear();
                    d.push_str("M ");
                    d.push_str(&self.point_text(point, scaling));
                }
                POINT_TYPE_LINE => {
                    pending.clear();
                    d.push_str("L ");
                    d.push_str(&self.point_text(point, scaling));
                }
                POINT_TYPE_BEZIER => {
                    pending.push(point);
                    if pending.len() == 3 {
                        d.push_str("C ");
                        for &p in &pending {
                            d.push_str(&self.point_text(p, scaling));
                        }
                        pending.clear();
                    }
                }
                _ => continue,
            }
            if point_type & POINT_TYPE_CLOSE != 0 {
                d.push_str("Z ");
            }
        }
        d.trim_end().to_string()
    }

    fn fill(&self, out: &mut SvgWriter, d: &str, brush: &Brush) {
        let (color, opacity) = brush_to_color(brush);
        let mut path = out.element("path");
        set(&mut path, "d", d);
        set(&mut path, "fill", color);
        if opacity < 1.0 {
            set(&mut path, "fill-opacity", fmt_num(opacity));
        }
        set(&mut path, "stroke", "none");
        out.node(path);
    }

    fn stroke(&self, out: &mut SvgWriter, d: &str, pen: &Pen, scaling: f64) {
        let (color, opacity) = brush_to_color(&pen.brush);
        let width = self.device_length(pen.width as f64, pen.unit, scaling).max(1.0);
        let mut path = out.element("path");
        set(&mut path, "d", d);
        set(&mut path, "fill", "none");
        set(&mut path, "stroke", color);
        set(&mut path, "stroke-width", fmt_num(width));
        if opacity < 1.0 {
            set(&mut path, "stroke-opacity", fmt_num(opacity));
        }
        out.node(path);
    }
}

fn read_rect(reader: &mut RecordReader<'_>, compressed: bool) -> Result<RectF> {
    if compressed {
        Ok((
            reader.read_i16()? as f64,
            reader.read_i16()? as f64,
            reader.read_i16()? as f64,
            reader.read_i16()? as f64,
        ))
    } else {
        Ok((
            reader.read_f32()? as f64,
            reader.read_f32()? as f64,
            reader.read_f32()? as f64,
            reader.read_f32()? as f64,
        ))
    }
}

fn read_rects(reader: &mut RecordReader<'_>, count: usize, compressed: bool) -> Result<Vec<RectF>> {
    let width = if compressed { 8 } else { 16 };
    let total = count
        .checked_mul(width)
        .ok_or_else(|| ConvertError::bounds("rectangle count overflow"))?;
    reader.require(total)?;
    (0..count).map(|_| read_rect(reader, compressed)).collect()
}

#[cfg(test)]
mod tests {
    use super::super::{EMFPLUS_RECORD_FILL_RECTS, EMFPLUS_RECORD_HEADER, RECORD_HEADER_SIZE};
    use super::*;

    fn record(kind: u16, flags: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&((RECORD_HEADER_SIZE + payload.len()) as u32).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn fill_rect_payload() -> Vec<u8> {
        let mut payload = 0xFFFF_0000u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&1u32.to_le_bytes());
        for v in [1i16, 2, 10, 20] {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        payload
    }

    #[test]
    fn test_fill_rects_with_color() {
        let mut player = EmfPlusPlayer::new(false);
        let mut out = SvgWriter::new("");
        let data = record(EMFPLUS_RECORD_FILL_RECTS, 0x8000 | 0x4000, &fill_rect_payload());
        player.play(&data, &mut out, 1.0);
        let svg = out.finish();
        assert!(svg.contains("d=\"M 1,2 L 11,2 L 11,22 L 1,22 Z\""), "{}", svg);
        assert!(svg.contains("fill=\"#FF0000\""));
        assert!(svg.contains("stroke=\"none\""));
    }

    #[test]
    fn test_dual_mode_draws_nothing() {
        let mut player = EmfPlusPlayer::new(false);
        let mut out = SvgWriter::new("");
        let header = [0xDBC0_1002u32, 1, 96, 96]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect::<Vec<u8>>();
        let mut data = record(EMFPLUS_RECORD_HEADER, 0x0001, &header);
        data.extend(record(EMFPLUS_RECORD_FILL_RECTS, 0x8000 | 0x4000, &fill_rect_payload()));
        player.play(&data, &mut out, 1.0);
        assert!(player.dual_mode);
        assert!(out.is_empty());
    }

    #[test]
    fn test_path_data_with_bezier_and_close() {
        let player = EmfPlusPlayer::new(false);
        let path = PlusPath {
            points: vec![(0.0, 0.0), (1.0, 0.0), (2.0, 1.0), (2.0, 2.0), (0.0, 2.0)],
            types: vec![0x00, 0x03, 0x03, 0x03, 0x81],
        };
        assert_eq!(
            player.path_data(&path, 1.0),
            "M 0,0 C 1,0 2,1 2,2 L 0,2 Z"
        );
    }

    #[test]
    fn test_missing_brush_object_skips_fill() {
        let mut player = EmfPlusPlayer::new(false);
        let mut out = SvgWriter::new("");
        let mut payload = fill_rect_payload();
        payload[..4].copy_from_slice(&3u32.to_le_bytes());
        player.play(&record(EMFPLUS_RECORD_FILL_RECTS, 0x4000, &payload), &mut out, 1.0);
        assert!(out.is_empty());
    }
}
