//! Drawing records: lines, polygons, beziers, shapes and arcs
//!
//! Outside an explicit path each record writes one self-contained element.
//! Inside a path the geometry is appended to the open `d` attribute.

use std::f64::consts::PI;

use super::{is_short_points, Renderer};
use crate::bounds::RecordReader;
use crate::error::{ConvertError, Result};
use crate::geometry::{PointD, PointL, RectL};
use crate::path::Segment;

// POLYDRAW point types
const PT_CLOSEFIGURE: u8 = 0x01;
const PT_LINETO: u8 = 0x02;
const PT_BEZIERTO: u8 = 0x04;
const PT_MOVETO: u8 = 0x06;

/// Points of a single-poly record: bounds, count, points.
fn read_poly(rec: &[u8]) -> Result<Vec<PointL>> {
    let mut reader = RecordReader::new(rec);
    let kind = reader.read_u32()?;
    reader.seek(24)?;
    let count = reader.read_u32()? as usize;
    reader.read_points(count, is_short_points(kind))
}

/// Point groups of a POLYPOLY record.
fn read_polypoly(rec: &[u8]) -> Result<Vec<Vec<PointL>>> {
    let mut reader = RecordReader::new(rec);
    let kind = reader.read_u32()?;
    reader.seek(24)?;
    let polys = reader.read_u32()? as usize;
    let total = reader.read_u32()? as usize;
    reader.require(polys.saturating_mul(4))?;
    let mut counts = Vec::with_capacity(polys);
    for _ in 0..polys {
        counts.push(reader.read_u32()? as usize);
    }
    let sum = counts.iter().try_fold(0usize, |acc, c| acc.checked_add(*c));
    if sum.map_or(true, |s| s > total) {
        return Err(ConvertError::bounds("polygon counts exceed the point count"));
    }
    let mut points = reader.read_points(total, is_short_points(kind))?.into_iter();
    Ok(counts.iter().map(|&n| points.by_ref().take(n).collect()).collect())
}

fn read_box(rec: &[u8]) -> Result<RectL> {
    RecordReader::at(rec, 8)?.read_rect_l()
}

pub(crate) fn polybezier(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let points = read_poly(rec)?;
    let Some((first, rest)) = points.split_first() else {
        return Ok(());
    };
    let local = r.open_local_path();
    r.move_to(*first);
    r.beziers(rest);
    r.end_path(local);
    Ok(())
}

pub(crate) fn polybezier_to(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let points = read_poly(rec)?;
    let local = r.start_path();
    r.beziers(&points);
    r.end_path(local);
    Ok(())
}

pub(crate) fn polygon(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let points = read_poly(rec)?;
    if points.is_empty() {
        return Ok(());
    }
    let local = r.open_local_path();
    r.figure(&points, true);
    r.end_form(local);
    Ok(())
}

pub(crate) fn polyline(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let points = read_poly(rec)?;
    if points.is_empty() {
        return Ok(());
    }
    let local = r.open_local_path();
    r.figure(&points, false);
    r.end_path(local);
    Ok(())
}

pub(crate) fn polyline_to(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let points = read_poly(rec)?;
    let local = r.start_path();
    for p in points {
        r.line_to(p);
    }
    r.end_path(local);
    Ok(())
}

pub(crate) fn polypolygon(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let polys = read_polypoly(rec)?;
    let local = r.open_local_path();
    for poly in polys.iter().filter(|p| !p.is_empty()) {
        r.figure(poly, true);
    }
    r.end_form(local);
    Ok(())
}

pub(crate) fn polypolyline(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let polys = read_polypoly(rec)?;
    let local = r.open_local_path();
    for poly in polys.iter().filter(|p| !p.is_empty()) {
        r.figure(poly, false);
    }
    r.end_path(local);
    Ok(())
}

pub(crate) fn polydraw(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::new(rec);
    let kind = reader.read_u32()?;
    reader.seek(24)?;
    let count = reader.read_u32()? as usize;
    let points = reader.read_points(count, is_short_points(kind))?;
    let types = reader.read_bytes(count)?;

    let local = r.open_local_path();
    if types.first().map_or(true, |t| t & !PT_CLOSEFIGURE != PT_MOVETO) {
        let cur = r.cur;
        r.move_to(cur);
    }
    let mut i = 0;
    while i < count {
        let kind = types[i] & !PT_CLOSEFIGURE;
        match kind {
            PT_MOVETO => r.move_to(points[i]),
            PT_BEZIERTO if i + 2 < count => {
                r.beziers(&points[i..i + 3]);
                i += 2;
            }
            PT_LINETO | PT_BEZIERTO => r.line_to(points[i]),
            _ => {}
        }
        if types[i] & PT_CLOSEFIGURE != 0 {
            r.close_figure();
        }
        i += 1;
    }
    r.end_path(local);
    Ok(())
}

pub(crate) fn lineto(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let p = RecordReader::at(rec, 8)?.read_point_l()?;
    let local = r.start_path();
    r.line_to(p);
    r.end_path(local);
    Ok(())
}

pub(crate) fn rectangle(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let b = read_box(rec)?;
    if r.in_path {
        let (l, t, rt, bt) = (b.left as f64, b.top as f64, b.right as f64, b.bottom as f64);
        r.move_to(PointD::new(l, t));
        r.line_to(PointD::new(rt, t));
        r.line_to(PointD::new(rt, bt));
        r.line_to(PointD::new(l, bt));
        r.close_figure();
        return Ok(());
    }
    r.rect_element(&b, None);
    Ok(())
}

pub(crate) fn roundrect(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let b = reader.read_rect_l()?;
    let corner = reader.read_point_l()?;
    let (rx, ry) = (corner.x as f64 / 2.0, corner.y as f64 / 2.0);
    if r.in_path {
        let (l, t) = (b.left.min(b.right) as f64, b.top.min(b.bottom) as f64);
        let (rt, bt) = (b.left.max(b.right) as f64, b.top.max(b.bottom) as f64);
        let (rx, ry) = (rx.abs().min((rt - l) / 2.0), ry.abs().min((bt - t) / 2.0));
        let radii = PointD::new(r.scale_x(rx), r.scale_y(ry));
        let sweep = r.dc.mapping.y_direction(&r.page) > 0.0;
        r.move_to(PointD::new(l + rx, t));
        r.line_to(PointD::new(rt - rx, t));
        r.arc_to(radii, PointD::new(rt, t + ry), false, sweep);
        r.line_to(PointD::new(rt, bt - ry));
        r.arc_to(radii, PointD::new(rt - rx, bt), false, sweep);
        r.line_to(PointD::new(l + rx, bt));
        r.arc_to(radii, PointD::new(l, bt - ry), false, sweep);
        r.line_to(PointD::new(l, t + ry));
        r.arc_to(radii, PointD::new(l + rx, t), false, sweep);
        r.close_figure();
        return Ok(());
    }
    let radii = (r.scale_x(rx.abs()), r.scale_y(ry.abs()));
    r.rect_element(&b, Some(radii));
    Ok(())
}

pub(crate) fn ellipse(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let b = read_box(rec)?;
    let (cx, cy) = b.center();
    let (rx, ry) = (b.width().abs() / 2.0, b.height().abs() / 2.0);
    if r.in_path {
        let radii = PointD::new(r.scale_x(rx), r.scale_y(ry));
        r.move_to(PointD::new(cx - rx, cy));
        r.arc_to(radii, PointD::new(cx + rx, cy), false, true);
        r.arc_to(radii, PointD::new(cx - rx, cy), false, true);
        r.close_figure();
        return Ok(());
    }
    let center = r.map(cx, cy);
    let (rx, ry) = (r.scale_x(rx), r.scale_y(ry));
    r.w.open("ellipse");
    r.clip_attr();
    r.w.attr_num("cx", center.x);
    r.w.attr_num("cy", center.y);
    r.w.attr_num("rx", rx);
    r.w.attr_num("ry", ry);
    r.close_shape();
    Ok(())
}

/// Box, start radial and end radial shared by the arc records.
struct ArcSpec {
    center: PointD,
    rx: f64,
    ry: f64,
    start: PointD,
    end: PointD,
}

fn read_arc(rec: &[u8]) -> Result<ArcSpec> {
    let mut reader = RecordReader::at(rec, 8)?;
    let b = reader.read_rect_l()?;
    let start = reader.read_point_l()?;
    let end = reader.read_point_l()?;
    let (cx, cy) = b.center();
    let center = PointD::new(cx, cy);
    let (rx, ry) = (b.width().abs() / 2.0, b.height().abs() / 2.0);
    Ok(ArcSpec {
        center,
        rx,
        ry,
        start: int_el_rad(start.into(), center, rx, ry),
        end: int_el_rad(end.into(), center, rx, ry),
    })
}

/// Intersection of the ray from `center` through `radial` with the ellipse.
pub(crate) fn int_el_rad(radial: PointD, center: PointD, rx: f64, ry: f64) -> PointD {
    let (dx, dy) = (radial.x - center.x, radial.y - center.y);
    if rx == 0.0 || ry == 0.0 {
        return center;
    }
    let norm = ((dx / rx).powi(2) + (dy / ry).powi(2)).sqrt();
    if norm == 0.0 {
        return PointD::new(center.x + rx, center.y);
    }
    PointD::new(center.x + dx / norm, center.y + dy / norm)
}

/// Screen-space angle of `p` around `center`, counter-clockwise positive.
fn angle(center: PointD, p: PointD) -> f64 {
    (center.y - p.y).atan2(p.x - center.x)
}

pub(crate) fn arc(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let spec = read_arc(rec)?;
    let local = r.open_local_path();
    r.move_to(spec.start);
    r.arc_segment(&spec);
    r.end_path(local);
    Ok(())
}

pub(crate) fn arc_to(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let spec = read_arc(rec)?;
    let local = r.start_path();
    r.line_to(spec.start);
    r.arc_segment(&spec);
    r.end_path(local);
    Ok(())
}

pub(crate) fn chord(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let spec = read_arc(rec)?;
    let local = r.open_local_path();
    r.move_to(spec.start);
    r.arc_segment(&spec);
    r.close_figure();
    r.end_form(local);
    Ok(())
}

pub(crate) fn pie(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let spec = read_arc(rec)?;
    let local = r.open_local_path();
    r.move_to(spec.start);
    r.arc_segment(&spec);
    r.line_to(spec.center);
    r.close_figure();
    r.end_form(local);
    Ok(())
}

/// Line from the current position to the arc start, then a circular arc.
pub(crate) fn angle_arc(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let c = reader.read_point_l()?;
    let radius = reader.read_u32()? as f64;
    let start_angle = (reader.read_f32()? as f64).to_radians();
    let sweep_angle = reader.read_f32()? as f64;
    let center = PointD::from(c);
    let on_circle = |a: f64| PointD::new(center.x + radius * a.cos(), center.y - radius * a.sin());
    let start = on_circle(start_angle);
    let end = on_circle(start_angle + sweep_angle.to_radians());

    let radii = PointD::new(r.scale_x(radius), r.scale_y(radius));
    let flip = r.dc.mapping.y_direction(&r.page) < 0.0;
    let sweep = (sweep_angle < 0.0) != flip;

    let local = r.start_path();
    r.line_to(start);
    if sweep_angle.abs() >= 360.0 {
        let opposite = PointD::new(2.0 * center.x - start.x, 2.0 * center.y - start.y);
        r.arc_to(radii, opposite, true, sweep);
        r.arc_to(radii, start, true, sweep);
    } else {
        r.arc_to(radii, end, sweep_angle.abs() > 180.0, sweep);
    }
    r.end_path(local);
    Ok(())
}

impl Renderer<'_> {
    /// `M p0 L p1 ... [Z]`
    fn figure(&mut self, points: &[PointL], closed: bool) {
        let Some((first, rest)) = points.split_first() else {
            return;
        };
        self.move_to(*first);
        for p in rest {
            self.line_to(*p);
        }
        if closed {
            self.close_figure();
        }
    }

    /// Cubic segments from groups of three points; a trailing partial
    /// group is dropped.
    fn beziers(&mut self, points: &[PointL]) {
        for group in points.chunks_exact(3) {
            self.w.raw("C ");
            let c1 = self.emit_point(group[0]);
            let c2 = self.emit_point(group[1]);
            let end = self.emit_point(group[2]);
            self.mirror(Segment::bezier_to(c1, c2, end));
        }
    }

    /// `A rx,ry 0 large sweep end` to a logical end point.
    fn arc_to(&mut self, radii: PointD, end: PointD, large: bool, sweep: bool) {
        self.w.raw("A ");
        self.w.point(radii);
        self.w.raw(&format!("0 {} {} ", large as u8, sweep as u8));
        let out = self.emit_point(end);
        self.mirror(Segment::arc_to(radii, out, large, sweep));
    }

    /// Elliptical arc from `spec.start` to `spec.end` in the current arc
    /// direction. Equal end points draw the whole ellipse.
    fn arc_segment(&mut self, spec: &ArcSpec) {
        let radii = PointD::new(self.scale_x(spec.rx), self.scale_y(spec.ry));
        let clockwise = self.dc.arc_direction > 0;
        let flip = self.dc.mapping.y_direction(&self.page) < 0.0;
        let sweep = clockwise != flip;

        if spec.start == spec.end {
            let opposite = PointD::new(
                2.0 * spec.center.x - spec.start.x,
                2.0 * spec.center.y - spec.start.y,
            );
            self.arc_to(radii, opposite, true, sweep);
            self.arc_to(radii, spec.end, true, sweep);
            return;
        }

        let (a0, a1) = (angle(spec.center, spec.start), angle(spec.center, spec.end));
        let span = if clockwise { a0 - a1 } else { a1 - a0 };
        let span = span.rem_euclid(2.0 * PI);
        self.arc_to(radii, spec.end, span > PI, sweep);
    }

    /// `<rect>` for a logical box, normalized to a positive size.
    fn rect_element(&mut self, b: &RectL, radii: Option<(f64, f64)>) {
        let p1 = self.map(b.left as f64, b.top as f64);
        let p2 = self.map(b.right as f64, b.bottom as f64);
        self.w.open("rect");
        self.clip_attr();
        self.w.attr_num("x", p1.x.min(p2.x));
        self.w.attr_num("y", p1.y.min(p2.y));
        self.w.attr_num("width", (p2.x - p1.x).abs());
        self.w.attr_num("height", (p2.y - p1.y).abs());
        if let Some((rx, ry)) = radii {
            self.w.attr_num("rx", rx);
            self.w.attr_num("ry", ry);
        }
        self.close_shape();
    }

    /// Stroke, fill and `/>` of an immediate shape element.
    fn close_shape(&mut self) {
        let stroked = self.stroke_attrs();
        let filled = self.fill_attrs();
        self.none_defaults(filled, stroked);
        self.w.raw("/>\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_el_rad_projects_onto_ellipse() {
        let c = PointD::new(0.0, 0.0);
        assert_eq!(int_el_rad(PointD::new(100.0, 0.0), c, 10.0, 5.0), PointD::new(10.0, 0.0));
        assert_eq!(int_el_rad(PointD::new(0.0, -3.0), c, 10.0, 5.0), PointD::new(0.0, -5.0));
    }

    #[test]
    fn test_int_el_rad_degenerate_radial() {
        let c = PointD::new(4.0, 4.0);
        assert_eq!(int_el_rad(c, c, 2.0, 2.0), PointD::new(6.0, 4.0));
    }

    #[test]
    fn test_angle_is_counter_clockwise_on_screen() {
        let c = PointD::new(0.0, 0.0);
        assert!((angle(c, PointD::new(0.0, -1.0)) - PI / 2.0).abs() < 1e-9);
    }
}
