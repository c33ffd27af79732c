//! Typed path geometry
//!
//! While a path is open every drawing record mirrors its geometry here, in
//! output units. Clip regions are kept in the same form.

use smallvec::{smallvec, SmallVec};

use crate::geometry::PointD;
use crate::svg_writer::fmt_point;

/// Maximum bezier subdivision depth when flattening.
pub const MAX_FLATTEN_DEPTH: u32 = 10;

/// Flatness tolerance in output units.
const FLATNESS: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentKind {
    Move,
    Line,
    /// Elliptical arc: points are the radii and the end point.
    Arc { large: bool, sweep: bool },
    Bezier,
    /// Closes the current figure.
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub kind: SegmentKind,
    /// One point for move/line, two for arcs, three for beziers.
    pub points: SmallVec<[PointD; 3]>,
}

impl Segment {
    pub fn move_to(p: PointD) -> Self {
        Self { kind: SegmentKind::Move, points: smallvec![p] }
    }

    pub fn line_to(p: PointD) -> Self {
        Self { kind: SegmentKind::Line, points: smallvec![p] }
    }

    pub fn arc_to(radii: PointD, end: PointD, large: bool, sweep: bool) -> Self {
        Self { kind: SegmentKind::Arc { large, sweep }, points: smallvec![radii, end] }
    }

    pub fn bezier_to(c1: PointD, c2: PointD, end: PointD) -> Self {
        Self { kind: SegmentKind::Bezier, points: smallvec![c1, c2, end] }
    }

    pub fn close() -> Self {
        Self { kind: SegmentKind::End, points: SmallVec::new() }
    }

    /// Last point reached by this segment, if any.
    pub fn end_point(&self) -> Option<PointD> {
        match self.kind {
            SegmentKind::End => None,
            _ => self.points.last().copied(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed rectangle through four corners.
    pub fn rectangle(corners: [PointD; 4]) -> Self {
        let mut path = Path::new();
        path.push(Segment::move_to(corners[0]));
        for corner in &corners[1..] {
            path.push(Segment::line_to(*corner));
        }
        path.push(Segment::line_to(corners[0]));
        path.push(Segment::close());
        path
    }

    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    /// Translate every point of every segment. Arc radii are left alone.
    pub fn offset(&mut self, by: PointD) {
        for seg in &mut self.segments {
            match seg.kind {
                SegmentKind::Arc { .. } => {
                    if let Some(end) = seg.points.get_mut(1) {
                        *end = end.offset(by);
                    }
                }
                _ => {
                    for p in &mut seg.points {
                        *p = p.offset(by);
                    }
                }
            }
        }
    }

    /// SVG path data for this path.
    pub fn to_svg_data(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg.kind {
                SegmentKind::Move => {
                    out.push_str("M ");
                    out.push_str(&fmt_point(seg.points[0]));
                }
                SegmentKind::Line => {
                    out.push_str("L ");
                    out.push_str(&fmt_point(seg.points[0]));
                }
                SegmentKind::Arc { large, sweep } => {
                    out.push_str("A ");
                    out.push_str(&fmt_point(seg.points[0]));
                    out.push_str(&format!("0 {} {} ", large as u8, sweep as u8));
                    out.push_str(&fmt_point(seg.points[1]));
                }
                SegmentKind::Bezier => {
                    out.push_str("C ");
                    for p in &seg.points {
                        out.push_str(&fmt_point(*p));
                    }
                }
                SegmentKind::End => out.push_str("Z "),
            }
        }
        out
    }

    /// Replace bezier segments by line runs.
    ///
    /// Subdivision uses an explicit work list and stops at
    /// [`MAX_FLATTEN_DEPTH`], so hostile control points cannot blow the stack.
    pub fn flatten(&self) -> Path {
        let mut out = Path::new();
        let mut current = PointD::default();
        let mut figure_start = PointD::default();
        for seg in &self.segments {
            match seg.kind {
                SegmentKind::Bezier => {
                    for p in flatten_bezier(current, seg.points[0], seg.points[1], seg.points[2]) {
                        out.push(Segment::line_to(p));
                    }
                    current = seg.points[2];
                }
                SegmentKind::Move => {
                    current = seg.points[0];
                    figure_start = current;
                    out.push(seg.clone());
                }
                SegmentKind::End => {
                    current = figure_start;
                    out.push(seg.clone());
                }
                _ => {
                    if let Some(end) = seg.end_point() {
                        current = end;
                    }
                    out.push(seg.clone());
                }
            }
        }
        out
    }
}

/// Points along a cubic bezier, excluding `p0`, ending at `p3`.
pub fn flatten_bezier(p0: PointD, p1: PointD, p2: PointD, p3: PointD) -> Vec<PointD> {
    let mut out = Vec::new();
    // Work list of (curve, depth); pushed in reverse so curves pop in order.
    let mut stack = vec![([p0, p1, p2, p3], 0u32)];
    while let Some((c, depth)) = stack.pop() {
        if depth >= MAX_FLATTEN_DEPTH || is_flat(&c) {
            out.push(c[3]);
            continue;
        }
        let (left, right) = split(&c);
        stack.push((right, depth + 1));
        stack.push((left, depth + 1));
    }
    out
}

fn is_flat(c: &[PointD; 4]) -> bool {
    let d1 = distance_to_line(c[1], c[0], c[3]);
    let d2 = distance_to_line(c[2], c[0], c[3]);
    d1.max(d2) <= FLATNESS
}

fn distance_to_line(p: PointD, a: PointD, b: PointD) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

fn mid(a: PointD, b: PointD) -> PointD {
    PointD::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

fn split(c: &[PointD; 4]) -> ([PointD; 4], [PointD; 4]) {
    let ab = mid(c[0], c[1]);
    let bc = mid(c[1], c[2]);
    let cd = mid(c[2], c[3]);
    let abc = mid(ab, bc);
    let bcd = mid(bc, cd);
    let m = mid(abc, bcd);
    ([c[0], ab, abc, m], [m, bcd, cd, c[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> PointD {
        PointD::new(x, y)
    }

    #[test]
    fn test_rectangle_svg_data() {
        let path = Path::rectangle([p(0.0, 0.0), p(10.0, 0.0), p(10.0, 5.0), p(0.0, 5.0)]);
        assert_eq!(path.to_svg_data(), "M 0,0 L 10,0 L 10,5 L 0,5 L 0,0 Z ");
    }

    #[test]
    fn test_offset_moves_all_points() {
        let mut path = Path::new();
        path.push(Segment::move_to(p(0.0, 0.0)));
        path.push(Segment::bezier_to(p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)));
        path.push(Segment::arc_to(p(5.0, 5.0), p(4.0, 4.0), false, true));
        path.offset(p(1.0, -1.0));
        let segs = path.segments();
        assert_eq!(segs[0].points[0], p(1.0, -1.0));
        assert_eq!(segs[1].points.as_slice(), &[p(2.0, 0.0), p(3.0, 1.0), p(4.0, 2.0)]);
        assert_eq!(segs[2].points.as_slice(), &[p(5.0, 5.0), p(5.0, 3.0)]);
    }

    #[test]
    fn test_flatten_straight_bezier_is_single_line() {
        let pts = flatten_bezier(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0));
        assert_eq!(pts, vec![p(3.0, 0.0)]);
    }

    #[test]
    fn test_flatten_is_bounded() {
        let far = p(1e12, -1e12);
        let pts = flatten_bezier(p(0.0, 0.0), far, p(-1e12, 1e12), p(1.0, 1.0));
        assert!(pts.len() <= 1 << MAX_FLATTEN_DEPTH);
        assert_eq!(*pts.last().unwrap(), p(1.0, 1.0));
    }

    #[test]
    fn test_flatten_path_removes_beziers() {
        let mut path = Path::new();
        path.push(Segment::move_to(p(0.0, 0.0)));
        path.push(Segment::bezier_to(p(0.0, 10.0), p(10.0, 10.0), p(10.0, 0.0)));
        path.push(Segment::close());
        let flat = path.flatten();
        assert!(flat.segments().iter().all(|s| s.kind != SegmentKind::Bezier));
        assert!(flat.segments().len() > 3);
        assert_eq!(flat.segments().last().unwrap().kind, SegmentKind::End);
    }
}
