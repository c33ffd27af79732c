//! Clipping records
//!
//! Every new region is emitted once as `<clipPath id="clip-N">` and later
//! elements reference it by id.

use log::debug;

use super::Renderer;
use crate::bounds::RecordReader;
use crate::clip::{mix, RegionOp};
use crate::device_context::ClipRegion;
use crate::error::Result;
use crate::geometry::{PointD, RectL};
use crate::path::Path;
use crate::svg_writer::set;

/// RGNDATA: header at 16, nCount at 24, rectangles from 48.
const RGNDATA_COUNT_OFFSET: usize = 24;
const RGNDATA_RECTS_OFFSET: usize = 48;

pub(crate) fn intersect_clip_rect(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let rect = RecordReader::at(rec, 8)?.read_rect_l()?;
    let region = r.logical_rect(&rect);
    r.combine_clip(&region, RegionOp::And);
    Ok(())
}

pub(crate) fn exclude_clip_rect(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let rect = RecordReader::at(rec, 8)?.read_rect_l()?;
    let region = r.logical_rect(&rect);
    r.combine_clip(&region, RegionOp::Diff);
    Ok(())
}

pub(crate) fn select_clip_path(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mode = RecordReader::at(rec, 8)?.read_u32()?;
    let op = RegionOp::from_u32(mode).unwrap_or(RegionOp::Copy);
    let region = r.path.clone();
    r.combine_clip(&region, op);
    Ok(())
}

pub(crate) fn offset_clip_rgn(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let off = RecordReader::at(rec, 8)?.read_point_l()?;
    let Some(clip) = r.dc.clip.clone() else {
        return Ok(());
    };
    let origin = r.map(0.0, 0.0);
    let moved = r.map_l(off);
    let mut region = clip.path;
    region.offset(PointD::new(moved.x - origin.x, moved.y - origin.y));
    r.set_clip(region);
    Ok(())
}

/// Region rectangles are in device units: only the page scale applies.
pub(crate) fn ext_select_clip_rgn(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let _cb_rgn_data = reader.read_u32()?;
    let mode = reader.read_u32()?;
    let op = RegionOp::from_u32(mode).unwrap_or(RegionOp::Copy);
    if op == RegionOp::Copy {
        debug!("clip reset");
        r.dc.clip = None;
        return Ok(());
    }

    reader.seek(RGNDATA_COUNT_OFFSET)?;
    let count = reader.read_u32()? as usize;
    reader.seek(RGNDATA_RECTS_OFFSET)?;
    reader.require(count.saturating_mul(16))?;
    let s = r.page.scaling;
    let mut region = Path::new();
    for _ in 0..count {
        let rect = reader.read_rect_l()?;
        let (l, t) = (rect.left as f64 * s, rect.top as f64 * s);
        let (rt, b) = (rect.right as f64 * s, rect.bottom as f64 * s);
        let piece = Path::rectangle([
            PointD::new(l, t),
            PointD::new(rt, t),
            PointD::new(rt, b),
            PointD::new(l, b),
        ]);
        for seg in piece.segments() {
            region.push(seg.clone());
        }
    }
    r.combine_clip(&region, op);
    Ok(())
}

impl Renderer<'_> {
    /// Rectangle path through the mapped corners of a logical box.
    fn logical_rect(&self, rect: &RectL) -> Path {
        let (l, t, rt, b) = (rect.left as f64, rect.top as f64, rect.right as f64, rect.bottom as f64);
        Path::rectangle([self.map(l, t), self.map(rt, t), self.map(rt, b), self.map(l, b)])
    }

    fn combine_clip(&mut self, incoming: &Path, op: RegionOp) {
        let current = self.dc.clip.as_ref().map(|c| &c.path);
        let combined = mix(self.clipper, current, incoming, op);
        self.set_clip(combined);
    }

    /// Install a clip region. Outside a path it is emitted under a fresh
    /// id; inside one no definition can be written and the id stays 0.
    fn set_clip(&mut self, region: Path) {
        if self.in_path {
            self.dc.clip = Some(ClipRegion { path: region, id: 0 });
            return;
        }
        let id = self.next_clip_id();
        let data = region.to_svg_data();

        let mut shape = self.w.element("path");
        set(&mut shape, "d", data.trim_end());
        let mut clip_path = self.w.element("clipPath");
        set(&mut clip_path, "id", format!("clip-{}", id));
        svg::Node::append(&mut clip_path, shape);
        self.w.defs(clip_path);

        self.dc.clip = Some(ClipRegion { path: region, id });
    }
}
