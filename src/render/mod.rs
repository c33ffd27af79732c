//! Render pass
//!
//! Second walk over the records validated by [`crate::analysis`]. Each record
//! kind is dispatched through a lookup table to a handler; kinds without a
//! handler are no-ops. Handlers append SVG text in record order.
//!
//! A handler that fails with a bounds error raises the error flag and stops
//! the walk. Whatever was written so far is returned as a partial document.

mod bitmap;
mod clipping;
mod comment;
mod control;
mod drawing;
mod object;
mod path;
mod state;
mod style;
mod text;

pub(crate) use text::clean_text;

use log::{debug, info, warn};

use crate::analysis::{Analysis, PathEntry, MWT_IDENTITY, MWT_LEFTMULTIPLY, MWT_RIGHTMULTIPLY, MWT_SET};
use crate::bounds::slice_at;
use crate::clip::ClipService;
use crate::device_context::{DcStack, DeviceContext};
use crate::emf_records::*;
use crate::emfplus::EmfPlusPlayer;
use crate::error::{ConvertError, Result};
use crate::geometry::{PointD, PointL, XForm};
use crate::image_codec::ImageCodec;
use crate::image_library::ImageLibrary;
use crate::object_table::ObjectTable;
use crate::options::ConversionOptions;
use crate::path::{Path, Segment};
use crate::svg_writer::{fmt_num, SvgWriter};
use crate::transform::Page;
use crate::Conversion;

/// Record handler. Receives the whole record, header included.
pub(crate) type Handler = fn(&mut Renderer<'_>, &[u8]) -> Result<()>;

const TABLE_SIZE: usize = EMR_MAX as usize + 1;

/// Drawing state for one conversion call.
pub(crate) struct Renderer<'a> {
    data: &'a [u8],
    analysis: &'a Analysis,
    pub(crate) options: &'a ConversionOptions,
    pub(crate) clipper: &'a dyn ClipService,
    pub(crate) codec: &'a dyn ImageCodec,
    pub(crate) w: SvgWriter,
    /// Elements drawn while a path is open, written once it closes.
    held: SvgWriter,
    pub(crate) dc: DeviceContext,
    pub(crate) stack: DcStack,
    pub(crate) objects: ObjectTable,
    pub(crate) page: Page,
    pub(crate) images: ImageLibrary,
    pub(crate) emfplus: EmfPlusPlayer,
    /// Mirror of the path being built, in output units.
    pub(crate) path: Path,
    pub(crate) in_path: bool,
    /// Number of BEGINPATH records met so far.
    paths_opened: usize,
    /// Current position in logical units.
    pub(crate) cur: PointD,
    pub(crate) transform_open: bool,
    clip_counter: u32,
    pub(crate) text_layout: u32,
    error: bool,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(
        data: &'a [u8],
        analysis: &'a Analysis,
        options: &'a ConversionOptions,
        clipper: &'a dyn ClipService,
        codec: &'a dyn ImageCodec,
    ) -> Self {
        Self {
            data,
            analysis,
            options,
            clipper,
            codec,
            w: SvgWriter::new(options.prefix()),
            held: SvgWriter::new(options.prefix()),
            dc: DeviceContext::default(),
            stack: DcStack::new(),
            objects: ObjectTable::default(),
            page: Page::default(),
            images: ImageLibrary::new(),
            emfplus: EmfPlusPlayer::new(options.verbose),
            path: Path::new(),
            in_path: false,
            paths_opened: 0,
            cur: PointD::default(),
            transform_open: false,
            clip_counter: 0,
            text_layout: 0,
            error: false,
        }
    }

    /// Walk every record and return the SVG text.
    pub(crate) fn run(mut self) -> Result<Conversion> {
        let table = handler_table();
        let analysis = self.analysis;
        info!("rendering {} records", analysis.records.len());

        for record in &analysis.records {
            if self.options.verbose {
                debug!(
                    "{:>8} {:>3} {:<28} {:?}",
                    record.offset,
                    record.kind,
                    record_name(record.kind),
                    support(record.kind)
                );
            }
            let handler = table.get(record.kind as usize).copied().unwrap_or(noop as Handler);
            let result = slice_at(self.data, record.offset, record.size).and_then(|body| handler(&mut self, body));
            match result {
                Ok(()) => {}
                Err(ConvertError::Bounds(msg)) => {
                    warn!("{} at offset {}: {}", record_name(record.kind), record.offset, msg);
                    self.error = true;
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            "rendered {} bytes of svg, complete: {}",
            self.w.len(),
            !self.error
        );
        Ok(Conversion { svg: self.w.finish(), complete: !self.error })
    }

    /// Run `draw` against the side buffer while a path is open, so whole
    /// elements never land inside the unfinished `d` attribute.
    pub(crate) fn outside_path<T>(&mut self, draw: impl FnOnce(&mut Self) -> T) -> T {
        if !self.in_path {
            return draw(self);
        }
        std::mem::swap(&mut self.w, &mut self.held);
        let result = draw(self);
        std::mem::swap(&mut self.w, &mut self.held);
        result
    }

    /// Write out the elements held back while the path was open.
    pub(crate) fn release_held(&mut self) {
        if !self.held.is_empty() {
            let held = self.held.take();
            self.w.raw(&held);
        }
    }

    /// Record a non-fatal error: the flag is raised but the walk goes on.
    pub(crate) fn flag_error(&mut self, what: &str) {
        warn!("{}", what);
        self.error = true;
    }

    pub(crate) fn map(&self, x: f64, y: f64) -> PointD {
        self.dc.mapping.point(&self.page, x, y)
    }

    pub(crate) fn map_l(&self, p: PointL) -> PointD {
        self.dc.mapping.point_l(&self.page, p)
    }

    pub(crate) fn scale_x(&self, v: f64) -> f64 {
        self.dc.mapping.scale_x(&self.page, v)
    }

    pub(crate) fn scale_y(&self, v: f64) -> f64 {
        self.dc.mapping.scale_y(&self.page, v)
    }

    /// Write a logical point as path data and make it the current position.
    pub(crate) fn emit_point(&mut self, p: impl Into<PointD>) -> PointD {
        let p = p.into();
        let out = self.map(p.x, p.y);
        self.cur = p;
        self.w.point(out);
        out
    }

    /// Mirror a segment into the typed path while an explicit path is open.
    pub(crate) fn mirror(&mut self, segment: Segment) {
        if self.in_path {
            self.path.push(segment);
        }
    }

    /// `M p ` / `L p ` command for a logical point.
    pub(crate) fn move_to(&mut self, p: impl Into<PointD>) {
        self.w.raw("M ");
        let out = self.emit_point(p);
        self.mirror(Segment::move_to(out));
    }

    pub(crate) fn line_to(&mut self, p: impl Into<PointD>) {
        self.w.raw("L ");
        let out = self.emit_point(p);
        self.mirror(Segment::line_to(out));
    }

    pub(crate) fn close_figure(&mut self) {
        self.w.raw("Z ");
        self.mirror(Segment::close());
    }

    /// Open a standalone `<path d="` unless an explicit path is open.
    /// Returns true when a standalone element was opened.
    pub(crate) fn open_local_path(&mut self) -> bool {
        if self.in_path {
            return false;
        }
        self.w.open("path");
        self.clip_attr();
        self.w.raw("d=\"");
        true
    }

    /// Like [`Self::open_local_path`], starting at the current position.
    pub(crate) fn start_path(&mut self) -> bool {
        let local = self.open_local_path();
        if local {
            let cur = self.cur;
            self.move_to(cur);
        }
        local
    }

    /// Close a standalone line element: stroked, never filled.
    pub(crate) fn end_path(&mut self, local: bool) {
        if !local {
            return;
        }
        self.close_d();
        let stroked = self.stroke_attrs();
        if !stroked {
            self.w.attr("stroke", "none");
        }
        self.w.raw("fill=\"none\" />\n");
    }

    /// Close a standalone closed figure: stroked and filled.
    pub(crate) fn end_form(&mut self, local: bool) {
        if !local {
            return;
        }
        self.close_d();
        let stroked = self.stroke_attrs();
        let filled = self.fill_attrs();
        self.none_defaults(filled, stroked);
        self.w.raw("/>\n");
    }

    /// Terminate a `d` attribute.
    pub(crate) fn close_d(&mut self) {
        self.w.trim_trailing_space();
        self.w.raw("\" ");
    }

    pub(crate) fn none_defaults(&mut self, filled: bool, stroked: bool) {
        if !filled {
            self.w.attr("fill", "none");
        }
        if !stroked {
            self.w.attr("stroke", "none");
        }
    }

    /// Side-table entry of the most recently opened path.
    pub(crate) fn current_path_entry(&self) -> Result<&'a PathEntry> {
        let analysis = self.analysis;
        self.paths_opened
            .checked_sub(1)
            .and_then(|i| analysis.paths.get(i))
            .ok_or_else(|| ConvertError::bounds("path record without a matching BEGINPATH"))
    }

    pub(crate) fn next_path_entry(&mut self) -> Result<&'a PathEntry> {
        self.paths_opened += 1;
        self.current_path_entry()
    }

    pub(crate) fn next_clip_id(&mut self) -> u32 {
        self.clip_counter += 1;
        self.clip_counter
    }

    /// Apply a world transform change. Returns false for unknown modes.
    pub(crate) fn apply_transform(&mut self, xform: &XForm, mode: u32) -> bool {
        let current = self.dc.world_transform;
        self.dc.world_transform = match mode {
            MWT_IDENTITY => XForm::identity(),
            MWT_LEFTMULTIPLY => xform.then(&current),
            MWT_RIGHTMULTIPLY => current.then(xform),
            MWT_SET => *xform,
            _ => return false,
        };
        true
    }

    /// Emit the world transform as a `<g transform="matrix(...)">` wrapper,
    /// replacing any wrapper already open. Ignored while a path is open.
    pub(crate) fn transform_group(&mut self) {
        if self.in_path {
            return;
        }
        if self.transform_open {
            self.w.close("g");
            self.w.raw("\n");
        }
        let t = self.dc.world_transform;
        let (sx, sy) = self.dc.mapping.axis_factors(&self.page);
        // conjugate by the map mode scale so the matrix acts on output units
        let k = if sx != 0.0 { sy / sx } else { 1.0 };
        let (m12, m21) = if k != 0.0 { (t.m12 * k, t.m21 / k) } else { (t.m12, t.m21) };
        let matrix = format!(
            "matrix({} {} {} {} {} {})",
            fmt_num(t.m11),
            fmt_num(m12),
            fmt_num(m21),
            fmt_num(t.m22),
            fmt_num(t.dx * sx * self.page.scaling),
            fmt_num(t.dy * sy * self.page.scaling)
        );
        self.w.open("g");
        self.w.attr("transform", &matrix);
        self.w.trim_trailing_space();
        self.w.raw(">\n");
        self.transform_open = true;
    }
}

fn noop(_r: &mut Renderer<'_>, _rec: &[u8]) -> Result<()> {
    Ok(())
}

fn handler_table() -> [Handler; TABLE_SIZE] {
    let mut t: [Handler; TABLE_SIZE] = [noop as Handler; TABLE_SIZE];
    let mut set = |kind: u32, handler: Handler| t[kind as usize] = handler;

    set(EMR_HEADER, control::header);
    set(EMR_EOF, control::eof);

    set(EMR_POLYBEZIER, drawing::polybezier);
    set(EMR_POLYBEZIER16, drawing::polybezier);
    set(EMR_POLYBEZIERTO, drawing::polybezier_to);
    set(EMR_POLYBEZIERTO16, drawing::polybezier_to);
    set(EMR_POLYGON, drawing::polygon);
    set(EMR_POLYGON16, drawing::polygon);
    set(EMR_POLYLINE, drawing::polyline);
    set(EMR_POLYLINE16, drawing::polyline);
    set(EMR_POLYLINETO, drawing::polyline_to);
    set(EMR_POLYLINETO16, drawing::polyline_to);
    set(EMR_POLYPOLYGON, drawing::polypolygon);
    set(EMR_POLYPOLYGON16, drawing::polypolygon);
    set(EMR_POLYPOLYLINE, drawing::polypolyline);
    set(EMR_POLYPOLYLINE16, drawing::polypolyline);
    set(EMR_POLYDRAW, drawing::polydraw);
    set(EMR_POLYDRAW16, drawing::polydraw);
    set(EMR_LINETO, drawing::lineto);
    set(EMR_RECTANGLE, drawing::rectangle);
    set(EMR_ROUNDRECT, drawing::roundrect);
    set(EMR_ELLIPSE, drawing::ellipse);
    set(EMR_ARC, drawing::arc);
    set(EMR_ARCTO, drawing::arc_to);
    set(EMR_CHORD, drawing::chord);
    set(EMR_PIE, drawing::pie);
    set(EMR_ANGLEARC, drawing::angle_arc);

    set(EMR_BEGINPATH, path::begin);
    set(EMR_ENDPATH, path::end);
    set(EMR_CLOSEFIGURE, path::close_figure);
    set(EMR_ABORTPATH, path::abort);
    set(EMR_FLATTENPATH, path::flatten);

    set(EMR_SETMAPMODE, state::set_map_mode);
    set(EMR_SETBKMODE, state::set_bk_mode);
    set(EMR_SETPOLYFILLMODE, state::set_polyfill_mode);
    set(EMR_SETROP2, state::set_rop2);
    set(EMR_SETSTRETCHBLTMODE, state::set_stretch_mode);
    set(EMR_SETTEXTALIGN, state::set_text_align);
    set(EMR_SETTEXTCOLOR, state::set_text_color);
    set(EMR_SETBKCOLOR, state::set_bk_color);
    set(EMR_SETARCDIRECTION, state::set_arc_direction);
    set(EMR_SETMITERLIMIT, state::set_miter_limit);
    set(EMR_SETLAYOUT, state::set_layout);
    set(EMR_SETWINDOWEXTEX, state::set_window_ext);
    set(EMR_SETWINDOWORGEX, state::set_window_org);
    set(EMR_SETVIEWPORTEXTEX, state::set_viewport_ext);
    set(EMR_SETVIEWPORTORGEX, state::set_viewport_org);
    set(EMR_SCALEWINDOWEXTEX, state::scale_window_ext);
    set(EMR_SCALEVIEWPORTEXTEX, state::scale_viewport_ext);
    set(EMR_MOVETOEX, state::move_to);
    set(EMR_SAVEDC, state::save_dc);
    set(EMR_RESTOREDC, state::restore_dc);
    set(EMR_SETWORLDTRANSFORM, state::set_world_transform);
    set(EMR_MODIFYWORLDTRANSFORM, state::modify_world_transform);

    set(EMR_CREATEPEN, object::create_pen);
    set(EMR_EXTCREATEPEN, object::ext_create_pen);
    set(EMR_CREATEBRUSHINDIRECT, object::create_brush_indirect);
    set(EMR_CREATEMONOBRUSH, object::create_pattern_brush);
    set(EMR_CREATEDIBPATTERNBRUSHPT, object::create_pattern_brush);
    set(EMR_EXTCREATEFONTINDIRECTW, object::ext_create_font);
    set(EMR_SELECTOBJECT, object::select_object);
    set(EMR_DELETEOBJECT, object::delete_object);

    set(EMR_INTERSECTCLIPRECT, clipping::intersect_clip_rect);
    set(EMR_EXCLUDECLIPRECT, clipping::exclude_clip_rect);
    set(EMR_SELECTCLIPPATH, clipping::select_clip_path);
    set(EMR_OFFSETCLIPRGN, clipping::offset_clip_rgn);
    set(EMR_EXTSELECTCLIPRGN, clipping::ext_select_clip_rgn);

    set(EMR_BITBLT, bitmap::bitblt);
    set(EMR_STRETCHBLT, bitmap::stretchblt);
    set(EMR_STRETCHDIBITS, bitmap::stretchdibits);
    set(EMR_ALPHABLEND, bitmap::alphablend);

    set(EMR_EXTTEXTOUTA, text::ext_text_out_a);
    set(EMR_EXTTEXTOUTW, text::ext_text_out_w);
    set(EMR_SMALLTEXTOUT, text::small_text_out);

    set(EMR_COMMENT, comment::comment);
    t
}

/// True for the 16-bit point variants of the poly records.
pub(crate) fn is_short_points(kind: u32) -> bool {
    matches!(
        kind,
        EMR_POLYBEZIER16
            | EMR_POLYGON16
            | EMR_POLYLINE16
            | EMR_POLYBEZIERTO16
            | EMR_POLYLINETO16
            | EMR_POLYPOLYLINE16
            | EMR_POLYPOLYGON16
            | EMR_POLYDRAW16
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_kind() {
        let table = handler_table();
        assert_eq!(table.len(), EMR_MAX as usize + 1);
        assert!(table[EMR_RECTANGLE as usize] as usize != noop as Handler as usize);
        assert!(table[EMR_GLSRECORD as usize] as usize == noop as Handler as usize);
    }

    #[test]
    fn test_short_point_kinds() {
        assert!(is_short_points(EMR_POLYGON16));
        assert!(!is_short_points(EMR_POLYGON));
    }
}
