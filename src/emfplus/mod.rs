//! EMF+ player for records embedded in EMF COMMENT records
//!
//! Each comment carries a run of EMF+ records. State (object table, world
//! and page transform, save stack) lives across comments for the whole
//! conversion. Objects may be split across several comments; the pieces
//! are gathered by [`ObjectAccumulator`] before being interpreted.

mod accumulator;
mod draw;
mod objects;

pub use accumulator::ObjectAccumulator;
pub use objects::{brush_to_color, parse_object, Brush, Pen, PlusFont, PlusObject, PlusPath};

use log::{debug, warn};

use crate::bounds::{slice_at, RecordReader};
use crate::emf_records::Support;
use crate::error::Result;
use crate::geometry::{PointD, XForm};
use crate::svg_writer::SvgWriter;

const OBJECT_TABLE_SIZE: usize = 256;

/// Type, flags, size and data size.
pub const RECORD_HEADER_SIZE: usize = 12;

// EMF+ Record Types
pub const EMFPLUS_RECORD_HEADER: u16 = 0x4001;
pub const EMFPLUS_RECORD_END_OF_FILE: u16 = 0x4002;
pub const EMFPLUS_RECORD_COMMENT: u16 = 0x4003;
pub const EMFPLUS_RECORD_GET_DC: u16 = 0x4004;
pub const EMFPLUS_RECORD_MULTI_FORMAT_START: u16 = 0x4005;
pub const EMFPLUS_RECORD_MULTI_FORMAT_SECTION: u16 = 0x4006;
pub const EMFPLUS_RECORD_MULTI_FORMAT_END: u16 = 0x4007;
pub const EMFPLUS_RECORD_OBJECT: u16 = 0x4008;
pub const EMFPLUS_RECORD_CLEAR: u16 = 0x4009;
pub const EMFPLUS_RECORD_FILL_RECTS: u16 = 0x400A;
pub const EMFPLUS_RECORD_DRAW_RECTS: u16 = 0x400B;
pub const EMFPLUS_RECORD_FILL_POLYGON: u16 = 0x400C;
pub const EMFPLUS_RECORD_DRAW_LINES: u16 = 0x400D;
pub const EMFPLUS_RECORD_FILL_ELLIPSE: u16 = 0x400E;
pub const EMFPLUS_RECORD_DRAW_ELLIPSE: u16 = 0x400F;
pub const EMFPLUS_RECORD_FILL_PIE: u16 = 0x4010;
pub const EMFPLUS_RECORD_DRAW_PIE: u16 = 0x4011;
pub const EMFPLUS_RECORD_DRAW_ARC: u16 = 0x4012;
pub const EMFPLUS_RECORD_FILL_REGION: u16 = 0x4013;
pub const EMFPLUS_RECORD_FILL_PATH: u16 = 0x4014;
pub const EMFPLUS_RECORD_DRAW_PATH: u16 = 0x4015;
pub const EMFPLUS_RECORD_FILL_CLOSED_CURVE: u16 = 0x4016;
pub const EMFPLUS_RECORD_DRAW_CLOSED_CURVE: u16 = 0x4017;
pub const EMFPLUS_RECORD_DRAW_CURVE: u16 = 0x4018;
pub const EMFPLUS_RECORD_DRAW_BEZIERS: u16 = 0x4019;
pub const EMFPLUS_RECORD_DRAW_IMAGE: u16 = 0x401A;
pub const EMFPLUS_RECORD_DRAW_IMAGE_POINTS: u16 = 0x401B;
pub const EMFPLUS_RECORD_DRAW_STRING: u16 = 0x401C;
pub const EMFPLUS_RECORD_SET_RENDERING_ORIGIN: u16 = 0x401D;
pub const EMFPLUS_RECORD_SET_ANTI_ALIAS_MODE: u16 = 0x401E;
pub const EMFPLUS_RECORD_SET_TEXT_RENDERING_HINT: u16 = 0x401F;
pub const EMFPLUS_RECORD_SET_TEXT_CONTRAST: u16 = 0x4020;
pub const EMFPLUS_RECORD_SET_INTERPOLATION_MODE: u16 = 0x4021;
pub const EMFPLUS_RECORD_SET_PIXEL_OFFSET_MODE: u16 = 0x4022;
pub const EMFPLUS_RECORD_SET_COMPOSITING_MODE: u16 = 0x4023;
pub const EMFPLUS_RECORD_SET_COMPOSITING_QUALITY: u16 = 0x4024;
pub const EMFPLUS_RECORD_SAVE: u16 = 0x4025;
pub const EMFPLUS_RECORD_RESTORE: u16 = 0x4026;
pub const EMFPLUS_RECORD_BEGIN_CONTAINER: u16 = 0x4027;
pub const EMFPLUS_RECORD_BEGIN_CONTAINER_NO_PARAMS: u16 = 0x4028;
pub const EMFPLUS_RECORD_END_CONTAINER: u16 = 0x4029;
pub const EMFPLUS_RECORD_SET_WORLD_TRANSFORM: u16 = 0x402A;
pub const EMFPLUS_RECORD_RESET_WORLD_TRANSFORM: u16 = 0x402B;
pub const EMFPLUS_RECORD_MULTIPLY_WORLD_TRANSFORM: u16 = 0x402C;
pub const EMFPLUS_RECORD_TRANSLATE_WORLD_TRANSFORM: u16 = 0x402D;
pub const EMFPLUS_RECORD_SCALE_WORLD_TRANSFORM: u16 = 0x402E;
pub const EMFPLUS_RECORD_ROTATE_WORLD_TRANSFORM: u16 = 0x402F;
pub const EMFPLUS_RECORD_SET_PAGE_TRANSFORM: u16 = 0x4030;
pub const EMFPLUS_RECORD_RESET_CLIP: u16 = 0x4031;
pub const EMFPLUS_RECORD_SET_CLIP_RECT: u16 = 0x4032;
pub const EMFPLUS_RECORD_SET_CLIP_PATH: u16 = 0x4033;
pub const EMFPLUS_RECORD_SET_CLIP_REGION: u16 = 0x4034;
pub const EMFPLUS_RECORD_OFFSET_CLIP: u16 = 0x4035;
pub const EMFPLUS_RECORD_DRAW_DRIVER_STRING: u16 = 0x4036;
pub const EMFPLUS_RECORD_STROKE_FILL_PATH: u16 = 0x4037;
pub const EMFPLUS_RECORD_SERIALIZABLE_OBJECT: u16 = 0x4038;
pub const EMFPLUS_RECORD_SET_TS_GRAPHICS: u16 = 0x4039;
pub const EMFPLUS_RECORD_SET_TS_CLIP: u16 = 0x403A;

const FIRST_RECORD: u16 = EMFPLUS_RECORD_HEADER;
const LAST_RECORD: u16 = EMFPLUS_RECORD_SET_TS_CLIP;

// Record flags
const FLAG_CONTINUED: u16 = 0x8000;
const FLAG_DUAL_MODE: u16 = 0x0001;
const FLAG_POST_MULTIPLY: u16 = 0x2000;

// Unit types
pub const UNIT_WORLD: u32 = 0;
pub const UNIT_DISPLAY: u32 = 1;
pub const UNIT_PIXEL: u32 = 2;
pub const UNIT_POINT: u32 = 3;
pub const UNIT_INCH: u32 = 4;
pub const UNIT_DOCUMENT: u32 = 5;
pub const UNIT_MILLIMETER: u32 = 6;

const DEFAULT_DPI: f64 = 96.0;

/// Pixels per `unit` at `dpi`.
pub fn unit_factor(unit: u32, dpi: f64) -> f64 {
    match unit {
        UNIT_POINT => dpi / 72.0,
        UNIT_INCH => dpi,
        UNIT_DOCUMENT => dpi / 300.0,
        UNIT_MILLIMETER => dpi / 25.4,
        _ => 1.0,
    }
}

/// Graphics state saved by SAVE and BEGINCONTAINER.
#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    index: u32,
    world: XForm,
    page_unit: u32,
    page_scale: f64,
}

/// Interprets EMF+ records and writes what they draw.
pub struct EmfPlusPlayer {
    verbose: bool,
    objects: Vec<Option<PlusObject>>,
    accumulator: ObjectAccumulator,
    world: XForm,
    page_unit: u32,
    page_scale: f64,
    dpi_x: f64,
    dpi_y: f64,
    dual_mode: bool,
    state_stack: Vec<GraphicsState>,
    records: usize,
}

impl EmfPlusPlayer {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            objects: vec![None; OBJECT_TABLE_SIZE],
            accumulator: ObjectAccumulator::new(),
            world: XForm::identity(),
            page_unit: UNIT_DISPLAY,
            page_scale: 1.0,
            dpi_x: DEFAULT_DPI,
            dpi_y: DEFAULT_DPI,
            dual_mode: false,
            state_stack: Vec::new(),
            records: 0,
        }
    }

    /// Number of EMF+ records seen so far.
    pub fn record_count(&self) -> usize {
        self.records
    }

    pub fn object(&self, id: u8) -> Option<&PlusObject> {
        self.objects.get(id as usize).and_then(|o| o.as_ref())
    }

    /// Walk the EMF+ records of one comment payload.
    pub fn play(&mut self, data: &[u8], out: &mut SvgWriter, scaling: f64) {
        let mut offset = 0usize;
        while offset + RECORD_HEADER_SIZE <= data.len() {
            let Ok((kind, flags, size, data_size)) = read_header(data, offset) else {
                break;
            };
            if size < RECORD_HEADER_SIZE || size > data.len() - offset {
                warn!("EMF+ record at {:#x} has invalid size {}", offset, size);
                break;
            }
            if !(FIRST_RECORD..=LAST_RECORD).contains(&kind) {
                warn!("EMF+ record kind {:#06x} at {:#x} is out of range", kind, offset);
                break;
            }
            if self.verbose {
                debug!(
                    "EMF+ {:#x}: {:#06x} {} ({:?})",
                    offset,
                    kind,
                    record_name(kind),
                    support(kind)
                );
            }
            self.records += 1;

            if kind != EMFPLUS_RECORD_OBJECT && self.accumulator.is_pending() {
                debug!("EMF+ {} ends a pending object early", record_name(kind));
                self.flush_pending();
            }

            let body = &data[offset + RECORD_HEADER_SIZE..offset + size];
            let payload = &body[..data_size.min(body.len())];
            if let Err(e) = self.handle_record(kind, flags, payload, out, scaling) {
                warn!("EMF+ record {} skipped: {}", record_name(kind), e);
            }
            offset += size;
        }
    }

    /// End of the EMF stream: interpret an object that never completed.
    pub fn finish(&mut self, _out: &mut SvgWriter, _scaling: f64) {
        if self.accumulator.is_pending() {
            warn!("EMF+ object continuation unresolved at end of file");
            self.flush_pending();
        }
    }

    /// Handle a single EMF+ record
    fn handle_record(
        &mut self,
        kind: u16,
        flags: u16,
        payload: &[u8],
        out: &mut SvgWriter,
        scaling: f64,
    ) -> Result<()> {
        match kind {
            EMFPLUS_RECORD_HEADER => self.handle_header(flags, payload),
            EMFPLUS_RECORD_OBJECT => self.handle_object(flags, payload),
            EMFPLUS_RECORD_FILL_RECTS => self.handle_fill_rects(flags, payload, out, scaling),
            EMFPLUS_RECORD_DRAW_RECTS => self.handle_draw_rects(flags, payload, out, scaling),
            EMFPLUS_RECORD_FILL_POLYGON => self.handle_fill_polygon(flags, payload, out, scaling),
            EMFPLUS_RECORD_DRAW_LINES => self.handle_draw_lines(flags, payload, out, scaling),
            EMFPLUS_RECORD_FILL_ELLIPSE => self.handle_fill_ellipse(flags, payload, out, scaling),
            EMFPLUS_RECORD_DRAW_ELLIPSE => self.handle_draw_ellipse(flags, payload, out, scaling),
            EMFPLUS_RECORD_FILL_PATH => self.handle_fill_path(flags, payload, out, scaling),
            EMFPLUS_RECORD_DRAW_PATH => self.handle_draw_path(flags, payload, out, scaling),
            EMFPLUS_RECORD_DRAW_BEZIERS => self.handle_draw_beziers(flags, payload, out, scaling),
            EMFPLUS_RECORD_DRAW_STRING => self.handle_draw_string(flags, payload, out, scaling),
            EMFPLUS_RECORD_SAVE => self.handle_save(payload),
            EMFPLUS_RECORD_RESTORE | EMFPLUS_RECORD_END_CONTAINER => self.handle_restore(payload),
            EMFPLUS_RECORD_BEGIN_CONTAINER => self.handle_begin_container(payload),
            EMFPLUS_RECORD_BEGIN_CONTAINER_NO_PARAMS => self.handle_save(payload),
            EMFPLUS_RECORD_SET_WORLD_TRANSFORM => {
                self.world = RecordReader::new(payload).read_xform()?;
                Ok(())
            }
            EMFPLUS_RECORD_RESET_WORLD_TRANSFORM => {
                self.world = XForm::identity();
                Ok(())
            }
            EMFPLUS_RECORD_MULTIPLY_WORLD_TRANSFORM => {
                let m = RecordReader::new(payload).read_xform()?;
                self.multiply_world(flags, &m);
                Ok(())
            }
            EMFPLUS_RECORD_TRANSLATE_WORLD_TRANSFORM => {
                let mut reader = RecordReader::new(payload);
                let dx = reader.read_f32()? as f64;
                let dy = reader.read_f32()? as f64;
                self.multiply_world(flags, &XForm::new(1.0, 0.0, 0.0, 1.0, dx, dy));
                Ok(())
            }
            EMFPLUS_RECORD_SCALE_WORLD_TRANSFORM => {
                let mut reader = RecordReader::new(payload);
                let sx = reader.read_f32()? as f64;
                let sy = reader.read_f32()? as f64;
                self.multiply_world(flags, &XForm::new(sx, 0.0, 0.0, sy, 0.0, 0.0));
                Ok(())
            }
            EMFPLUS_RECORD_ROTATE_WORLD_TRANSFORM => {
                let angle = (RecordReader::new(payload).read_f32()? as f64).to_radians();
                let (sin, cos) = angle.sin_cos();
                self.multiply_world(flags, &XForm::new(cos, sin, -sin, cos, 0.0, 0.0));
                Ok(())
            }
            EMFPLUS_RECORD_SET_PAGE_TRANSFORM => {
                let scale = RecordReader::new(payload).read_f32()? as f64;
                self.page_unit = (flags & 0xFF) as u32;
                if scale.is_finite() && scale > 0.0 {
                    self.page_scale = scale;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn handle_header(&mut self, flags: u16, payload: &[u8]) -> Result<()> {
        self.dual_mode = flags & FLAG_DUAL_MODE != 0;
        let mut reader = RecordReader::at(payload, 8)?;
        let dpi_x = reader.read_u32()?;
        let dpi_y = reader.read_u32()?;
        if dpi_x > 0 {
            self.dpi_x = dpi_x as f64;
        }
        if dpi_y > 0 {
            self.dpi_y = dpi_y as f64;
        }
        debug!(
            "EMF+ header: dual mode {}, dpi {}x{}",
            self.dual_mode, self.dpi_x, self.dpi_y
        );
        Ok(())
    }

    /// Handle OBJECT record - creates brushes, pens, paths, etc.
    fn handle_object(&mut self, flags: u16, payload: &[u8]) -> Result<()> {
        let object_id = (flags & 0xFF) as u8;
        let object_type = ((flags >> 8) & 0x7F) as u8;

        if flags & FLAG_CONTINUED != 0 {
            let total = RecordReader::new(payload).read_u32()? as usize;
            let fragment = slice_at(payload, 4, payload.len() - 4)?;
            if !self.accumulator.append(object_type, object_id, fragment) {
                self.flush_pending();
                self.accumulator.start(object_type, object_id, total, fragment);
            }
            if self.accumulator.is_complete() {
                self.flush_pending();
            }
            return Ok(());
        }

        // last piece of a continued object
        if self.accumulator.append(object_type, object_id, payload) {
            self.flush_pending();
            return Ok(());
        }
        self.flush_pending();
        self.store_object(object_type, object_id, payload);
        Ok(())
    }

    fn flush_pending(&mut self) {
        if let Some((object_type, object_id, buffer)) = self.accumulator.take() {
            self.store_object(object_type, object_id, &buffer);
        }
    }

    fn store_object(&mut self, object_type: u8, object_id: u8, payload: &[u8]) {
        match parse_object(object_type, payload) {
            Ok(object) => self.objects[object_id as usize] = Some(object),
            Err(e) => warn!("EMF+ object {} (type {}) dropped: {}", object_id, object_type, e),
        }
    }

    fn multiply_world(&mut self, flags: u16, m: &XForm) {
        self.world = if flags & FLAG_POST_MULTIPLY != 0 {
            self.world.then(m)
        } else {
            m.then(&self.world)
        };
    }

    fn push_state(&mut self, index: u32) {
        self.state_stack.push(GraphicsState {
            index,
            world: self.world,
            page_unit: self.page_unit,
            page_scale: self.page_scale,
        });
    }

    /// Handle SAVE and BEGINCONTAINERNOPARAMS records
    fn handle_save(&mut self, payload: &[u8]) -> Result<()> {
        let index = RecordReader::new(payload).read_u32()?;
        self.push_state(index);
        Ok(())
    }

    /// Handle RESTORE and ENDCONTAINER records
    fn handle_restore(&mut self, payload: &[u8]) -> Result<()> {
        let index = RecordReader::new(payload).read_u32()?;
        let Some(pos) = self.state_stack.iter().rposition(|s| s.index == index) else {
            debug!("EMF+ restore of unknown state {}", index);
            return Ok(());
        };
        let state = self.state_stack[pos];
        self.state_stack.truncate(pos);
        self.world = state.world;
        self.page_unit = state.page_unit;
        self.page_scale = state.page_scale;
        Ok(())
    }

    /// Handle BEGINCONTAINER: save, then map the source rect onto the
    /// destination rect.
    fn handle_begin_container(&mut self, payload: &[u8]) -> Result<()> {
        let mut reader = RecordReader::new(payload);
        let mut rect = || -> Result<[f64; 4]> {
            Ok([
                reader.read_f32()? as f64,
                reader.read_f32()? as f64,
                reader.read_f32()? as f64,
                reader.read_f32()? as f64,
            ])
        };
        let dest = rect()?;
        let src = rect()?;
        let index = reader.read_u32()?;
        self.push_state(index);

        let sx = if src[2] != 0.0 { dest[2] / src[2] } else { 1.0 };
        let sy = if src[3] != 0.0 { dest[3] / src[3] } else { 1.0 };
        let container = XForm::new(sx, 0.0, 0.0, sy, dest[0] - src[0] * sx, dest[1] - src[1] * sy);
        self.world = container.then(&self.world);
        Ok(())
    }

    /// World coordinates to output pixels.
    fn device_point(&self, x: f64, y: f64, scaling: f64) -> PointD {
        let (wx, wy) = self.world.apply(x, y);
        let fx = unit_factor(self.page_unit, self.dpi_x) * self.page_scale * scaling;
        let fy = unit_factor(self.page_unit, self.dpi_y) * self.page_scale * scaling;
        PointD::new(wx * fx, wy * fy)
    }

    /// A length in `unit` to output pixels.
    fn device_length(&self, length: f64, unit: u32, scaling: f64) -> f64 {
        let w = &self.world;
        let det = (w.m11 * w.m22 - w.m12 * w.m21).abs().sqrt();
        let factor = if unit == UNIT_WORLD {
            unit_factor(self.page_unit, self.dpi_x) * self.page_scale
        } else {
            unit_factor(unit, self.dpi_x)
        };
        length * factor * det * scaling
    }
}

fn read_header(data: &[u8], offset: usize) -> Result<(u16, u16, usize, usize)> {
    let mut reader = RecordReader::at(data, offset)?;
    let kind = reader.read_u16()?;
    let flags = reader.read_u16()?;
    let size = reader.read_u32()? as usize;
    let data_size = reader.read_u32()? as usize;
    Ok((kind, flags, size, data_size))
}

/// How completely an EMF+ record kind is rendered.
pub fn support(kind: u16) -> Support {
    use Support::*;
    match kind {
        EMFPLUS_RECORD_HEADER | EMFPLUS_RECORD_END_OF_FILE | EMFPLUS_RECORD_OBJECT
        | EMFPLUS_RECORD_FILL_RECTS | EMFPLUS_RECORD_DRAW_RECTS | EMFPLUS_RECORD_FILL_POLYGON
        | EMFPLUS_RECORD_DRAW_LINES | EMFPLUS_RECORD_FILL_ELLIPSE | EMFPLUS_RECORD_DRAW_ELLIPSE
        | EMFPLUS_RECORD_FILL_PATH | EMFPLUS_RECORD_DRAW_PATH | EMFPLUS_RECORD_DRAW_BEZIERS
        | EMFPLUS_RECORD_SAVE | EMFPLUS_RECORD_RESTORE | EMFPLUS_RECORD_BEGIN_CONTAINER
        | EMFPLUS_RECORD_BEGIN_CONTAINER_NO_PARAMS | EMFPLUS_RECORD_END_CONTAINER
        | EMFPLUS_RECORD_SET_WORLD_TRANSFORM | EMFPLUS_RECORD_RESET_WORLD_TRANSFORM
        | EMFPLUS_RECORD_MULTIPLY_WORLD_TRANSFORM | EMFPLUS_RECORD_TRANSLATE_WORLD_TRANSFORM
        | EMFPLUS_RECORD_SCALE_WORLD_TRANSFORM | EMFPLUS_RECORD_ROTATE_WORLD_TRANSFORM
        | EMFPLUS_RECORD_SET_PAGE_TRANSFORM => Supported,

        EMFPLUS_RECORD_DRAW_STRING => Partial,

        EMFPLUS_RECORD_COMMENT | EMFPLUS_RECORD_GET_DC | EMFPLUS_RECORD_MULTI_FORMAT_START
        | EMFPLUS_RECORD_MULTI_FORMAT_SECTION | EMFPLUS_RECORD_MULTI_FORMAT_END
        | EMFPLUS_RECORD_SET_RENDERING_ORIGIN | EMFPLUS_RECORD_SET_ANTI_ALIAS_MODE
        | EMFPLUS_RECORD_SET_TEXT_RENDERING_HINT | EMFPLUS_RECORD_SET_TEXT_CONTRAST
        | EMFPLUS_RECORD_SET_INTERPOLATION_MODE | EMFPLUS_RECORD_SET_PIXEL_OFFSET_MODE
        | EMFPLUS_RECORD_SET_COMPOSITING_MODE | EMFPLUS_RECORD_SET_COMPOSITING_QUALITY
        | EMFPLUS_RECORD_SET_TS_GRAPHICS | EMFPLUS_RECORD_SET_TS_CLIP => Unused,

        _ => Ignored,
    }
}

/// Symbolic name of an EMF+ record kind.
pub fn record_name(kind: u16) -> &'static str {
    match kind {
        EMFPLUS_RECORD_HEADER => "EmfPlusHeader",
        EMFPLUS_RECORD_END_OF_FILE => "EmfPlusEndOfFile",
        EMFPLUS_RECORD_COMMENT => "EmfPlusComment",
        EMFPLUS_RECORD_GET_DC => "EmfPlusGetDC",
        EMFPLUS_RECORD_MULTI_FORMAT_START => "EmfPlusMultiFormatStart",
        EMFPLUS_RECORD_MULTI_FORMAT_SECTION => "EmfPlusMultiFormatSection",
        EMFPLUS_RECORD_MULTI_FORMAT_END => "EmfPlusMultiFormatEnd",
        EMFPLUS_RECORD_OBJECT => "EmfPlusObject",
        EMFPLUS_RECORD_CLEAR => "EmfPlusClear",
        EMFPLUS_RECORD_FILL_RECTS => "EmfPlusFillRects",
        EMFPLUS_RECORD_DRAW_RECTS => "EmfPlusDrawRects",
        EMFPLUS_RECORD_FILL_POLYGON => "EmfPlusFillPolygon",
        EMFPLUS_RECORD_DRAW_LINES => "EmfPlusDrawLines",
        EMFPLUS_RECORD_FILL_ELLIPSE => "EmfPlusFillEllipse",
        EMFPLUS_RECORD_DRAW_ELLIPSE => "EmfPlusDrawEllipse",
        EMFPLUS_RECORD_FILL_PIE => "EmfPlusFillPie",
        EMFPLUS_RECORD_DRAW_PIE => "EmfPlusDrawPie",
        EMFPLUS_RECORD_DRAW_ARC => "EmfPlusDrawArc",
        EMFPLUS_RECORD_FILL_REGION => "EmfPlusFillRegion",
        EMFPLUS_RECORD_FILL_PATH => "EmfPlusFillPath",
        EMFPLUS_RECORD_DRAW_PATH => "EmfPlusDrawPath",
        EMFPLUS_RECORD_FILL_CLOSED_CURVE => "EmfPlusFillClosedCurve",
        EMFPLUS_RECORD_DRAW_CLOSED_CURVE => "EmfPlusDrawClosedCurve",
        EMFPLUS_RECORD_DRAW_CURVE => "EmfPlusDrawCurve",
        EMFPLUS_RECORD_DRAW_BEZIERS => "EmfPlusDrawBeziers",
        EMFPLUS_RECORD_DRAW_IMAGE => "EmfPlusDrawImage",
        EMFPLUS_RECORD_DRAW_IMAGE_POINTS => "EmfPlusDrawImagePoints",
        EMFPLUS_RECORD_DRAW_STRING => "EmfPlusDrawString",
        EMFPLUS_RECORD_SET_RENDERING_ORIGIN => "EmfPlusSetRenderingOrigin",
        EMFPLUS_RECORD_SET_ANTI_ALIAS_MODE => "EmfPlusSetAntiAliasMode",
        EMFPLUS_RECORD_SET_TEXT_RENDERING_HINT => "EmfPlusSetTextRenderingHint",
        EMFPLUS_RECORD_SET_TEXT_CONTRAST => "EmfPlusSetTextContrast",
        EMFPLUS_RECORD_SET_INTERPOLATION_MODE => "EmfPlusSetInterpolationMode",
        EMFPLUS_RECORD_SET_PIXEL_OFFSET_MODE => "EmfPlusSetPixelOffsetMode",
        EMFPLUS_RECORD_SET_COMPOSITING_MODE => "EmfPlusSetCompositingMode",
        EMFPLUS_RECORD_SET_COMPOSITING_QUALITY => "EmfPlusSetCompositingQuality",
        EMFPLUS_RECORD_SAVE => "EmfPlusSave",
        EMFPLUS_RECORD_RESTORE => "EmfPlusRestore",
        EMFPLUS_RECORD_BEGIN_CONTAINER => "EmfPlusBeginContainer",
        EMFPLUS_RECORD_BEGIN_CONTAINER_NO_PARAMS => "EmfPlusBeginContainerNoParams",
        EMFPLUS_RECORD_END_CONTAINER => "EmfPlusEndContainer",
        EMFPLUS_RECORD_SET_WORLD_TRANSFORM => "EmfPlusSetWorldTransform",
        EMFPLUS_RECORD_RESET_WORLD_TRANSFORM => "EmfPlusResetWorldTransform",
        EMFPLUS_RECORD_MULTIPLY_WORLD_TRANSFORM => "EmfPlusMultiplyWorldTransform",
        EMFPLUS_RECORD_TRANSLATE_WORLD_TRANSFORM => "EmfPlusTranslateWorldTransform",
        EMFPLUS_RECORD_SCALE_WORLD_TRANSFORM => "EmfPlusScaleWorldTransform",
        EMFPLUS_RECORD_ROTATE_WORLD_TRANSFORM => "EmfPlusRotateWorldTransform",
        EMFPLUS_RECORD_SET_PAGE_TRANSFORM => "EmfPlusSetPageTransform",
        EMFPLUS_RECORD_RESET_CLIP => "EmfPlusResetClip",
        EMFPLUS_RECORD_SET_CLIP_RECT => "EmfPlusSetClipRect",
        EMFPLUS_RECORD_SET_CLIP_PATH => "EmfPlusSetClipPath",
        EMFPLUS_RECORD_SET_CLIP_REGION => "EmfPlusSetClipRegion",
        EMFPLUS_RECORD_OFFSET_CLIP => "EmfPlusOffsetClip",
        EMFPLUS_RECORD_DRAW_DRIVER_STRING => "EmfPlusDrawDriverString",
        EMFPLUS_RECORD_STROKE_FILL_PATH => "EmfPlusStrokeFillPath",
        EMFPLUS_RECORD_SERIALIZABLE_OBJECT => "EmfPlusSerializableObject",
        EMFPLUS_RECORD_SET_TS_GRAPHICS => "EmfPlusSetTSGraphics",
        EMFPLUS_RECORD_SET_TS_CLIP => "EmfPlusSetTSClip",
        _ => "EmfPlusUnknown",
    }
}

#[cfg(test)]
mod tests {
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

    fn solid_brush(argb: u32) -> Vec<u8> {
        [0xDBC0_1002u32, 0, argb].iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_every_kind_is_named() {
        for kind in FIRST_RECORD..=LAST_RECORD {
            assert_ne!(record_name(kind), "EmfPlusUnknown", "kind {:#06x}", kind);
        }
    }

    #[test]
    fn test_object_in_one_record() {
        let mut player = EmfPlusPlayer::new(false);
        let mut out = SvgWriter::new("");
        let data = record(EMFPLUS_RECORD_OBJECT, 0x0100 | 7, &solid_brush(0xFF00_FF00));
        player.play(&data, &mut out, 1.0);
        assert_eq!(player.object(7), Some(&PlusObject::Brush(Brush::SolidColor(0xFF00_FF00))));
    }

    #[test]
    fn test_object_split_over_comments() {
        let body = solid_brush(0xFF12_3456);
        let mut player = EmfPlusPlayer::new(false);
        let mut out = SvgWriter::new("");
        for chunk in body.chunks(4) {
            let mut payload = (body.len() as u32).to_le_bytes().to_vec();
            payload.extend_from_slice(chunk);
            let data = record(EMFPLUS_RECORD_OBJECT, 0x8000 | 0x0100 | 2, &payload);
            player.play(&data, &mut out, 1.0);
        }
        assert_eq!(player.object(2), Some(&PlusObject::Brush(Brush::SolidColor(0xFF12_3456))));
    }

    #[test]
    fn test_pending_object_forced_at_finish() {
        let body = solid_brush(0xFF00_0001);
        let mut player = EmfPlusPlayer::new(false);
        let mut out = SvgWriter::new("");
        let mut payload = 64u32.to_le_bytes().to_vec();
        payload.extend_from_slice(&body);
        player.play(&record(EMFPLUS_RECORD_OBJECT, 0x8000 | 0x0100 | 1, &payload), &mut out, 1.0);
        assert!(player.object(1).is_none());
        player.finish(&mut out, 1.0);
        assert_eq!(player.object(1), Some(&PlusObject::Brush(Brush::SolidColor(0xFF00_0001))));
    }

    #[test]
    fn test_out_of_range_kind_stops_walk() {
        let mut player = EmfPlusPlayer::new(false);
        let mut out = SvgWriter::new("");
        let mut data = record(0x3000, 0, &[]);
        data.extend(record(EMFPLUS_RECORD_OBJECT, 0x0100, &solid_brush(0xFF00_0000)));
        player.play(&data, &mut out, 1.0);
        assert!(player.object(0).is_none());
        assert_eq!(player.record_count(), 0);
    }

    #[test]
    fn test_save_restore_by_index() {
        let mut player = EmfPlusPlayer::new(false);
        let mut out = SvgWriter::new("");
        let mut data = record(EMFPLUS_RECORD_SAVE, 0, &5u32.to_le_bytes());
        let mut translate = 10.0f32.to_le_bytes().to_vec();
        translate.extend_from_slice(&20.0f32.to_le_bytes());
        data.extend(record(EMFPLUS_RECORD_TRANSLATE_WORLD_TRANSFORM, 0, &translate));
        player.play(&data, &mut out, 1.0);
        assert_eq!(player.world.dx, 10.0);
        player.play(&record(EMFPLUS_RECORD_RESTORE, 0, &5u32.to_le_bytes()), &mut out, 1.0);
        assert!(player.world.is_identity());
        assert!(player.state_stack.is_empty());
    }

    #[test]
    fn test_unit_factors() {
        assert_eq!(unit_factor(UNIT_INCH, 96.0), 96.0);
        assert_eq!(unit_factor(UNIT_POINT, 72.0), 1.0);
        assert_eq!(unit_factor(UNIT_PIXEL, 300.0), 1.0);
        assert!((unit_factor(UNIT_MILLIMETER, 25.4) - 1.0).abs() < 1e-12);
    }
}
