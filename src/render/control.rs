//! HEADER and EOF

use log::debug;

use super::Renderer;
use crate::bounds::RecordReader;
use crate::error::Result;
use crate::object_table::ObjectTable;
use crate::svg_writer::fmt_num;

const XML_PROLOG: &str = "<?xml version=\"1.0\"  encoding=\"UTF-8\" standalone=\"no\"?>\n";
const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Output size for bounds of `bw` x `bh` and the requested size.
///
/// Zero requested sizes are derived from the bounds. When both are given the
/// bounds' aspect ratio is kept and the larger side shrinks to fit.
pub(crate) fn image_size(bw: f64, bh: f64, req_w: f64, req_h: f64) -> (f64, f64) {
    let (bw, bh) = (bw.abs(), bh.abs());
    let ratio = if bh != 0.0 { bw / bh } else { 1.0 };
    match (req_w > 0.0, req_h > 0.0) {
        (true, true) => {
            if ratio != 0.0 && req_w / req_h > ratio {
                (req_h * ratio, req_h)
            } else if ratio != 0.0 {
                (req_w, req_w / ratio)
            } else {
                (req_w, req_h)
            }
        }
        (true, false) => (req_w, if ratio != 0.0 { req_w / ratio } else { req_w }),
        (false, true) => (req_h * ratio, req_h),
        (false, false) => (bw, bh),
    }
}

pub(crate) fn header(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let bounds = reader.read_rect_l()?;
    reader.seek(56)?;
    let handles = reader.read_u16()?;
    reader.seek(72)?;
    let device_cx = reader.read_i32()?;
    let _device_cy = reader.read_i32()?;
    let mm_cx = reader.read_i32()?;

    r.objects = ObjectTable::new(handles);
    r.page.px_per_mm = if mm_cx != 0 { device_cx as f64 / mm_cx as f64 } else { 1.0 };

    let (mut width, mut height) = image_size(
        bounds.width(),
        bounds.height(),
        r.options.image_width,
        r.options.image_height,
    );
    r.page.scaling = if bounds.width() != 0.0 { width / bounds.width().abs() } else { 1.0 };

    let broken_y = (bounds.top < 0) != (bounds.bottom < 0) && bounds.top != 0 && bounds.bottom != 0;
    let (ref_x, ref_y) = if broken_y {
        width += 1.0;
        height += 1.0;
        (0.0, 0.0)
    } else {
        (bounds.left as f64, bounds.top as f64)
    };
    debug!(
        "header: {} handles, bounds {:?}, scaling {}, px/mm {}",
        handles, bounds, r.page.scaling, r.page.px_per_mm
    );

    if r.options.svg_delimiter {
        r.w.raw(XML_PROLOG);
        r.w.open("svg");
        r.w.attr("version", "1.1");
        r.w.attr("xmlns", SVG_NS);
        r.w.attr("xmlns:xlink", XLINK_NS);
        if let Some(ns) = r.options.namespace.as_deref() {
            r.w.attr(&format!("xmlns:{}", ns), SVG_NS);
        }
        r.w.attr_num("width", width);
        r.w.attr_num("height", height);
        r.w.trim_trailing_space();
        r.w.raw(">\n");
    }

    let translate = format!(
        "translate({}, {})",
        fmt_num(-ref_x * r.page.scaling),
        fmt_num(-ref_y * r.page.scaling)
    );
    r.w.open("g");
    r.w.attr("transform", &translate);
    r.w.trim_trailing_space();
    r.w.raw(">\n");
    Ok(())
}

pub(crate) fn eof(r: &mut Renderer<'_>, _rec: &[u8]) -> Result<()> {
    if r.in_path {
        r.abandon_path();
    }
    if r.options.emfplus {
        let scaling = r.page.scaling;
        r.emfplus.finish(&mut r.w, scaling);
    }
    if r.transform_open {
        r.w.close("g");
        r.w.raw("\n");
        r.transform_open = false;
    }
    r.w.close("g");
    r.w.raw("\n");
    if r.options.svg_delimiter {
        r.w.close("svg");
        r.w.raw("\n");
    }
    Ok(())
}
