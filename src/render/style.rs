//! Stroke, fill and clip attributes resolved from the device context

use super::Renderer;
use crate::device_context::*;
use crate::svg_writer::fmt_num;

impl Renderer<'_> {
    /// Write the stroke attributes of the current pen. Returns true when
    /// the stroke was set, including an explicit `stroke="none"`.
    pub(crate) fn stroke_attrs(&mut self) -> bool {
        let stroke = self.dc.stroke.clone();
        if stroke.is_null() {
            self.no_stroke();
            return true;
        }

        let width = self.stroke_width(&stroke);
        self.w.attr("stroke", &stroke.color.hex());
        self.w.attr("stroke-width", &format!("{}px", fmt_num(width)));

        let dash = |n: f64| fmt_num(n * width);
        let pattern = match stroke.style & PS_STYLE_MASK {
            PS_DASH => Some(format!("{},{}", dash(5.0), dash(5.0))),
            PS_DOT => Some(format!("{},{}", dash(1.0), dash(1.0))),
            PS_DASHDOT => Some(format!("{},{},{},{}", dash(5.0), dash(5.0), dash(1.0), dash(5.0))),
            PS_DASHDOTDOT => Some(format!(
                "{},{},{},{},{},{}",
                dash(5.0),
                dash(5.0),
                dash(1.0),
                dash(1.0),
                dash(1.0),
                dash(5.0)
            )),
            _ => None,
        };
        if let Some(pattern) = pattern {
            self.w.attr("stroke-dasharray", &pattern);
        }

        let cap = match stroke.style & PS_ENDCAP_MASK {
            PS_ENDCAP_SQUARE => "square",
            PS_ENDCAP_FLAT => "butt",
            _ => "round",
        };
        self.w.attr("stroke-linecap", cap);

        let join = match stroke.style & PS_JOIN_MASK {
            PS_JOIN_BEVEL => "bevel",
            PS_JOIN_MITER => "miter",
            _ => "round",
        };
        self.w.attr("stroke-linejoin", join);
        if join == "miter" {
            self.w.attr_num("stroke-miterlimit", self.dc.miter_limit);
        }
        true
    }

    /// Null pen: outline in the fill colour when something is filled.
    fn no_stroke(&mut self) {
        if self.dc.fill.style != BS_NULL {
            self.w.attr("stroke-width", "1px");
            self.w.attr("stroke", &self.dc.fill.color.hex());
        } else {
            self.w.attr("stroke", "none");
            self.w.attr("stroke-width", "0.0");
        }
    }

    /// Cosmetic pens are one device unit wide whatever their declared width.
    pub(crate) fn stroke_width(&self, stroke: &Stroke) -> f64 {
        if stroke.style & PS_TYPE_MASK == PS_GEOMETRIC {
            let w = self.scale_x(stroke.width);
            if w > 0.0 {
                return w;
            }
        }
        self.page.scaling
    }

    /// Write the fill attributes of the current brush. Returns true when
    /// the fill was set, including an explicit `fill="none"`.
    pub(crate) fn fill_attrs(&mut self) -> bool {
        let fill = self.dc.fill.clone();
        match fill.style {
            BS_NULL => self.w.attr("fill", "none"),
            BS_MONOPATTERN | BS_DIBPATTERNPT if fill.pattern != 0 => {
                self.fill_rule();
                self.w.attr("fill", &format!("url(#img-{}-ref)", fill.pattern));
            }
            _ => {
                self.fill_rule();
                self.w.attr("fill", &fill.color.hex());
            }
        }
        true
    }

    fn fill_rule(&mut self) {
        let rule = match self.dc.polyfill_mode {
            WINDING => "nonzero",
            _ => "evenodd",
        };
        self.w.attr("fill-rule", rule);
    }

    /// `clip-path="url(#clip-N)" ` when a clip region is active.
    pub(crate) fn clip_attr(&mut self) {
        let id = self.dc.clip_id();
        if id != 0 {
            self.w.attr("clip-path", &format!("url(#clip-{})", id));
        }
    }

    /// Same as [`Self::clip_attr`], for elements built with the `svg` crate.
    pub(crate) fn clip_url(&self) -> Option<String> {
        match self.dc.clip_id() {
            0 => None,
            id => Some(format!("url(#clip-{})", id)),
        }
    }
}
