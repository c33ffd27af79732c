//! SVG output sink
//!
//! GDI paths are built incrementally across records, so most output is
//! appended as text in record order. Self-contained elements (definitions,
//! images, EMF+ shapes) are built with the `svg` crate and serialized in
//! place.

use base64::{engine::general_purpose, Engine as _};
use svg::node::element::Element;
use svg::Node;

use crate::geometry::PointD;

/// Format a number with at most four decimals and no trailing zeros.
pub fn fmt_num(v: f64) -> String {
    if !v.is_finite() {
        return "0".to_string();
    }
    let mut s = format!("{:.4}", v);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

/// `x,y ` as used in path data.
pub fn fmt_point(p: PointD) -> String {
    format!("{},{} ", fmt_num(p.x), fmt_num(p.y))
}

/// `#RRGGBB` in upper case.
pub fn color_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// Base64 data URI for embedded images.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

/// CDATA section for text content. An embedded `]]>` is split across two
/// sections.
pub fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// Append-only SVG text buffer with optional namespace prefix.
pub struct SvgWriter {
    out: String,
    prefix: String,
}

impl SvgWriter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            out: String::with_capacity(4096),
            prefix: prefix.into(),
        }
    }

    /// Append raw text.
    pub fn raw(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// `<ns:name `
    pub fn open(&mut self, name: &str) {
        self.out.push('<');
        self.out.push_str(&self.prefix);
        self.out.push_str(name);
        self.out.push(' ');
    }

    /// `</ns:name>`
    pub fn close(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(&self.prefix);
        self.out.push_str(name);
        self.out.push('>');
    }

    /// `name="value" `
    pub fn attr(&mut self, name: &str, value: &str) {
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(value);
        self.out.push_str("\" ");
    }

    pub fn attr_num(&mut self, name: &str, value: f64) {
        self.attr(name, &fmt_num(value));
    }

    pub fn point(&mut self, p: PointD) {
        self.out.push_str(&fmt_point(p));
    }

    /// Drop trailing blanks, used before closing a `d` attribute.
    pub fn trim_trailing_space(&mut self) {
        while self.out.ends_with(' ') {
            self.out.pop();
        }
    }

    /// New element named with the namespace prefix.
    pub fn element(&self, name: &str) -> Element {
        Element::new(format!("{}{}", self.prefix, name))
    }

    /// Serialize a finished element.
    pub fn node(&mut self, node: Element) {
        self.out.push_str(&node.to_string());
        self.out.push('\n');
    }

    /// `<defs>` wrapper around a single child.
    pub fn defs(&mut self, child: Element) {
        let mut defs = self.element("defs");
        defs.append(child);
        self.node(defs);
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Move the text written so far out, leaving the buffer empty.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.out)
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Set an attribute on an element built through [`SvgWriter::element`].
pub fn set<V: Into<svg::node::Value>>(element: &mut Element, name: &str, value: V) {
    element.assign(name, value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(10.0), "10");
        assert_eq!(fmt_num(1.5), "1.5");
        assert_eq!(fmt_num(0.123456), "0.1235");
        assert_eq!(fmt_num(-0.00001), "0");
        assert_eq!(fmt_num(f64::NAN), "0");
    }

    #[test]
    fn test_color_hex() {
        assert_eq!(color_hex(255, 0, 16), "#FF0010");
    }

    #[test]
    fn test_prefixed_tags() {
        let mut w = SvgWriter::new("svg:");
        w.open("path");
        w.raw("d=\"M 0,0 ");
        w.trim_trailing_space();
        w.raw("\" />");
        w.close("g");
        assert_eq!(w.finish(), "<svg:path d=\"M 0,0\" /></svg:g>");
    }

    #[test]
    fn test_element_node() {
        let mut w = SvgWriter::new("");
        let mut image = w.element("image");
        set(&mut image, "width", 3);
        w.node(image);
        assert!(w.as_str().starts_with("<image"));
        assert!(w.as_str().contains("width=\"3\""));
    }

    #[test]
    fn test_cdata_escapes_terminator() {
        assert_eq!(cdata("x]]>y"), "<![CDATA[x]]]]><![CDATA[>y]]>");
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("image/png", b"abc"), "data:image/png;base64,YWJj");
    }
}
