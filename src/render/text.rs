//! Text output: EXTTEXTOUTA, EXTTEXTOUTW and SMALLTEXTOUT

use super::Renderer;
use crate::bounds::RecordReader;
use crate::error::Result;
use crate::geometry::PointL;
use crate::svg_writer::{cdata, fmt_num};
use crate::transform::MapMode;

// Text alignment bits
const TA_RIGHT: u32 = 0x0002;
const TA_CENTER: u32 = 0x0006;
const TA_BOTTOM: u32 = 0x0008;
const TA_BASELINE: u32 = 0x0018;

const LAYOUT_RTL: u32 = 0x0001;

// SMALLTEXTOUT options
const ETO_NO_RECT: u32 = 0x0100;
const ETO_SMALL_CHARS: u32 = 0x0200;

/// Distance from the top of the em box to the baseline, in em.
const ASCENT: f64 = 0.9;

pub(crate) fn ext_text_out_a(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let (origin, count, offset) = read_emrtext(rec)?;
    let bytes = RecordReader::at(rec, offset)?.read_bytes(count)?;
    let text = clean_text(bytes.iter().map(|&b| if b > 0x7F { ' ' } else { b as char }));
    r.text(origin, &text);
    Ok(())
}

pub(crate) fn ext_text_out_w(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let (origin, count, offset) = read_emrtext(rec)?;
    let raw = RecordReader::at(rec, offset)?.read_utf16(count)?;
    let text = clean_text(raw.chars());
    r.text(origin, &text);
    Ok(())
}

pub(crate) fn small_text_out(r: &mut Renderer<'_>, rec: &[u8]) -> Result<()> {
    let mut reader = RecordReader::at(rec, 8)?;
    let origin = reader.read_point_l()?;
    let count = reader.read_u32()? as usize;
    let options = reader.read_u32()?;
    let start = if options & ETO_NO_RECT != 0 { 36 } else { 52 };
    reader.seek(start)?;
    let text = if options & ETO_SMALL_CHARS != 0 {
        // one byte per character, Latin-1
        clean_text(reader.read_bytes(count)?.iter().map(|&b| b as char))
    } else {
        clean_text(reader.read_utf16(count)?.chars())
    };
    r.text(origin, &text);
    Ok(())
}

/// Reference point, character count and string offset of an EMRTEXT.
fn read_emrtext(rec: &[u8]) -> Result<(PointL, usize, usize)> {
    let mut reader = RecordReader::at(rec, 36)?;
    let origin = reader.read_point_l()?;
    let count = reader.read_u32()? as usize;
    let offset = reader.read_u32()? as usize;
    Ok((origin, count, offset))
}

/// Stop at NUL and turn control characters other than tab, line feed and
/// vertical tab into spaces.
pub(crate) fn clean_text(chars: impl Iterator<Item = char>) -> String {
    chars
        .take_while(|&c| c != '\0')
        .map(|c| match c {
            '\t' | '\n' | '\u{0B}' => c,
            c if (c as u32) < 0x20 => ' ',
            c => c,
        })
        .collect()
}

impl Renderer<'_> {
    fn text(&mut self, origin: PointL, text: &str) {
        self.outside_path(|r| r.write_text(origin, text));
    }

    fn write_text(&mut self, origin: PointL, text: &str) {
        let font = self.dc.font.clone();
        let org = self.map_l(origin);
        let size = self.scale_x(font.height as f64).abs();
        let align = self.dc.text_align;
        let y = if align & TA_BASELINE == TA_BASELINE || align & TA_BOTTOM != 0 {
            org.y
        } else {
            org.y + size * ASCENT
        };

        self.w.open("text");
        if let Some(family) = font.family.as_deref() {
            self.w.attr("font-family", family);
        }
        self.w.attr("fill", &self.dc.text_color.hex());
        if font.escapement != 0 {
            let orientation = match self.dc.mapping.map_mode {
                MapMode::Isotropic | MapMode::Anisotropic
                    if self.dc.mapping.y_direction(&self.page) < 0.0 =>
                {
                    1.0
                }
                _ => -1.0,
            };
            let rotate = format!(
                "rotate({}, {}, {})",
                fmt_num(orientation * font.escapement as f64 / 10.0),
                fmt_num(org.x),
                fmt_num(y)
            );
            self.w.attr("transform", &rotate);
        }
        if self.text_layout & LAYOUT_RTL != 0 {
            self.w.attr("writing-mode", "rl-tb");
        }
        if font.italic {
            self.w.attr("font-style", "italic");
        }
        self.w.attr("style", "white-space:pre;");
        match (font.underline, font.strikeout) {
            (true, true) => self.w.attr("text-decoration", "underline line-through"),
            (true, false) => self.w.attr("text-decoration", "underline"),
            (false, true) => self.w.attr("text-decoration", "line-through"),
            (false, false) => {}
        }
        if font.weight != 0 {
            self.w.attr("font-weight", &font.weight.to_string());
        }
        let anchor = if align & TA_CENTER == TA_CENTER {
            "middle"
        } else if align & TA_RIGHT != 0 {
            "end"
        } else {
            "start"
        };
        self.w.attr("text-anchor", anchor);
        self.w.attr_num("x", org.x);
        self.w.attr_num("y", y);
        if size > 0.0 {
            self.w.attr_num("font-size", size);
        }
        self.clip_attr();
        self.w.trim_trailing_space();
        self.w.raw(">");
        self.w.raw(&cdata(text));
        self.w.close("text");
        self.w.raw("\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("a\u{1}b\tc\0dropped".chars()), "a b\tc");
    }
}
