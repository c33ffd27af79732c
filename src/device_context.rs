//! Device context engine
//!
//! The current drawing attributes and the SAVEDC/RESTOREDC stack. A saved
//! context is a full value copy, so restoring never aliases live state.

use crate::error::{ConvertError, Result};
use crate::geometry::XForm;
use crate::path::Path;
use crate::transform::Mapping;

// Pen styles (low byte of the style field)
pub const PS_SOLID: u32 = 0;
pub const PS_DASH: u32 = 1;
pub const PS_DOT: u32 = 2;
pub const PS_DASHDOT: u32 = 3;
pub const PS_DASHDOTDOT: u32 = 4;
pub const PS_NULL: u32 = 5;
pub const PS_INSIDEFRAME: u32 = 6;
pub const PS_USERSTYLE: u32 = 7;
pub const PS_ALTERNATE: u32 = 8;
pub const PS_STYLE_MASK: u32 = 0x0000_000F;

pub const PS_ENDCAP_ROUND: u32 = 0x0000_0000;
pub const PS_ENDCAP_SQUARE: u32 = 0x0000_0100;
pub const PS_ENDCAP_FLAT: u32 = 0x0000_0200;
pub const PS_ENDCAP_MASK: u32 = 0x0000_0F00;

pub const PS_JOIN_ROUND: u32 = 0x0000_0000;
pub const PS_JOIN_BEVEL: u32 = 0x0000_1000;
pub const PS_JOIN_MITER: u32 = 0x0000_2000;
pub const PS_JOIN_MASK: u32 = 0x0000_F000;

pub const PS_COSMETIC: u32 = 0x0000_0000;
pub const PS_GEOMETRIC: u32 = 0x0001_0000;
pub const PS_TYPE_MASK: u32 = 0x000F_0000;

// Brush styles
pub const BS_SOLID: u32 = 0;
pub const BS_NULL: u32 = 1;
pub const BS_HATCHED: u32 = 2;
pub const BS_PATTERN: u32 = 3;
pub const BS_INDEXED: u32 = 4;
pub const BS_DIBPATTERN: u32 = 5;
pub const BS_DIBPATTERNPT: u32 = 6;
pub const BS_PATTERN8X8: u32 = 7;
pub const BS_DIBPATTERN8X8: u32 = 8;
pub const BS_MONOPATTERN: u32 = 9;

// Background modes
pub const TRANSPARENT: u32 = 1;
pub const OPAQUE: u32 = 2;

// Polygon fill modes
pub const ALTERNATE: u32 = 1;
pub const WINDING: u32 = 2;

// Arc directions as stored in SETARCDIRECTION
pub const AD_COUNTERCLOCKWISE: u32 = 1;
pub const AD_CLOCKWISE: u32 = 2;

// Stock objects
pub const STOCK_OBJECT: u32 = 0x8000_0000;
pub const WHITE_BRUSH: u32 = 0x8000_0000;
pub const LTGRAY_BRUSH: u32 = 0x8000_0001;
pub const GRAY_BRUSH: u32 = 0x8000_0002;
pub const DKGRAY_BRUSH: u32 = 0x8000_0003;
pub const BLACK_BRUSH: u32 = 0x8000_0004;
pub const NULL_BRUSH: u32 = 0x8000_0005;
pub const WHITE_PEN: u32 = 0x8000_0006;
pub const BLACK_PEN: u32 = 0x8000_0007;
pub const NULL_PEN: u32 = 0x8000_0008;

/// RGB colour. Records store it as a COLORREF (`0x00BBGGRR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 0xFF, g: 0xFF, b: 0xFF };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_colorref(value: u32) -> Self {
        Self {
            r: (value & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: ((value >> 16) & 0xFF) as u8,
        }
    }

    pub fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// `#RRGGBB`
    pub fn hex(&self) -> String {
        crate::svg_writer::color_hex(self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    /// Full pen style bitfield: style, end cap, join and pen type.
    pub style: u32,
    /// Width in logical units.
    pub width: f64,
    pub color: Color,
}

impl Default for Stroke {
    fn default() -> Self {
        Self { style: PS_SOLID, width: 1.0, color: Color::BLACK }
    }
}

impl Stroke {
    pub fn is_null(&self) -> bool {
        self.style & PS_STYLE_MASK == PS_NULL
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
    pub style: u32,
    pub color: Color,
    pub hatch: u32,
    /// Image library id for pattern brushes.
    pub pattern: u32,
}

impl Default for Fill {
    fn default() -> Self {
        Self { style: BS_SOLID, color: Color::WHITE, hatch: 0, pattern: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Font {
    /// Full face name, only present in the extended LOGFONT form.
    pub name: Option<String>,
    pub family: Option<String>,
    pub height: i32,
    pub width: i32,
    pub weight: i32,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    /// Tenths of a degree.
    pub escapement: i32,
    pub orientation: i32,
}

/// A clip region and the `clip-N` id under which it was emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRegion {
    pub path: Path,
    pub id: u32,
}

/// The active GDI drawing attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceContext {
    pub stroke: Stroke,
    pub fill: Fill,
    pub font: Font,
    pub bk_mode: u32,
    pub bk_color: Color,
    pub text_color: Color,
    pub text_align: u32,
    pub polyfill_mode: u32,
    pub stretch_mode: u32,
    pub rop2: u32,
    pub miter_limit: f64,
    /// `1` for clockwise, `-1` for counter-clockwise.
    pub arc_direction: i32,
    pub clip: Option<ClipRegion>,
    pub world_transform: XForm,
    pub mapping: Mapping,
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self {
            stroke: Stroke::default(),
            fill: Fill::default(),
            font: Font::default(),
            bk_mode: OPAQUE,
            bk_color: Color::WHITE,
            text_color: Color::BLACK,
            text_align: 0,
            polyfill_mode: ALTERNATE,
            stretch_mode: 0,
            rop2: 13,
            miter_limit: 10.0,
            arc_direction: -1,
            clip: None,
            world_transform: XForm::identity(),
            mapping: Mapping::default(),
        }
    }
}

impl DeviceContext {
    /// Id of the active clip region, 0 when none.
    pub fn clip_id(&self) -> u32 {
        self.clip.as_ref().map(|c| c.id).unwrap_or(0)
    }

    pub fn set_arc_direction(&mut self, direction: u32) {
        match direction {
            AD_CLOCKWISE => self.arc_direction = 1,
            AD_COUNTERCLOCKWISE => self.arc_direction = -1,
            _ => {}
        }
    }

    /// Apply a stock object. Returns false for stock handles that do not
    /// change drawing attributes (fonts, palettes, DC pen/brush).
    pub fn select_stock(&mut self, handle: u32) -> bool {
        let brush = |dc: &mut DeviceContext, level: u8| {
            dc.fill.color = Color::gray(level);
            dc.fill.style = BS_SOLID;
        };
        match handle {
            WHITE_BRUSH => brush(self, 0xFF),
            LTGRAY_BRUSH => brush(self, 0xC0),
            GRAY_BRUSH => brush(self, 0x80),
            DKGRAY_BRUSH => brush(self, 0x40),
            BLACK_BRUSH => brush(self, 0x00),
            NULL_BRUSH => self.fill.style = BS_NULL,
            WHITE_PEN => {
                self.stroke.color = Color::WHITE;
                self.stroke.style = PS_SOLID;
            }
            BLACK_PEN => {
                self.stroke.color = Color::BLACK;
                self.stroke.style = PS_SOLID;
            }
            NULL_PEN => self.stroke.style = PS_NULL,
            _ => return false,
        }
        true
    }
}

/// SAVEDC/RESTOREDC stack.
#[derive(Debug, Default)]
pub struct DcStack {
    saved: Vec<DeviceContext>,
}

impl DcStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }

    pub fn save(&mut self, dc: &DeviceContext) {
        self.saved.push(dc.clone());
    }

    /// Pop back to the `|relative|`-th saved context counted from the top.
    ///
    /// The restored entry and everything saved after it are discarded. A
    /// depth past the bottom of the stack fails and leaves the stack as is.
    pub fn restore(&mut self, relative: i32) -> Result<DeviceContext> {
        let back = relative.unsigned_abs() as usize;
        if back == 0 || back > self.saved.len() {
            return Err(ConvertError::bounds(format!(
                "RESTOREDC {} with {} saved contexts",
                relative,
                self.saved.len()
            )));
        }
        let index = self.saved.len() - back;
        let dc = self.saved[index].clone();
        self.saved.truncate(index);
        Ok(dc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorref_byte_order() {
        assert_eq!(Color::from_colorref(0x000000FF), Color::new(0xFF, 0, 0));
        assert_eq!(Color::from_colorref(0x00112233).hex(), "#332211");
    }

    #[test]
    fn test_save_restore_is_identity() {
        let mut dc = DeviceContext::default();
        dc.fill.color = Color::new(1, 2, 3);
        dc.font.family = Some("Arial".to_string());
        let before = dc.clone();
        let mut stack = DcStack::new();
        stack.save(&dc);
        dc.fill.color = Color::BLACK;
        dc.font.family = None;
        dc = stack.restore(-1).unwrap();
        assert_eq!(dc, before);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_restore_discards_newer_entries() {
        let mut stack = DcStack::new();
        let mut dc = DeviceContext::default();
        for mode in 1..=3 {
            dc.bk_mode = mode;
            stack.save(&dc);
        }
        let restored = stack.restore(-2).unwrap();
        assert_eq!(restored.bk_mode, 2);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_restore_too_deep_fails_without_change() {
        let mut stack = DcStack::new();
        stack.save(&DeviceContext::default());
        assert!(stack.restore(-2).is_err());
        assert!(stack.restore(0).is_err());
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_stock_objects() {
        let mut dc = DeviceContext::default();
        assert!(dc.select_stock(GRAY_BRUSH));
        assert_eq!(dc.fill.color, Color::gray(0x80));
        assert!(dc.select_stock(NULL_PEN));
        assert!(dc.stroke.is_null());
        assert!(!dc.select_stock(0x8000_000D));
    }
}
