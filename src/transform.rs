//! Logical to SVG coordinate mapping
//!
//! Points go through the map mode (window/viewport) and the page scale.
//! The world transform is not applied here: it is emitted as a
//! `<g transform="matrix(...)">` wrapper by the render pass.

use crate::geometry::{PointD, PointL};

/// GDI mapping modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapMode {
    #[default]
    Text,
    LoMetric,
    HiMetric,
    LoEnglish,
    HiEnglish,
    Twips,
    Isotropic,
    Anisotropic,
}

impl MapMode {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => MapMode::Text,
            2 => MapMode::LoMetric,
            3 => MapMode::HiMetric,
            4 => MapMode::LoEnglish,
            5 => MapMode::HiEnglish,
            6 => MapMode::Twips,
            7 => MapMode::Isotropic,
            8 => MapMode::Anisotropic,
            _ => return None,
        })
    }
}

/// Window or viewport origin and extent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extent {
    pub org_x: f64,
    pub org_y: f64,
    pub ext_x: f64,
    pub ext_y: f64,
}

/// The part of the device context that drives the logical mapping.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mapping {
    pub map_mode: MapMode,
    pub window: Extent,
    pub viewport: Extent,
}

/// Page-level values fixed by the header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    /// Output pixels per metafile device unit.
    pub scaling: f64,
    /// Device pixels per millimeter of the reference device.
    pub px_per_mm: f64,
}

impl Default for Page {
    fn default() -> Self {
        Self { scaling: 1.0, px_per_mm: 1.0 }
    }
}

impl Mapping {
    /// Per-axis factors and whether origins apply.
    fn factors(&self, page: &Page) -> (f64, f64, bool) {
        let mm = page.px_per_mm;
        match self.map_mode {
            MapMode::Text => (1.0, 1.0, false),
            MapMode::LoMetric => (mm * 0.1, -(mm * 0.1), false),
            MapMode::HiMetric => (mm * 0.01, -(mm * 0.01), false),
            MapMode::LoEnglish => (mm * 0.01 * 25.4, -(mm * 0.01 * 25.4), false),
            MapMode::HiEnglish => (mm * 0.001 * 25.4, -(mm * 0.001 * 25.4), false),
            MapMode::Twips => (mm / 1440.0 * 25.4, -(mm / 1440.0 * 25.4), false),
            MapMode::Isotropic => {
                let s = ratio(self.viewport.ext_x, self.window.ext_x);
                (s, s, true)
            }
            MapMode::Anisotropic => (
                ratio(self.viewport.ext_x, self.window.ext_x),
                ratio(self.viewport.ext_y, self.window.ext_y),
                true,
            ),
        }
    }

    /// Map a logical point to output units.
    pub fn point(&self, page: &Page, x: f64, y: f64) -> PointD {
        let (sx, sy, origins) = self.factors(page);
        let (px, py) = if origins {
            (
                (x - self.window.org_x) * sx + self.viewport.org_x,
                (y - self.window.org_y) * sy + self.viewport.org_y,
            )
        } else {
            (x * sx, y * sy)
        };
        PointD::new(px * page.scaling, py * page.scaling)
    }

    pub fn point_l(&self, page: &Page, pt: PointL) -> PointD {
        self.point(page, pt.x as f64, pt.y as f64)
    }

    /// Scale a horizontal length. No origin, no axis flip.
    pub fn scale_x(&self, page: &Page, v: f64) -> f64 {
        let (sx, _, _) = self.factors(page);
        v * sx.abs() * page.scaling
    }

    /// Scale a vertical length. Isotropic mode reuses the horizontal ratio.
    pub fn scale_y(&self, page: &Page, v: f64) -> f64 {
        let (_, sy, _) = self.factors(page);
        v * sy.abs() * page.scaling
    }

    /// Signed per-axis factors, page scale excluded.
    pub fn axis_factors(&self, page: &Page) -> (f64, f64) {
        let (sx, sy, _) = self.factors(page);
        (sx, sy)
    }

    /// Signed vertical factor; negative when the Y axis points up.
    pub fn y_direction(&self, page: &Page) -> f64 {
        let (_, sy, _) = self.factors(page);
        sy
    }
}

fn ratio(viewport: f64, window: f64) -> f64 {
    if window == 0.0 {
        1.0
    } else {
        viewport / window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(scaling: f64) -> Page {
        Page { scaling, px_per_mm: 4.0 }
    }

    #[test]
    fn test_text_mode_scales_only_by_page() {
        let m = Mapping::default();
        assert_eq!(m.point(&page(2.0), 10.0, 20.0), PointD::new(20.0, 40.0));
    }

    #[test]
    fn test_metric_mode_flips_y() {
        let m = Mapping { map_mode: MapMode::LoMetric, ..Default::default() };
        let p = m.point(&page(1.0), 100.0, 100.0);
        assert!((p.x - 40.0).abs() < 1e-9);
        assert!((p.y + 40.0).abs() < 1e-9);
        assert!((m.scale_y(&page(1.0), 100.0) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_anisotropic_uses_origins() {
        let m = Mapping {
            map_mode: MapMode::Anisotropic,
            window: Extent { org_x: 10.0, org_y: 10.0, ext_x: 100.0, ext_y: 50.0 },
            viewport: Extent { org_x: 5.0, org_y: 0.0, ext_x: 200.0, ext_y: 200.0 },
        };
        assert_eq!(m.point(&page(1.0), 20.0, 20.0), PointD::new(25.0, 40.0));
        assert_eq!(m.scale_x(&page(1.0), 10.0), 20.0);
    }

    #[test]
    fn test_isotropic_forces_equal_axes() {
        let m = Mapping {
            map_mode: MapMode::Isotropic,
            window: Extent { ext_x: 100.0, ext_y: 10.0, ..Default::default() },
            viewport: Extent { ext_x: 50.0, ext_y: 50.0, ..Default::default() },
        };
        assert_eq!(m.scale_x(&page(1.0), 10.0), m.scale_y(&page(1.0), 10.0));
    }

    #[test]
    fn test_zero_window_extent_does_not_divide() {
        let m = Mapping { map_mode: MapMode::Anisotropic, ..Default::default() };
        assert_eq!(m.point(&page(1.0), 3.0, 4.0), PointD::new(3.0, 4.0));
    }

    #[test]
    fn test_map_mode_from_u32() {
        assert_eq!(MapMode::from_u32(8), Some(MapMode::Anisotropic));
        assert_eq!(MapMode::from_u32(0), None);
    }
}
