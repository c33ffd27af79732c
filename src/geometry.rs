//! Basic geometry types shared by the record handlers

/// A point in output (SVG) units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointD {
    pub x: f64,
    pub y: f64,
}

impl PointD {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, by: PointD) -> PointD {
        PointD::new(self.x + by.x, self.y + by.y)
    }
}

/// A point in logical units as stored in a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointL {
    pub x: i32,
    pub y: i32,
}

impl From<PointL> for PointD {
    fn from(p: PointL) -> Self {
        PointD::new(p.x as f64, p.y as f64)
    }
}

/// A logical rectangle, inclusive-exclusive as stored in records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RectL {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RectL {
    pub fn width(&self) -> f64 {
        self.right as f64 - self.left as f64
    }

    pub fn height(&self) -> f64 {
        self.bottom as f64 - self.top as f64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left as f64 + self.right as f64) / 2.0,
            (self.top as f64 + self.bottom as f64) / 2.0,
        )
    }
}

/// 2x3 affine matrix in GDI row-vector order: `x' = x*m11 + y*m21 + dx`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XForm {
    pub m11: f64,
    pub m12: f64,
    pub m21: f64,
    pub m22: f64,
    pub dx: f64,
    pub dy: f64,
}

impl Default for XForm {
    fn default() -> Self {
        Self::identity()
    }
}

impl XForm {
    pub fn identity() -> Self {
        Self {
            m11: 1.0,
            m12: 0.0,
            m21: 0.0,
            m22: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }

    pub fn new(m11: f64, m12: f64, m21: f64, m22: f64, dx: f64, dy: f64) -> Self {
        Self { m11, m12, m21, m22, dx, dy }
    }

    /// `self` applied first, then `other`.
    pub fn then(&self, other: &XForm) -> XForm {
        XForm {
            m11: self.m11 * other.m11 + self.m12 * other.m21,
            m12: self.m11 * other.m12 + self.m12 * other.m22,
            m21: self.m21 * other.m11 + self.m22 * other.m21,
            m22: self.m21 * other.m12 + self.m22 * other.m22,
            dx: self.dx * other.m11 + self.dy * other.m21 + other.dx,
            dy: self.dx * other.m12 + self.dy * other.m22 + other.dy,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.m11 + y * self.m21 + self.dx,
            x * self.m12 + y * self.m22 + self.dy,
        )
    }

    pub fn is_identity(&self) -> bool {
        *self == XForm::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_then() {
        let t = XForm::new(2.0, 0.0, 0.0, 3.0, 5.0, 7.0);
        assert_eq!(XForm::identity().then(&t), t);
        assert_eq!(t.then(&XForm::identity()), t);
    }

    #[test]
    fn test_then_order() {
        let scale = XForm::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = XForm::new(1.0, 0.0, 0.0, 1.0, 10.0, 0.0);
        // scale first, then shift
        assert_eq!(scale.then(&shift).apply(1.0, 1.0), (12.0, 2.0));
        // shift first, then scale
        assert_eq!(shift.then(&scale).apply(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn test_rect_dimensions() {
        let r = RectL { left: 10, top: 20, right: 110, bottom: 70 };
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 50.0);
        assert_eq!(r.center(), (60.0, 45.0));
    }
}
