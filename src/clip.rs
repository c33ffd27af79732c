//! Clip region combination
//!
//! Region arithmetic is delegated to a [`ClipService`]. Incoming regions are
//! flattened to line segments first, so a service only ever sees moves,
//! lines, arcs and closes.

use crate::path::Path;

/// Region combination mode as stored in clipping records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionOp {
    And,
    Or,
    Xor,
    Diff,
    Copy,
}

impl RegionOp {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => RegionOp::And,
            2 => RegionOp::Or,
            3 => RegionOp::Xor,
            4 => RegionOp::Diff,
            5 => RegionOp::Copy,
            _ => return None,
        })
    }
}

/// Combines the current clip region with an incoming one.
pub trait ClipService {
    /// `current` is `None` when no clip is active. Returns the new region.
    fn combine(&self, current: Option<&Path>, incoming: &Path, op: RegionOp) -> Path;
}

/// Default service: the incoming region replaces the current one for every
/// mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplaceClipper;

impl ClipService for ReplaceClipper {
    fn combine(&self, _current: Option<&Path>, incoming: &Path, _op: RegionOp) -> Path {
        incoming.clone()
    }
}

/// Flatten `incoming` and hand it to `service`.
pub fn mix(service: &dyn ClipService, current: Option<&Path>, incoming: &Path, op: RegionOp) -> Path {
    let flat = incoming.flatten();
    service.combine(current, &flat, op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::PointD;
    use crate::path::{Segment, SegmentKind};

    #[test]
    fn test_region_op_values() {
        assert_eq!(RegionOp::from_u32(1), Some(RegionOp::And));
        assert_eq!(RegionOp::from_u32(5), Some(RegionOp::Copy));
        assert_eq!(RegionOp::from_u32(0), None);
    }

    #[test]
    fn test_mix_flattens_and_replaces() {
        let current = Path::rectangle([
            PointD::new(0.0, 0.0),
            PointD::new(1.0, 0.0),
            PointD::new(1.0, 1.0),
            PointD::new(0.0, 1.0),
        ]);
        let mut incoming = Path::new();
        incoming.push(Segment::move_to(PointD::new(0.0, 0.0)));
        incoming.push(Segment::bezier_to(
            PointD::new(0.0, 50.0),
            PointD::new(50.0, 50.0),
            PointD::new(50.0, 0.0),
        ));
        let out = mix(&ReplaceClipper, Some(&current), &incoming, RegionOp::And);
        assert!(out.segments().iter().all(|s| s.kind != SegmentKind::Bezier));
        assert_eq!(out.segments()[0], Segment::move_to(PointD::new(0.0, 0.0)));
    }
}
