//! Scoreboard region geometry.
//!
//! Regions are defined once against a 1920x1080 reference frame and scaled
//! to whatever resolution the incoming stream actually has. Scaling is a
//! pure per-axis multiply with truncation to integer pixels.

use serde::{Deserialize, Serialize};

/// Width of the reference frame the region rectangles are defined against.
pub const REFERENCE_WIDTH: u32 = 1920;
/// Height of the reference frame the region rectangles are defined against.
pub const REFERENCE_HEIGHT: u32 = 1080;

/// A rectangle in reference-resolution pixel coordinates (x1, y1) .. (x2, y2).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRect {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl RegionRect {
    pub const fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// True when the rectangle has positive area and non-negative origin.
    pub fn is_well_formed(&self) -> bool {
        self.x1 >= 0 && self.y1 >= 0 && self.x2 > self.x1 && self.y2 > self.y1
    }

    /// Scales each coordinate independently and truncates to integer pixels.
    ///
    /// There is no error condition here: a rectangle that lands outside a
    /// small frame produces a degenerate crop, which the preprocessor
    /// reports as an empty region.
    pub fn scale(&self, scale_x: f64, scale_y: f64) -> ScaledRegion {
        ScaledRegion {
            x1: (self.x1 as f64 * scale_x) as i64,
            y1: (self.y1 as f64 * scale_y) as i64,
            x2: (self.x2 as f64 * scale_x) as i64,
            y2: (self.y2 as f64 * scale_y) as i64,
        }
    }
}

/// A region rectangle mapped into the current frame's pixel grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScaledRegion {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

/// The four scoreboard field rectangles, in reference coordinates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RegionSet {
    pub score1: RegionRect,
    pub score2: RegionRect,
    pub clock: RegionRect,
    pub quarter: RegionRect,
}

impl Default for RegionSet {
    /// Rectangles for the standard national-broadcast scoreboard layout.
    fn default() -> Self {
        Self {
            score1: RegionRect::new(1518, 846, 1596, 896),
            score2: RegionRect::new(1706, 849, 1784, 899),
            clock: RegionRect::new(1568, 908, 1646, 958),
            quarter: RegionRect::new(1441, 918, 1517, 963),
        }
    }
}

impl RegionSet {
    pub fn is_well_formed(&self) -> bool {
        self.score1.is_well_formed()
            && self.score2.is_well_formed()
            && self.clock.is_well_formed()
            && self.quarter.is_well_formed()
    }

    /// Maps every rectangle to a frame of the given size.
    pub fn scale_to(&self, frame_width: u32, frame_height: u32) -> ScaledRegionSet {
        let scale_x = frame_width as f64 / REFERENCE_WIDTH as f64;
        let scale_y = frame_height as f64 / REFERENCE_HEIGHT as f64;
        ScaledRegionSet {
            score1: self.score1.scale(scale_x, scale_y),
            score2: self.score2.scale(scale_x, scale_y),
            clock: self.clock.scale(scale_x, scale_y),
            quarter: self.quarter.scale(scale_x, scale_y),
        }
    }
}

/// The four field rectangles in current-frame pixels.
#[derive(Clone, Copy, Debug)]
pub struct ScaledRegionSet {
    pub score1: ScaledRegion,
    pub score2: ScaledRegion,
    pub clock: ScaledRegion,
    pub quarter: ScaledRegion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_half_resolution() {
        let rect = RegionRect::new(1518, 846, 1596, 896);
        let scaled = rect.scale(0.5, 0.5);
        assert_eq!(scaled.x1, 759);
        assert_eq!(scaled.y1, 423);
        assert_eq!(scaled.x2, 798);
        assert_eq!(scaled.y2, 448);
    }

    #[test]
    fn test_scale_identity() {
        let rect = RegionRect::new(100, 200, 300, 400);
        let scaled = rect.scale(1.0, 1.0);
        assert_eq!((scaled.x1, scaled.y1, scaled.x2, scaled.y2), (100, 200, 300, 400));
    }

    #[test]
    fn test_scale_truncates() {
        // 0.7 * 15 = 10.5 -> 10, not rounded up
        let rect = RegionRect::new(15, 15, 25, 25);
        let scaled = rect.scale(0.7, 0.7);
        assert_eq!(scaled.x1, 10);
        assert_eq!(scaled.x2, 17); // 17.5 -> 17
    }

    #[test]
    fn test_scale_independent_axes() {
        let rect = RegionRect::new(100, 100, 200, 200);
        let scaled = rect.scale(0.5, 2.0);
        assert_eq!((scaled.x1, scaled.y1, scaled.x2, scaled.y2), (50, 200, 100, 400));
    }

    #[test]
    fn test_region_set_scale_to() {
        let set = RegionSet::default();
        let scaled = set.scale_to(960, 540);
        assert_eq!(scaled.score1.x1, 759);
        assert_eq!(scaled.score1.y1, 423);
        assert_eq!(scaled.score1.x2, 798);
        assert_eq!(scaled.score1.y2, 448);
    }

    #[test]
    fn test_well_formed() {
        assert!(RegionRect::new(0, 0, 1, 1).is_well_formed());
        assert!(!RegionRect::new(10, 10, 10, 20).is_well_formed());
        assert!(!RegionRect::new(10, 10, 5, 20).is_well_formed());
        assert!(!RegionRect::new(-1, 0, 5, 5).is_well_formed());
        assert!(RegionSet::default().is_well_formed());
    }
}
