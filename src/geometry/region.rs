use serde::{Deserialize, Serialize};

use super::NormalizedPoint;

/// Upper bound of the normalized scene scale.
pub const SCENE_SCALE: f64 = 1000.0;

/// Axis-aligned rectangle on the 0–1000 scene scale, as returned by detection.
///
/// Field order mirrors the detection payload (`ymin, xmin, ymax, xmax`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub ymin: i32,
    pub xmin: i32,
    pub ymax: i32,
    pub xmax: i32,
}

impl BoundingBox {
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
        }
    }

    /// `0 <= min < max <= 1000` on both axes.
    pub fn is_valid(&self) -> bool {
        let scale = SCENE_SCALE as i32;
        (0..scale).contains(&self.xmin)
            && (0..scale).contains(&self.ymin)
            && self.xmin < self.xmax
            && self.ymin < self.ymax
            && self.xmax <= scale
            && self.ymax <= scale
    }

    pub fn center(&self) -> NormalizedPoint {
        NormalizedPoint::new(
            f64::from(self.xmin + self.xmax) / 2.0,
            f64::from(self.ymin + self.ymax) / 2.0,
        )
    }

    /// Containment test against the box grown by `padding` on all four sides.
    /// Edges are inclusive.
    pub fn contains_padded(&self, point: NormalizedPoint, padding: f64) -> bool {
        point.x >= f64::from(self.xmin) - padding
            && point.x <= f64::from(self.xmax) + padding
            && point.y >= f64::from(self.ymin) - padding
            && point.y <= f64::from(self.ymax) + padding
    }
}
