use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, NormalizedPoint};

/// One hidden cat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub id: String,
    pub region: BoundingBox,
    /// Midpoint of `region`, computed once when the target is created.
    pub center: NormalizedPoint,
    pub found: bool,
}

impl Target {
    pub fn new(id: impl Into<String>, region: BoundingBox) -> Self {
        Self {
            id: id.into(),
            center: region.center(),
            region,
            found: false,
        }
    }

    /// Builds the session's target list in detection order (`cat-0`, `cat-1`, ...).
    pub fn from_boxes(boxes: &[BoundingBox]) -> Vec<Target> {
        boxes
            .iter()
            .enumerate()
            .map(|(index, region)| Target::new(format!("cat-{index}"), *region))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_detection_order() {
        let targets = Target::from_boxes(&[
            BoundingBox::new(0, 0, 10, 10),
            BoundingBox::new(20, 20, 40, 60),
        ]);
        assert_eq!(targets[0].id, "cat-0");
        assert_eq!(targets[1].id, "cat-1");
        assert_eq!(targets[1].center, NormalizedPoint::new(30.0, 40.0));
        assert!(targets.iter().all(|target| !target.found));
    }
}
