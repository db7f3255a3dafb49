//! Pointer → scene coordinate mapping for an image rendered with
//! `object-fit: contain` semantics.
//!
//! The rendered image is the largest rectangle with the image's aspect ratio
//! that fits the container, centered. Whatever is left over on one axis is
//! blank margin (pillarbox bars left/right, letterbox bars top/bottom) and
//! pointer events landing there map to [`PointerMapping::OutOfBounds`].

use serde::{Deserialize, Serialize};

use super::region::SCENE_SCALE;

/// Point on the fixed 0–1000 scene scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: NormalizedPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The element's bounding rectangle in the same pixel space as pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// Where the image content actually lands inside the container,
/// in container-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedArea {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerMapping {
    Inside(NormalizedPoint),
    /// Pointer is in the blank margin or outside the container; callers
    /// treat this as neither a hit nor a miss.
    OutOfBounds,
}

impl PointerMapping {
    pub fn point(self) -> Option<NormalizedPoint> {
        match self {
            PointerMapping::Inside(point) => Some(point),
            PointerMapping::OutOfBounds => None,
        }
    }
}

/// Computes the contain-fit rectangle. Returns `None` for degenerate geometry.
pub fn fit_contain(
    container: &ContainerRect,
    natural_width: u32,
    natural_height: u32,
) -> Option<RenderedArea> {
    if natural_width == 0
        || natural_height == 0
        || !(container.width > 0.0)
        || !(container.height > 0.0)
    {
        return None;
    }

    let natural_ratio = f64::from(natural_width) / f64::from(natural_height);
    let display_ratio = container.width / container.height;

    let area = if display_ratio > natural_ratio {
        let height = container.height;
        let width = height * natural_ratio;
        RenderedArea {
            offset_x: (container.width - width) / 2.0,
            offset_y: 0.0,
            width,
            height,
        }
    } else {
        let width = container.width;
        let height = width / natural_ratio;
        RenderedArea {
            offset_x: 0.0,
            offset_y: (container.height - height) / 2.0,
            width,
            height,
        }
    };

    Some(area)
}

/// Recomputed from scratch on every call; nothing about the container is cached
/// because it may have been resized since the previous event.
pub fn map_pointer_to_scene(
    pointer_x: f64,
    pointer_y: f64,
    container: &ContainerRect,
    natural_width: u32,
    natural_height: u32,
) -> PointerMapping {
    let Some(area) = fit_contain(container, natural_width, natural_height) else {
        log::debug!(
            "ignoring pointer on degenerate geometry {container:?} ({natural_width}x{natural_height})"
        );
        return PointerMapping::OutOfBounds;
    };

    let local_x = pointer_x - container.left;
    let local_y = pointer_y - container.top;

    // Range checks are false for NaN, so non-finite pointers land here too.
    let inside_x = (area.offset_x..=area.offset_x + area.width).contains(&local_x);
    let inside_y = (area.offset_y..=area.offset_y + area.height).contains(&local_y);
    if !(inside_x && inside_y) {
        return PointerMapping::OutOfBounds;
    }

    let norm_x = (local_x - area.offset_x) / area.width * SCENE_SCALE;
    let norm_y = (local_y - area.offset_y) / area.height * SCENE_SCALE;

    PointerMapping::Inside(NormalizedPoint::new(
        norm_x.clamp(0.0, SCENE_SCALE),
        norm_y.clamp(0.0, SCENE_SCALE),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(point: NormalizedPoint, x: f64, y: f64) {
        assert!(
            (point.x - x).abs() < 1e-9 && (point.y - y).abs() < 1e-9,
            "expected ({x}, {y}), got {point:?}"
        );
    }

    #[test]
    fn wide_container_is_pillarboxed() {
        // 4:3 image in a 1000x300 box renders 400x300 with 300px bars each side.
        let rect = ContainerRect::new(0.0, 0.0, 1000.0, 300.0);
        let area = fit_contain(&rect, 800, 600).unwrap();
        assert_eq!(area.width, 400.0);
        assert_eq!(area.height, 300.0);
        assert_eq!(area.offset_x, 300.0);
        assert_eq!(area.offset_y, 0.0);
    }

    #[test]
    fn tall_container_is_letterboxed() {
        let rect = ContainerRect::new(0.0, 0.0, 400.0, 900.0);
        let area = fit_contain(&rect, 800, 600).unwrap();
        assert_eq!(area.width, 400.0);
        assert_eq!(area.height, 300.0);
        assert_eq!(area.offset_x, 0.0);
        assert_eq!(area.offset_y, 300.0);
    }

    #[test]
    fn center_of_rendered_image_maps_to_scene_center() {
        let rect = ContainerRect::new(20.0, 40.0, 1000.0, 300.0);
        let mapped = map_pointer_to_scene(520.0, 190.0, &rect, 800, 600);
        assert_close(mapped.point().unwrap(), 500.0, 500.0);
    }

    #[test]
    fn clicks_in_the_bars_are_out_of_bounds() {
        let rect = ContainerRect::new(0.0, 0.0, 1000.0, 300.0);
        assert_eq!(
            map_pointer_to_scene(150.0, 150.0, &rect, 800, 600),
            PointerMapping::OutOfBounds
        );
        assert_eq!(
            map_pointer_to_scene(701.0, 150.0, &rect, 800, 600),
            PointerMapping::OutOfBounds
        );

        let tall = ContainerRect::new(0.0, 0.0, 400.0, 900.0);
        assert_eq!(
            map_pointer_to_scene(200.0, 100.0, &tall, 800, 600),
            PointerMapping::OutOfBounds
        );
    }

    #[test]
    fn rendered_edges_are_inclusive() {
        let rect = ContainerRect::new(0.0, 0.0, 1000.0, 300.0);
        assert_close(
            map_pointer_to_scene(300.0, 0.0, &rect, 800, 600).point().unwrap(),
            0.0,
            0.0,
        );
        assert_close(
            map_pointer_to_scene(700.0, 300.0, &rect, 800, 600).point().unwrap(),
            1000.0,
            1000.0,
        );
    }

    #[test]
    fn non_finite_pointers_are_out_of_bounds() {
        let rect = ContainerRect::new(0.0, 0.0, 100.0, 100.0);
        for (x, y) in [
            (f64::NAN, 50.0),
            (50.0, f64::NAN),
            (f64::INFINITY, 50.0),
            (50.0, f64::NEG_INFINITY),
        ] {
            assert_eq!(
                map_pointer_to_scene(x, y, &rect, 10, 10),
                PointerMapping::OutOfBounds,
                "({x}, {y})"
            );
        }

        let drifting = ContainerRect::new(f64::NAN, 0.0, 100.0, 100.0);
        assert_eq!(
            map_pointer_to_scene(50.0, 50.0, &drifting, 10, 10),
            PointerMapping::OutOfBounds
        );
    }

    #[test]
    fn degenerate_geometry_never_maps() {
        let rect = ContainerRect::new(0.0, 0.0, 0.0, 300.0);
        assert_eq!(
            map_pointer_to_scene(0.0, 0.0, &rect, 800, 600),
            PointerMapping::OutOfBounds
        );
        let rect = ContainerRect::new(0.0, 0.0, 300.0, 300.0);
        assert_eq!(
            map_pointer_to_scene(10.0, 10.0, &rect, 0, 600),
            PointerMapping::OutOfBounds
        );
    }
}
