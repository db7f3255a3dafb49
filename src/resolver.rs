use crate::geometry::NormalizedPoint;
use crate::models::Target;

/// Tolerance added on every side of a detected box, in scene units (7.5% of the scale).
/// Stylized cats often spill past the box detection drew around them.
pub const HIT_PADDING: f64 = 75.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Hit { target_id: String },
    Miss,
}

pub fn resolve_hit<'a, I>(point: NormalizedPoint, candidates: I) -> Resolution
where
    I: IntoIterator<Item = &'a Target>,
{
    resolve_hit_with_padding(point, candidates, HIT_PADDING)
}

/// Among candidates whose padded region contains `point`, picks the one whose
/// stored center is nearest. Exact distance ties go to the earliest candidate.
/// Found targets are skipped.
pub fn resolve_hit_with_padding<'a, I>(
    point: NormalizedPoint,
    candidates: I,
    padding: f64,
) -> Resolution
where
    I: IntoIterator<Item = &'a Target>,
{
    let mut best: Option<(&Target, f64)> = None;

    for target in candidates {
        if target.found || !target.region.contains_padded(point, padding) {
            continue;
        }
        let distance = point.distance_to(target.center);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((target, distance)),
        }
    }

    match best {
        Some((target, _)) => Resolution::Hit {
            target_id: target.id.clone(),
        },
        None => Resolution::Miss,
    }
}
