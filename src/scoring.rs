use rand::{seq::SliceRandom, Rng};

use crate::models::Target;

pub const MISS_PENALTY: u32 = 50;
pub const TIME_BONUS_PER_SECOND: u32 = 10;

/// Score after finding one target.
pub fn on_hit(current_score: u32, points_per_target: u32) -> u32 {
    current_score.saturating_add(points_per_target)
}

/// Score after a miss. Never drops below zero.
pub fn on_miss(current_score: u32, penalty: u32) -> u32 {
    current_score.saturating_sub(penalty)
}

/// Score after clearing the board with `remaining_secs` left on the clock.
pub fn on_win(current_score: u32, remaining_secs: u32, bonus_per_second: u32) -> u32 {
    current_score.saturating_add(remaining_secs.saturating_mul(bonus_per_second))
}

/// Uniformly picks one of the targets that are still hidden.
pub fn pick_hint<'a, R>(targets: &'a [Target], rng: &mut R) -> Option<&'a Target>
where
    R: Rng + ?Sized,
{
    let unfound: Vec<&Target> = targets.iter().filter(|target| !target.found).collect();
    unfound.choose(rng).copied()
}
