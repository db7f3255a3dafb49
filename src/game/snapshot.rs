use serde::Serialize;

use crate::{
    geometry::NormalizedPoint,
    models::{ArtStyle, Difficulty, Target},
    scheduler::Scheduler,
};

use super::state::{ClickFeedback, GameMachine, GamePhase, SessionToken};

/// Everything a presentation layer needs to draw one frame of the game.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub session: Option<SessionToken>,
    pub difficulty: Difficulty,
    pub style: ArtStyle,
    pub difficulty_label: &'static str,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,
    pub targets: Vec<Target>,
    pub found_count: usize,
    pub total_count: usize,
    pub score: u32,
    pub time_left: u32,
    pub time_label: String,
    pub low_time: bool,
    pub hints_left: u32,
    pub active_hint: Option<NormalizedPoint>,
    pub feedback: Option<ClickFeedback>,
    pub win_pending: bool,
    /// True once the board is finished; unfound cats may be outlined.
    pub board_revealed: bool,
    pub result_overlay_visible: bool,
    pub score_submitted: bool,
    pub error: Option<String>,
    pub plays_used: u32,
    pub plays_left: u32,
    pub upsell_visible: bool,
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            session: None,
            difficulty: Difficulty::default(),
            style: ArtStyle::default(),
            difficulty_label: Difficulty::default().label(),
            image_width: None,
            image_height: None,
            targets: Vec::new(),
            found_count: 0,
            total_count: 0,
            score: 0,
            time_left: 0,
            time_label: format_clock(0),
            low_time: false,
            hints_left: 0,
            active_hint: None,
            feedback: None,
            win_pending: false,
            board_revealed: false,
            result_overlay_visible: false,
            score_submitted: false,
            error: None,
            plays_used: 0,
            plays_left: 0,
            upsell_visible: false,
        }
    }
}

/// `m:ss`, e.g. `1:05`.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

impl<S: Scheduler> GameMachine<S> {
    pub fn snapshot(&self) -> GameSnapshot {
        let phase = self.phase();
        let time_left = self.time_left();
        GameSnapshot {
            phase,
            session: self.token(),
            difficulty: self.difficulty(),
            style: self.style(),
            difficulty_label: self.difficulty().label(),
            image_width: self.scene().map(|scene| scene.width),
            image_height: self.scene().map(|scene| scene.height),
            targets: self.targets().to_vec(),
            found_count: self.targets().iter().filter(|t| t.found).count(),
            total_count: self.targets().len(),
            score: self.score(),
            time_left,
            time_label: format_clock(time_left),
            low_time: phase == GamePhase::Playing
                && time_left < self.config().low_time_threshold_secs,
            hints_left: self.hints_left(),
            active_hint: self.active_hint(),
            feedback: self.feedback(),
            win_pending: self.is_win_pending(),
            board_revealed: phase.is_finished(),
            result_overlay_visible: self.result_overlay_visible(),
            score_submitted: self.score_submitted(),
            error: self.error_message().map(str::to_owned),
            plays_used: self.plays_used(),
            plays_left: self.plays_left(),
            upsell_visible: self.upsell_visible(),
        }
    }
}
