use std::{fmt, time::Duration};

use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::GameConfig,
    error::{GameError, GameResult, RejectReason},
    geometry::{map_pointer_to_scene, BoundingBox, ContainerRect, NormalizedPoint, PointerMapping},
    models::{rank_entries, ArtStyle, Difficulty, DifficultyConfig, LeaderboardEntry, Target},
    provider::{validate_boxes, SceneImage},
    resolver::{resolve_hit_with_padding, Resolution},
    scheduler::{ManualScheduler, ScheduledTimer, Scheduler, TimerId, TimerKind},
    scoring,
    store::Persistence,
};

const ENABLE_LOGS: bool = true;

use crate::{session_debug, session_info, session_warn};

/// Identity of one started session. Provider results and timers carry the
/// token they were issued for and are dropped if it is no longer current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    #[default]
    Idle,
    Generating,
    Analyzing,
    Playing,
    Won,
    Lost,
    Error,
    Leaderboard,
}

impl GamePhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::Lost)
    }

    fn can_start(&self) -> bool {
        matches!(
            self,
            GamePhase::Idle | GamePhase::Error | GamePhase::Won | GamePhase::Lost
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FeedbackKind {
    Hit,
    Miss { penalty: u32 },
}

/// Transient marker where the last pointer landed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickFeedback {
    pub point: NormalizedPoint,
    pub kind: FeedbackKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointerOutcome {
    /// Not playing, a win is pending, or the pointer hit the blank margin.
    Ignored,
    Hit {
        target_id: String,
        score: u32,
        board_cleared: bool,
    },
    Miss {
        score: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Ignored,
    Running { time_left: u32 },
    Expired,
}

#[derive(Debug, Default)]
struct ArmedTimers {
    countdown: Option<TimerId>,
    hint: Option<TimerId>,
    feedback: Option<TimerId>,
    win: Option<TimerId>,
    reveal: Option<TimerId>,
}

impl ArmedTimers {
    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerId> {
        match kind {
            TimerKind::CountdownTick => &mut self.countdown,
            TimerKind::HintExpiry => &mut self.hint,
            TimerKind::FeedbackClear => &mut self.feedback,
            TimerKind::WinTransition => &mut self.win,
            TimerKind::ResultReveal => &mut self.reveal,
        }
    }

    fn drain(&mut self) -> impl Iterator<Item = TimerId> {
        [
            self.countdown.take(),
            self.hint.take(),
            self.feedback.take(),
            self.win.take(),
            self.reveal.take(),
        ]
        .into_iter()
        .flatten()
    }
}

/// The session state machine. Synchronous and free of I/O except for the
/// injected [`Persistence`]; every delayed effect goes through `S`.
pub struct GameMachine<S: Scheduler> {
    config: GameConfig,
    store: Persistence,
    scheduler: S,
    rng: StdRng,
    timers: ArmedTimers,

    phase: GamePhase,
    difficulty: Difficulty,
    style: ArtStyle,
    token: Option<SessionToken>,
    scene: Option<SceneImage>,
    targets: Vec<Target>,
    score: u32,
    time_left: u32,
    hints_left: u32,
    active_hint: Option<NormalizedPoint>,
    feedback: Option<ClickFeedback>,
    error_message: Option<String>,
    win_pending: bool,
    result_overlay_visible: bool,
    score_submitted: bool,
    upsell_visible: bool,
}

impl<S: Scheduler> GameMachine<S> {
    pub fn new(config: GameConfig, store: Persistence, scheduler: S) -> Self {
        Self::with_rng(config, store, scheduler, StdRng::from_entropy())
    }

    pub fn with_rng(
        mut config: GameConfig,
        store: Persistence,
        scheduler: S,
        rng: StdRng,
    ) -> Self {
        config.sanitize();
        let upsell_visible = store.play_count() >= config.free_games;
        Self {
            config,
            store,
            scheduler,
            rng,
            timers: ArmedTimers::default(),
            phase: GamePhase::Idle,
            difficulty: Difficulty::default(),
            style: ArtStyle::default(),
            token: None,
            scene: None,
            targets: Vec::new(),
            score: 0,
            time_left: 0,
            hints_left: 0,
            active_hint: None,
            feedback: None,
            error_message: None,
            win_pending: false,
            result_overlay_visible: false,
            score_submitted: false,
            upsell_visible,
        }
    }

    /// Starts a new session if the phase allows it and the free-play quota is
    /// not used up. The play counter is bumped on acceptance, before the
    /// scene even exists.
    pub fn start_session(
        &mut self,
        difficulty: Difficulty,
        style: ArtStyle,
    ) -> GameResult<SessionToken> {
        if !self.phase.can_start() {
            return Err(RejectReason::InvalidPhase {
                phase: self.phase,
                action: "start a game",
            }
            .into());
        }

        let played = self.store.play_count();
        let quota = self.config.free_games;
        if played >= quota {
            self.upsell_visible = true;
            log::warn!("Start rejected: {played}/{quota} free games used");
            return Err(RejectReason::QuotaExhausted { played, quota }.into());
        }

        self.clear_session();

        let token = SessionToken::new();
        let settings = difficulty.config();
        self.token = Some(token);
        self.difficulty = difficulty;
        self.style = style;
        self.hints_left = settings.hints;
        self.time_left = settings.time_limit_secs;
        self.phase = GamePhase::Generating;
        self.store.set_play_count(played + 1);

        session_info!(
            token,
            "started {difficulty} / {style:?} (game {} of {quota})",
            played + 1
        );
        Ok(token)
    }

    /// Applies the image provider's result. Stale tokens are rejected with
    /// [`GameError::Superseded`] and leave the machine untouched.
    pub fn image_ready(
        &mut self,
        token: SessionToken,
        result: Result<SceneImage, GameError>,
    ) -> GameResult<()> {
        self.ensure_current(token, GamePhase::Generating)?;

        match result {
            Ok(scene) => {
                session_info!(token, "scene ready ({}x{})", scene.width, scene.height);
                self.scene = Some(scene);
                self.phase = GamePhase::Analyzing;
                Ok(())
            }
            Err(err) => {
                self.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Applies the detection result and starts the countdown.
    /// Empty or malformed box lists fail the session like a provider error.
    pub fn targets_ready(
        &mut self,
        token: SessionToken,
        result: Result<Vec<BoundingBox>, GameError>,
    ) -> GameResult<usize> {
        self.ensure_current(token, GamePhase::Analyzing)?;

        let boxes = match result.and_then(|boxes| validate_boxes(&boxes).map(|_| boxes)) {
            Ok(boxes) => boxes,
            Err(err) => {
                self.fail(err.clone());
                return Err(err);
            }
        };

        let settings = self.difficulty_config();
        if boxes.len() != settings.expected_targets as usize {
            session_warn!(
                token,
                "detected {} cats, {} asked for",
                boxes.len(),
                settings.expected_targets
            );
        }

        self.targets = Target::from_boxes(&boxes);
        self.time_left = settings.time_limit_secs;
        self.phase = GamePhase::Playing;
        self.arm(TimerKind::CountdownTick, self.config.tick_interval());

        session_info!(
            token,
            "playing: {} cats, {}s on the clock",
            self.targets.len(),
            self.time_left
        );
        Ok(self.targets.len())
    }

    /// Drops the current session, whatever state it is in, and returns to Idle.
    /// The play counter is not touched.
    pub fn abandon(&mut self) {
        if let Some(token) = self.token {
            session_info!(token, "abandoned in {:?}", self.phase);
        }
        self.clear_session();
        self.phase = GamePhase::Idle;
    }

    /// Maps a raw pointer event through the current scene geometry and
    /// resolves it. Margin clicks are ignored, not missed.
    pub fn handle_pointer(
        &mut self,
        pointer_x: f64,
        pointer_y: f64,
        container: &ContainerRect,
    ) -> PointerOutcome {
        if !self.accepts_pointer() {
            return PointerOutcome::Ignored;
        }
        let Some(scene) = &self.scene else {
            return PointerOutcome::Ignored;
        };

        match map_pointer_to_scene(pointer_x, pointer_y, container, scene.width, scene.height) {
            PointerMapping::Inside(point) => self.apply_point(point),
            PointerMapping::OutOfBounds => PointerOutcome::Ignored,
        }
    }

    /// Resolves an already-normalized point against the unfound targets.
    pub fn apply_point(&mut self, point: NormalizedPoint) -> PointerOutcome {
        if !self.accepts_pointer() {
            return PointerOutcome::Ignored;
        }

        match resolve_hit_with_padding(point, self.targets.iter(), self.config.hit_padding) {
            Resolution::Hit { target_id } => self.register_hit(target_id, point),
            Resolution::Miss => self.register_miss(point),
        }
    }

    fn register_hit(&mut self, target_id: String, point: NormalizedPoint) -> PointerOutcome {
        let token = self.current_token();
        if let Some(target) = self.targets.iter_mut().find(|t| t.id == target_id) {
            target.found = true;
        }
        self.score = scoring::on_hit(self.score, self.difficulty_config().points_per_target);
        self.show_feedback(point, FeedbackKind::Hit);

        let board_cleared = self.targets.iter().all(|target| target.found);
        session_debug!(token, "hit {target_id}, score {}", self.score);

        if board_cleared {
            // The final hit wins even if the clock is about to run out.
            self.disarm(TimerKind::CountdownTick);
            self.score = scoring::on_win(
                self.score,
                self.time_left,
                self.config.time_bonus_per_second,
            );
            self.win_pending = true;
            session_info!(
                token,
                "board cleared with {}s left, final score {}",
                self.time_left,
                self.score
            );

            let delay = self.config.win_delay();
            if delay.is_zero() {
                self.complete_win();
            } else {
                self.arm(TimerKind::WinTransition, delay);
            }
        }

        PointerOutcome::Hit {
            target_id,
            score: self.score,
            board_cleared,
        }
    }

    fn register_miss(&mut self, point: NormalizedPoint) -> PointerOutcome {
        let penalty = self.config.miss_penalty;
        self.score = scoring::on_miss(self.score, penalty);
        self.show_feedback(point, FeedbackKind::Miss { penalty });
        session_debug!(self.current_token(), "miss, score {}", self.score);
        PointerOutcome::Miss { score: self.score }
    }

    /// One countdown step. Reaching zero ends the session as Lost; further
    /// ticks are ignored.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != GamePhase::Playing || self.win_pending || self.time_left == 0 {
            return TickOutcome::Ignored;
        }

        self.time_left -= 1;
        if self.time_left == 0 {
            self.disarm(TimerKind::CountdownTick);
            self.phase = GamePhase::Lost;
            let found = self.targets.iter().filter(|t| t.found).count();
            session_info!(
                self.current_token(),
                "time up: {found}/{} found, score {}",
                self.targets.len(),
                self.score
            );
            self.enter_finished();
            return TickOutcome::Expired;
        }

        self.arm(TimerKind::CountdownTick, self.config.tick_interval());
        TickOutcome::Running {
            time_left: self.time_left,
        }
    }

    /// Reveals the center of a random unfound cat for a short while.
    /// Rejections leave the state unchanged.
    pub fn request_hint(&mut self) -> GameResult<NormalizedPoint> {
        if self.phase != GamePhase::Playing || self.win_pending {
            return Err(RejectReason::InvalidPhase {
                phase: self.phase,
                action: "use a hint",
            }
            .into());
        }
        if self.hints_left == 0 {
            return Err(RejectReason::NoHintsLeft.into());
        }

        let center = scoring::pick_hint(&self.targets, &mut self.rng)
            .map(|target| target.center)
            .ok_or(RejectReason::NothingToHint)?;

        self.active_hint = Some(center);
        self.hints_left -= 1;
        self.arm(TimerKind::HintExpiry, self.config.hint_duration());
        session_debug!(
            self.current_token(),
            "hint at ({:.0}, {:.0}), {} left",
            center.x,
            center.y,
            self.hints_left
        );
        Ok(center)
    }

    pub fn submit_score(&mut self, player_name: &str) -> GameResult<LeaderboardEntry> {
        if self.score_submitted {
            return Err(RejectReason::AlreadySubmitted.into());
        }
        if self.phase != GamePhase::Won {
            return Err(RejectReason::InvalidPhase {
                phase: self.phase,
                action: "submit a score",
            }
            .into());
        }
        let name = player_name.trim();
        if name.is_empty() {
            return Err(RejectReason::EmptyPlayerName.into());
        }

        let entry = LeaderboardEntry::new(name, self.score, self.difficulty.label(), Utc::now());
        self.store.append_leaderboard_entry(entry.clone());
        self.score_submitted = true;
        self.disarm(TimerKind::ResultReveal);
        self.result_overlay_visible = false;
        self.phase = GamePhase::Leaderboard;

        session_info!(self.current_token(), "{name} submitted {}", entry.score);
        Ok(entry)
    }

    pub fn open_leaderboard(&mut self) -> GameResult<()> {
        if !matches!(
            self.phase,
            GamePhase::Idle | GamePhase::Won | GamePhase::Lost | GamePhase::Error
        ) {
            return Err(RejectReason::InvalidPhase {
                phase: self.phase,
                action: "open the leaderboard",
            }
            .into());
        }
        self.disarm(TimerKind::ResultReveal);
        self.result_overlay_visible = false;
        self.phase = GamePhase::Leaderboard;
        Ok(())
    }

    /// Leaving the leaderboard abandons whatever session was behind it.
    pub fn close_leaderboard(&mut self) -> GameResult<()> {
        if self.phase != GamePhase::Leaderboard {
            return Err(RejectReason::InvalidPhase {
                phase: self.phase,
                action: "close the leaderboard",
            }
            .into());
        }
        self.abandon();
        Ok(())
    }

    /// Lets the player hide the summary to inspect the board, and bring it back.
    pub fn set_result_overlay(&mut self, visible: bool) -> GameResult<()> {
        if !self.phase.is_finished() {
            return Err(RejectReason::InvalidPhase {
                phase: self.phase,
                action: "toggle the result overlay",
            }
            .into());
        }
        self.disarm(TimerKind::ResultReveal);
        self.result_overlay_visible = visible;
        Ok(())
    }

    pub fn dismiss_upsell(&mut self) {
        self.upsell_visible = false;
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        rank_entries(&self.store.leaderboard())
    }

    /// Feeds a fired timer back in. Returns `false` when the timer belongs to
    /// a previous session or was re-armed/cancelled after it fired.
    pub fn handle_timer(&mut self, timer: ScheduledTimer) -> bool {
        self.scheduler.acknowledge(timer.id);

        if self.token != Some(timer.token) {
            session_debug!(timer.token, "dropping stale {:?}", timer.kind);
            return false;
        }
        let slot = self.timers.slot(timer.kind);
        if *slot != Some(timer.id) {
            session_debug!(timer.token, "dropping superseded {:?}", timer.kind);
            return false;
        }
        *slot = None;

        match timer.kind {
            TimerKind::CountdownTick => {
                self.tick();
            }
            TimerKind::HintExpiry => self.active_hint = None,
            TimerKind::FeedbackClear => self.feedback = None,
            TimerKind::WinTransition => self.complete_win(),
            TimerKind::ResultReveal => {
                if self.phase.is_finished() {
                    self.result_overlay_visible = true;
                }
            }
        }
        true
    }

    fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.disarm(kind);
        if let Some(token) = self.token {
            let id = self.scheduler.arm(delay, token, kind);
            *self.timers.slot(kind) = Some(id);
        }
    }

    fn disarm(&mut self, kind: TimerKind) {
        if let Some(id) = self.timers.slot(kind).take() {
            self.scheduler.cancel(id);
        }
    }

    fn disarm_all(&mut self) {
        let armed: Vec<TimerId> = self.timers.drain().collect();
        for id in armed {
            self.scheduler.cancel(id);
        }
    }

    fn ensure_current(&self, token: SessionToken, expected: GamePhase) -> GameResult<()> {
        if self.token != Some(token) || self.phase != expected {
            session_debug!(token, "discarding result, machine is in {:?}", self.phase);
            return Err(GameError::Superseded(token));
        }
        Ok(())
    }

    fn accepts_pointer(&self) -> bool {
        self.phase == GamePhase::Playing && !self.win_pending
    }

    fn complete_win(&mut self) {
        if !self.win_pending {
            return;
        }
        self.win_pending = false;
        self.phase = GamePhase::Won;
        self.enter_finished();
    }

    fn enter_finished(&mut self) {
        self.disarm(TimerKind::CountdownTick);
        self.result_overlay_visible = false;
        self.arm(TimerKind::ResultReveal, self.config.result_delay());
    }

    fn fail(&mut self, err: GameError) {
        if let Some(token) = self.token {
            session_warn!(token, "failed in {:?}: {err}", self.phase);
        }
        self.clear_session();
        self.error_message = Some(err.to_string());
        self.phase = GamePhase::Error;
    }

    fn show_feedback(&mut self, point: NormalizedPoint, kind: FeedbackKind) {
        self.feedback = Some(ClickFeedback { point, kind });
        self.arm(TimerKind::FeedbackClear, self.config.feedback_duration());
    }

    fn clear_session(&mut self) {
        self.disarm_all();
        self.token = None;
        self.scene = None;
        self.targets.clear();
        self.score = 0;
        self.time_left = 0;
        self.hints_left = 0;
        self.active_hint = None;
        self.feedback = None;
        self.error_message = None;
        self.win_pending = false;
        self.result_overlay_visible = false;
        self.score_submitted = false;
    }

    fn current_token(&self) -> SessionToken {
        // Only reached while a session is live.
        self.token.unwrap_or_default()
    }

    fn difficulty_config(&self) -> DifficultyConfig {
        self.difficulty.config()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.token
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn style(&self) -> ArtStyle {
        self.style
    }

    pub fn scene(&self) -> Option<&SceneImage> {
        self.scene.as_ref()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn hints_left(&self) -> u32 {
        self.hints_left
    }

    pub fn active_hint(&self) -> Option<NormalizedPoint> {
        self.active_hint
    }

    pub fn feedback(&self) -> Option<ClickFeedback> {
        self.feedback
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_win_pending(&self) -> bool {
        self.win_pending
    }

    pub fn result_overlay_visible(&self) -> bool {
        self.result_overlay_visible
    }

    pub fn score_submitted(&self) -> bool {
        self.score_submitted
    }

    pub fn upsell_visible(&self) -> bool {
        self.upsell_visible
    }

    pub fn plays_used(&self) -> u32 {
        self.store.play_count()
    }

    pub fn plays_left(&self) -> u32 {
        self.config.free_games.saturating_sub(self.plays_used())
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl GameMachine<ManualScheduler> {
    /// Moves virtual time forward, firing every timer that comes due in
    /// order, including ones armed by earlier timers in the same window.
    /// Returns how many fired timers were applied.
    pub fn advance(&mut self, by: Duration) -> usize {
        let deadline = self.scheduler.now() + by;
        let mut applied = 0;
        while let Some(timer) = self.scheduler.pop_due(deadline) {
            if self.handle_timer(timer) {
                applied += 1;
            }
        }
        self.scheduler.set_now(deadline);
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing_machine() -> (GameMachine<ManualScheduler>, SessionToken) {
        let mut machine = GameMachine::with_rng(
            GameConfig::default(),
            Persistence::in_memory(),
            ManualScheduler::new(),
            StdRng::seed_from_u64(1),
        );
        let token = machine
            .start_session(Difficulty::Easy, ArtStyle::Cartoon)
            .unwrap();
        let scene = SceneImage {
            bytes: Vec::<u8>::new().into(),
            width: 10,
            height: 10,
        };
        machine.image_ready(token, Ok(scene)).unwrap();
        machine
            .targets_ready(token, Ok(vec![BoundingBox::new(0, 0, 100, 100)]))
            .unwrap();
        (machine, token)
    }

    #[test]
    fn timers_from_other_sessions_are_dropped() {
        let (mut machine, _) = playing_machine();
        let foreign = ScheduledTimer {
            id: TimerId(1),
            token: SessionToken::new(),
            kind: TimerKind::CountdownTick,
        };
        assert!(!machine.handle_timer(foreign));
        assert_eq!(machine.time_left(), 90);
    }

    #[test]
    fn manual_tick_supersedes_the_armed_countdown() {
        let (mut machine, token) = playing_machine();
        let armed = machine.timers.countdown.unwrap();

        assert_eq!(machine.tick(), TickOutcome::Running { time_left: 89 });
        let stale = ScheduledTimer {
            id: armed,
            token,
            kind: TimerKind::CountdownTick,
        };
        assert!(!machine.handle_timer(stale));
        assert_eq!(machine.time_left(), 89);
        assert_eq!(machine.scheduler().pending_count(), 1);
    }

    #[test]
    fn token_display_is_compact() {
        let token = SessionToken::new();
        assert_eq!(token.to_string().len(), 32);
        assert!(!token.to_string().contains('-'));
    }
}
