use std::{sync::Arc, time::Duration};

use cat_hideouts::{
    error::{GameError, RejectReason},
    game::{FeedbackKind, TickOutcome},
    geometry::{BoundingBox, ContainerRect, NormalizedPoint},
    provider::SceneImage,
    scheduler::{ManualScheduler, TimerKind},
    store::{JsonFileBackend, Persistence},
    ArtStyle, Difficulty, GameConfig, GameMachine, GamePhase, PointerOutcome, SessionToken,
};
use rand::{rngs::StdRng, SeedableRng};

type Machine = GameMachine<ManualScheduler>;

fn machine_with(config: GameConfig, store: Persistence) -> Machine {
    GameMachine::with_rng(config, store, ManualScheduler::new(), StdRng::seed_from_u64(7))
}

fn machine() -> (Machine, Persistence) {
    let store = Persistence::in_memory();
    (machine_with(GameConfig::default(), store.clone()), store)
}

fn square_scene() -> SceneImage {
    SceneImage {
        bytes: Arc::from(Vec::new()),
        width: 1000,
        height: 1000,
    }
}

/// `count` 50×50 boxes spaced far enough apart that padded regions never overlap.
fn spread_boxes(count: usize) -> Vec<BoundingBox> {
    (0..count)
        .map(|index| {
            let x = (index % 5) as i32 * 200;
            let y = (index / 5) as i32 * 300;
            BoundingBox::new(x, y, x + 50, y + 50)
        })
        .collect()
}

fn start_playing(machine: &mut Machine, difficulty: Difficulty, boxes: Vec<BoundingBox>) -> SessionToken {
    let token = machine.start_session(difficulty, ArtStyle::Cartoon).unwrap();
    machine.image_ready(token, Ok(square_scene())).unwrap();
    machine.targets_ready(token, Ok(boxes)).unwrap();
    assert_eq!(machine.phase(), GamePhase::Playing);
    token
}

fn find_all(machine: &mut Machine) {
    let centers: Vec<NormalizedPoint> = machine.targets().iter().map(|t| t.center).collect();
    for center in centers {
        assert!(matches!(machine.apply_point(center), PointerOutcome::Hit { .. }));
    }
}

#[test]
fn easy_clear_with_forty_seconds_left_scores_1100() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    assert_eq!(machine.time_left(), 90);
    assert_eq!(machine.hints_left(), 3);

    machine.advance(Duration::from_secs(50));
    assert_eq!(machine.time_left(), 40);

    find_all(&mut machine);
    assert_eq!(machine.score(), 1100);

    machine.advance(Duration::from_millis(500));
    assert_eq!(machine.phase(), GamePhase::Won);
    assert_eq!(machine.score(), 1100);
}

#[test]
fn final_hit_updates_board_before_deferred_win() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    machine.advance(Duration::from_secs(10));

    find_all(&mut machine);
    assert!(machine.targets().iter().all(|t| t.found));
    assert_eq!(machine.score(), 700 + 80 * 10);
    assert_eq!(machine.phase(), GamePhase::Playing);
    assert!(machine.is_win_pending());
    assert!(!machine.scheduler().is_armed(TimerKind::CountdownTick));

    // Input is frozen while the win is pending.
    assert_eq!(
        machine.apply_point(NormalizedPoint::new(950.0, 950.0)),
        PointerOutcome::Ignored
    );
    assert!(machine.request_hint().is_err());

    machine.advance(Duration::from_millis(499));
    assert_eq!(machine.phase(), GamePhase::Playing);
    machine.advance(Duration::from_millis(1));
    assert_eq!(machine.phase(), GamePhase::Won);
    assert_eq!(machine.time_left(), 80);
}

#[test]
fn last_hit_beats_the_final_tick() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    machine.advance(Duration::from_secs(89));
    assert_eq!(machine.time_left(), 1);

    find_all(&mut machine);
    machine.advance(Duration::from_secs(2));

    assert_eq!(machine.phase(), GamePhase::Won);
    assert_eq!(machine.time_left(), 1);
    assert_eq!(machine.score(), 700 + 10);
}

#[test]
fn zero_win_delay_transitions_immediately() {
    let config = GameConfig {
        win_delay_ms: 0,
        ..GameConfig::default()
    };
    let mut machine = machine_with(config, Persistence::in_memory());
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(1));

    let outcome = machine.apply_point(machine.targets()[0].center);
    assert!(matches!(outcome, PointerOutcome::Hit { board_cleared: true, .. }));
    assert_eq!(machine.phase(), GamePhase::Won);
}

#[test]
fn shrinking_padding_never_turns_a_center_click_into_a_miss() {
    let config = GameConfig {
        hit_padding: -60.0,
        ..GameConfig::default()
    };
    let mut machine = machine_with(config, Persistence::in_memory());
    assert_eq!(machine.config().hit_padding, 75.0);
    start_playing(
        &mut machine,
        Difficulty::Easy,
        vec![BoundingBox::new(100, 100, 200, 200)],
    );

    let outcome = machine.apply_point(machine.targets()[0].center);
    assert!(matches!(outcome, PointerOutcome::Hit { board_cleared: true, .. }));
}

#[test]
fn nan_pointer_costs_nothing() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    machine.apply_point(machine.targets()[0].center);
    let container = ContainerRect::new(0.0, 0.0, 1000.0, 1000.0);

    assert_eq!(
        machine.handle_pointer(f64::NAN, 500.0, &container),
        PointerOutcome::Ignored
    );
    assert_eq!(machine.score(), 100);
}

#[test]
fn medium_misses_floor_at_zero() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Medium, spread_boxes(10));

    let far_corner = NormalizedPoint::new(990.0, 990.0);
    assert_eq!(machine.apply_point(far_corner), PointerOutcome::Miss { score: 0 });
    assert_eq!(machine.apply_point(far_corner), PointerOutcome::Miss { score: 0 });
    assert_eq!(machine.score(), 0);

    let first = machine.targets()[0].center;
    machine.apply_point(first);
    assert_eq!(machine.score(), 200);
    machine.apply_point(far_corner);
    assert_eq!(machine.score(), 150);
}

#[test]
fn running_out_of_time_loses_exactly_once() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    let first = machine.targets()[0].center;
    machine.apply_point(first);

    machine.advance(Duration::from_secs(90));
    assert_eq!(machine.phase(), GamePhase::Lost);
    assert_eq!(machine.time_left(), 0);
    assert_eq!(machine.score(), 100);

    for _ in 0..5 {
        assert_eq!(machine.tick(), TickOutcome::Ignored);
    }
    assert_eq!(machine.phase(), GamePhase::Lost);
    assert!(!machine.scheduler().is_armed(TimerKind::CountdownTick));
    assert_eq!(
        machine.apply_point(machine.targets()[1].center),
        PointerOutcome::Ignored
    );
}

#[test]
fn result_overlay_reveals_after_delay() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    machine.advance(Duration::from_secs(90));
    assert!(!machine.result_overlay_visible());
    assert!(machine.snapshot().board_revealed);

    machine.advance(Duration::from_millis(2_499));
    assert!(!machine.result_overlay_visible());
    machine.advance(Duration::from_millis(1));
    assert!(machine.result_overlay_visible());

    machine.set_result_overlay(false).unwrap();
    assert!(!machine.result_overlay_visible());
    assert_eq!(machine.score(), 0);
    assert_eq!(machine.targets().len(), 7);
}

#[test]
fn quota_blocks_the_fourth_start() {
    let (mut machine, store) = machine();
    for _ in 0..3 {
        machine.start_session(Difficulty::Easy, ArtStyle::Sketch).unwrap();
        machine.abandon();
    }
    assert_eq!(store.play_count(), 3);
    assert!(!machine.upsell_visible());

    let err = machine
        .start_session(Difficulty::Easy, ArtStyle::Sketch)
        .unwrap_err();
    assert_eq!(
        err,
        GameError::InputRejected(RejectReason::QuotaExhausted { played: 3, quota: 3 })
    );
    assert_eq!(machine.phase(), GamePhase::Idle);
    assert_eq!(store.play_count(), 3);
    assert!(machine.upsell_visible());
    assert_eq!(machine.plays_left(), 0);

    machine.dismiss_upsell();
    assert!(!machine.upsell_visible());
}

#[test]
fn exhausted_quota_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    {
        let store = Persistence::new(JsonFileBackend::new(path.clone()).unwrap());
        let mut machine = machine_with(GameConfig::default(), store);
        for _ in 0..3 {
            machine.start_session(Difficulty::Hard, ArtStyle::Abstract).unwrap();
            machine.abandon();
        }
    }

    let store = Persistence::new(JsonFileBackend::new(path).unwrap());
    let mut machine = machine_with(GameConfig::default(), store);
    assert!(machine.upsell_visible());
    assert!(machine
        .start_session(Difficulty::Easy, ArtStyle::Minecraft)
        .is_err());
}

#[test]
fn hints_reveal_unfound_cats_until_spent() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    find_first(&mut machine, 6);

    let hint = machine.request_hint().unwrap();
    assert_eq!(hint, machine.targets()[6].center);
    assert_eq!(machine.active_hint(), Some(hint));
    assert_eq!(machine.hints_left(), 2);

    machine.advance(Duration::from_millis(1_999));
    assert_eq!(machine.active_hint(), Some(hint));
    machine.advance(Duration::from_millis(1));
    assert_eq!(machine.active_hint(), None);

    machine.request_hint().unwrap();
    machine.request_hint().unwrap();
    let before = machine.snapshot();
    assert_eq!(
        machine.request_hint(),
        Err(GameError::InputRejected(RejectReason::NoHintsLeft))
    );
    assert_eq!(machine.snapshot(), before);
}

fn find_first(machine: &mut Machine, count: usize) {
    let centers: Vec<NormalizedPoint> =
        machine.targets().iter().take(count).map(|t| t.center).collect();
    for center in centers {
        machine.apply_point(center);
    }
}

#[test]
fn hint_outside_play_is_rejected() {
    let (mut machine, _) = machine();
    assert!(matches!(
        machine.request_hint(),
        Err(GameError::InputRejected(RejectReason::InvalidPhase { .. }))
    ));
}

#[test]
fn feedback_marker_clears() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    let miss = NormalizedPoint::new(990.0, 990.0);
    machine.apply_point(miss);

    let feedback = machine.feedback().unwrap();
    assert_eq!(feedback.point, miss);
    assert_eq!(feedback.kind, FeedbackKind::Miss { penalty: 50 });

    machine.advance(Duration::from_millis(600));
    assert!(machine.feedback().is_none());
}

#[test]
fn margin_clicks_are_neither_hit_nor_miss() {
    let (mut machine, _) = machine();
    let token = machine.start_session(Difficulty::Easy, ArtStyle::Realistic).unwrap();
    let wide = SceneImage {
        bytes: Arc::from(Vec::new()),
        width: 1000,
        height: 500,
    };
    machine.image_ready(token, Ok(wide)).unwrap();
    machine
        .targets_ready(token, Ok(vec![BoundingBox::new(450, 450, 550, 550)]))
        .unwrap();

    // 800×800 container, image rendered 800×400 with 200px letterbox bars.
    let container = ContainerRect::new(100.0, 50.0, 800.0, 800.0);
    assert_eq!(
        machine.handle_pointer(500.0, 100.0, &container),
        PointerOutcome::Ignored
    );
    assert_eq!(machine.score(), 0);
    assert!(machine.feedback().is_none());

    let outcome = machine.handle_pointer(500.0, 450.0, &container);
    assert!(matches!(outcome, PointerOutcome::Hit { board_cleared: true, .. }));
}

#[test]
fn stale_provider_results_are_discarded() {
    let (mut machine, _) = machine();
    let stale = machine.start_session(Difficulty::Easy, ArtStyle::Cartoon).unwrap();
    machine.abandon();

    assert_eq!(
        machine.image_ready(stale, Ok(square_scene())),
        Err(GameError::Superseded(stale))
    );
    assert_eq!(machine.phase(), GamePhase::Idle);

    let current = machine.start_session(Difficulty::Easy, ArtStyle::Cartoon).unwrap();
    assert_eq!(
        machine.image_ready(stale, Err(GameError::Generation("late".into()))),
        Err(GameError::Superseded(stale))
    );
    assert_eq!(machine.phase(), GamePhase::Generating);
    assert_eq!(machine.token(), Some(current));
}

#[test]
fn abandon_cancels_every_timer() {
    let (mut machine, store) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    machine.request_hint().unwrap();
    machine.apply_point(NormalizedPoint::new(990.0, 990.0));
    assert!(machine.scheduler().pending_count() >= 3);

    machine.abandon();
    assert_eq!(machine.scheduler().pending_count(), 0);
    assert_eq!(machine.phase(), GamePhase::Idle);
    assert!(machine.targets().is_empty());
    assert_eq!(machine.score(), 0);
    assert_eq!(machine.active_hint(), None);
    assert_eq!(store.play_count(), 1);

    assert_eq!(machine.advance(Duration::from_secs(120)), 0);
}

#[test]
fn provider_failures_end_in_error() {
    let (mut machine, _) = machine();
    let token = machine.start_session(Difficulty::Easy, ArtStyle::Cartoon).unwrap();
    let err = GameError::Generation("quota exceeded upstream".into());
    assert_eq!(machine.image_ready(token, Err(err.clone())), Err(err));
    assert_eq!(machine.phase(), GamePhase::Error);
    assert!(machine.error_message().unwrap().contains("quota exceeded upstream"));

    let token = machine.start_session(Difficulty::Easy, ArtStyle::Cartoon).unwrap();
    machine.image_ready(token, Ok(square_scene())).unwrap();
    let result = machine.targets_ready(token, Ok(Vec::new()));
    assert!(matches!(result, Err(GameError::Detection(_))));
    assert_eq!(machine.phase(), GamePhase::Error);
    assert_eq!(machine.scheduler().pending_count(), 0);
}

#[test]
fn detection_count_mismatch_still_plays() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Hard, spread_boxes(4));
    assert_eq!(machine.targets().len(), 4);
    assert_eq!(machine.time_left(), 180);
    assert_eq!(machine.hints_left(), 1);
}

#[test]
fn winning_score_goes_on_the_leaderboard() {
    let (mut machine, store) = machine();
    start_playing(&mut machine, Difficulty::Medium, spread_boxes(3));
    find_all(&mut machine);
    machine.advance(Duration::from_millis(500));
    assert_eq!(machine.phase(), GamePhase::Won);
    let final_score = machine.score();
    assert_eq!(final_score, 3 * 200 + 120 * 10);

    assert_eq!(
        machine.submit_score("   ").unwrap_err(),
        GameError::InputRejected(RejectReason::EmptyPlayerName)
    );

    let entry = machine.submit_score("  Mia ").unwrap();
    assert_eq!(entry.name, "Mia");
    assert_eq!(entry.score, final_score);
    assert_eq!(entry.difficulty, "Medium");
    assert_eq!(machine.phase(), GamePhase::Leaderboard);
    assert_eq!(
        machine.submit_score("Mia").unwrap_err(),
        GameError::InputRejected(RejectReason::AlreadySubmitted)
    );
    assert_eq!(store.leaderboard().len(), 1);

    machine.close_leaderboard().unwrap();
    assert_eq!(machine.phase(), GamePhase::Idle);
    assert_eq!(machine.leaderboard()[0].name, "Mia");
}

#[test]
fn lost_sessions_cannot_submit() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    machine.advance(Duration::from_secs(90));
    assert!(matches!(
        machine.submit_score("Mia"),
        Err(GameError::InputRejected(RejectReason::InvalidPhase { .. }))
    ));
}

#[test]
fn leaderboard_is_reachable_from_idle_but_not_mid_game() {
    let (mut machine, _) = machine();
    machine.open_leaderboard().unwrap();
    assert_eq!(machine.phase(), GamePhase::Leaderboard);
    machine.close_leaderboard().unwrap();

    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    assert!(machine.open_leaderboard().is_err());
    assert_eq!(machine.phase(), GamePhase::Playing);
}

#[test]
fn snapshot_flags_low_time() {
    let (mut machine, _) = machine();
    start_playing(&mut machine, Difficulty::Easy, spread_boxes(7));
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.time_label, "1:30");
    assert!(!snapshot.low_time);
    assert_eq!(snapshot.plays_left, 2);

    machine.advance(Duration::from_secs(76));
    let snapshot = machine.snapshot();
    assert_eq!(snapshot.time_label, "0:14");
    assert!(snapshot.low_time);
}
