use std::sync::{Arc, Weak};

use log::info;
use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
};

use crate::{
    config::GameConfig,
    error::{GameError, GameResult},
    geometry::ContainerRect,
    models::{ArtStyle, Difficulty, LeaderboardEntry},
    provider::{SceneImage, SceneProvider},
    scheduler::{ScheduledTimer, TokioScheduler},
    store::Persistence,
};

use super::{
    snapshot::GameSnapshot,
    state::{GameMachine, PointerOutcome, SessionToken},
};

const ENABLE_LOGS: bool = true;

use crate::{session_debug, session_info};

type SharedMachine = Arc<Mutex<GameMachine<TokioScheduler>>>;

/// Async front of [`GameMachine`]: runs provider calls, pumps real timers
/// into the machine and publishes a [`GameSnapshot`] after every change.
///
/// Cheap to clone. Must be created inside a tokio runtime.
pub struct GameController<P: SceneProvider> {
    machine: SharedMachine,
    provider: Arc<P>,
    snapshots: Arc<watch::Sender<GameSnapshot>>,
    timer_pump: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<P: SceneProvider> Clone for GameController<P> {
    fn clone(&self) -> Self {
        Self {
            machine: Arc::clone(&self.machine),
            provider: Arc::clone(&self.provider),
            snapshots: Arc::clone(&self.snapshots),
            timer_pump: Arc::clone(&self.timer_pump),
        }
    }
}

impl<P: SceneProvider> GameController<P> {
    pub fn new(config: GameConfig, store: Persistence, provider: P) -> Self {
        let (scheduler, fired) = TokioScheduler::new();
        let machine = GameMachine::new(config, store, scheduler);
        let (snapshots, _) = watch::channel(machine.snapshot());

        let machine = Arc::new(Mutex::new(machine));
        let snapshots = Arc::new(snapshots);
        let pump = tokio::spawn(pump_timers(
            Arc::downgrade(&machine),
            Arc::clone(&snapshots),
            fired,
        ));

        Self {
            machine,
            provider: Arc::new(provider),
            snapshots,
            timer_pump: Arc::new(Mutex::new(Some(pump))),
        }
    }

    /// Starts a session and drives it through generation and detection.
    ///
    /// Resolves once the board is playable or the session failed. If the
    /// session is abandoned or replaced while a provider call is in flight,
    /// the late result is dropped and `GameError::Superseded` is returned.
    pub async fn start_game(
        &self,
        difficulty: Difficulty,
        style: ArtStyle,
    ) -> GameResult<SessionToken> {
        let token = self
            .with_machine(|machine| machine.start_session(difficulty, style))
            .await?;
        session_info!(token, "requesting {} scene", style.label());

        let generated = self
            .provider
            .generate_image(difficulty, style)
            .await
            .map_err(|err| GameError::Generation(format!("{err:#}")))
            .and_then(SceneImage::decode);

        let image_bytes = match generated {
            Ok(scene) => {
                let bytes = Arc::clone(&scene.bytes);
                self.with_machine(|machine| machine.image_ready(token, Ok(scene)))
                    .await?;
                bytes
            }
            Err(err) => {
                self.with_machine(|machine| machine.image_ready(token, Err(err.clone())))
                    .await?;
                return Err(err);
            }
        };

        session_debug!(token, "asking for cat detection");
        let detected = self
            .provider
            .detect_objects(&image_bytes, difficulty, style)
            .await
            .map_err(|err| GameError::Detection(format!("{err:#}")));

        self.with_machine(|machine| machine.targets_ready(token, detected))
            .await?;
        Ok(token)
    }

    pub async fn pointer(&self, x: f64, y: f64, container: ContainerRect) -> PointerOutcome {
        self.with_machine(|machine| machine.handle_pointer(x, y, &container))
            .await
    }

    pub async fn request_hint(&self) -> GameResult<()> {
        self.with_machine(|machine| machine.request_hint().map(|_| ()))
            .await
    }

    pub async fn abandon(&self) {
        self.with_machine(|machine| machine.abandon()).await
    }

    pub async fn submit_score(&self, player_name: &str) -> GameResult<LeaderboardEntry> {
        self.with_machine(|machine| machine.submit_score(player_name))
            .await
    }

    pub async fn open_leaderboard(&self) -> GameResult<Vec<LeaderboardEntry>> {
        self.with_machine(|machine| -> GameResult<Vec<LeaderboardEntry>> {
            machine.open_leaderboard()?;
            Ok(machine.leaderboard())
        })
        .await
    }

    pub async fn close_leaderboard(&self) -> GameResult<()> {
        self.with_machine(|machine| machine.close_leaderboard())
            .await
    }

    pub async fn set_result_overlay(&self, visible: bool) -> GameResult<()> {
        self.with_machine(|machine| machine.set_result_overlay(visible))
            .await
    }

    pub async fn dismiss_upsell(&self) {
        self.with_machine(|machine| machine.dismiss_upsell()).await
    }

    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        self.machine.lock().await.leaderboard()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> GameSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GameSnapshot> {
        self.snapshots.subscribe()
    }

    /// Abandons any live session and stops delivering timers.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.timer_pump.lock().await.take() {
            handle.abort();
        }
        self.abandon().await;
        info!("Game controller shut down");
    }

    async fn with_machine<T>(
        &self,
        apply: impl FnOnce(&mut GameMachine<TokioScheduler>) -> T,
    ) -> T {
        let mut machine = self.machine.lock().await;
        let result = apply(&mut *machine);
        self.snapshots.send_replace(machine.snapshot());
        result
    }
}

async fn pump_timers(
    machine: Weak<Mutex<GameMachine<TokioScheduler>>>,
    snapshots: Arc<watch::Sender<GameSnapshot>>,
    mut fired: mpsc::UnboundedReceiver<ScheduledTimer>,
) {
    while let Some(timer) = fired.recv().await {
        let Some(shared) = machine.upgrade() else {
            break;
        };
        let mut guard = shared.lock().await;
        if guard.handle_timer(timer) {
            snapshots.send_replace(guard.snapshot());
        }
    }
}
