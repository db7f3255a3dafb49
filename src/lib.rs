//! Engine for a "find the hidden cats" picture game.
//!
//! A session asks a [`SceneProvider`] for an illustration and the boxes of
//! the cats hidden in it, then resolves clicks against those boxes on a
//! fixed 0–1000 scene scale while a countdown runs. [`GameMachine`] holds the
//! rules and is fully synchronous; [`GameController`] drives it from tokio.

pub mod config;
pub mod error;
pub mod game;
pub mod geometry;
pub mod models;
pub mod provider;
pub mod resolver;
pub mod scheduler;
pub mod scoring;
pub mod store;
pub mod utils;

pub use config::GameConfig;
pub use error::{GameError, GameResult, RejectReason};
pub use game::{
    GameController, GameMachine, GamePhase, GameSnapshot, PointerOutcome, SessionToken,
};
pub use geometry::{BoundingBox, ContainerRect, NormalizedPoint, PointerMapping};
pub use models::{ArtStyle, Difficulty, LeaderboardEntry, Target};
pub use provider::{SceneImage, SceneProvider};
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler};
pub use store::{JsonFileBackend, KeyValueBackend, MemoryBackend, Persistence, SqliteBackend};
pub use utils::init_logging;
