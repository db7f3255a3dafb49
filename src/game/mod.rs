pub mod controller;
pub mod snapshot;
pub mod state;

pub use controller::GameController;
pub use snapshot::{format_clock, GameSnapshot};
pub use state::{
    ClickFeedback, FeedbackKind, GameMachine, GamePhase, PointerOutcome, SessionToken,
    TickOutcome,
};
