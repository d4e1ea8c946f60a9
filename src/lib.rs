// Library surface for headless/integration tests and reuse.
// The terminal setup and CLI live in main.rs.
pub mod app;
pub mod app_dirs;
pub mod best_scores;
pub mod clock;
pub mod config;
pub mod error;
pub mod games;
pub mod history;
pub mod machine;
pub mod problem;
pub mod profile;
pub mod progression;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod summary;
pub mod ui;
pub mod util;

pub use clock::{Clock, Countdown, Expiry, Generation};
pub use machine::{NullSink, PresentationSink, RoundStateMachine};
pub use problem::ProblemSource;
pub use profile::{Difficulty, DifficultyProfile, GameKind, ScoringRules};
pub use session::{Outcome, SessionSnapshot, Status};
