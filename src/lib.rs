// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod answer;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod problem;
pub mod runtime;
pub mod scorer;
pub mod session;

pub use error::{ConfigurationError, ParseError};
pub use session::{Phase, RevealStep, ScoreResult, SessionController, Statistics};
