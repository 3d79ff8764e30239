//! Ready Room - Match session orchestration for competitive PUG lobbies
//!
//! This crate drives multiplayer match sessions through their negotiation
//! stages (captain pick, team draft, faction pick, base pick, readiness,
//! rounds, scoring), notifying independently-failing side-effect plugins at
//! each transition and arbitrating concurrent user interactions against
//! live prompts.

pub mod config;
pub mod error;
pub mod gating;
pub mod lobby;
pub mod plugins;
pub mod roster;
pub mod session;
pub mod storage;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{GateError, MatchError, Result};
pub use types::*;

// Re-export key components
pub use plugins::bus::PluginBus;
pub use roster::Team;
pub use session::{MatchInstance, MatchSession, MatchStage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
