//! Plugin event dispatch
//!
//! Match lifecycle notifications are decoupled from plugin implementations:
//! the bus broadcasts enumerated events to every registered plugin that
//! subscribes to them, isolating each plugin's failures from the match and
//! from the other plugins.

pub mod audio;
pub mod bus;
pub mod event;
pub mod logger;

pub use audio::{AudioPlugin, TeamAudioWorker};
pub use bus::{MatchPlugin, PluginBus};
pub use event::{EventKind, MatchEvent};
pub use logger::EventLogger;
