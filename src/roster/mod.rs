//! Team and roster model
//!
//! Ordered rosters with the captain at index 0, in-place substitution, and
//! snapshot serialization for persistence.

pub mod team;

pub use team::{PlayerSnapshot, Team, TeamSnapshot};
