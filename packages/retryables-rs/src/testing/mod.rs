//! Testing Utilities Module
//!
//! Helpers for tests of crates built on top of this one: fixture messages and
//! receipt logs, plus common assertions on gas parameters.
//!
//! ## Submodules
//!
//! - `fixtures` - Sample networks, messages and bridge logs
//! - `assertions` - Common test assertions

pub mod assertions;
pub mod fixtures;

// Re-export commonly used items
pub use assertions::*;
pub use fixtures::*;
