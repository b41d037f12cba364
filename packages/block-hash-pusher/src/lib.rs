//! Block Hash Pusher - Library interface
//!
//! Re-exports internal modules for use by the binary and integration tests.

pub mod backend;
pub mod config;
pub mod guard;
pub mod planner;
pub mod push;
pub mod registrar;

pub use backend::{EvmPushBackend, ParentReceipt, PushBackend};
pub use config::Config;
pub use push::{push, PushCall, PushOutcome, PushRequest};
