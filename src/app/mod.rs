//! Application orchestration layer
//!
//! This module owns the shell context, the connection-mode state machine
//! and the dispatch of toolkit events to shell operations.

pub mod controller;
pub mod events;
pub mod state;

pub use controller::{AppShell, ShellError};
pub use events::UiEvent;
pub use state::{ConnectingState, ShellState, StateEvent, StateMachine};
