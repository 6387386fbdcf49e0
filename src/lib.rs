//! Application shell for small embedded desktops
//!
//! Keeps the catalog of application kinds and their running instances,
//! presents instances as shortcuts and windows on a widget toolkit and
//! routes typed messages between connected instances.

pub mod app;
pub mod apps;
pub mod config;
pub mod domain;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{AppShell, ShellError, ShellState, UiEvent};
pub use config::{ShellConfig, TransitionPolicy};
pub use domain::connection::{ComType, Message};
pub use domain::descriptor::{AppDescriptor, AppMode, DataSizes};
pub use domain::instance::{AppInstance, InstanceId, Lifecycle};
pub use domain::registry::DescriptorId;
