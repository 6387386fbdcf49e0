//! Domain logic and core data structures
//!
//! This module contains the application model itself: descriptors,
//! instances, registries and the connection graph. Nothing here talks to
//! the toolkit directly.

pub mod connection;
pub mod core;
pub mod descriptor;
pub mod instance;
pub mod registry;
