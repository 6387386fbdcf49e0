//! Configuration module for the application shell
//!
//! Holds the desktop geometry, the palette used to render style classes and
//! the transition policy that decides whether windows animate.

pub mod shell;

pub use shell::{ConfigError, Palette, Rgba, ShellConfig, TransitionPolicy};
