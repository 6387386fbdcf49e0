//! Desktop presentation
//!
//! The toolkit seam, desktop assembly on top of it, shortcut layout and
//! software rendering of desktop snapshots.

pub mod desktop;
pub mod layout;
pub mod renderer;
pub mod toolkit;

pub use desktop::{Desktop, ElementOwner, ShortcutElements, WindowControl};
pub use renderer::{DesktopRenderer, RendererError, Scene, SceneItem};
pub use toolkit::{
    Animation, AnimationId, ElementId, ElementKind, HeadlessToolkit, Property, StyleClass, Toolkit,
};
