//! Application descriptor contract
//!
//! A descriptor describes one *kind* of installable application. The shell
//! keeps descriptors for its whole lifetime and drives them through the
//! lifecycle callbacks below; every running instance points back at the
//! descriptor it was started from.

use std::any::Any;

use bitflags::bitflags;

use crate::app::controller::{AppShell, ShellError};
use crate::domain::connection::Message;
use crate::domain::instance::InstanceId;
use crate::ui::toolkit::ElementId;

bitflags! {
    /// Per-kind presentation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AppMode: u8 {
        /// Keep the kind out of the application chooser
        const NOT_LISTED = 0x01;
        /// Create shortcuts without a title label
        const NO_SHORTCUT_TITLE = 0x02;
    }
}

/// Sizes in bytes of the three private data blocks of an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataSizes {
    /// Allocated at run, freed at close
    pub app: usize,
    /// Allocated while a shortcut is open
    pub shortcut: usize,
    /// Allocated while a window is open
    pub window: usize,
}

impl DataSizes {
    pub fn new(app: usize, shortcut: usize, window: usize) -> Self {
        Self { app, shortcut, window }
    }
}

/// Behaviour of one application kind
///
/// Callbacks receive the shell itself so they can open shortcuts or windows,
/// touch their own data blocks and talk to the toolkit. Visual elements are
/// always created before the matching callback runs, so the handle passed in
/// is immediately usable.
pub trait AppDescriptor {
    /// Unique name, also the default instance name
    fn name(&self) -> &str;

    fn mode(&self) -> AppMode {
        AppMode::empty()
    }

    fn data_sizes(&self) -> DataSizes;

    /// Called once after the instance is registered and its app data exists
    ///
    /// `conf` is the caller supplied configuration, if any. Returning an
    /// error discards the instance without calling [`AppDescriptor::close`].
    fn run(
        &self,
        shell: &mut AppShell,
        app: InstanceId,
        conf: Option<&dyn Any>,
    ) -> Result<(), ShellError>;

    /// Called after the window, shortcut and connections are gone and
    /// before the app data block is released
    fn close(&self, _shell: &mut AppShell, _app: InstanceId) {}

    /// Populate the freshly created shortcut and its data block
    fn shortcut_open(
        &self,
        _shell: &mut AppShell,
        _app: InstanceId,
        _shortcut: ElementId,
    ) -> Result<(), ShellError> {
        Ok(())
    }

    /// Populate the freshly created window and its data block
    fn window_open(
        &self,
        _shell: &mut AppShell,
        _app: InstanceId,
        _window: ElementId,
    ) -> Result<(), ShellError> {
        Ok(())
    }

    /// Handle a message routed over a connection ending at `receiver`
    ///
    /// Kinds that do not consume messages keep the default no-op.
    fn receive(&self, _shell: &mut AppShell, _receiver: InstanceId, _message: &Message<'_>) {}
}
