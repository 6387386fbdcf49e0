//! Application shell and coordination layer
//!
//! The shell owns the descriptor and instance registries, the connection
//! graph, the connection-mode state and the desktop. Every lifecycle,
//! presentation and routing operation goes through it.

use std::any::Any;
use std::rc::Rc;

use thiserror::Error;
use tiny_skia::Pixmap;

use crate::app::state::{ShellState, StateEvent, StateMachine};
use crate::config::{ConfigError, ShellConfig};
use crate::domain::connection::{ComType, ConnectionGraph, Message};
use crate::domain::descriptor::{AppDescriptor, AppMode};
use crate::domain::instance::{
    AllocError, AppInstance, BlockKind, DataBlock, InstanceId, Lifecycle, ShortcutSlot, WindowSlot,
};
use crate::domain::registry::{DescriptorId, DescriptorRegistry, InstanceRegistry};
use crate::ui::desktop::Desktop;
use crate::ui::renderer::{DesktopRenderer, RendererError};
use crate::ui::toolkit::{ElementId, HeadlessToolkit, StyleClass, Toolkit};

/// Errors reported by shell operations
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Alloc(#[from] AllocError),

    #[error("no running instance {0}")]
    UnknownInstance(InstanceId),

    #[error("no application kind {0}")]
    UnknownDescriptor(DescriptorId),

    #[error("{0} has no open window")]
    NoWindow(InstanceId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RendererError),

    /// Failure reported by an application callback
    #[error("{name}: {reason}")]
    App { name: String, reason: String },
}

/// Main application shell
///
/// Single owner of all shell state. Descriptor callbacks receive `&mut
/// AppShell`, so the shell never holds a borrow across a callback.
pub struct AppShell {
    pub(super) descriptors: DescriptorRegistry,
    pub(super) instances: InstanceRegistry,
    pub(super) connections: ConnectionGraph,
    pub(super) state: ShellState,
    pub(super) desktop: Desktop,
}

impl AppShell {
    /// Creates a shell on top of a toolkit and builds the desktop
    ///
    /// # Returns
    /// AppShell instance or ShellError if the configuration is invalid
    pub fn new(config: ShellConfig, toolkit: Box<dyn Toolkit>) -> Result<Self, ShellError> {
        config.validate()?;
        let desktop = Desktop::new(toolkit, config);
        tracing::debug!("desktop assembled");

        Ok(Self {
            descriptors: DescriptorRegistry::new(),
            instances: InstanceRegistry::new(),
            connections: ConnectionGraph::new(),
            state: ShellState::default(),
            desktop,
        })
    }

    /// Creates a shell backed by an in-memory toolkit sized to the configured screen
    pub fn headless(config: ShellConfig) -> Result<Self, ShellError> {
        let toolkit = HeadlessToolkit::new(config.screen_width, config.screen_height);
        Self::new(config, Box::new(toolkit))
    }

    pub fn register(&mut self, descriptor: Rc<dyn AppDescriptor>) -> DescriptorId {
        self.descriptors.register(descriptor)
    }

    pub fn lookup(&self, name: &str) -> Option<DescriptorId> {
        self.descriptors.lookup(name)
    }

    pub fn descriptors(&self) -> &DescriptorRegistry {
        &self.descriptors
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub fn instance(&self, app: InstanceId) -> Option<&AppInstance> {
        self.instances.get(app)
    }

    pub fn instance_mut(&mut self, app: InstanceId) -> Option<&mut AppInstance> {
        self.instances.get_mut(app)
    }

    pub fn connections(&self) -> &ConnectionGraph {
        &self.connections
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    pub fn config(&self) -> &ShellConfig {
        self.desktop.config()
    }

    pub fn desktop(&self) -> &Desktop {
        &self.desktop
    }

    pub fn toolkit(&self) -> &dyn Toolkit {
        self.desktop.toolkit()
    }

    pub fn toolkit_mut(&mut self) -> &mut dyn Toolkit {
        self.desktop.toolkit_mut()
    }

    /// Starts a new instance of a descriptor
    ///
    /// # Arguments
    /// * `descriptor` - Kind to run
    /// * `conf` - Optional configuration handed to the descriptor's `run`
    ///
    /// # Returns
    /// Id of the running instance, or the error that prevented it from starting
    pub fn run(
        &mut self,
        descriptor: DescriptorId,
        conf: Option<&dyn Any>,
    ) -> Result<InstanceId, ShellError> {
        let dsc = self
            .descriptors
            .get(descriptor)
            .cloned()
            .ok_or(ShellError::UnknownDescriptor(descriptor))?;

        let app_data = DataBlock::allocate(BlockKind::App, dsc.data_sizes().app)?;
        let app = self.instances.insert(descriptor, Rc::clone(&dsc), app_data);
        tracing::info!(%app, kind = dsc.name(), "application started");

        if let Err(err) = dsc.run(self, app, conf) {
            tracing::warn!(%app, kind = dsc.name(), error = %err, "application failed to start");
            self.teardown(app);
            self.instances.remove(app);
            return Err(err);
        }
        if !self.instances.contains(app) {
            tracing::debug!(%app, kind = dsc.name(), "application closed during start");
            return Err(ShellError::UnknownInstance(app));
        }
        Ok(app)
    }

    /// Closes an instance and releases everything it owns
    ///
    /// Window, shortcut and connections go first, then the descriptor's
    /// `close` runs, then the app data block is wiped and released. Closing
    /// an instance that is already closing is a no-op.
    pub fn close(&mut self, app: InstanceId) -> Result<(), ShellError> {
        let instance = self
            .instances
            .get_mut(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        if instance.lifecycle() == Lifecycle::Closing {
            return Ok(());
        }
        instance.set_lifecycle(Lifecycle::Closing);
        let descriptor = Rc::clone(instance.descriptor());

        self.teardown(app);
        descriptor.close(self, app);
        self.instances.remove(app);

        tracing::info!(%app, kind = descriptor.name(), "application closed");
        Ok(())
    }

    /// Changes the display name and the shortcut title showing it
    pub fn rename(&mut self, app: InstanceId, name: &str) -> Result<(), ShellError> {
        let instance = self
            .instances
            .get_mut(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        instance.set_name(name);
        if let Some(title) = instance.shortcut_title() {
            self.desktop.set_text(title, name);
        }
        Ok(())
    }

    /// Opens the desktop shortcut of an instance
    ///
    /// Does nothing if a shortcut is already open or the instance is closing.
    pub fn open_shortcut(&mut self, app: InstanceId) -> Result<(), ShellError> {
        let instance = self
            .instances
            .get(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        if !instance.is_running() || instance.shortcut().is_some() {
            tracing::debug!(%app, "shortcut open ignored");
            return Ok(());
        }

        let descriptor = Rc::clone(instance.descriptor());
        let title = (!descriptor.mode().contains(AppMode::NO_SHORTCUT_TITLE))
            .then(|| instance.name().to_owned());
        let data = DataBlock::allocate(BlockKind::Shortcut, descriptor.data_sizes().shortcut)?;

        let elements = self.desktop.create_shortcut(app, title.as_deref());
        if let Some(instance) = self.instances.get_mut(app) {
            instance.attach_shortcut(ShortcutSlot {
                element: elements.element,
                title: elements.title,
                data,
            });
        }
        tracing::debug!(%app, shortcut = %elements.element, "shortcut opened");

        if let Err(err) = descriptor.shortcut_open(self, app, elements.element) {
            self.drop_shortcut(app);
            return Err(err);
        }

        self.desktop.focus_shortcut(elements.element);
        self.refresh_marks();
        Ok(())
    }

    /// Closes the desktop shortcut of an instance, if open
    pub fn close_shortcut(&mut self, app: InstanceId) -> Result<(), ShellError> {
        if !self.instances.contains(app) {
            return Err(ShellError::UnknownInstance(app));
        }
        self.drop_shortcut(app);
        Ok(())
    }

    /// Opens the window of an instance
    ///
    /// Closes the application chooser. Does nothing if a window is already
    /// open or the instance is closing.
    pub fn open_window(&mut self, app: InstanceId) -> Result<(), ShellError> {
        let instance = self
            .instances
            .get(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        if !instance.is_running() || instance.window().is_some() {
            tracing::debug!(%app, "window open ignored");
            return Ok(());
        }

        let descriptor = Rc::clone(instance.descriptor());
        self.desktop.close_chooser();
        let data = DataBlock::allocate(BlockKind::Window, descriptor.data_sizes().window)?;

        let element = self.desktop.create_window(app, descriptor.name());
        if let Some(instance) = self.instances.get_mut(app) {
            instance.attach_window(WindowSlot { element, data });
        }
        tracing::debug!(%app, window = %element, "window opened");

        if let Err(err) = descriptor.window_open(self, app, element) {
            self.drop_window(app);
            return Err(err);
        }
        Ok(())
    }

    /// Closes the window of an instance, if open
    ///
    /// An instance waiting on its close animation closes right away.
    pub fn close_window(&mut self, app: InstanceId) -> Result<(), ShellError> {
        let instance = self
            .instances
            .get(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        if instance.lifecycle() == Lifecycle::ClosePending {
            return self.close(app);
        }
        self.drop_window(app);
        Ok(())
    }

    /// Collapses the window of an instance back towards its shortcut
    ///
    /// The window is logically closed at once. With animated transitions the
    /// old element shrinks into the shortcut and is destroyed afterwards. No
    /// shortcut is created if there is none.
    pub fn minimize_window(&mut self, app: InstanceId) -> Result<(), ShellError> {
        let instance = self
            .instances
            .get_mut(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        if !instance.is_running() {
            return Ok(());
        }
        let shortcut = instance.shortcut();
        let animated = self.desktop.config().transition.is_animated();
        if !animated {
            self.drop_window(app);
            return Ok(());
        }

        let Some(slot) = instance.detach_window() else {
            return Ok(());
        };
        let target = self.desktop.shortcut_origin(shortcut);
        self.desktop.close_input_overlay(Some(app));
        self.desktop.detach_window(slot.element);
        if !self.desktop.animate_window_minimize(slot.element, target) {
            self.desktop.destroy(slot.element);
        }
        tracing::debug!(%app, window = %slot.element, "window minimized");
        Ok(())
    }

    /// Handles the window close control
    ///
    /// With animated transitions the shortcut closes at once, the window
    /// slides out and the instance closes when the animation ends. Requests
    /// while that close is pending are ignored.
    pub fn request_close(&mut self, app: InstanceId) -> Result<(), ShellError> {
        let instance = self
            .instances
            .get_mut(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        if !instance.is_running() {
            tracing::debug!(%app, "close already in progress");
            return Ok(());
        }
        let Some(window) = instance.window() else {
            return self.close(app);
        };
        if !self.desktop.config().transition.is_animated() {
            return self.close(app);
        }

        instance.set_lifecycle(Lifecycle::ClosePending);
        self.desktop.close_input_overlay(Some(app));
        self.drop_shortcut(app);
        if !self.desktop.animate_window_close(window, app) {
            return self.close(app);
        }
        tracing::debug!(%app, "close pending on window animation");
        Ok(())
    }

    /// Shows the on-screen input overlay for the window of an instance
    pub fn open_input_overlay(&mut self, app: InstanceId) -> Result<ElementId, ShellError> {
        let instance = self
            .instances
            .get(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        if instance.window().is_none() {
            return Err(ShellError::NoWindow(app));
        }
        Ok(self.desktop.open_input_overlay(app))
    }

    /// Hides the input overlay if it belongs to the instance
    ///
    /// # Returns
    /// true if an overlay was closed
    pub fn close_input_overlay(&mut self, app: InstanceId) -> bool {
        self.desktop.close_input_overlay(Some(app))
    }

    /// Instance whose window holds `element`
    pub fn window_of(&self, element: ElementId) -> Option<InstanceId> {
        self.desktop.window_of(element)
    }

    /// Adds the connection `sender -> receiver`
    ///
    /// Instances that are closing take no new connections.
    ///
    /// # Returns
    /// true if the connection was new
    pub fn connect(&mut self, sender: InstanceId, receiver: InstanceId) -> Result<bool, ShellError> {
        for app in [sender, receiver] {
            let instance = self
                .instances
                .get(app)
                .ok_or(ShellError::UnknownInstance(app))?;
            if !instance.is_running() {
                tracing::debug!(%sender, %receiver, %app, "connect ignored, instance closing");
                return Ok(false);
            }
        }
        let added = self.connections.connect(sender, receiver);
        if added {
            tracing::debug!(%sender, %receiver, "connected");
            self.refresh_marks();
        }
        Ok(added)
    }

    /// Removes connections matching both filters, `None` matching any instance
    ///
    /// # Returns
    /// Number of connections removed
    pub fn disconnect(&mut self, sender: Option<InstanceId>, receiver: Option<InstanceId>) -> usize {
        let removed = self.connections.disconnect(sender, receiver);
        if removed > 0 {
            tracing::debug!(?sender, ?receiver, removed, "disconnected");
            self.refresh_marks();
        }
        removed
    }

    pub fn has_edge(&self, sender: InstanceId, receiver: InstanceId) -> bool {
        self.connections.has_edge(sender, receiver)
    }

    /// Delivers a message to every receiver connected to `sender`
    ///
    /// The receiver list is taken before the first delivery. Receivers
    /// that closed meanwhile are skipped.
    ///
    /// # Returns
    /// Number of connections the message was routed over, 0 for `ComType::Invalid`
    pub fn send(&mut self, sender: InstanceId, kind: ComType, payload: &[u8]) -> usize {
        if kind == ComType::Invalid {
            return 0;
        }

        let receivers = self.connections.receivers_of(sender);
        let message = Message {
            sender,
            kind,
            payload,
        };
        for receiver in &receivers {
            let Some(descriptor) = self
                .instances
                .get(*receiver)
                .map(|instance| Rc::clone(instance.descriptor()))
            else {
                continue;
            };
            descriptor.receive(self, *receiver, &message);
        }

        tracing::debug!(%sender, ?kind, size = payload.len(), delivered = receivers.len(), "message routed");
        receivers.len()
    }

    /// Processes a connection-mode event and restyles the shortcuts on change
    ///
    /// # Returns
    /// The new state after processing
    pub fn process_event(&mut self, event: StateEvent) -> ShellState {
        let previous = self.state;
        self.state = StateMachine::process_event(previous, event);

        if self.state != previous {
            match self.state {
                ShellState::Normal => tracing::info!("connection mode left"),
                ShellState::Connecting(connecting) => {
                    tracing::info!(sender = %connecting.sender, "connection mode entered")
                }
            }
            self.refresh_marks();
        }
        self.state
    }

    /// Swaps the configuration and refreshes the desktop
    pub fn reconfigure(&mut self, config: ShellConfig) -> Result<(), ShellError> {
        config.validate()?;
        self.desktop.set_config(config);
        self.refresh_marks();
        tracing::debug!("configuration applied");
        Ok(())
    }

    /// Renders the current desktop
    pub fn render(&self) -> Result<Pixmap, ShellError> {
        let pixmap = DesktopRenderer::new().render(&self.desktop.scene())?;
        Ok(pixmap)
    }

    /// Restyles every shortcut for the current connection-mode state
    pub(crate) fn refresh_marks(&mut self) {
        self.desktop.reset_shortcut_styles();
        let Some(sender) = self.state.sender() else {
            return;
        };

        let marks: Vec<(ElementId, StyleClass)> = self
            .instances
            .iter(None)
            .filter_map(|instance| {
                let shortcut = instance.shortcut()?;
                if instance.id() == sender {
                    Some((shortcut, StyleClass::ShortcutSending))
                } else if self.connections.has_edge(sender, instance.id()) {
                    Some((shortcut, StyleClass::ShortcutReceiving))
                } else {
                    None
                }
            })
            .collect();
        for (shortcut, style) in marks {
            self.desktop.set_shortcut_style(shortcut, style);
        }
    }

    /// Removes visuals and connections of an instance about to go away
    fn teardown(&mut self, app: InstanceId) {
        self.drop_window(app);
        self.drop_shortcut(app);
        let removed = self.connections.disconnect(Some(app), None)
            + self.connections.disconnect(None, Some(app));
        if removed > 0 {
            tracing::debug!(%app, removed, "connections removed");
        }
        self.process_event(StateEvent::InstanceClosed(app));
        self.refresh_marks();
    }

    pub(super) fn drop_shortcut(&mut self, app: InstanceId) -> bool {
        let Some(slot) = self
            .instances
            .get_mut(app)
            .and_then(|instance| instance.detach_shortcut())
        else {
            return false;
        };
        self.desktop.remove_shortcut(slot.element);
        tracing::debug!(%app, shortcut = %slot.element, "shortcut closed");
        true
    }

    pub(super) fn drop_window(&mut self, app: InstanceId) -> bool {
        let Some(slot) = self
            .instances
            .get_mut(app)
            .and_then(|instance| instance.detach_window())
        else {
            return false;
        };
        self.desktop.close_input_overlay(Some(app));
        self.desktop.destroy(slot.element);
        tracing::debug!(%app, window = %slot.element, "window closed");
        true
    }
}
