//! Recording descriptor shared by unit tests

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::app::controller::{AppShell, ShellError};
use crate::domain::connection::Message;
use crate::domain::descriptor::{AppDescriptor, AppMode, DataSizes};
use crate::domain::instance::{DataBlock, InstanceId};
use crate::ui::toolkit::ElementId;

/// Descriptor that writes every callback it receives into a shared log
pub(crate) struct RecordingApp {
    name: String,
    mode: AppMode,
    sizes: DataSizes,
    open_shortcut: bool,
    fail_run: bool,
    receives: bool,
    close_in_run: bool,
    link_on_close: bool,
    log: Rc<RefCell<Vec<String>>>,
}

impl RecordingApp {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            mode: AppMode::empty(),
            sizes: DataSizes::new(8, 4, 4),
            open_shortcut: false,
            fail_run: false,
            receives: false,
            close_in_run: false,
            link_on_close: false,
            log: Rc::default(),
        }
    }

    pub(crate) fn with_mode(mut self, mode: AppMode) -> Self {
        self.mode = mode;
        self
    }

    pub(crate) fn with_sizes(mut self, sizes: DataSizes) -> Self {
        self.sizes = sizes;
        self
    }

    /// Opens a shortcut from `run`
    pub(crate) fn opening_shortcut(mut self) -> Self {
        self.open_shortcut = true;
        self
    }

    /// Fails `run` after doing its other work
    pub(crate) fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }

    /// Records received messages
    pub(crate) fn receiving(mut self) -> Self {
        self.receives = true;
        self
    }

    /// Closes its own instance from `run` and still reports success
    pub(crate) fn closing_in_run(mut self) -> Self {
        self.close_in_run = true;
        self
    }

    /// Tries to connect to every other instance from `close`
    pub(crate) fn linking_on_close(mut self) -> Self {
        self.link_on_close = true;
        self
    }

    pub(crate) fn log(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.log)
    }

    pub(crate) fn into_rc(self) -> Rc<dyn AppDescriptor> {
        Rc::new(self)
    }

    fn record(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

impl AppDescriptor for RecordingApp {
    fn name(&self) -> &str {
        &self.name
    }

    fn mode(&self) -> AppMode {
        self.mode
    }

    fn data_sizes(&self) -> DataSizes {
        self.sizes
    }

    fn run(
        &self,
        shell: &mut AppShell,
        app: InstanceId,
        conf: Option<&dyn Any>,
    ) -> Result<(), ShellError> {
        match conf.and_then(|c| c.downcast_ref::<u32>()) {
            Some(value) => self.record(format!("run {app} conf={value}")),
            None => self.record(format!("run {app}")),
        }
        if self.open_shortcut {
            shell.open_shortcut(app)?;
        }
        if self.close_in_run {
            shell.close(app)?;
        }
        if self.fail_run {
            return Err(ShellError::App {
                name: self.name.clone(),
                reason: "refused to start".to_owned(),
            });
        }
        Ok(())
    }

    fn close(&self, shell: &mut AppShell, app: InstanceId) {
        let edges = shell
            .connections()
            .iter()
            .filter(|c| c.sender == app || c.receiver == app)
            .count();
        let (window, shortcut) = shell
            .instance(app)
            .map_or((false, false), |i| (i.window().is_some(), i.shortcut().is_some()));
        self.record(format!("close {app} edges={edges} window={window} shortcut={shortcut}"));

        if self.link_on_close {
            for peer in shell.instances().ids() {
                if peer != app {
                    let added = shell.connect(app, peer).is_ok_and(|added| added);
                    self.record(format!("link {app} -> {peer} added={added}"));
                }
            }
        }
    }

    fn shortcut_open(
        &self,
        shell: &mut AppShell,
        app: InstanceId,
        shortcut: ElementId,
    ) -> Result<(), ShellError> {
        let size = shell
            .instance(app)
            .and_then(|i| i.shortcut_data())
            .map_or(0, DataBlock::len);
        self.record(format!("shortcut_open {app} {shortcut} data={size}"));
        Ok(())
    }

    fn window_open(
        &self,
        shell: &mut AppShell,
        app: InstanceId,
        window: ElementId,
    ) -> Result<(), ShellError> {
        let size = shell
            .instance(app)
            .and_then(|i| i.window_data())
            .map_or(0, DataBlock::len);
        self.record(format!("window_open {app} {window} data={size}"));
        Ok(())
    }

    fn receive(&self, _shell: &mut AppShell, receiver: InstanceId, message: &Message<'_>) {
        if self.receives {
            self.record(format!(
                "recv {receiver} from {} {:?} {}",
                message.sender,
                message.kind,
                message.size()
            ));
        }
    }
}
