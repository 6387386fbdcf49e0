//! Example application
//!
//! Shows a shortcut with the number of messages it has sent and forwards
//! text to every connected instance.

use std::any::Any;

use crate::app::controller::{AppShell, ShellError};
use crate::domain::connection::ComType;
use crate::domain::descriptor::{AppDescriptor, DataSizes};
use crate::domain::instance::InstanceId;
use crate::ui::toolkit::{ElementId, ElementKind, StyleClass};

use super::{read_label, read_u32, write_label, write_u32};

pub struct Example;

impl Example {
    pub const NAME: &'static str = "Example";

    /// Sends `text` to the receivers of `app` and counts the send
    ///
    /// # Returns
    /// Number of connections the text was routed over
    pub fn emit(shell: &mut AppShell, app: InstanceId, text: &str) -> Result<usize, ShellError> {
        let delivered = shell.send(app, ComType::Char, text.as_bytes());

        let instance = shell
            .instance_mut(app)
            .ok_or(ShellError::UnknownInstance(app))?;
        let sent = read_u32(instance.app_data().as_slice()).wrapping_add(1);
        write_u32(instance.app_data_mut().as_mut_slice(), sent);
        let label = instance
            .shortcut_data()
            .and_then(|data| read_label(data.as_slice()));

        if let Some(label) = label {
            shell.toolkit_mut().set_text(label, &Self::sent_text(sent));
        }
        Ok(delivered)
    }

    /// Messages sent so far by an instance
    pub fn sent(shell: &AppShell, app: InstanceId) -> Option<u32> {
        shell
            .instance(app)
            .map(|instance| read_u32(instance.app_data().as_slice()))
    }

    fn sent_text(sent: u32) -> String {
        format!("sent: {sent}")
    }
}

impl AppDescriptor for Example {
    fn name(&self) -> &str {
        Self::NAME
    }

    /// App block: send counter. Shortcut and window blocks: label handle.
    fn data_sizes(&self) -> DataSizes {
        DataSizes::new(4, 4, 4)
    }

    fn run(
        &self,
        shell: &mut AppShell,
        app: InstanceId,
        _conf: Option<&dyn Any>,
    ) -> Result<(), ShellError> {
        shell.open_shortcut(app)
    }

    fn shortcut_open(
        &self,
        shell: &mut AppShell,
        app: InstanceId,
        shortcut: ElementId,
    ) -> Result<(), ShellError> {
        let sent = Self::sent(shell, app).unwrap_or(0);
        let area = shell.toolkit().area(shortcut).unwrap_or_default();

        let toolkit = shell.toolkit_mut();
        let label = toolkit.create(ElementKind::Label, shortcut);
        toolkit.set_style(label, StyleClass::Plain);
        toolkit.set_area(label, area);
        toolkit.set_text(label, &Self::sent_text(sent));

        if let Some(data) = shell.instance_mut(app).and_then(|i| i.shortcut_data_mut()) {
            write_label(data.as_mut_slice(), label);
        }
        Ok(())
    }

    fn window_open(
        &self,
        shell: &mut AppShell,
        app: InstanceId,
        window: ElementId,
    ) -> Result<(), ShellError> {
        let content = shell.config().window_content_area();

        let toolkit = shell.toolkit_mut();
        let label = toolkit.create(ElementKind::Label, window);
        toolkit.set_style(label, StyleClass::Plain);
        toolkit.set_area(label, content);
        toolkit.set_text(label, "Connect this app and send text to its receivers");

        if let Some(data) = shell.instance_mut(app).and_then(|i| i.window_data_mut()) {
            write_label(data.as_mut_slice(), label);
        }
        Ok(())
    }
}
