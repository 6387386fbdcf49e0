//! Terminal application
//!
//! Prints every message it receives. The log lives in the app data block:
//! a little-endian `u16` length followed by the text, trimmed from the
//! front when full.

use std::any::Any;

use crate::app::controller::{AppShell, ShellError};
use crate::domain::connection::{ComType, Message};
use crate::domain::descriptor::{AppDescriptor, DataSizes};
use crate::domain::instance::InstanceId;
use crate::ui::toolkit::{ElementId, ElementKind, StyleClass};

use super::{read_label, write_label};

/// Bytes of text the log keeps
pub const LOG_CAPACITY: usize = 256;

const HEADER: usize = 2;

pub struct Terminal;

impl Terminal {
    pub const NAME: &'static str = "Terminal";

    /// Current log text of an instance
    pub fn log(shell: &AppShell, app: InstanceId) -> Option<String> {
        shell
            .instance(app)
            .map(|instance| log_text(instance.app_data().as_slice()))
    }

    fn append(block: &mut [u8], text: &str) {
        let mut log = log_text(block);
        log.push_str(text);
        log.push('\n');

        // Keep the newest text, cut on a char boundary
        let mut start = log.len().saturating_sub(LOG_CAPACITY);
        while !log.is_char_boundary(start) {
            start += 1;
        }
        store(block, &log[start..]);
    }

    fn refresh_window(shell: &mut AppShell, app: InstanceId) {
        let Some(instance) = shell.instance(app) else {
            return;
        };
        let text = log_text(instance.app_data().as_slice());
        let Some(label) = instance
            .window_data()
            .and_then(|data| read_label(data.as_slice()))
        else {
            return;
        };
        shell.toolkit_mut().set_text(label, &text);
    }
}

fn log_text(block: &[u8]) -> String {
    let len = block
        .get(..HEADER)
        .map_or(0, |h| usize::from(u16::from_le_bytes([h[0], h[1]])));
    let body = block.get(HEADER..HEADER + len).unwrap_or(&[]);
    String::from_utf8_lossy(body).into_owned()
}

fn store(block: &mut [u8], text: &str) {
    if block.len() < HEADER {
        return;
    }
    let bytes = text.as_bytes();
    let len = bytes.len().min(block.len() - HEADER).min(usize::from(u16::MAX));
    block[..HEADER].copy_from_slice(&(len as u16).to_le_bytes());
    block[HEADER..HEADER + len].copy_from_slice(&bytes[..len]);
}

impl AppDescriptor for Terminal {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn data_sizes(&self) -> DataSizes {
        DataSizes::new(HEADER + LOG_CAPACITY, 0, 4)
    }

    fn run(
        &self,
        _shell: &mut AppShell,
        _app: InstanceId,
        _conf: Option<&dyn Any>,
    ) -> Result<(), ShellError> {
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

        if let Some(data) = shell.instance_mut(app).and_then(|i| i.window_data_mut()) {
            write_label(data.as_mut_slice(), label);
        }
        Self::refresh_window(shell, app);
        Ok(())
    }

    fn receive(&self, shell: &mut AppShell, receiver: InstanceId, message: &Message<'_>) {
        let line = match message.kind {
            ComType::Char | ComType::Log => String::from_utf8_lossy(message.payload).into_owned(),
            ComType::Int => message
                .ints()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            ComType::Trigger | ComType::Invalid => String::new(),
        };

        let Some(instance) = shell.instance_mut(receiver) else {
            return;
        };
        let block = instance.app_data_mut().as_mut_slice();
        if message.kind == ComType::Trigger {
            store(block, "");
        } else {
            Terminal::append(block, &format!("{}: {line}", message.sender));
        }
        Terminal::refresh_window(shell, receiver);
    }
}
