//! Application shell demo host
//!
//! Builds a shell on the headless toolkit, registers the bundled
//! applications and plays a short scripted session: launch through the
//! chooser, wire a connection in connection mode, send a message, open and
//! minimise a window. The final desktop can be written out as PNG.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use appshell::apps::{self, Example, Terminal};
use appshell::ui::{DesktopRenderer, ElementId, WindowControl};
use appshell::{AppShell, InstanceId, ShellConfig, ShellError, UiEvent};

/// Demo command line arguments
#[derive(Parser, Debug)]
#[command(name = "appshell")]
#[command(about = "Scripted session on a headless application shell")]
struct Args {
    /// Shell configuration (TOML)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the final desktop to this PNG file
    #[arg(long, value_name = "PATH")]
    png: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &args.config {
        Some(path) => ShellConfig::load(path)?,
        None => ShellConfig::default(),
    };
    let mut shell = AppShell::headless(config)?;
    for descriptor in apps::builtin() {
        shell.register(descriptor);
    }

    let (example, terminal) = scripted_session(&mut shell)?;

    info!(
        instances = shell.instances().len(),
        connections = shell.connections().len(),
        sent = Example::sent(&shell, example).unwrap_or(0),
        "session finished"
    );
    if let Some(log) = Terminal::log(&shell, terminal) {
        info!(terminal = %terminal, log = %log.trim_end(), "terminal output");
    }

    if let Some(path) = args.png {
        let pixmap = shell.render()?;
        DesktopRenderer::new().save_png(&pixmap, &path)?;
        info!(path = %path.display(), "desktop written");
    }

    Ok(())
}

fn scripted_session(shell: &mut AppShell) -> Result<(InstanceId, InstanceId), ShellError> {
    let settle = shell.config().transition.window_ms().unwrap_or(0);

    let example = launch(shell, Example::NAME)?;
    let terminal = launch(shell, Terminal::NAME)?;
    shell.tick(settle);

    let example_sc = shortcut_of(shell, example)?;
    let terminal_sc = shortcut_of(shell, terminal)?;

    // Wire example -> terminal by hand
    shell.handle_event(UiEvent::LongPressed(example_sc))?;
    shell.handle_event(UiEvent::Released(terminal_sc))?;
    let page = shell.desktop().page();
    shell.handle_event(UiEvent::Released(page))?;

    Example::emit(shell, example, "hello from the demo")?;

    shell.handle_event(UiEvent::Released(terminal_sc))?;
    shell.tick(settle);

    let window = shell
        .instance(terminal)
        .and_then(|i| i.window())
        .ok_or(ShellError::NoWindow(terminal))?;
    if let Some(minimize) = shell.desktop().window_control(window, WindowControl::Minimize) {
        shell.handle_event(UiEvent::Released(minimize))?;
    }
    shell.tick(settle);

    Ok((example, terminal))
}

/// Opens the chooser and taps the entry for `name`
fn launch(shell: &mut AppShell, name: &str) -> Result<InstanceId, ShellError> {
    shell.toggle_chooser();
    let kind = shell.lookup(name);
    let entry = shell
        .desktop()
        .chooser_entries()
        .into_iter()
        .find(|(_, descriptor)| Some(*descriptor) == kind);

    let Some((entry, kind)) = entry else {
        shell.toggle_chooser();
        return Err(ShellError::App {
            name: name.to_owned(),
            reason: "not listed in the chooser".to_owned(),
        });
    };
    info!(name, %entry, "launching from chooser");
    shell.launch_from_chooser(kind)
}

fn shortcut_of(shell: &AppShell, app: InstanceId) -> Result<ElementId, ShellError> {
    shell
        .instance(app)
        .and_then(|i| i.shortcut())
        .ok_or(ShellError::UnknownInstance(app))
}
