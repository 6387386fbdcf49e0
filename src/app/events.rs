//! UI event dispatch
//!
//! Translates element-level input from the toolkit into shell operations:
//! launching from the chooser, opening windows from shortcuts, wiring
//! connections in connection mode and finishing animated transitions.

use crate::app::controller::{AppShell, ShellError};
use crate::app::state::{ShellState, StateEvent};
use crate::domain::instance::InstanceId;
use crate::domain::registry::DescriptorId;
use crate::ui::desktop::{ElementOwner, Transition, WindowControl};
use crate::ui::toolkit::{AnimationId, ElementId};

/// Input and completion events delivered by the toolkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    /// Element was tapped and released
    Released(ElementId),
    /// Element was held down
    LongPressed(ElementId),
    /// Property animation ran to its end
    AnimationFinished(AnimationId),
}

impl AppShell {
    /// Dispatches one toolkit event
    ///
    /// Events for elements the shell does not know, or no longer knows, are
    /// ignored so duplicate input stays harmless.
    pub fn handle_event(&mut self, event: UiEvent) -> Result<(), ShellError> {
        match event {
            UiEvent::Released(element) => self.on_release(element),
            UiEvent::LongPressed(element) => {
                self.on_long_press(element);
                Ok(())
            }
            UiEvent::AnimationFinished(animation) => {
                self.finish_transition(animation);
                Ok(())
            }
        }
    }

    /// Advances animations by `elapsed_ms` and completes finished transitions
    pub fn tick(&mut self, elapsed_ms: u32) {
        for animation in self.desktop.tick(elapsed_ms) {
            self.finish_transition(animation);
        }
    }

    /// Opens the application chooser, or closes it if open
    pub fn toggle_chooser(&mut self) {
        if self.desktop.close_chooser() {
            return;
        }
        let entries: Vec<(DescriptorId, String)> = self
            .descriptors
            .listed()
            .map(|(id, descriptor)| (id, descriptor.name().to_owned()))
            .collect();
        self.desktop.open_chooser(&entries);
    }

    /// Starts a descriptor picked in the chooser and shows its shortcut
    pub fn launch_from_chooser(&mut self, descriptor: DescriptorId) -> Result<InstanceId, ShellError> {
        self.desktop.close_chooser();
        let app = self.run(descriptor, None)?;
        self.open_shortcut(app)?;
        if let Some(shortcut) = self.instance(app).and_then(|i| i.shortcut()) {
            self.desktop.fade_in_shortcut(shortcut);
        }
        Ok(app)
    }

    fn on_release(&mut self, element: ElementId) -> Result<(), ShellError> {
        let Some(owner) = self.desktop.owner(element) else {
            tracing::warn!(%element, "release on unknown element ignored");
            return Ok(());
        };

        match owner {
            ElementOwner::Background => {
                self.desktop.close_chooser();
                self.process_event(StateEvent::BackgroundTapped);
                Ok(())
            }
            ElementOwner::AppsButton => {
                self.toggle_chooser();
                Ok(())
            }
            ElementOwner::ChooserEntry(descriptor) => self.launch_from_chooser(descriptor).map(|_| ()),
            ElementOwner::Shortcut(app) => self.on_shortcut_release(app, element),
            ElementOwner::WindowControl(app, WindowControl::Minimize) => self.minimize_window(app),
            ElementOwner::WindowControl(app, WindowControl::Close) => self.request_close(app),
            ElementOwner::Window(_) | ElementOwner::InputOverlay(_) | ElementOwner::Detached => Ok(()),
        }
    }

    fn on_shortcut_release(&mut self, app: InstanceId, shortcut: ElementId) -> Result<(), ShellError> {
        match self.state {
            ShellState::Connecting(connecting) => {
                let sender = connecting.sender;
                if app == sender {
                    return Ok(());
                }
                if self.has_edge(sender, app) {
                    self.disconnect(Some(sender), Some(app));
                } else {
                    self.connect(sender, app)?;
                }
                Ok(())
            }
            ShellState::Normal => {
                self.desktop.focus_shortcut(shortcut);
                if self.desktop.close_chooser() {
                    return Ok(());
                }

                let had_window = self.instance(app).is_some_and(|i| i.window().is_some());
                self.open_window(app)?;
                if had_window {
                    return Ok(());
                }
                if let Some(window) = self.instance(app).and_then(|i| i.window()) {
                    let from = self.desktop.shortcut_origin(Some(shortcut));
                    self.desktop.animate_window_open(window, from);
                }
                Ok(())
            }
        }
    }

    fn on_long_press(&mut self, element: ElementId) {
        match self.desktop.owner(element) {
            Some(ElementOwner::Shortcut(app)) => {
                self.process_event(StateEvent::ShortcutLongPressed(app));
            }
            Some(_) => {}
            None => tracing::warn!(%element, "long press on unknown element ignored"),
        }
    }

    fn finish_transition(&mut self, animation: AnimationId) {
        let Some((element, action)) = self.desktop.take_transition(animation) else {
            return;
        };

        match action {
            Transition::DestroyElement => self.desktop.destroy(element),
            Transition::CloseInstance(app) => {
                if let Err(err) = self.close(app) {
                    tracing::warn!(%app, error = %err, "pending close could not complete");
                    self.desktop.destroy(element);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ShellConfig, TransitionPolicy};
    use crate::domain::descriptor::AppMode;
    use crate::domain::instance::Lifecycle;
    use crate::testing::RecordingApp;
    use crate::ui::toolkit::StyleClass;
    use pretty_assertions::assert_eq;

    const WINDOW_MS: u32 = 100;
    const SHORTCUT_MS: u32 = 40;

    fn shell(transition: TransitionPolicy) -> AppShell {
        AppShell::headless(ShellConfig::default().with_transition(transition)).unwrap()
    }

    fn animated() -> TransitionPolicy {
        TransitionPolicy::Animated {
            window_ms: WINDOW_MS,
            shortcut_ms: SHORTCUT_MS,
        }
    }

    fn launch(shell: &mut AppShell, name: &str) -> (InstanceId, ElementId) {
        let kind = shell.lookup(name).unwrap();
        let app = shell.run(kind, None).unwrap();
        let shortcut = shell.instance(app).unwrap().shortcut().unwrap();
        (app, shortcut)
    }

    fn style(shell: &AppShell, element: ElementId) -> Option<StyleClass> {
        shell.toolkit().style(element)
    }

    fn release(shell: &mut AppShell, element: ElementId) {
        shell.handle_event(UiEvent::Released(element)).unwrap();
    }

    fn long_press(shell: &mut AppShell, element: ElementId) {
        shell.handle_event(UiEvent::LongPressed(element)).unwrap();
    }

    #[test]
    fn connection_mode_toggles_edges() {
        let mut shell = shell(TransitionPolicy::Immediate);
        shell.register(RecordingApp::new("A").opening_shortcut().into_rc());
        let (a, sa) = launch(&mut shell, "A");
        let (b, sb) = launch(&mut shell, "A");

        long_press(&mut shell, sa);
        assert_eq!(shell.state().sender(), Some(a));
        assert_eq!(style(&shell, sa), Some(StyleClass::ShortcutSending));
        assert_eq!(style(&shell, sb), Some(StyleClass::Shortcut));

        release(&mut shell, sb);
        assert!(shell.has_edge(a, b));
        assert_eq!(style(&shell, sb), Some(StyleClass::ShortcutReceiving));

        release(&mut shell, sb);
        assert!(!shell.has_edge(a, b));
        assert_eq!(style(&shell, sb), Some(StyleClass::Shortcut));

        // Tapping the sender neither connects nor opens a window
        release(&mut shell, sa);
        assert!(shell.connections().is_empty());
        assert!(shell.instance(a).unwrap().window().is_none());

        long_press(&mut shell, sa);
        assert_eq!(shell.state(), ShellState::Normal);
        assert_eq!(style(&shell, sa), Some(StyleClass::Shortcut));
    }

    #[test]
    fn switching_sender_clears_previous_marks() {
        let mut shell = shell(TransitionPolicy::Immediate);
        shell.register(RecordingApp::new("A").opening_shortcut().into_rc());
        let (a, sa) = launch(&mut shell, "A");
        let (b, sb) = launch(&mut shell, "A");
        let (c, sc) = launch(&mut shell, "A");
        shell.connect(a, c).unwrap();
        shell.connect(b, a).unwrap();

        long_press(&mut shell, sa);
        assert_eq!(style(&shell, sc), Some(StyleClass::ShortcutReceiving));

        long_press(&mut shell, sb);
        assert_eq!(shell.state().sender(), Some(b));
        assert_eq!(style(&shell, sb), Some(StyleClass::ShortcutSending));
        assert_eq!(style(&shell, sa), Some(StyleClass::ShortcutReceiving));
        assert_eq!(style(&shell, sc), Some(StyleClass::Shortcut));
        assert!(shell.has_edge(a, c));
    }

    #[test]
    fn background_tap_leaves_connection_mode() {
        let mut shell = shell(TransitionPolicy::Immediate);
        shell.register(RecordingApp::new("A").opening_shortcut().into_rc());
        let (a, sa) = launch(&mut shell, "A");
        let (b, sb) = launch(&mut shell, "A");
        shell.connect(a, b).unwrap();

        long_press(&mut shell, sa);
        let page = shell.desktop().page();
        release(&mut shell, page);

        assert_eq!(shell.state(), ShellState::Normal);
        assert_eq!(style(&shell, sa), Some(StyleClass::Shortcut));
        assert_eq!(style(&shell, sb), Some(StyleClass::Shortcut));
        assert!(shell.has_edge(a, b));
    }

    #[test]
    fn normal_tap_opens_window_unless_chooser_is_open() {
        let mut shell = shell(TransitionPolicy::Immediate);
        shell.register(RecordingApp::new("A").opening_shortcut().into_rc());
        let (a, sa) = launch(&mut shell, "A");

        let apps = shell.desktop().apps_button();
        release(&mut shell, apps);
        assert!(shell.desktop().is_chooser_open());

        release(&mut shell, sa);
        assert!(!shell.desktop().is_chooser_open());
        assert!(shell.instance(a).unwrap().window().is_none());

        release(&mut shell, sa);
        let window = shell.instance(a).unwrap().window().unwrap();
        assert_eq!(shell.toolkit().area(window), Some(shell.config().screen_area()));

        // A second tap keeps the same window
        release(&mut shell, sa);
        assert_eq!(shell.instance(a).unwrap().window(), Some(window));
    }

    #[test]
    fn chooser_launches_listed_kinds() {
        let mut shell = shell(animated());
        shell.register(RecordingApp::new("Hidden").with_mode(AppMode::NOT_LISTED).into_rc());
        let files = shell.register(RecordingApp::new("Files").into_rc());

        shell.toggle_chooser();
        let entries = shell.desktop().chooser_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].1, files);

        release(&mut shell, entries[0].0);
        assert!(!shell.desktop().is_chooser_open());
        assert_eq!(shell.instances().len(), 1);

        let app = shell.instances().ids()[0];
        let shortcut = shell.instance(app).unwrap().shortcut().unwrap();
        assert_eq!(shell.toolkit().opacity(shortcut), Some(0));

        shell.tick(SHORTCUT_MS);
        assert_eq!(shell.toolkit().opacity(shortcut), Some(shell.config().shortcut_opacity));
    }

    #[test]
    fn animated_open_grows_from_shortcut() {
        let mut shell = shell(animated());
        shell.register(RecordingApp::new("A").opening_shortcut().into_rc());
        let (a, sa) = launch(&mut shell, "A");
        let origin = shell.toolkit().area(sa).unwrap();

        release(&mut shell, sa);
        let window = shell.instance(a).unwrap().window().unwrap();
        assert_eq!(shell.toolkit().area(window), Some(origin));

        shell.tick(WINDOW_MS);
        assert_eq!(shell.toolkit().area(window), Some(shell.config().screen_area()));
    }

    #[test]
    fn animated_minimize_allows_reopen_during_animation() {
        let mut shell = shell(animated());
        shell.register(RecordingApp::new("A").opening_shortcut().into_rc());
        let (a, sa) = launch(&mut shell, "A");
        shell.open_window(a).unwrap();
        let old = shell.instance(a).unwrap().window().unwrap();
        let minimize = shell.desktop().window_control(old, WindowControl::Minimize).unwrap();

        release(&mut shell, minimize);
        let instance = shell.instance(a).unwrap();
        assert!(instance.window().is_none());
        assert!(instance.window_data().is_none());
        assert!(shell.toolkit().exists(old));
        assert_eq!(shell.desktop().owner(old), Some(ElementOwner::Detached));

        // Duplicate release on the detached control does nothing
        release(&mut shell, minimize);

        release(&mut shell, sa);
        let new = shell.instance(a).unwrap().window().unwrap();
        assert_ne!(new, old);

        shell.tick(WINDOW_MS);
        assert!(!shell.toolkit().exists(old));
        assert!(shell.toolkit().exists(new));
        assert_eq!(shell.instance(a).unwrap().window(), Some(new));
    }

    #[test]
    fn animated_close_completes_once() {
        let mut shell = shell(animated());
        let app = RecordingApp::new("A").opening_shortcut();
        let log = app.log();
        shell.register(app.into_rc());
        let (a, _) = launch(&mut shell, "A");
        shell.open_window(a).unwrap();
        let window = shell.instance(a).unwrap().window().unwrap();
        let close = shell.desktop().window_control(window, WindowControl::Close).unwrap();
        let minimize = shell.desktop().window_control(window, WindowControl::Minimize).unwrap();

        release(&mut shell, close);
        let instance = shell.instance(a).unwrap();
        assert_eq!(instance.lifecycle(), Lifecycle::ClosePending);
        assert!(instance.shortcut().is_none());
        assert_eq!(shell.toolkit().area(window).map(|r| r.y), Some(0));

        release(&mut shell, close);
        release(&mut shell, minimize);
        assert_eq!(shell.instance(a).unwrap().window(), Some(window));

        shell.tick(WINDOW_MS / 2);
        assert!(shell.instances().contains(a));
        shell.tick(WINDOW_MS / 2);

        assert!(!shell.instances().contains(a));
        assert!(!shell.toolkit().exists(window));
        let closes = log.borrow().iter().filter(|e| e.starts_with("close")).count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn closing_window_during_close_animation_finishes_close() {
        let mut shell = shell(animated());
        let app = RecordingApp::new("A").opening_shortcut();
        let log = app.log();
        shell.register(app.into_rc());
        let (a, _) = launch(&mut shell, "A");
        shell.open_window(a).unwrap();
        let window = shell.instance(a).unwrap().window().unwrap();
        shell.request_close(a).unwrap();
        assert_eq!(shell.instance(a).unwrap().lifecycle(), Lifecycle::ClosePending);

        shell.close_window(a).unwrap();

        assert!(!shell.instances().contains(a));
        assert!(!shell.toolkit().exists(window));
        assert_eq!(shell.desktop().pending_transitions(), 0);
        shell.tick(WINDOW_MS);
        let closes = log.borrow().iter().filter(|e| e.starts_with("close")).count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn immediate_close_control_closes_instance() {
        let mut shell = shell(TransitionPolicy::Immediate);
        shell.register(RecordingApp::new("A").into_rc());
        let kind = shell.lookup("A").unwrap();
        let a = shell.run(kind, None).unwrap();
        shell.open_window(a).unwrap();
        let window = shell.instance(a).unwrap().window().unwrap();
        let close = shell.desktop().window_control(window, WindowControl::Close).unwrap();

        release(&mut shell, close);
        assert!(!shell.instances().contains(a));
        // The control went away with its window
        release(&mut shell, close);
    }

    #[test]
    fn closing_sender_returns_to_normal() {
        let mut shell = shell(TransitionPolicy::Immediate);
        shell.register(RecordingApp::new("A").opening_shortcut().into_rc());
        let (a, sa) = launch(&mut shell, "A");
        let (b, sb) = launch(&mut shell, "A");
        shell.connect(a, b).unwrap();

        long_press(&mut shell, sa);
        assert_eq!(style(&shell, sb), Some(StyleClass::ShortcutReceiving));

        shell.close(a).unwrap();
        assert_eq!(shell.state(), ShellState::Normal);
        assert_eq!(style(&shell, sb), Some(StyleClass::Shortcut));
        assert!(shell.connections().is_empty());
    }

    #[test]
    fn events_for_unknown_elements_are_ignored() {
        let mut shell = shell(TransitionPolicy::Immediate);
        let stray = ElementId::from_raw(9999);
        release(&mut shell, stray);
        long_press(&mut shell, stray);
        shell
            .handle_event(UiEvent::AnimationFinished(AnimationId::from_raw(42)))
            .unwrap();
        assert_eq!(shell.state(), ShellState::Normal);
    }
}
