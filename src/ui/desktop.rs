//! Desktop assembly and element ownership
//!
//! The desktop owns the toolkit and every element the shell creates on it:
//! the shortcut page, the menu bar with its "Apps" button, the application
//! chooser, shortcuts, windows and the input overlay. Each element is
//! recorded in a typed side-table so events arriving for an element can be
//! traced back to the instance or descriptor behind it.

use std::collections::HashMap;

use crate::config::ShellConfig;
use crate::domain::core::Rect;
use crate::domain::instance::InstanceId;
use crate::domain::registry::DescriptorId;
use crate::ui::layout::{ShortcutGrid, title_area};
use crate::ui::renderer::{Scene, SceneItem};
use crate::ui::toolkit::{Animation, AnimationId, ElementId, ElementKind, Property, StyleClass, Toolkit};

/// Control buttons in a window header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowControl {
    Minimize,
    Close,
}

/// What a shell-created element stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementOwner {
    /// Empty desktop area behind the shortcuts
    Background,
    AppsButton,
    ChooserEntry(DescriptorId),
    Shortcut(InstanceId),
    Window(InstanceId),
    WindowControl(InstanceId, WindowControl),
    InputOverlay(InstanceId),
    /// Element animating out after being logically closed
    Detached,
}

/// Work left for the end of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    DestroyElement,
    CloseInstance(InstanceId),
}

#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    element: ElementId,
    action: Transition,
}

/// Elements making up one shortcut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutElements {
    pub element: ElementId,
    pub title: Option<ElementId>,
}

pub struct Desktop {
    toolkit: Box<dyn Toolkit>,
    config: ShellConfig,
    page: ElementId,
    menu: ElementId,
    apps_button: ElementId,
    apps_label: ElementId,
    chooser: Option<ElementId>,
    input_overlay: Option<(ElementId, InstanceId)>,
    /// Shortcuts in page order
    shortcuts: Vec<ShortcutElements>,
    windows: Vec<ElementId>,
    owners: HashMap<ElementId, ElementOwner>,
    pending: HashMap<AnimationId, PendingTransition>,
}

impl Desktop {
    /// Builds the shortcut page and the menu bar on the toolkit screen
    pub fn new(mut toolkit: Box<dyn Toolkit>, config: ShellConfig) -> Self {
        let screen = toolkit.screen();

        let page = toolkit.create(ElementKind::Page, screen);
        toolkit.set_style(page, StyleClass::Background);

        let menu = toolkit.create(ElementKind::Panel, screen);
        toolkit.set_style(menu, StyleClass::Menu);

        let apps_button = toolkit.create(ElementKind::Button, menu);
        toolkit.set_style(apps_button, StyleClass::MenuButton);
        let apps_label = toolkit.create(ElementKind::Label, apps_button);
        toolkit.set_style(apps_label, StyleClass::Title);
        toolkit.set_text(apps_label, "Apps");

        let mut owners = HashMap::new();
        owners.insert(page, ElementOwner::Background);
        owners.insert(apps_button, ElementOwner::AppsButton);

        let mut desktop = Self {
            toolkit,
            config,
            page,
            menu,
            apps_button,
            apps_label,
            chooser: None,
            input_overlay: None,
            shortcuts: Vec::new(),
            windows: Vec::new(),
            owners,
            pending: HashMap::new(),
        };
        desktop.apply_geometry();
        desktop
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Swaps the configuration and re-lays out the fixed elements
    pub fn set_config(&mut self, config: ShellConfig) {
        self.config = config;
        self.apply_geometry();
    }

    pub fn toolkit(&self) -> &dyn Toolkit {
        self.toolkit.as_ref()
    }

    pub fn toolkit_mut(&mut self) -> &mut dyn Toolkit {
        self.toolkit.as_mut()
    }

    pub fn page(&self) -> ElementId {
        self.page
    }

    pub fn apps_button(&self) -> ElementId {
        self.apps_button
    }

    pub fn chooser(&self) -> Option<ElementId> {
        self.chooser
    }

    pub fn is_chooser_open(&self) -> bool {
        self.chooser.is_some()
    }

    pub fn owner(&self, element: ElementId) -> Option<ElementOwner> {
        self.owners.get(&element).copied()
    }

    /// Shortcut elements in page order
    pub fn shortcuts(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.shortcuts.iter().map(|s| s.element)
    }

    /// Elements owned as chooser entries, in list order
    pub fn chooser_entries(&self) -> Vec<(ElementId, DescriptorId)> {
        let mut entries: Vec<_> = self
            .owners
            .iter()
            .filter_map(|(el, owner)| match owner {
                ElementOwner::ChooserEntry(d) => Some((*el, *d)),
                _ => None,
            })
            .collect();
        entries.sort();
        entries
    }

    pub fn input_overlay(&self) -> Option<(ElementId, InstanceId)> {
        self.input_overlay
    }

    pub fn set_text(&mut self, element: ElementId, text: &str) {
        self.toolkit.set_text(element, text);
    }

    /// Instance whose window contains `element`, walking up the element tree
    pub fn window_of(&self, element: ElementId) -> Option<InstanceId> {
        let mut current = element;
        loop {
            if let Some(ElementOwner::Window(app)) = self.owners.get(&current) {
                return Some(*app);
            }
            current = self.toolkit.parent(current)?;
        }
    }

    pub fn create_shortcut(&mut self, app: InstanceId, title: Option<&str>) -> ShortcutElements {
        let element = self.toolkit.create(ElementKind::Button, self.page);
        self.toolkit.set_style(element, StyleClass::Shortcut);
        self.toolkit.set_opacity(element, self.config.shortcut_opacity);
        self.owners.insert(element, ElementOwner::Shortcut(app));

        let title = title.map(|text| {
            let label = self.toolkit.create(ElementKind::Label, element);
            self.toolkit.set_style(label, StyleClass::Title);
            self.toolkit.set_text(label, text);
            label
        });

        let shortcut = ShortcutElements { element, title };
        self.shortcuts.push(shortcut);
        self.layout_shortcuts();
        shortcut
    }

    pub fn focus_shortcut(&mut self, shortcut: ElementId) {
        let animated = self.config.transition.is_animated();
        self.toolkit.focus(self.page, shortcut, animated);
    }

    pub fn set_shortcut_style(&mut self, shortcut: ElementId, style: StyleClass) {
        self.toolkit.set_style(shortcut, style);
    }

    /// Puts every shortcut back to the neutral style
    pub fn reset_shortcut_styles(&mut self) {
        for shortcut in &self.shortcuts {
            self.toolkit.set_style(shortcut.element, StyleClass::Shortcut);
        }
    }

    /// Creates a full-screen window with minimise and close controls
    pub fn create_window(&mut self, app: InstanceId, title: &str) -> ElementId {
        let screen = self.toolkit.screen();
        let area = self.config.screen_area();
        let header_h = self.config.menu_height;

        let window = self.toolkit.create(ElementKind::Window, screen);
        self.toolkit.set_style(window, StyleClass::Window);
        self.toolkit.set_area(window, area);
        self.owners.insert(window, ElementOwner::Window(app));
        self.windows.push(window);

        let label = self.toolkit.create(ElementKind::Label, window);
        self.toolkit.set_style(label, StyleClass::Title);
        self.toolkit.set_area(label, Rect::new(0, 0, area.w - 2 * header_h, header_h));
        self.toolkit.set_text(label, title);

        for (slot, control) in [(2, WindowControl::Minimize), (1, WindowControl::Close)] {
            let button = self.toolkit.create(ElementKind::Button, window);
            self.toolkit.set_style(button, StyleClass::WindowControl);
            self.toolkit
                .set_area(button, Rect::new(area.w - slot * header_h, 0, header_h, header_h));
            self.owners
                .insert(button, ElementOwner::WindowControl(app, control));
        }

        window
    }

    /// Control button of a window
    pub fn window_control(&self, window: ElementId, control: WindowControl) -> Option<ElementId> {
        self.owners.iter().find_map(|(element, owner)| match owner {
            ElementOwner::WindowControl(_, c)
                if *c == control && self.toolkit.parent(*element) == Some(window) =>
            {
                Some(*element)
            }
            _ => None,
        })
    }

    /// Marks a window and its controls as no longer belonging to an instance
    pub fn detach_window(&mut self, window: ElementId) {
        for (element, owner) in self.owners.iter_mut() {
            if *element == window || self.toolkit.parent(*element) == Some(window) {
                *owner = ElementOwner::Detached;
            }
        }
    }

    /// Destroys an element with its children and forgets everything tied to it
    pub fn destroy(&mut self, element: ElementId) {
        self.toolkit.destroy(element);
        self.prune();
    }

    pub fn remove_shortcut(&mut self, shortcut: ElementId) {
        self.destroy(shortcut);
        self.layout_shortcuts();
    }

    /// Opens the application chooser listing the given kinds
    pub fn open_chooser(&mut self, entries: &[(DescriptorId, String)]) {
        self.close_chooser();

        let screen = self.toolkit.screen();
        let area = self.config.chooser_area();
        let list = self.toolkit.create(ElementKind::List, screen);
        self.toolkit.set_style(list, StyleClass::Chooser);
        self.toolkit.set_area(list, area);

        let entry_h = self.config.menu_height;
        for (row, (descriptor, name)) in entries.iter().enumerate() {
            let entry = self.toolkit.create(ElementKind::ListEntry, list);
            self.toolkit.set_style(entry, StyleClass::ChooserEntry);
            self.toolkit.set_text(entry, name);
            self.toolkit.set_area(
                entry,
                Rect::new(area.x, area.y + row as i32 * entry_h, area.w, entry_h),
            );
            self.owners
                .insert(entry, ElementOwner::ChooserEntry(*descriptor));
        }

        self.chooser = Some(list);
        tracing::debug!(entries = entries.len(), "application chooser opened");
    }

    /// Closes the chooser
    ///
    /// # Returns
    /// true if it was open
    pub fn close_chooser(&mut self) -> bool {
        let Some(list) = self.chooser.take() else {
            return false;
        };
        self.destroy(list);
        tracing::debug!("application chooser closed");
        true
    }

    /// Shows the input overlay for an instance, replacing any other one
    pub fn open_input_overlay(&mut self, app: InstanceId) -> ElementId {
        self.close_input_overlay(None);

        let screen = self.toolkit.screen();
        let overlay = self.toolkit.create(ElementKind::Overlay, screen);
        self.toolkit.set_style(overlay, StyleClass::Overlay);
        self.toolkit
            .set_area(overlay, self.config.input_overlay_area());
        self.owners.insert(overlay, ElementOwner::InputOverlay(app));
        self.input_overlay = Some((overlay, app));
        overlay
    }

    /// Closes the input overlay, only if it belongs to `app` when one is given
    pub fn close_input_overlay(&mut self, app: Option<InstanceId>) -> bool {
        match self.input_overlay {
            Some((overlay, owner)) if app.is_none_or(|a| a == owner) => {
                self.input_overlay = None;
                self.destroy(overlay);
                true
            }
            _ => false,
        }
    }

    /// Where window animations start or end for an instance
    ///
    /// The shortcut area when there is one, otherwise a shortcut-sized
    /// rectangle in the middle of the screen.
    pub fn shortcut_origin(&self, shortcut: Option<ElementId>) -> Rect {
        shortcut
            .and_then(|sc| self.toolkit.area(sc))
            .unwrap_or_else(|| {
                Rect::centered(
                    self.config.screen_width,
                    self.config.screen_height,
                    self.config.shortcut_width,
                    self.config.shortcut_height,
                )
            })
    }

    /// Grows a window from `from` to full screen
    pub fn animate_window_open(&mut self, window: ElementId, from: Rect) {
        let Some(ms) = self.config.transition.window_ms() else {
            return;
        };
        self.animate_area(window, from, self.config.screen_area(), ms);
    }

    /// Shrinks a window into `to` and destroys it afterwards
    ///
    /// # Returns
    /// false when transitions are immediate and nothing was started
    pub fn animate_window_minimize(&mut self, window: ElementId, to: Rect) -> bool {
        let Some(ms) = self.config.transition.window_ms() else {
            return false;
        };
        let last = self.animate_area(window, self.config.screen_area(), to, ms);
        self.pending.insert(
            last,
            PendingTransition {
                element: window,
                action: Transition::DestroyElement,
            },
        );
        true
    }

    /// Slides a window off the bottom edge, then closes its instance
    pub fn animate_window_close(&mut self, window: ElementId, app: InstanceId) -> bool {
        let Some(ms) = self.config.transition.window_ms() else {
            return false;
        };
        let start_y = self.toolkit.area(window).map_or(0, |a| a.y);
        self.toolkit.animate(Animation::new(
            window,
            Property::Y,
            start_y,
            self.config.screen_height,
            ms,
        ));
        let last = self
            .toolkit
            .animate(Animation::new(window, Property::Opacity, 255, 0, ms));
        self.pending.insert(
            last,
            PendingTransition {
                element: window,
                action: Transition::CloseInstance(app),
            },
        );
        true
    }

    /// Fades a new shortcut in to the configured opacity
    pub fn fade_in_shortcut(&mut self, shortcut: ElementId) {
        let Some(ms) = self.config.transition.shortcut_ms() else {
            return;
        };
        let target = i32::from(self.config.shortcut_opacity);
        self.toolkit
            .animate(Animation::new(shortcut, Property::Opacity, 0, target, ms));
    }

    /// Advances toolkit animations
    pub fn tick(&mut self, elapsed_ms: u32) -> Vec<AnimationId> {
        self.toolkit.tick(elapsed_ms)
    }

    pub(crate) fn take_transition(&mut self, animation: AnimationId) -> Option<(ElementId, Transition)> {
        self.pending
            .remove(&animation)
            .map(|p| (p.element, p.action))
    }

    pub fn pending_transitions(&self) -> usize {
        self.pending.len()
    }

    /// Snapshot of the visible rectangles for the renderer
    pub fn scene(&self) -> Scene {
        let palette = &self.config.palette;
        let mut elements = vec![self.page, self.menu, self.apps_button];
        elements.extend(self.shortcuts.iter().map(|s| s.element));
        elements.extend(self.windows.iter().copied());
        elements.extend(self.chooser);
        elements.extend(self.chooser_entries().into_iter().map(|(el, _)| el));
        elements.extend(self.input_overlay.map(|(el, _)| el));

        let items = elements
            .into_iter()
            .filter_map(|el| {
                let style = self.toolkit.style(el)?;
                let fill = palette.fill_for(style)?;
                Some(SceneItem {
                    area: self.toolkit.area(el)?,
                    fill: fill.to_color(),
                    opacity: self.toolkit.opacity(el)?,
                    outlined: matches!(
                        style,
                        StyleClass::Shortcut
                            | StyleClass::ShortcutSending
                            | StyleClass::ShortcutReceiving
                            | StyleClass::Window
                    ),
                })
            })
            .collect();

        Scene {
            width: self.config.screen_width,
            height: self.config.screen_height,
            items,
        }
    }

    fn apply_geometry(&mut self) {
        let menu_h = self.config.menu_height;
        self.toolkit.set_area(self.page, self.config.screen_area());
        self.toolkit.set_area(self.menu, self.config.menu_area());
        let button = Rect::new(0, 0, 2 * menu_h, menu_h);
        self.toolkit.set_area(self.apps_button, button);
        self.toolkit.set_area(self.apps_label, button);
        self.layout_shortcuts();
    }

    fn layout_shortcuts(&mut self) {
        let grid = ShortcutGrid::from_config(&self.config);
        for (index, shortcut) in self.shortcuts.iter().enumerate() {
            let slot = grid.slot(index);
            self.toolkit.set_area(shortcut.element, slot);
            if let Some(title) = shortcut.title {
                self.toolkit
                    .set_area(title, title_area(slot, &self.config));
            }
        }
    }

    /// Drops bookkeeping for elements the toolkit no longer has
    fn prune(&mut self) {
        let toolkit = self.toolkit.as_ref();
        self.owners.retain(|el, _| toolkit.exists(*el));
        self.shortcuts.retain(|s| toolkit.exists(s.element));
        self.windows.retain(|w| toolkit.exists(*w));
        self.pending.retain(|_, p| toolkit.exists(p.element));
        if self.chooser.is_some_and(|c| !toolkit.exists(c)) {
            self.chooser = None;
        }
        if self.input_overlay.is_some_and(|(o, _)| !toolkit.exists(o)) {
            self.input_overlay = None;
        }
    }

    fn animate_area(&mut self, element: ElementId, from: Rect, to: Rect, ms: u32) -> AnimationId {
        self.toolkit
            .animate(Animation::new(element, Property::Width, from.w, to.w, ms));
        self.toolkit
            .animate(Animation::new(element, Property::Height, from.h, to.h, ms));
        self.toolkit
            .animate(Animation::new(element, Property::X, from.x, to.x, ms));
        self.toolkit
            .animate(Animation::new(element, Property::Y, from.y, to.y, ms))
    }
}
