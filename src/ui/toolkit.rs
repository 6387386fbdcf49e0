//! Widget toolkit seam
//!
//! The shell never draws anything itself. It creates and destroys elements,
//! moves them around, changes their style class and starts property
//! animations through the [`Toolkit`] trait. Input events and animation
//! completions come back to the shell as `UiEvent`s.
//!
//! [`HeadlessToolkit`] keeps the whole element tree in memory. It backs the
//! demo binary and the tests and can be rendered with the desktop renderer.

use std::collections::HashMap;
use std::fmt;

use crate::domain::core::Rect;

/// Handle of a toolkit element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// Handle of a running property animation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u32);

impl AnimationId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

/// Kinds of elements the shell asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// Scrollable container
    Page,
    /// Plain rectangle holding other elements
    Panel,
    Button,
    Label,
    /// Titled window with a control bar
    Window,
    List,
    ListEntry,
    /// Floating element above windows
    Overlay,
}

/// Visual style classes, resolved to colours by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleClass {
    Plain,
    Background,
    Menu,
    MenuButton,
    Shortcut,
    ShortcutSending,
    ShortcutReceiving,
    Title,
    Window,
    WindowControl,
    Chooser,
    ChooserEntry,
    Overlay,
}

/// Numeric element property an animation drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    X,
    Y,
    Width,
    Height,
    Opacity,
}

/// Linear interpolation of one property over a duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animation {
    pub target: ElementId,
    pub property: Property,
    pub start: i32,
    pub end: i32,
    pub duration_ms: u32,
}

impl Animation {
    pub fn new(target: ElementId, property: Property, start: i32, end: i32, duration_ms: u32) -> Self {
        Self {
            target,
            property,
            start,
            end,
            duration_ms,
        }
    }

    /// Property value after `elapsed_ms`
    pub fn value_at(&self, elapsed_ms: u32) -> i32 {
        if self.duration_ms == 0 || elapsed_ms >= self.duration_ms {
            return self.end;
        }
        let span = i64::from(self.end) - i64::from(self.start);
        let value = i64::from(self.start) + span * i64::from(elapsed_ms) / i64::from(self.duration_ms);
        value as i32
    }
}

/// Capabilities the shell consumes from a widget toolkit
///
/// Areas are absolute screen coordinates. Destroying an element destroys
/// its children and cancels animations running on any of them.
pub trait Toolkit {
    /// Root element covering the display
    fn screen(&self) -> ElementId;

    fn create(&mut self, kind: ElementKind, parent: ElementId) -> ElementId;

    fn destroy(&mut self, element: ElementId);

    fn exists(&self, element: ElementId) -> bool;

    fn parent(&self, element: ElementId) -> Option<ElementId>;

    fn set_text(&mut self, element: ElementId, text: &str);

    fn text(&self, element: ElementId) -> Option<&str>;

    fn set_area(&mut self, element: ElementId, area: Rect);

    fn area(&self, element: ElementId) -> Option<Rect>;

    fn set_style(&mut self, element: ElementId, style: StyleClass);

    fn style(&self, element: ElementId) -> Option<StyleClass>;

    fn set_opacity(&mut self, element: ElementId, opacity: u8);

    fn opacity(&self, element: ElementId) -> Option<u8>;

    /// Scrolls `container` so that `child` is visible
    fn focus(&mut self, container: ElementId, child: ElementId, animated: bool);

    fn animate(&mut self, animation: Animation) -> AnimationId;

    /// Advances running animations and returns the ones that finished
    fn tick(&mut self, elapsed_ms: u32) -> Vec<AnimationId>;
}

#[derive(Debug, Clone)]
struct Node {
    kind: ElementKind,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    text: String,
    area: Rect,
    style: StyleClass,
    opacity: u8,
    scroll_y: i32,
}

impl Node {
    fn new(kind: ElementKind, parent: Option<ElementId>) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            text: String::new(),
            area: Rect::default(),
            style: StyleClass::Plain,
            opacity: u8::MAX,
            scroll_y: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct RunningAnimation {
    id: AnimationId,
    animation: Animation,
    elapsed_ms: u32,
}

/// In-memory toolkit without a display
#[derive(Debug)]
pub struct HeadlessToolkit {
    root: ElementId,
    nodes: HashMap<ElementId, Node>,
    next_element: u32,
    animations: Vec<RunningAnimation>,
    next_animation: u32,
    focused: Option<ElementId>,
}

impl HeadlessToolkit {
    /// Creates a toolkit whose screen is `width` x `height` pixels
    pub fn new(width: i32, height: i32) -> Self {
        let root = ElementId(0);
        let mut screen = Node::new(ElementKind::Panel, None);
        screen.area = Rect::new(0, 0, width, height);

        let mut nodes = HashMap::new();
        nodes.insert(root, screen);

        Self {
            root,
            nodes,
            next_element: 1,
            animations: Vec::new(),
            next_animation: 0,
            focused: None,
        }
    }

    pub fn kind(&self, element: ElementId) -> Option<ElementKind> {
        self.nodes.get(&element).map(|n| n.kind)
    }

    pub fn children(&self, element: ElementId) -> &[ElementId] {
        self.nodes
            .get(&element)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Current vertical scroll offset of a container
    pub fn scroll_offset(&self, element: ElementId) -> Option<i32> {
        self.nodes.get(&element).map(|n| n.scroll_y)
    }

    /// Element most recently focused inside a container
    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    pub fn element_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn running_animations(&self) -> usize {
        self.animations.len()
    }

    /// Deepest, most recently created element under the point
    pub fn hit_test(&self, x: i32, y: i32) -> Option<ElementId> {
        self.hit_test_in(self.root, x, y)
    }

    fn hit_test_in(&self, element: ElementId, x: i32, y: i32) -> Option<ElementId> {
        let node = self.nodes.get(&element)?;
        if !node.area.contains_point(x, y) {
            return None;
        }
        node.children
            .iter()
            .rev()
            .find_map(|child| self.hit_test_in(*child, x, y))
            .or(Some(element))
    }

    fn collect_subtree(&self, element: ElementId, out: &mut Vec<ElementId>) {
        out.push(element);
        for child in self.children(element) {
            self.collect_subtree(*child, out);
        }
    }

    fn apply(&mut self, animation: &Animation, value: i32) {
        let Some(node) = self.nodes.get_mut(&animation.target) else {
            return;
        };
        match animation.property {
            Property::X => node.area.x = value,
            Property::Y => node.area.y = value,
            Property::Width => node.area.w = value,
            Property::Height => node.area.h = value,
            Property::Opacity => node.opacity = value.clamp(0, i32::from(u8::MAX)) as u8,
        }
    }
}

impl Toolkit for HeadlessToolkit {
    fn screen(&self) -> ElementId {
        self.root
    }

    fn create(&mut self, kind: ElementKind, parent: ElementId) -> ElementId {
        let parent = if self.nodes.contains_key(&parent) {
            parent
        } else {
            tracing::warn!(%parent, "parent element missing, attaching to screen");
            self.root
        };

        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.nodes.insert(id, Node::new(kind, Some(parent)));
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        tracing::trace!(element = %id, ?kind, %parent, "element created");
        id
    }

    fn destroy(&mut self, element: ElementId) {
        if element == self.root || !self.nodes.contains_key(&element) {
            return;
        }

        let mut doomed = Vec::new();
        self.collect_subtree(element, &mut doomed);

        let parent = self.nodes.get(&element).and_then(|n| n.parent);
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != element);
        }
        for id in &doomed {
            self.nodes.remove(id);
        }
        self.animations
            .retain(|a| !doomed.contains(&a.animation.target));
        if self.focused.is_some_and(|f| doomed.contains(&f)) {
            self.focused = None;
        }
        tracing::trace!(%element, removed = doomed.len(), "element destroyed");
    }

    fn exists(&self, element: ElementId) -> bool {
        self.nodes.contains_key(&element)
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.nodes.get(&element).and_then(|n| n.parent)
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.text.clear();
            node.text.push_str(text);
        }
    }

    fn text(&self, element: ElementId) -> Option<&str> {
        self.nodes.get(&element).map(|n| n.text.as_str())
    }

    fn set_area(&mut self, element: ElementId, area: Rect) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.area = area;
        }
    }

    fn area(&self, element: ElementId) -> Option<Rect> {
        self.nodes.get(&element).map(|n| n.area)
    }

    fn set_style(&mut self, element: ElementId, style: StyleClass) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.style = style;
        }
    }

    fn style(&self, element: ElementId) -> Option<StyleClass> {
        self.nodes.get(&element).map(|n| n.style)
    }

    fn set_opacity(&mut self, element: ElementId, opacity: u8) {
        if let Some(node) = self.nodes.get_mut(&element) {
            node.opacity = opacity;
        }
    }

    fn opacity(&self, element: ElementId) -> Option<u8> {
        self.nodes.get(&element).map(|n| n.opacity)
    }

    fn focus(&mut self, container: ElementId, child: ElementId, _animated: bool) {
        let (Some(outer), Some(inner)) = (self.area(container), self.area(child)) else {
            return;
        };
        let Some(node) = self.nodes.get_mut(&container) else {
            return;
        };

        let visible_top = outer.y + node.scroll_y;
        let visible_bottom = outer.bottom() + node.scroll_y;
        if inner.y < visible_top {
            node.scroll_y = inner.y - outer.y;
        } else if inner.bottom() > visible_bottom {
            node.scroll_y = inner.bottom() - outer.bottom();
        }
        self.focused = Some(child);
    }

    fn animate(&mut self, animation: Animation) -> AnimationId {
        let id = AnimationId(self.next_animation);
        self.next_animation += 1;
        self.apply(&animation, animation.start);
        self.animations.push(RunningAnimation {
            id,
            animation,
            elapsed_ms: 0,
        });
        id
    }

    fn tick(&mut self, elapsed_ms: u32) -> Vec<AnimationId> {
        let mut finished = Vec::new();
        let mut running = std::mem::take(&mut self.animations);

        for anim in &mut running {
            anim.elapsed_ms = anim.elapsed_ms.saturating_add(elapsed_ms);
            let value = anim.animation.value_at(anim.elapsed_ms);
            self.apply(&anim.animation, value);
            if anim.elapsed_ms >= anim.animation.duration_ms {
                finished.push(anim.id);
            }
        }

        running.retain(|a| !finished.contains(&a.id));
        self.animations = running;
        finished
    }
}
