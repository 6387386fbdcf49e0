use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tiny_skia::Color;

use crate::domain::core::Rect;
use crate::ui::toolkit::StyleClass;

/// How window and shortcut transitions are carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Every open, close and minimise takes effect at once
    Immediate,
    /// Windows and shortcuts animate, teardown runs on completion
    Animated { window_ms: u32, shortcut_ms: u32 },
}

impl TransitionPolicy {
    pub fn is_animated(&self) -> bool {
        matches!(self, TransitionPolicy::Animated { .. })
    }

    pub fn window_ms(&self) -> Option<u32> {
        match self {
            TransitionPolicy::Animated { window_ms, .. } => Some(*window_ms),
            TransitionPolicy::Immediate => None,
        }
    }

    pub fn shortcut_ms(&self) -> Option<u32> {
        match self {
            TransitionPolicy::Animated { shortcut_ms, .. } => Some(*shortcut_ms),
            TransitionPolicy::Immediate => None,
        }
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        TransitionPolicy::Animated {
            window_ms: 200,
            shortcut_ms: 150,
        }
    }
}

/// RGBA colour as written in the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, u8::MAX])
    }

    pub fn to_color(self) -> Color {
        let [r, g, b, a] = self.0;
        Color::from_rgba8(r, g, b, a)
    }
}

/// Colours per style class
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    pub background: Rgba,
    pub menu: Rgba,
    pub shortcut: Rgba,
    pub shortcut_sending: Rgba,
    pub shortcut_receiving: Rgba,
    pub window: Rgba,
    pub chooser: Rgba,
    pub overlay: Rgba,
}

impl Palette {
    /// Fill colour for a style class, `None` for classes drawn as text only
    pub fn fill_for(&self, style: StyleClass) -> Option<Rgba> {
        match style {
            StyleClass::Background => Some(self.background),
            StyleClass::Menu | StyleClass::MenuButton | StyleClass::WindowControl => Some(self.menu),
            StyleClass::Shortcut => Some(self.shortcut),
            StyleClass::ShortcutSending => Some(self.shortcut_sending),
            StyleClass::ShortcutReceiving => Some(self.shortcut_receiving),
            StyleClass::Window => Some(self.window),
            StyleClass::Chooser | StyleClass::ChooserEntry => Some(self.chooser),
            StyleClass::Overlay => Some(self.overlay),
            StyleClass::Plain | StyleClass::Title => None,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba::rgb(0x30, 0x40, 0x50),
            menu: Rgba::rgb(0x00, 0x00, 0x00),
            shortcut: Rgba::rgb(0xE0, 0xE8, 0xF0),
            shortcut_sending: Rgba::rgb(0xFF, 0xE0, 0xE0),
            shortcut_receiving: Rgba::rgb(0xE0, 0xFF, 0xE0),
            window: Rgba::rgb(0xF0, 0xF0, 0xF0),
            chooser: Rgba::rgb(0x10, 0x10, 0x10),
            overlay: Rgba::rgb(0x40, 0x40, 0x40),
        }
    }
}

/// Geometry, colours and transition policy of the desktop
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    pub screen_width: i32,
    pub screen_height: i32,
    pub menu_height: i32,
    pub shortcut_width: i32,
    pub shortcut_height: i32,
    pub shortcut_gap: i32,
    pub page_padding: i32,
    pub title_margin: i32,
    pub window_padding: i32,
    pub chooser_width: Option<i32>,
    pub chooser_height: Option<i32>,
    pub shortcut_opacity: u8,
    pub transition: TransitionPolicy,
    pub palette: Palette,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            screen_width: Self::DEFAULT_SCREEN_WIDTH,
            screen_height: Self::DEFAULT_SCREEN_HEIGHT,
            menu_height: 40,
            shortcut_width: 100,
            shortcut_height: 80,
            shortcut_gap: 15,
            page_padding: 10,
            title_margin: 2,
            window_padding: 5,
            chooser_width: None,
            chooser_height: None,
            shortcut_opacity: 204,
            transition: TransitionPolicy::default(),
            palette: Palette::default(),
        }
    }
}

impl ShellConfig {
    pub const DEFAULT_SCREEN_WIDTH: i32 = 480;
    pub const DEFAULT_SCREEN_HEIGHT: i32 = 320;

    /// Parses and validates a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Same configuration with a different transition policy
    pub fn with_transition(mut self, transition: TransitionPolicy) -> Self {
        self.transition = transition;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("screen_width", self.screen_width),
            ("screen_height", self.screen_height),
            ("menu_height", self.menu_height),
            ("shortcut_width", self.shortcut_width),
            ("shortcut_height", self.shortcut_height),
        ] {
            if value <= 0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }
        for (field, value) in [
            ("shortcut_gap", self.shortcut_gap),
            ("page_padding", self.page_padding),
            ("title_margin", self.title_margin),
            ("window_padding", self.window_padding),
        ] {
            if value < 0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        if let Some(value) = self.chooser_width.filter(|w| *w <= 0) {
            return Err(ConfigError::NonPositive { field: "chooser_width", value });
        }
        if let Some(value) = self.chooser_height.filter(|h| *h <= 0) {
            return Err(ConfigError::NonPositive { field: "chooser_height", value });
        }

        if self.menu_height >= self.screen_height {
            return Err(ConfigError::MenuTooTall {
                menu_height: self.menu_height,
                screen_height: self.screen_height,
            });
        }

        let page_width = self.screen_width - 2 * self.page_padding;
        if self.shortcut_width > page_width {
            return Err(ConfigError::ShortcutTooLarge {
                width: self.shortcut_width,
                page_width,
            });
        }

        if let TransitionPolicy::Animated { window_ms, shortcut_ms } = self.transition {
            if window_ms == 0 || shortcut_ms == 0 {
                return Err(ConfigError::ZeroDuration);
            }
        }

        Ok(())
    }

    pub fn screen_area(&self) -> Rect {
        Rect::new(0, 0, self.screen_width, self.screen_height)
    }

    pub fn menu_area(&self) -> Rect {
        Rect::new(0, 0, self.screen_width, self.menu_height)
    }

    /// Area of the application chooser list, right below the menu
    pub fn chooser_area(&self) -> Rect {
        let w = self.chooser_width.unwrap_or(self.screen_width / 3);
        let h = self.chooser_height.unwrap_or(3 * self.screen_height / 4);
        Rect::new(0, self.menu_height, w, h)
    }

    /// Usable body of a full-screen window below its header
    pub fn window_content_area(&self) -> Rect {
        let pad = self.window_padding;
        Rect::new(
            pad,
            self.menu_height + pad,
            self.screen_width - 2 * pad,
            self.screen_height - self.menu_height - 2 * pad,
        )
    }

    /// Area of the on-screen input overlay, the lower half of the display
    pub fn input_overlay_area(&self) -> Rect {
        let h = self.screen_height / 2;
        Rect::new(0, self.screen_height - h, self.screen_width, h)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: i32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i32 },
    #[error("menu height {menu_height} leaves no room on a {screen_height}px screen")]
    MenuTooTall { menu_height: i32, screen_height: i32 },
    #[error("shortcut width {width} does not fit the {page_width}px shortcut page")]
    ShortcutTooLarge { width: i32, page_width: i32 },
    #[error("animated transitions need non-zero durations")]
    ZeroDuration,
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot read configuration {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ShellConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.transition.is_animated());
        assert_eq!(config.chooser_area(), Rect::new(0, 40, 160, 240));
    }

    #[test]
    fn toml_overrides_fields() {
        let config = ShellConfig::from_toml_str(
            r#"
            screen_width = 800
            screen_height = 480
            chooser_width = 300

            [transition]
            kind = "immediate"

            [palette]
            shortcut = [1, 2, 3, 255]
            "#,
        )
        .unwrap();

        assert_eq!(config.screen_width, 800);
        assert_eq!(config.menu_height, 40);
        assert_eq!(config.transition, TransitionPolicy::Immediate);
        assert_eq!(config.palette.shortcut, Rgba([1, 2, 3, 255]));
        assert_eq!(config.palette.window, Palette::default().window);
        assert_eq!(config.chooser_area().w, 300);
    }

    #[test]
    fn animated_policy_parses_durations() {
        let config = ShellConfig::from_toml_str(
            r#"
            [transition]
            kind = "animated"
            window_ms = 120
            shortcut_ms = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.transition.window_ms(), Some(120));
        assert_eq!(config.transition.shortcut_ms(), Some(60));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = ShellConfig::from_toml_str("screen_depth = 16").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let mut config = ShellConfig::default();
        config.screen_width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { field: "screen_width", .. })
        ));

        let mut config = ShellConfig::default();
        config.menu_height = config.screen_height;
        assert!(matches!(config.validate(), Err(ConfigError::MenuTooTall { .. })));

        let mut config = ShellConfig::default();
        config.shortcut_width = config.screen_width;
        assert!(matches!(config.validate(), Err(ConfigError::ShortcutTooLarge { .. })));

        let mut config = ShellConfig::default();
        config.shortcut_gap = -1;
        assert!(matches!(config.validate(), Err(ConfigError::Negative { .. })));
    }

    #[test]
    fn zero_duration_animation_is_rejected() {
        let config = ShellConfig::default().with_transition(TransitionPolicy::Animated {
            window_ms: 0,
            shortcut_ms: 100,
        });
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDuration)));
    }

    #[test]
    fn window_content_excludes_header_and_padding() {
        let config = ShellConfig::default();
        assert_eq!(config.window_content_area(), Rect::new(5, 45, 470, 270));
    }
}
