//! Shortcut grid layout
//!
//! Shortcuts fill the page row by row below the menu. The layout is pure
//! geometry so it can be checked without a toolkit.

use crate::config::ShellConfig;
use crate::domain::core::Rect;

/// Grid of shortcut slots on the desktop page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutGrid {
    pub columns: i32,
    origin_x: i32,
    origin_y: i32,
    cell_w: i32,
    cell_h: i32,
    gap: i32,
}

impl ShortcutGrid {
    pub fn from_config(config: &ShellConfig) -> Self {
        let usable = config.screen_width - 2 * config.page_padding;
        let columns = ((usable + config.shortcut_gap) / (config.shortcut_width + config.shortcut_gap)).max(1);

        Self {
            columns,
            origin_x: config.page_padding,
            origin_y: config.menu_height + config.page_padding,
            cell_w: config.shortcut_width,
            cell_h: config.shortcut_height,
            gap: config.shortcut_gap,
        }
    }

    /// Area of the `index`-th shortcut
    pub fn slot(&self, index: usize) -> Rect {
        let index = index as i32;
        let col = index % self.columns;
        let row = index / self.columns;
        Rect::new(
            self.origin_x + col * (self.cell_w + self.gap),
            self.origin_y + row * (self.cell_h + self.gap),
            self.cell_w,
            self.cell_h,
        )
    }
}

/// Area of a shortcut title inside its shortcut
pub fn title_area(shortcut: Rect, config: &ShellConfig) -> Rect {
    Rect::new(
        shortcut.x,
        shortcut.y + config.title_margin,
        shortcut.w,
        (shortcut.h / 4).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_wrap_after_last_column() {
        let config = ShellConfig::default();
        let grid = ShortcutGrid::from_config(&config);

        // 460px usable, 100px shortcuts with 15px gaps
        assert_eq!(grid.columns, 4);
        assert_eq!(grid.slot(0), Rect::new(10, 50, 100, 80));
        assert_eq!(grid.slot(1), Rect::new(125, 50, 100, 80));
        assert_eq!(grid.slot(4), Rect::new(10, 145, 100, 80));
    }

    #[test]
    fn narrow_screen_keeps_one_column() {
        let mut config = ShellConfig::default();
        config.screen_width = 120;
        let grid = ShortcutGrid::from_config(&config);
        assert_eq!(grid.columns, 1);
        assert_eq!(grid.slot(2).y, 50 + 2 * 95);
    }

    #[test]
    fn title_sits_at_top_margin() {
        let config = ShellConfig::default();
        let title = title_area(Rect::new(10, 50, 100, 80), &config);
        assert_eq!(title, Rect::new(10, 52, 100, 20));
    }
}
