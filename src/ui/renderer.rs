//! Desktop rendering
//!
//! Rasterises a [`Scene`] snapshot of the desktop with tiny-skia. The scene
//! is built by the desktop from toolkit state, so layout and rendering stay
//! separately testable.

use std::path::Path;

use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect as SkiaRect, Stroke, Transform};

use crate::domain::core::Rect;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid scene dimensions: {width}x{height}")]
    InvalidSceneDimensions { width: i32, height: i32 },

    #[error("Failed to write PNG: {0}")]
    EncodingFailed(String),
}

/// One filled rectangle of the desktop
#[derive(Debug, Clone)]
pub struct SceneItem {
    pub area: Rect,
    pub fill: Color,
    /// Element opacity, applied on top of the fill alpha
    pub opacity: u8,
    /// Draw a thin border around the rectangle
    pub outlined: bool,
}

/// Back-to-front list of desktop rectangles
#[derive(Debug, Clone)]
pub struct Scene {
    pub width: i32,
    pub height: i32,
    pub items: Vec<SceneItem>,
}

/// Software renderer for desktop scenes
#[derive(Debug)]
pub struct DesktopRenderer {
    border_color: Color,
    border_width: f32,
}

impl DesktopRenderer {
    pub fn new() -> Self {
        Self {
            border_color: Color::from_rgba8(0x40, 0x60, 0x80, 0xFF),
            border_width: 1.0,
        }
    }

    /// Render a scene to a new pixmap
    pub fn render(&self, scene: &Scene) -> Result<Pixmap, RendererError> {
        if scene.width <= 0 || scene.height <= 0 {
            return Err(RendererError::InvalidSceneDimensions {
                width: scene.width,
                height: scene.height,
            });
        }

        let mut pixmap = Pixmap::new(scene.width as u32, scene.height as u32)
            .ok_or(RendererError::PixmapCreationFailed)?;
        pixmap.fill(Color::BLACK);

        for item in &scene.items {
            self.render_item(&mut pixmap, item);
        }

        Ok(pixmap)
    }

    /// Write a rendered pixmap as PNG
    pub fn save_png(&self, pixmap: &Pixmap, path: &Path) -> Result<(), RendererError> {
        pixmap
            .save_png(path)
            .map_err(|e| RendererError::EncodingFailed(e.to_string()))
    }

    fn render_item(&self, pixmap: &mut Pixmap, item: &SceneItem) {
        if item.area.is_empty() || item.opacity == 0 {
            return;
        }
        let Some(rect) = SkiaRect::from_xywh(
            item.area.x as f32,
            item.area.y as f32,
            item.area.w as f32,
            item.area.h as f32,
        ) else {
            return;
        };

        let opacity = f32::from(item.opacity) / 255.0;
        let mut fill = item.fill;
        fill.apply_opacity(opacity);

        let mut paint = Paint::default();
        paint.set_color(fill);
        paint.anti_alias = false;
        pixmap.fill_rect(rect, &paint, Transform::identity(), None);

        if item.outlined {
            let path = PathBuilder::from_rect(rect);
            let mut border = self.border_color;
            border.apply_opacity(opacity);
            paint.set_color(border);

            let stroke = Stroke {
                width: self.border_width,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}

impl Default for DesktopRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(area: Rect, fill: Color, opacity: u8) -> SceneItem {
        SceneItem {
            area,
            fill,
            opacity,
            outlined: false,
        }
    }

    #[test]
    fn render_fills_items_back_to_front() {
        let scene = Scene {
            width: 40,
            height: 30,
            items: vec![
                item(Rect::new(0, 0, 40, 30), Color::from_rgba8(10, 20, 30, 255), 255),
                item(Rect::new(5, 5, 10, 10), Color::from_rgba8(200, 100, 50, 255), 255),
            ],
        };

        let pixmap = DesktopRenderer::new().render(&scene).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (40, 30));

        let inside = pixmap.pixel(8, 8).unwrap();
        assert_eq!((inside.red(), inside.green(), inside.blue()), (200, 100, 50));

        let outside = pixmap.pixel(30, 20).unwrap();
        assert_eq!((outside.red(), outside.green(), outside.blue()), (10, 20, 30));
    }

    #[test]
    fn transparent_items_are_skipped() {
        let scene = Scene {
            width: 10,
            height: 10,
            items: vec![item(Rect::new(0, 0, 10, 10), Color::WHITE, 0)],
        };

        let pixmap = DesktopRenderer::new().render(&scene).unwrap();
        let px = pixmap.pixel(5, 5).unwrap();
        assert_eq!((px.red(), px.green(), px.blue()), (0, 0, 0));
    }

    #[test]
    fn empty_scene_dimensions_fail() {
        let scene = Scene {
            width: 0,
            height: 10,
            items: Vec::new(),
        };
        assert!(matches!(
            DesktopRenderer::new().render(&scene),
            Err(RendererError::InvalidSceneDimensions { .. })
        ));
    }
}
