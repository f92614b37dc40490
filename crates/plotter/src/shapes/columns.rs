use geometry::Viewport;
use graphics::{Color, GraphicsApi};

use crate::{
    frame::Frame,
    graphic::{DrawAction, Graphic},
};

/// A bar plot. Each value is drawn as a column rising from the bottom of the
/// viewport, scaled so that the largest value (or a fixed scale) fills the
/// full height.
///
/// The plot sleeps until its values change.
pub struct Columns {
    viewport: Viewport,
    values: Vec<f32>,
    scale: Option<f32>,
    background: Color,
    color: Color,
    margin: i32,
    dirty: bool,
}

impl Columns {
    /// Horizontal space left on each side of a column.
    pub const DEFAULT_MARGIN: i32 = 4;

    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            values: Vec::new(),
            scale: None,
            background: Color::new(0.1, 0.1, 0.1, 1.0),
            color: Color::new(0.6, 0.2, 0.8, 1.0),
            margin: Self::DEFAULT_MARGIN,
            dirty: false,
        }
    }

    #[must_use]
    pub fn with_colors(mut self, background: Color, color: Color) -> Self {
        self.background = background;
        self.color = color;
        self
    }

    /// Fixes the value that fills the full height. Larger values are clipped.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    #[must_use]
    pub fn with_margin(mut self, margin: i32) -> Self {
        self.margin = margin.max(0);
        self
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn set_values(&mut self, values: impl IntoIterator<Item = f32>) {
        self.values.clear();
        self.values.extend(values);
        self.dirty = true;
    }

    pub fn push(&mut self, value: f32) {
        self.values.push(value);
        self.dirty = true;
    }

    /// Moves the plot. The old and new regions are repainted on the next
    /// frame.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// The rectangle of each column relative to the viewport, in value order.
    /// Negative and non-finite values produce empty columns.
    #[must_use]
    pub fn column_rects(&self) -> Vec<Viewport> {
        let count = self.values.len() as i64;
        if count == 0 {
            return Vec::new();
        }

        let width = i64::from(self.viewport.width());
        let height = self.viewport.height();
        let scale = self.scale.unwrap_or_else(|| {
            self.values
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold(0.0, f32::max)
        });

        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let i = i as i64;
                let left = (i * width / count) as i32;
                let right = ((i + 1) * width / count) as i32;

                let fraction = if scale > 0.0 && value.is_finite() {
                    (value / scale).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let bar = (fraction * height as f32).round() as i32;

                Viewport::from_xywh(
                    left + self.margin,
                    height - bar,
                    right - left - 2 * self.margin,
                    bar,
                )
            })
            .collect()
    }
}

impl Graphic for Columns {
    fn draw_action(&self, _frame: &Frame) -> DrawAction {
        if self.dirty {
            DrawAction::Invalidate
        } else {
            DrawAction::Sleep
        }
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn draw(&mut self, gfx: &mut dyn GraphicsApi, _frame: &Frame) {
        gfx.fill_rect(
            Viewport::from_xywh(0, 0, self.viewport.width(), self.viewport.height()),
            self.background,
        );

        for rect in self.column_rects() {
            if !rect.is_empty() {
                gfx.fill_rect(rect, self.color);
            }
        }

        self.dirty = false;
    }
}
