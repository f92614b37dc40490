use geometry::{Extent, ScreenPx, Viewport};
use graphics::{Color, GraphicsApi};

use crate::{
    frame::{Frame, FRAME_PERIOD},
    graphic::{DrawAction, Graphic},
};

/// An animated box for checking that the render loop is alive. The outline
/// blinks and a bar across the middle fills up once per period.
///
/// Because it animates, a scene containing a `DebugBox` never goes idle.
pub struct DebugBox {
    viewport: Viewport,
    color: Color,
    thickness: i32,
    period: u32,
}

impl DebugBox {
    pub const DEFAULT_PERIOD: u32 = 60;

    /// Distance from the window edges when placed with [`DebugBox::place`].
    pub const MARGIN: i32 = 40;

    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            viewport: Viewport::from_xywh(0, 0, width, height),
            color: Color::GREEN,
            thickness: 2,
            period: Self::DEFAULT_PERIOD,
        }
    }

    /// Sets the length of one blink cycle in frames.
    ///
    /// ## Panics
    ///
    /// Panics if `period` does not divide [`FRAME_PERIOD`], which would make
    /// the animation jump when the frame counter wraps.
    #[must_use]
    pub fn with_period(mut self, period: u32) -> Self {
        assert!(
            period > 0 && FRAME_PERIOD % period == 0,
            "period {} does not divide the frame period",
            period
        );
        self.period = period;
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_thickness(mut self, thickness: i32) -> Self {
        self.thickness = thickness.max(1);
        self
    }

    #[must_use]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Moves the box to the top-right corner of a surface of the given size.
    pub fn place(&mut self, surface: Extent<u32, ScreenPx>) {
        let surface_width = i32::try_from(surface.width).unwrap_or(i32::MAX);
        let (width, height) = (self.viewport.width(), self.viewport.height());

        self.viewport = Viewport::from_xywh(
            surface_width - width - Self::MARGIN,
            Self::MARGIN,
            width,
            height,
        );
    }

    /// The four edges of the outline, relative to the viewport.
    #[must_use]
    pub fn outline(&self) -> [Viewport; 4] {
        let (w, h, t) = (self.viewport.width(), self.viewport.height(), self.thickness);

        [
            Viewport::from_xywh(0, 0, w, t),
            Viewport::from_xywh(0, h - t, w, t),
            Viewport::from_xywh(0, t, t, h - 2 * t),
            Viewport::from_xywh(w - t, t, t, h - 2 * t),
        ]
    }

    /// The progress bar for `frame`, relative to the viewport.
    #[must_use]
    pub fn progress(&self, frame: &Frame) -> Viewport {
        let (w, h, t) = (self.viewport.width(), self.viewport.height(), self.thickness);
        let track = (w - 4 * t).max(0);
        let filled = (frame.phase(self.period) * f64::from(track)).round() as i32;

        Viewport::from_xywh(2 * t, h / 2 - t, filled, 2 * t)
    }
}

impl Graphic for DebugBox {
    fn draw_action(&self, _frame: &Frame) -> DrawAction {
        DrawAction::Animate
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn draw(&mut self, gfx: &mut dyn GraphicsApi, frame: &Frame) {
        if frame.phase(self.period) < 0.5 {
            for edge in self.outline() {
                gfx.fill_rect(edge, self.color);
            }
        }

        let progress = self.progress(frame);
        if !progress.is_empty() {
            gfx.fill_rect(progress, self.color);
        }
    }
}

#[cfg(test)]
mod tests {
    use graphics::Headless;

    use super::*;
    use crate::{
        driver::{FrameDriver, LoopDirective},
        frame::FrameCounter,
    };

    fn vp(x: i32, y: i32, w: i32, h: i32) -> Viewport {
        Viewport::from_xywh(x, y, w, h)
    }

    #[test]
    fn placed_in_top_right_corner() {
        let mut debug = DebugBox::new(300, 100);
        debug.place(Extent::new(800, 600));
        assert_eq!(debug.viewport(), vp(460, 40, 300, 100));

        debug.place(Extent::new(1024, 768));
        assert_eq!(debug.viewport(), vp(684, 40, 300, 100));
    }

    #[test]
    fn outline_edges() {
        let debug = DebugBox::new(10, 6).with_thickness(1);

        assert_eq!(
            debug.outline(),
            [vp(0, 0, 10, 1), vp(0, 5, 10, 1), vp(0, 1, 1, 4), vp(9, 1, 1, 4)]
        );
    }

    #[test]
    fn progress_fills_over_period() {
        let debug = DebugBox::new(10, 6).with_thickness(1).with_period(60);

        let start = FrameCounter::starting_at(60).current();
        assert!(debug.progress(&start).is_empty());

        let half = FrameCounter::starting_at(30).current();
        assert_eq!(debug.progress(&half), vp(2, 2, 3, 2));
    }

    #[test]
    #[should_panic]
    fn period_must_divide_frame_period() {
        let _ = DebugBox::new(10, 10).with_period(13);
    }

    #[test]
    fn blinks_while_animating() {
        let debug = DebugBox::new(10, 6)
            .with_thickness(1)
            .with_period(4)
            .with_color(Color::WHITE);

        let mut driver = FrameDriver::default();
        let mut gfx = Headless::new(Extent::new(20, 20));
        driver.resize(&mut gfx, Extent::new(20, 20));
        driver.registry_mut().append(std::rc::Rc::new(std::cell::RefCell::new(debug)));

        // Phase 1/4: outline visible.
        let report = driver.render_frame(&mut gfx);
        assert_eq!(report.directive, LoopDirective::Continue);
        assert_eq!(gfx.target().pixel(0, 0), Some(Color::WHITE));

        // Phase 2/4: outline hidden.
        driver.render_frame(&mut gfx);
        assert_eq!(gfx.target().pixel(0, 0), Some(Color::BLACK));

        // Phase 0: outline back.
        driver.render_frame(&mut gfx);
        driver.render_frame(&mut gfx);
        assert_eq!(gfx.target().pixel(0, 0), Some(Color::WHITE));
    }
}
