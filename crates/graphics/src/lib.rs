//! Graphics!
//!
//! The graphics API provider used by the plotter. The frame driver only needs
//! a handful of operations from it (clearing, viewports, a state stack and
//! error reporting), which are captured by [`GraphicsApi`]. Graphics use
//! [`GraphicsApi::fill_rect`] as their drawing primitive. Neither clears nor
//! fills blend; a translucent color replaces the pixels it covers.
//!
//! ## Backends
//!
//! - [`Headless`]: a software rasterizer over a [`PixelBuffer`]. Used in tests
//!   and for rendering without a window.
//! - [`GlowGraphics`]: OpenGL through `glow`. Requires a current context.
//!
//! ## Coordinates
//!
//! All rectangles are in framebuffer pixels with the origin in the top-left
//! corner. Backends that disagree (OpenGL) flip internally.

mod error;
mod gl;
mod headless;
mod pixel_buffer;

pub use self::{
    error::{Error, ErrorCode},
    gl::GlowGraphics,
    headless::{Command, Headless},
    pixel_buffer::{PixelBuffer, PixelFormat, RowIter},
};

use geometry::{Extent, ScreenPx, Viewport};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const RED: Self = Self {
        r: 1.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub const GREEN: Self = Self {
        r: 0.0,
        g: 1.0,
        b: 0.0,
        a: 1.0,
    };

    pub const BLUE: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 1.0,
        a: 1.0,
    };

    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    #[must_use]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// The operations the frame driver and graphics need from a graphics API.
///
/// Implementations must be used from the thread that owns the underlying
/// context.
pub trait GraphicsApi {
    /// Informs the backend of the framebuffer size. Backends that keep their
    /// own render target may lose its contents when the size changes.
    fn resize(&mut self, extent: Extent<u32, ScreenPx>);

    /// The framebuffer size last passed to [`GraphicsApi::resize`].
    fn extent(&self) -> Extent<u32, ScreenPx>;

    /// Fills `region` (or the whole surface if `None`) with `color`, ignoring
    /// the active viewport.
    fn clear(&mut self, region: Option<Viewport>, color: Color);

    /// Sets the active viewport. Subsequent drawing is relative to its origin
    /// and clipped to its bounds.
    fn set_viewport(&mut self, viewport: Viewport);

    /// The active viewport.
    fn viewport(&self) -> Viewport;

    /// Saves the active viewport.
    fn push_state(&mut self);

    /// Restores the most recently saved viewport. Popping an empty stack is
    /// reported through [`GraphicsApi::last_error`].
    fn pop_state(&mut self);

    /// Fills a rectangle given relative to the active viewport.
    ///
    /// Fills are opaque writes: the pixels take on `color`, alpha included,
    /// and nothing is blended with what was there before.
    fn fill_rect(&mut self, rect: Viewport, color: Color);

    /// Returns and clears one pending error, if any.
    fn last_error(&mut self) -> Option<ErrorCode>;

    /// Makes everything drawn so far visible to the window system. Called
    /// before the window swaps buffers.
    fn present(&mut self);
}

/// Maps a rectangle relative to `viewport` into surface coordinates, clipped
/// to the viewport.
pub(crate) fn clip_to_viewport(viewport: Viewport, rect: Viewport) -> Option<Viewport> {
    let absolute = rect + geometry::Offset::new(viewport.x(), viewport.y());
    absolute.intersection(&viewport)
}

/// The whole surface as a rectangle.
pub fn surface_rect(extent: Extent<u32, ScreenPx>) -> Viewport {
    Viewport::from_xywh(
        0,
        0,
        i32::try_from(extent.width).unwrap_or(i32::MAX),
        i32::try_from(extent.height).unwrap_or(i32::MAX),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_relative_rect() {
        let viewport = Viewport::from_xywh(10, 10, 20, 20);

        assert_eq!(
            clip_to_viewport(viewport, Viewport::from_xywh(0, 0, 5, 5)),
            Some(Viewport::from_xywh(10, 10, 5, 5))
        );
        assert_eq!(
            clip_to_viewport(viewport, Viewport::from_xywh(15, 15, 10, 10)),
            Some(Viewport::from_xywh(25, 25, 5, 5))
        );
        assert_eq!(
            clip_to_viewport(viewport, Viewport::from_xywh(30, 0, 5, 5)),
            None
        );
    }

    #[test]
    fn surface() {
        assert_eq!(
            surface_rect(Extent::new(640, 480)),
            Viewport::from_xywh(0, 0, 640, 480)
        );
    }
}
