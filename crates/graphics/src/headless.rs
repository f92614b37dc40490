use geometry::{Extent, ScreenPx, Viewport};
use smallvec::SmallVec;

use crate::{clip_to_viewport, surface_rect, Color, ErrorCode, GraphicsApi, PixelBuffer};

/// A recorded call into the [`Headless`] backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Resize(Extent<u32, ScreenPx>),
    Clear {
        region: Option<Viewport>,
        color: Color,
    },
    SetViewport(Viewport),
    PushState,
    PopState,
    FillRect {
        rect: Viewport,
        color: Color,
    },
    Present,
}

/// Software backend that draws into a [`PixelBuffer`] and records every call
/// it receives.
pub struct Headless {
    target: PixelBuffer,
    viewport: Viewport,
    stack: SmallVec<[Viewport; 8]>,
    errors: Vec<ErrorCode>,
    commands: Vec<Command>,
    presented: usize,
}

impl Headless {
    #[must_use]
    pub fn new(extent: Extent<u32, ScreenPx>) -> Self {
        Self {
            target: PixelBuffer::new(extent, Color::TRANSPARENT),
            viewport: surface_rect(extent),
            stack: SmallVec::new(),
            errors: Vec::new(),
            commands: Vec::new(),
            presented: 0,
        }
    }

    /// The pixels drawn so far.
    #[must_use]
    pub fn target(&self) -> &PixelBuffer {
        &self.target
    }

    /// Every call received since creation or the last
    /// [`Headless::take_commands`].
    #[must_use]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// The number of times the backend has been presented.
    #[must_use]
    pub fn presented(&self) -> usize {
        self.presented
    }

    /// Queues an error to be returned by [`GraphicsApi::last_error`].
    pub fn inject_error(&mut self, code: ErrorCode) {
        self.errors.push(code);
    }

    /// The depth of the saved state stack.
    #[must_use]
    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }
}

impl GraphicsApi for Headless {
    fn resize(&mut self, extent: Extent<u32, ScreenPx>) {
        self.commands.push(Command::Resize(extent));

        if extent != self.target.extent() {
            self.target = PixelBuffer::new(extent, Color::TRANSPARENT);
            self.viewport = surface_rect(extent);
        }
    }

    fn extent(&self) -> Extent<u32, ScreenPx> {
        self.target.extent()
    }

    fn clear(&mut self, region: Option<Viewport>, color: Color) {
        self.commands.push(Command::Clear { region, color });

        match region {
            Some(region) => self.target.fill_rect(region, color),
            None => self.target.fill(color),
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport(viewport));
        self.viewport = viewport;
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn push_state(&mut self) {
        self.commands.push(Command::PushState);
        self.stack.push(self.viewport);
    }

    fn pop_state(&mut self) {
        self.commands.push(Command::PopState);

        match self.stack.pop() {
            Some(viewport) => self.viewport = viewport,
            None => self.errors.push(ErrorCode::STACK_UNDERFLOW),
        }
    }

    fn fill_rect(&mut self, rect: Viewport, color: Color) {
        self.commands.push(Command::FillRect { rect, color });

        if let Some(clipped) = clip_to_viewport(self.viewport, rect) {
            self.target.fill_rect(clipped, color);
        }
    }

    fn last_error(&mut self) -> Option<ErrorCode> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.errors.remove(0))
        }
    }

    fn present(&mut self) {
        self.commands.push(Command::Present);
        self.presented += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_relative_to_viewport() {
        let mut gfx = Headless::new(Extent::new(8, 8));
        gfx.clear(None, Color::BLACK);

        gfx.set_viewport(Viewport::from_xywh(4, 4, 4, 4));
        gfx.fill_rect(Viewport::from_xywh(0, 0, 100, 100), Color::RED);

        assert_eq!(gfx.target().pixel(3, 3), Some(Color::BLACK));
        assert_eq!(gfx.target().pixel(4, 4), Some(Color::RED));
        assert_eq!(gfx.target().pixel(7, 7), Some(Color::RED));
    }

    #[test]
    fn fills_replace_instead_of_blending() {
        let mut gfx = Headless::new(Extent::new(4, 4));
        gfx.clear(None, Color::RED);
        gfx.fill_rect(Viewport::from_xywh(0, 0, 2, 2), Color::TRANSPARENT);

        assert_eq!(gfx.target().pixel(1, 1), Some(Color::TRANSPARENT));
        assert_eq!(gfx.target().pixel(2, 2), Some(Color::RED));
    }

    #[test]
    fn region_clear_ignores_viewport() {
        let mut gfx = Headless::new(Extent::new(4, 4));
        gfx.clear(None, Color::BLACK);
        gfx.set_viewport(Viewport::from_xywh(0, 0, 1, 1));
        gfx.clear(Some(Viewport::from_xywh(2, 2, 2, 2)), Color::WHITE);

        assert_eq!(gfx.target().pixel(0, 0), Some(Color::BLACK));
        assert_eq!(gfx.target().pixel(3, 3), Some(Color::WHITE));
    }

    #[test]
    fn state_stack() {
        let mut gfx = Headless::new(Extent::new(10, 10));
        let full = gfx.viewport();

        gfx.push_state();
        gfx.set_viewport(Viewport::from_xywh(1, 1, 2, 2));
        assert_eq!(gfx.stack_depth(), 1);
        gfx.pop_state();

        assert_eq!(gfx.viewport(), full);
        assert_eq!(gfx.last_error(), None);

        gfx.pop_state();
        assert_eq!(gfx.last_error(), Some(ErrorCode::STACK_UNDERFLOW));
        assert_eq!(gfx.last_error(), None);
    }

    #[test]
    fn injected_errors_drain_in_order() {
        let mut gfx = Headless::new(Extent::new(1, 1));
        gfx.inject_error(ErrorCode::INVALID_VALUE);
        gfx.inject_error(ErrorCode::OUT_OF_MEMORY);

        assert_eq!(gfx.last_error(), Some(ErrorCode::INVALID_VALUE));
        assert_eq!(gfx.last_error(), Some(ErrorCode::OUT_OF_MEMORY));
        assert_eq!(gfx.last_error(), None);
    }

    #[test]
    fn resize_discards_contents() {
        let mut gfx = Headless::new(Extent::new(2, 2));
        gfx.clear(None, Color::RED);

        gfx.resize(Extent::new(2, 2));
        assert_eq!(gfx.target().pixel(0, 0), Some(Color::RED));

        gfx.resize(Extent::new(3, 3));
        assert_eq!(gfx.target().pixel(0, 0), Some(Color::TRANSPARENT));
        assert_eq!(gfx.viewport(), Viewport::from_xywh(0, 0, 3, 3));
    }
}
