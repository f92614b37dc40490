use std::{cell::RefCell, rc::Rc};

use geometry::Viewport;
use graphics::GraphicsApi;

use crate::frame::Frame;

/// How urgently a graphic needs to be redrawn this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawAction {
    /// Nothing changed. The graphic is only redrawn if something it overlaps
    /// is redrawn.
    Sleep,
    /// The graphic changed and must be redrawn this frame. Anything it
    /// overlaps is redrawn with it.
    Invalidate,
    /// The graphic is redrawn every frame.
    Animate,
}

/// A request from a graphic to stop the render loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitRequest {
    /// Stop rendering and close normally.
    Close,
    /// Stop rendering and report the failure to whoever started the loop.
    Fail(String),
}

/// Something that can be drawn by the frame driver.
///
/// The driver queries [`Graphic::draw_action`], [`Graphic::viewport`] and
/// [`Graphic::exit_request`] every frame. Nothing is cached between frames.
pub trait Graphic {
    fn draw_action(&self, frame: &Frame) -> DrawAction;

    /// The region of the window the graphic draws into.
    fn viewport(&self) -> Viewport;

    /// Draws the graphic. The active viewport has already been set to
    /// [`Graphic::viewport`], and the region has been cleared.
    fn draw(&mut self, gfx: &mut dyn GraphicsApi, frame: &Frame);

    fn exit_request(&self) -> Option<ExitRequest> {
        None
    }
}

impl<G: Graphic + ?Sized> Graphic for Box<G> {
    fn draw_action(&self, frame: &Frame) -> DrawAction {
        (**self).draw_action(frame)
    }

    fn viewport(&self) -> Viewport {
        (**self).viewport()
    }

    fn draw(&mut self, gfx: &mut dyn GraphicsApi, frame: &Frame) {
        (**self).draw(gfx, frame);
    }

    fn exit_request(&self) -> Option<ExitRequest> {
        (**self).exit_request()
    }
}

/// A graphic shared between the registry and whoever created it.
pub type SharedGraphic = Rc<RefCell<dyn Graphic>>;
