//! The loop that drives a [`FrameDriver`] against a window.

use geometry::{Extent, ScreenPx};
use graphics::GraphicsApi;
use log::{debug, error, info};

use crate::{
    driver::{FrameDriver, LoopDirective},
    error::Error,
    registry::Waker,
};

/// The window operations the governing loop needs.
pub trait WindowSystem {
    type Error: std::error::Error;

    /// The size of the window's drawable surface in pixels.
    fn framebuffer_size(&self) -> Extent<u32, ScreenPx>;

    fn should_close(&self) -> bool;

    fn set_should_close(&mut self, value: bool);

    /// Shows the presented frame.
    fn swap_buffers(&mut self) -> Result<(), Self::Error>;

    /// Processes pending events without blocking. Returns true if the window
    /// system damaged the surface contents (resize, expose).
    fn poll_events(&mut self) -> bool;

    /// Blocks until at least one event arrives, then processes all pending
    /// events. Returns true if the window system damaged the surface contents.
    fn wait_events(&mut self) -> bool;

    /// A callback that makes a blocked [`WindowSystem::wait_events`] return.
    /// Graphics submitted from other threads use it to get drawn while the
    /// scene is idle.
    fn waker(&self) -> Option<Waker> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// Blocked on the window system until the next event.
    IdleWait,
    Closing,
    ClosingWithError,
}

impl LoopState {
    /// The state after a frame that returned `directive`.
    ///
    /// Terminal states never change.
    #[must_use]
    pub fn next(self, directive: LoopDirective) -> Self {
        if self.is_terminal() {
            return self;
        }

        match directive {
            LoopDirective::Continue => LoopState::Running,
            LoopDirective::Idle => LoopState::IdleWait,
            LoopDirective::Close => LoopState::Closing,
            LoopDirective::Fail => LoopState::ClosingWithError,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Closing | LoopState::ClosingWithError)
    }
}

/// Draws frames into `gfx` and shows them in `window` until the window is
/// closed or a graphic asks to stop.
///
/// Returns the failure reported by a graphic if the loop stopped because of
/// [`LoopDirective::Fail`].
pub fn run<W: WindowSystem + ?Sized>(
    window: &mut W,
    gfx: &mut dyn GraphicsApi,
    driver: &mut FrameDriver,
) -> Result<(), Error> {
    let mut state = LoopState::Running;
    info!("render loop started");

    if let Some(waker) = window.waker() {
        driver.registry().set_waker(waker);
    }

    while !state.is_terminal() {
        if window.should_close() {
            transition(&mut state, LoopState::Closing);
            break;
        }

        driver.resize(gfx, window.framebuffer_size());
        let report = driver.render_frame(gfx);

        if report.painted() {
            gfx.present();
            if let Err(e) = window.swap_buffers() {
                error!("frame {}: failed to swap buffers: {}", report.frame.count, e);
            }
        }

        let next = state.next(report.directive);
        transition(&mut state, next);

        let damaged = match state {
            LoopState::Running => window.poll_events(),
            LoopState::IdleWait => {
                let damaged = window.wait_events();
                transition(&mut state, LoopState::Running);
                damaged
            }
            LoopState::Closing | LoopState::ClosingWithError => {
                window.set_should_close(true);
                window.poll_events();
                false
            }
        };

        if damaged {
            driver.invalidate_all();
        }
    }

    match state {
        LoopState::ClosingWithError => driver.take_failure().map_or(Ok(()), Err),
        _ => Ok(()),
    }
}

fn transition(state: &mut LoopState, next: LoopState) {
    if *state != next {
        if next.is_terminal() {
            info!("render loop: {:?} -> {:?}", state, next);
        } else {
            debug!("render loop: {:?} -> {:?}", state, next);
        }
        *state = next;
    }
}
