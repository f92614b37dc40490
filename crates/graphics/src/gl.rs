use geometry::{Extent, ScreenPx, Viewport};
use glow::HasContext;
use log::{debug, error};
use smallvec::SmallVec;

use crate::{clip_to_viewport, surface_rect, Color, Error, ErrorCode, GraphicsApi};

/// OpenGL backend.
///
/// Everything is drawn into an offscreen framebuffer that is blitted to the
/// window on [`GraphicsApi::present`]. The offscreen image keeps its contents
/// across buffer swaps, which lets the frame driver skip graphics whose pixels
/// are still valid. Its contents are lost when the surface is resized.
pub struct GlowGraphics {
    gl: glow::Context,
    extent: Extent<u32, ScreenPx>,
    framebuffer: Option<glow::Framebuffer>,
    renderbuffer: Option<glow::Renderbuffer>,
    viewport: Viewport,
    stack: SmallVec<[Viewport; 8]>,
    errors: SmallVec<[ErrorCode; 4]>,
}

impl GlowGraphics {
    /// Creates the backend and its offscreen render target.
    ///
    /// ## Safety
    ///
    /// The context behind `gl` must be current on the calling thread, and must
    /// remain current whenever the returned value is used or dropped.
    pub unsafe fn new(gl: glow::Context, extent: Extent<u32, ScreenPx>) -> Result<Self, Error> {
        let mut graphics = Self {
            gl,
            extent,
            framebuffer: None,
            renderbuffer: None,
            viewport: surface_rect(extent),
            stack: SmallVec::new(),
            errors: SmallVec::new(),
        };

        graphics.create_target()?;
        graphics.gl.enable(glow::SCISSOR_TEST);
        graphics.apply_viewport();

        Ok(graphics)
    }

    fn create_target(&mut self) -> Result<(), Error> {
        self.destroy_target();

        let (width, height) = gl_size(self.extent);

        // SAFETY: the context is current (see `new`).
        unsafe {
            let renderbuffer =
                self.gl
                    .create_renderbuffer()
                    .map_err(|message| Error::ResourceCreation {
                        what: "renderbuffer",
                        message,
                    })?;
            self.renderbuffer = Some(renderbuffer);

            self.gl
                .bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            self.gl
                .renderbuffer_storage(glow::RENDERBUFFER, glow::RGBA8, width, height);

            let framebuffer =
                self.gl
                    .create_framebuffer()
                    .map_err(|message| Error::ResourceCreation {
                        what: "framebuffer",
                        message,
                    })?;
            self.framebuffer = Some(framebuffer);

            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(renderbuffer),
            );

            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                return Err(Error::IncompleteFramebuffer { status });
            }
        }

        debug!("created {}x{} offscreen target", width, height);
        Ok(())
    }

    fn destroy_target(&mut self) {
        // SAFETY: the context is current (see `new`).
        unsafe {
            if let Some(framebuffer) = self.framebuffer.take() {
                self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                self.gl.delete_framebuffer(framebuffer);
            }

            if let Some(renderbuffer) = self.renderbuffer.take() {
                self.gl.delete_renderbuffer(renderbuffer);
            }
        }
    }

    /// Converts a top-left origin rectangle to GL's bottom-left origin.
    fn flip(&self, rect: Viewport) -> (i32, i32, i32, i32) {
        let surface_height = gl_size(self.extent).1;
        (
            rect.x(),
            surface_height.saturating_sub(rect.bottom_left().y),
            rect.width(),
            rect.height(),
        )
    }

    fn scissor(&self, rect: Viewport) {
        let (x, y, w, h) = self.flip(rect);
        // SAFETY: the context is current (see `new`).
        unsafe { self.gl.scissor(x, y, w, h) };
    }

    fn apply_viewport(&self) {
        let (x, y, w, h) = self.flip(self.viewport);
        // SAFETY: the context is current (see `new`).
        unsafe { self.gl.viewport(x, y, w, h) };
        self.scissor(self.viewport);
    }

    fn clear_scissored(&self, rect: Viewport, color: Color) {
        self.scissor(rect);
        // SAFETY: the context is current (see `new`).
        unsafe {
            self.gl.clear_color(color.r, color.g, color.b, color.a);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
        self.scissor(self.viewport);
    }
}

impl GraphicsApi for GlowGraphics {
    fn resize(&mut self, extent: Extent<u32, ScreenPx>) {
        if extent == self.extent {
            return;
        }

        self.extent = extent;
        self.viewport = surface_rect(extent);
        self.stack.clear();

        if let Err(e) = self.create_target() {
            error!("could not recreate offscreen target: {}", e);
            self.errors.push(ErrorCode::INVALID_FRAMEBUFFER_OPERATION);
        }

        self.apply_viewport();
    }

    fn extent(&self) -> Extent<u32, ScreenPx> {
        self.extent
    }

    fn clear(&mut self, region: Option<Viewport>, color: Color) {
        let region = region.unwrap_or_else(|| surface_rect(self.extent));
        if !region.is_empty() {
            self.clear_scissored(region, color);
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.apply_viewport();
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn push_state(&mut self) {
        self.stack.push(self.viewport);
    }

    fn pop_state(&mut self) {
        match self.stack.pop() {
            Some(viewport) => {
                self.viewport = viewport;
                self.apply_viewport();
            }
            None => self.errors.push(ErrorCode::STACK_UNDERFLOW),
        }
    }

    fn fill_rect(&mut self, rect: Viewport, color: Color) {
        if let Some(clipped) = clip_to_viewport(self.viewport, rect) {
            self.clear_scissored(clipped, color);
        }
    }

    fn last_error(&mut self) -> Option<ErrorCode> {
        if !self.errors.is_empty() {
            return Some(self.errors.remove(0));
        }

        // SAFETY: the context is current (see `new`).
        match unsafe { self.gl.get_error() } {
            glow::NO_ERROR => None,
            code => Some(ErrorCode(code)),
        }
    }

    fn present(&mut self) {
        let (width, height) = gl_size(self.extent);

        // SAFETY: the context is current (see `new`).
        unsafe {
            self.gl.disable(glow::SCISSOR_TEST);
            self.gl
                .bind_framebuffer(glow::READ_FRAMEBUFFER, self.framebuffer);
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);
            self.gl.blit_framebuffer(
                0,
                0,
                width,
                height,
                0,
                0,
                width,
                height,
                glow::COLOR_BUFFER_BIT,
                glow::NEAREST,
            );
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, self.framebuffer);
            self.gl.enable(glow::SCISSOR_TEST);
        }
    }
}

impl Drop for GlowGraphics {
    fn drop(&mut self) {
        self.destroy_target();
    }
}

/// GL sizes are signed and must be non-zero for renderbuffer storage.
fn gl_size(extent: Extent<u32, ScreenPx>) -> (i32, i32) {
    let clamp = |v: u32| i32::try_from(v.max(1)).unwrap_or(i32::MAX);
    (clamp(extent.width), clamp(extent.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gl_size_never_zero() {
        assert_eq!(gl_size(Extent::new(0, 0)), (1, 1));
        assert_eq!(gl_size(Extent::new(640, 480)), (640, 480));
        assert_eq!(gl_size(Extent::new(u32::MAX, 1)), (i32::MAX, 1));
    }
}
