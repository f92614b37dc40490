//! A native window with an OpenGL context, for running a
//! [`plotter::FrameDriver`] on screen.

use std::{ffi::CString, num::NonZeroU32, sync::Arc};

use geometry::{Extent, Offset, ScreenPx};
use glutin::{
    config::ConfigTemplateBuilder,
    context::{ContextApi, ContextAttributesBuilder, PossiblyCurrentContext},
    display::{Display, DisplayApiPreference, GetGlDisplay},
    prelude::*,
    surface::{Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface},
};
use graphics::GlowGraphics;
use log::{debug, info, trace, warn};
use parking_lot::Mutex;
use plotter::{WindowSystem, Waker};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle, RawWindowHandle};
use winit::{
    dpi::{LogicalPosition, LogicalSize, PhysicalSize},
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create the window: {0}")]
    Window(String),
    #[error("no OpenGL config is compatible with the window")]
    NoConfig,
    #[error("OpenGL context setup failed")]
    Context(#[from] glutin::error::Error),
    #[error("graphics backend setup failed")]
    Graphics(#[from] graphics::Error),
}

bitflags::bitflags! {
    pub struct WindowFlags: u32 {
        const RESIZABLE = 0x1;
        const VISIBLE = 0x2;
        const TRANSPARENT = 0x4;
        const ALWAYS_ON_TOP = 0x8;
    }
}

impl Default for WindowFlags {
    fn default() -> Self {
        WindowFlags::RESIZABLE | WindowFlags::VISIBLE
    }
}

/// A description of the window to create.
pub struct WindowDesc<'a> {
    pub title: &'a str,
    pub size: Extent<u32, ScreenPx>,
    pub min_size: Option<Extent<u32, ScreenPx>>,
    pub max_size: Option<Extent<u32, ScreenPx>>,
    pub position: Option<Offset<i32, ScreenPx>>,
    pub flags: WindowFlags,
    /// Synchronize buffer swaps with the display's refresh rate.
    pub vsync: bool,
}

impl Default for WindowDesc<'_> {
    fn default() -> Self {
        Self {
            title: "",
            size: Extent::new(800, 600),
            min_size: None,
            max_size: None,
            position: None,
            flags: WindowFlags::default(),
            vsync: true,
        }
    }
}

impl<'a> WindowDesc<'a> {
    fn builder(&self) -> WindowBuilder {
        let mut builder = WindowBuilder::new()
            .with_title(self.title)
            .with_inner_size(as_logical_size(self.size))
            .with_resizable(self.flags.contains(WindowFlags::RESIZABLE))
            .with_visible(self.flags.contains(WindowFlags::VISIBLE))
            .with_transparent(self.flags.contains(WindowFlags::TRANSPARENT))
            .with_always_on_top(self.flags.contains(WindowFlags::ALWAYS_ON_TOP));

        if let Some(position) = self.position {
            builder = builder.with_position(as_logical_position(position));
        }

        if let Some(min_size) = self.min_size {
            builder = builder.with_min_inner_size(as_logical_size(min_size));
        }

        if let Some(max_size) = self.max_size {
            builder = builder.with_max_inner_size(as_logical_size(max_size));
        }

        builder
    }
}

/// A window with a current OpenGL context, driven one batch of events at a
/// time.
///
/// Must be created and used on the main thread.
pub struct GlWindow {
    // Field order is drop order. The context must go before the surface and
    // the surface before the window.
    context: PossiblyCurrentContext,
    surface: Surface<WindowSurface>,
    window: Window,
    event_loop: EventLoop<()>,
    should_close: bool,
    waker: Waker,
}

impl GlWindow {
    /// Opens a window and makes an OpenGL context current for it on the
    /// calling thread.
    pub fn new(desc: &WindowDesc) -> Result<Self, Error> {
        let event_loop = EventLoop::new();
        let window = desc
            .builder()
            .build(&event_loop)
            .map_err(|e| Error::Window(e.to_string()))?;

        let raw_window_handle = window.raw_window_handle();

        // SAFETY: the handles belong to `window`, which is kept alive for as
        // long as the context.
        let display = unsafe {
            Display::new(
                window.raw_display_handle(),
                display_preference(raw_window_handle),
            )?
        };

        let template = ConfigTemplateBuilder::new()
            .with_alpha_size(8)
            .with_transparency(desc.flags.contains(WindowFlags::TRANSPARENT))
            .compatible_with_native_window(raw_window_handle)
            .build();

        // SAFETY: as above.
        let configs = unsafe { display.find_configs(template)? };
        let config = fewest_samples(configs, |config| config.num_samples())?;

        let attributes = ContextAttributesBuilder::new().build(Some(raw_window_handle));
        let fallback_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::Gles(None))
            .build(Some(raw_window_handle));

        // SAFETY: the window handle belongs to `window`, which outlives the
        // context.
        let context = unsafe {
            match display.create_context(&config, &attributes) {
                Ok(context) => context,
                Err(e) => {
                    debug!("desktop OpenGL unavailable ({}), falling back to GLES", e);
                    display.create_context(&config, &fallback_attributes)?
                }
            }
        };

        let size = window.inner_size();
        let surface_attributes = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            NonZeroU32::new(size.width).unwrap_or(NonZeroU32::MIN),
            NonZeroU32::new(size.height).unwrap_or(NonZeroU32::MIN),
        );

        // SAFETY: as above.
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes)? };
        let context = context.make_current(&surface)?;

        if desc.vsync {
            if let Err(e) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
                warn!("failed to enable vsync: {}", e);
            }
        }

        let proxy = Mutex::new(event_loop.create_proxy());
        let waker: Waker = Arc::new(move || {
            // Fails only once the event loop is gone, and with it the window.
            if proxy.lock().send_event(()).is_err() {
                trace!("wake-up after the event loop closed");
            }
        });

        info!(
            "created {}x{} window \"{}\" ({} samples)",
            size.width,
            size.height,
            desc.title,
            config.num_samples()
        );

        Ok(Self {
            context,
            surface,
            window,
            event_loop,
            should_close: false,
            waker,
        })
    }

    /// Creates an OpenGL graphics backend for the window's context.
    pub fn create_graphics(&self) -> Result<GlowGraphics, Error> {
        let display = self.context.display();

        // SAFETY: the context is current on this thread for as long as `self`
        // exists.
        let graphics = unsafe {
            let gl = glow::Context::from_loader_function(|symbol| {
                CString::new(symbol).map_or(std::ptr::null(), |symbol| {
                    display.get_proc_address(symbol.as_c_str())
                })
            });

            GlowGraphics::new(gl, self.framebuffer_size())?
        };

        Ok(graphics)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Processes events until the OS queue is empty. If `block` is set, first
    /// waits for at least one event for this window.
    fn pump(&mut self, block: bool) -> bool {
        let Self {
            context,
            surface,
            window,
            event_loop,
            should_close,
            ..
        } = self;

        let mut damaged = false;
        let mut received = false;

        event_loop.run_return(|event, _, control_flow| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                received = true;

                match event {
                    WindowEvent::CloseRequested => {
                        debug!("close requested");
                        *should_close = true;
                    }
                    WindowEvent::Resized(size) => {
                        resize_surface(surface, context, size);
                        damaged = true;
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        resize_surface(surface, context, *new_inner_size);
                        damaged = true;
                    }
                    _ => {}
                }
            }
            Event::UserEvent(()) => {
                debug!("woken by another thread");
                received = true;
            }
            Event::RedrawRequested(_) => {
                received = true;
                damaged = true;
            }
            Event::MainEventsCleared => {
                if !block || received || *should_close {
                    control_flow.set_exit();
                } else {
                    control_flow.set_wait();
                }
            }
            _ => {}
        });

        damaged
    }
}

impl WindowSystem for GlWindow {
    type Error = glutin::error::Error;

    fn framebuffer_size(&self) -> Extent<u32, ScreenPx> {
        as_extent(self.window.inner_size())
    }

    fn should_close(&self) -> bool {
        self.should_close
    }

    fn set_should_close(&mut self, value: bool) {
        self.should_close = value;
    }

    fn swap_buffers(&mut self) -> Result<(), Self::Error> {
        self.surface.swap_buffers(&self.context)
    }

    fn poll_events(&mut self) -> bool {
        self.pump(false)
    }

    fn wait_events(&mut self) -> bool {
        self.pump(true)
    }

    fn waker(&self) -> Option<Waker> {
        Some(self.waker.clone())
    }
}

#[cfg(target_os = "windows")]
fn display_preference(window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::WglThenEgl(Some(window))
}

#[cfg(target_os = "macos")]
fn display_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Cgl
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn display_preference(_window: RawWindowHandle) -> DisplayApiPreference {
    DisplayApiPreference::Egl
}

/// Prefers configs without multisampling. The offscreen target is single
/// sampled and cannot be blitted to a multisampled window.
fn fewest_samples<C>(
    configs: impl Iterator<Item = C>,
    samples: impl Fn(&C) -> u8,
) -> Result<C, Error> {
    configs.min_by_key(samples).ok_or(Error::NoConfig)
}

fn resize_surface(
    surface: &Surface<WindowSurface>,
    context: &PossiblyCurrentContext,
    size: PhysicalSize<u32>,
) {
    // Minimized windows report a zero size.
    if let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
    {
        surface.resize(context, width, height);
    }
}

fn as_logical_size(size: Extent<u32, ScreenPx>) -> LogicalSize<u32> {
    LogicalSize::new(size.width, size.height)
}

fn as_logical_position(position: Offset<i32, ScreenPx>) -> LogicalPosition<i32> {
    LogicalPosition::new(position.x, position.y)
}

fn as_extent(size: PhysicalSize<u32>) -> Extent<u32, ScreenPx> {
    Extent::new(size.width, size.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags() {
        let flags = WindowFlags::default();
        assert!(flags.contains(WindowFlags::RESIZABLE | WindowFlags::VISIBLE));
        assert!(!flags.intersects(WindowFlags::TRANSPARENT | WindowFlags::ALWAYS_ON_TOP));
    }

    #[test]
    fn default_desc() {
        let desc = WindowDesc::default();
        assert_eq!(desc.size, Extent::new(800, 600));
        assert!(desc.vsync);
        assert!(desc.min_size.is_none());
    }

    #[test]
    fn conversions() {
        assert_eq!(
            as_logical_size(Extent::new(640, 480)),
            LogicalSize::new(640, 480)
        );
        assert_eq!(
            as_logical_position(Offset::new(-5, 10)),
            LogicalPosition::new(-5, 10)
        );
        assert_eq!(
            as_extent(PhysicalSize::new(1920, 1080)),
            Extent::new(1920, 1080)
        );
    }

    #[test]
    fn config_with_fewest_samples() {
        let picked = fewest_samples([4u8, 0, 2, 0].into_iter(), |samples| *samples);
        assert_eq!(picked.ok(), Some(0));

        let none = fewest_samples(std::iter::empty::<u8>(), |samples| *samples);
        assert!(matches!(none, Err(Error::NoConfig)));
    }
}
