use std::fmt;

use geometry::{Extent, ScreenPx, Viewport};
use graphics::{surface_rect, Color, GraphicsApi};
use log::{debug, trace, warn};

use crate::{
    damage::{Candidate, DamageTracker},
    error::Error,
    frame::{Frame, FrameCounter},
    graphic::{DrawAction, ExitRequest},
    registry::Registry,
};

/// What the governing loop should do after a frame.
#[repr(i8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoopDirective {
    /// Stop rendering and close normally.
    Close = -2,
    /// Stop rendering and report a failure to the caller.
    Fail = -1,
    /// Nothing is animating. Block until the next external event.
    Idle = 0,
    /// Something is animating or just changed. Draw again without blocking.
    Continue = 1,
}

impl LoopDirective {
    #[must_use]
    pub fn code(self) -> i8 {
        self as i8
    }

    #[must_use]
    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -2 => Some(Self::Close),
            -1 => Some(Self::Fail),
            0 => Some(Self::Idle),
            1 => Some(Self::Continue),
            _ => None,
        }
    }

    fn priority(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Continue => 1,
            Self::Close => 2,
            Self::Fail => 3,
        }
    }

    /// Combines the directives of two graphics. Failure wins over closing,
    /// closing wins over continuing, continuing wins over idling.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        if other.priority() > self.priority() {
            other
        } else {
            self
        }
    }
}

/// How much of the surface is cleared before redrawing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClearPolicy {
    /// Clear and redraw only the damaged regions.
    #[default]
    Damaged,
    /// Clear the whole surface and redraw every graphic whenever anything is
    /// damaged.
    Surface,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// The color damaged regions are cleared to before graphics are drawn
    /// over them. Defaults to black.
    pub clear_color: Color,

    /// Defaults to [`ClearPolicy::Damaged`].
    pub clear_policy: ClearPolicy,

    /// The maximum number of graphics API errors drained and logged at each
    /// check. A lost context can report errors indefinitely. Defaults to 8.
    pub max_errors_per_check: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            clear_policy: ClearPolicy::Damaged,
            max_errors_per_check: 8,
        }
    }
}

/// Summary of one drawn frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameReport {
    pub frame: Frame,
    pub directive: LoopDirective,
    /// The number of graphics whose draw method was called.
    pub redrawn: usize,
    /// The number of regions cleared.
    pub cleared: usize,
    /// The number of graphics API errors reported during the frame.
    pub errors: usize,
}

impl FrameReport {
    /// Whether anything was written to the surface, in which case it has to be
    /// presented.
    #[must_use]
    pub fn painted(&self) -> bool {
        self.redrawn > 0 || self.cleared > 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    PreDraw,
    PostDraw,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::PreDraw => "pre-draw",
            Phase::PostDraw => "post-draw",
        })
    }
}

/// Draws the graphics of a [`Registry`] one frame at a time.
pub struct FrameDriver {
    config: Config,
    registry: Registry,
    tracker: DamageTracker,
    counter: FrameCounter,
    /// Damage is tracked over the part of each graphic on the surface.
    candidates: Vec<Candidate>,
    /// The full viewport of each graphic, in draw order.
    viewports: Vec<Viewport>,
    extent: Option<Extent<u32, ScreenPx>>,
    full_damage: bool,
    failure: Option<Error>,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl FrameDriver {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            registry: Registry::new(),
            tracker: DamageTracker::new(),
            counter: FrameCounter::new(),
            candidates: Vec::new(),
            viewports: Vec::new(),
            extent: None,
            full_damage: true,
            failure: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The scene. Graphics added here are drawn from the next frame on.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The most recently drawn frame.
    #[must_use]
    pub fn frame(&self) -> Frame {
        self.counter.current()
    }

    /// Repaints the whole surface on the next frame.
    pub fn invalidate_all(&mut self) {
        self.full_damage = true;
    }

    /// Marks a region of the surface as stale for the next frame.
    pub fn invalidate(&mut self, region: Viewport) {
        self.tracker.add_damage(region);
    }

    /// Brings the graphics backend to the window's framebuffer size,
    /// repainting everything if it changed.
    pub fn resize(&mut self, gfx: &mut dyn GraphicsApi, extent: Extent<u32, ScreenPx>) {
        if self.extent != Some(extent) {
            debug!("surface resized to {}x{}", extent.width, extent.height);
            self.extent = Some(extent);
            gfx.resize(extent);
            self.invalidate_all();
        }
    }

    /// Returns the failure reported by a graphic through
    /// [`LoopDirective::Fail`], if any.
    pub fn take_failure(&mut self) -> Option<Error> {
        self.failure.take()
    }

    /// Draws one frame.
    pub fn render_frame(&mut self, gfx: &mut dyn GraphicsApi) -> FrameReport {
        let received = self.registry.drain_remote();
        if received > 0 {
            debug!("received {} graphics from other threads", received);
        }

        let frame = self.counter.advance();

        for region in self.registry.take_vacated() {
            self.tracker.add_damage(region);
        }

        let surface = surface_rect(gfx.extent());
        if std::mem::take(&mut self.full_damage) {
            self.tracker.add_damage(surface);
        }

        let mut directive = LoopDirective::Idle;
        self.candidates.clear();
        self.viewports.clear();

        for (index, entry) in self.registry.entries().enumerate() {
            let graphic = entry.graphic.borrow();
            let action = graphic.draw_action(&frame);

            if action != DrawAction::Sleep {
                directive = directive.merge(LoopDirective::Continue);
            }

            match graphic.exit_request() {
                None => {}
                Some(ExitRequest::Close) => directive = directive.merge(LoopDirective::Close),
                Some(ExitRequest::Fail(reason)) => {
                    directive = directive.merge(LoopDirective::Fail);
                    if self.failure.is_none() {
                        self.failure = Some(Error::GraphicFailed {
                            index,
                            frame: frame.count,
                            reason,
                        });
                    }
                }
            }

            let viewport = graphic.viewport();
            self.viewports.push(viewport);
            self.candidates.push(Candidate {
                action,
                viewport: visible_part(viewport, surface),
                drawn_at: entry.drawn_at,
            });
        }

        let escalate_to = match self.config.clear_policy {
            ClearPolicy::Damaged => None,
            ClearPolicy::Surface => Some(surface),
        };

        let damage = self.tracker.compute(&self.candidates, escalate_to);
        let limit = self.config.max_errors_per_check;
        let (mut errors, mut redrawn, mut cleared) = (0, 0, 0);

        if !damage.is_empty() {
            errors += report_errors(gfx, Phase::PreDraw, &frame, None, limit);

            for region in damage.regions() {
                if let Some(region) = region.intersection(&surface) {
                    gfx.clear(Some(region), self.config.clear_color);
                    cleared += 1;
                }
            }

            for index in damage.redraws() {
                let visible = self.candidates[index].viewport;
                let viewport = self.viewports[index];

                // Zero-area graphics still draw when asked to.
                if visible.is_empty() && !viewport.is_empty() {
                    continue;
                }

                let Some(entry) = self.registry.entry_at_mut(index) else {
                    continue;
                };

                gfx.push_state();
                gfx.set_viewport(viewport);
                entry.graphic.borrow_mut().draw(gfx, &frame);
                gfx.pop_state();

                entry.drawn_at = Some(visible);
                redrawn += 1;

                errors += report_errors(gfx, Phase::PostDraw, &frame, Some(index), limit);
            }
        }

        // Graphics that left the surface have nothing left to repaint.
        for (index, candidate) in self.candidates.iter().enumerate() {
            if candidate.viewport.is_empty() && !self.viewports[index].is_empty() {
                if let Some(entry) = self.registry.entry_at_mut(index) {
                    entry.drawn_at = Some(candidate.viewport);
                }
            }
        }

        let report = FrameReport {
            frame,
            directive,
            redrawn,
            cleared,
            errors,
        };

        if report.painted() {
            debug!(
                "frame {}: redrew {} of {} graphics over {} regions",
                frame.count,
                report.redrawn,
                self.candidates.len(),
                report.cleared
            );
        } else {
            trace!("frame {}: nothing to draw", frame.count);
        }

        report
    }
}

/// The part of `viewport` on the surface. Graphics entirely off the surface
/// get the same empty rectangle, so moving around off screen is not damage.
fn visible_part(viewport: Viewport, surface: Viewport) -> Viewport {
    viewport
        .intersection(&surface)
        .unwrap_or_else(|| Viewport::from_xywh(0, 0, 0, 0))
}

/// Drains and logs pending graphics API errors. They never abort the frame.
fn report_errors(
    gfx: &mut dyn GraphicsApi,
    phase: Phase,
    frame: &Frame,
    graphic: Option<usize>,
    limit: usize,
) -> usize {
    let mut count = 0;

    while count < limit {
        let Some(code) = gfx.last_error() else {
            break;
        };
        count += 1;

        match graphic {
            Some(index) => warn!(
                "frame {}: {} graphics error from graphic {}: {}",
                frame.count, phase, index, code
            ),
            None => warn!("frame {}: {} graphics error: {}", frame.count, phase, code),
        }
    }

    count
}
