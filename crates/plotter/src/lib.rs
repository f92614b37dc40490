//! Damage-tracked drawing of a scene of graphics.
//!
//! A [`FrameDriver`] owns a [`Registry`] of graphics and draws one frame at a
//! time into a [`graphics::GraphicsApi`]. Each frame it asks every graphic how
//! urgently it needs to be redrawn and where it is, works out which graphics
//! have to be redrawn to keep the screen correct, and draws only those. The
//! result of a frame is a [`LoopDirective`] that tells the governing loop in
//! [`event_loop`] whether to keep polling, block for the next event, or stop.
//!
//! Everything in this crate runs on the thread that owns the graphics
//! context. Graphics produced on other threads are handed over through a
//! [`RemoteRegistrar`].

pub mod damage;
pub mod driver;
pub mod event_loop;
pub mod frame;
pub mod graphic;
pub mod registry;
pub mod shapes;

mod error;

pub use self::{
    damage::{Candidate, Damage, DamageTracker},
    driver::{ClearPolicy, Config, FrameDriver, FrameReport, LoopDirective},
    error::Error,
    event_loop::{LoopState, WindowSystem},
    frame::{Frame, FrameCounter, FRAME_PERIOD},
    graphic::{DrawAction, ExitRequest, Graphic, SharedGraphic},
    registry::{GraphicId, Registry, RemoteRegistrar, Waker},
};
