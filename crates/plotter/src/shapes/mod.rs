//! Ready-made graphics.

mod columns;
mod debug_box;

pub use self::{columns::Columns, debug_box::DebugBox};
