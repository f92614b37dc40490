pub mod arena;
pub mod flagvec;

pub use arena::{Arena, Handle};
pub use flagvec::FlagVec;
