/// Errors that end the render loop.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A graphic requested that rendering stop because it cannot continue.
    #[error("graphic {index} failed in frame {frame}: {reason}")]
    GraphicFailed {
        /// Position of the graphic in draw order at the time of failure.
        index: usize,
        frame: u32,
        reason: String,
    },
}
