use std::fmt;

/// Failures while setting up a graphics backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create {what}: {message}")]
    ResourceCreation { what: &'static str, message: String },
    #[error("offscreen framebuffer is incomplete (status {status:#06x})")]
    IncompleteFramebuffer { status: u32 },
    #[error("failed to encode image")]
    Encoding(#[from] png::EncodingError),
}

/// A graphics API error code, numbered the way OpenGL numbers them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const INVALID_ENUM: Self = Self(0x0500);
    pub const INVALID_VALUE: Self = Self(0x0501);
    pub const INVALID_OPERATION: Self = Self(0x0502);
    pub const STACK_OVERFLOW: Self = Self(0x0503);
    pub const STACK_UNDERFLOW: Self = Self(0x0504);
    pub const OUT_OF_MEMORY: Self = Self(0x0505);
    pub const INVALID_FRAMEBUFFER_OPERATION: Self = Self(0x0506);
    pub const CONTEXT_LOST: Self = Self(0x0507);

    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::INVALID_ENUM => "INVALID_ENUM",
            Self::INVALID_VALUE => "INVALID_VALUE",
            Self::INVALID_OPERATION => "INVALID_OPERATION",
            Self::STACK_OVERFLOW => "STACK_OVERFLOW",
            Self::STACK_UNDERFLOW => "STACK_UNDERFLOW",
            Self::OUT_OF_MEMORY => "OUT_OF_MEMORY",
            Self::INVALID_FRAMEBUFFER_OPERATION => "INVALID_FRAMEBUFFER_OPERATION",
            Self::CONTEXT_LOST => "CONTEXT_LOST",
            _ => return None,
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({:#06x})", name, self.0),
            None => write!(f, "unknown error ({:#06x})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            ErrorCode::STACK_UNDERFLOW.to_string(),
            "STACK_UNDERFLOW (0x0504)"
        );
        assert_eq!(ErrorCode(0x1234).to_string(), "unknown error (0x1234)");
    }
}
