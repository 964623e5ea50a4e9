use core::fmt;

use telop_fit::TelopError;

/// Errors raised while rendering a telop onto a display surface.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderError {
    /// Tokenizing, measuring or solving failed.
    Fit(TelopError),
    /// The surface reported offsets for a different number of units than were injected.
    UnitCountMismatch { expected: usize, actual: usize },
    /// The caller's cancel token fired at a suspension point.
    Cancelled,
    /// A newer render request took over the surface.
    ///
    /// The stale request stopped without touching the surface; callers
    /// should treat this as a no-op.
    Superseded { generation: u64 },
}

impl RenderError {
    /// Whether the request was abandoned rather than failed.
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. } | Self::Cancelled)
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fit(err) => write!(f, "autofit failed: {}", err),
            Self::UnitCountMismatch { expected, actual } => write!(
                f,
                "surface reported {} unit offsets, expected {}",
                actual, expected
            ),
            Self::Cancelled => write!(f, "render cancelled"),
            Self::Superseded { generation } => {
                write!(f, "render request {} superseded", generation)
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TelopError> for RenderError {
    fn from(value: TelopError) -> Self {
        Self::Fit(value)
    }
}
