use core::fmt;

use crate::measure::FontContext;

/// Errors raised by the typesetting core.
///
/// Malformed ruby markup, a missing word segmenter and a bisection that runs
/// out of iterations are not errors; they degrade instead.
#[derive(Clone, Debug, PartialEq)]
pub enum TelopError {
    /// The width oracle could not obtain a measurement surface.
    MeasureSurfaceUnavailable { reason: String },
    /// Widths measured under one font context were offered to a solve under another.
    StaleMeasurement {
        measured: Box<FontContext>,
        current: Box<FontContext>,
    },
    /// A configuration value is out of range.
    InvalidConfig {
        field: &'static str,
        reason: String,
    },
    /// Serialized configuration could not be decoded.
    ConfigParse(String),
}

impl TelopError {
    pub(crate) fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TelopError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MeasureSurfaceUnavailable { reason } => {
                write!(f, "measurement surface unavailable: {}", reason)
            }
            Self::StaleMeasurement { measured, current } => write!(
                f,
                "unit widths are stale: measured under {} but solving under {}",
                measured, current
            ),
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid config field `{}`: {}", field, reason)
            }
            Self::ConfigParse(msg) => write!(f, "config parse failed: {}", msg),
        }
    }
}

impl std::error::Error for TelopError {}

impl From<serde_json::Error> for TelopError {
    fn from(value: serde_json::Error) -> Self {
        Self::ConfigParse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_field() {
        let err = TelopError::invalid_config("min_scale", "must be positive");
        assert_eq!(
            err.to_string(),
            "invalid config field `min_scale`: must be positive"
        );
    }

    #[test]
    fn json_errors_convert_into_parse_errors() {
        let err: TelopError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, TelopError::ConfigParse(_)));
    }
}
