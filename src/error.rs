use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, LarsErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum LarsErr {
    InvalidConfig {
        option: &'static str,
        value: f32,
        expected: &'static str,
    },
    GroupedLearningRate,
    EmptySchedule,
    ScheduleExhausted {
        step: usize,
        len: usize,
    },
    InvalidSpec(serde_json::Error),
    GradientCountMismatch {
        got: usize,
        expected: usize,
    },
    ShapeMismatch {
        index: usize,
        got: Vec<usize>,
        expected: Vec<usize>,
    },
    SizeMismatch {
        got: usize,
        expected: usize,
    },
    NonContiguous {
        index: usize,
    },
}

impl LarsErr {
    /// Tells whether this error comes from building or configuring the optimizer, as opposed
    /// to malformed input on a single step.
    ///
    /// # Returns
    /// `true` for configuration errors.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LarsErr::InvalidConfig { .. }
                | LarsErr::GroupedLearningRate
                | LarsErr::EmptySchedule
                | LarsErr::ScheduleExhausted { .. }
                | LarsErr::InvalidSpec(_)
        )
    }
}

impl Display for LarsErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LarsErr::InvalidConfig {
                option,
                value,
                expected,
            } => write!(f, "invalid value {value} for `{option}`, expected {expected}"),
            LarsErr::GroupedLearningRate => f.write_str(
                "the wrapped optimizer uses per-group learning rates, a single global rate is required",
            ),
            LarsErr::EmptySchedule => f.write_str("the dynamic learning rate schedule is empty"),
            LarsErr::ScheduleExhausted { step, len } => write!(
                f,
                "the learning rate schedule has {len} rates but step {step} was requested"
            ),
            LarsErr::InvalidSpec(e) => write!(f, "invalid optimizer spec: {e}"),
            LarsErr::GradientCountMismatch { got, expected } => write!(
                f,
                "there's a gradient count mismatch, got {got} and expected {expected}"
            ),
            LarsErr::ShapeMismatch {
                index,
                got,
                expected,
            } => write!(
                f,
                "the gradient of parameter {index} has shape {got:?}, expected {expected:?}"
            ),
            LarsErr::SizeMismatch { got, expected } => write!(
                f,
                "there's a size mismatch between the gradient and the parameters, got {got} and expected {expected}"
            ),
            LarsErr::NonContiguous { index } => {
                write!(f, "parameter {index} is not laid out contiguously in memory")
            }
        }
    }
}

impl Error for LarsErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LarsErr::InvalidSpec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LarsErr {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidSpec(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        assert!(LarsErr::GroupedLearningRate.is_config_error());
        assert!(LarsErr::ScheduleExhausted { step: 3, len: 3 }.is_config_error());
        assert!(!LarsErr::GradientCountMismatch { got: 1, expected: 2 }.is_config_error());
        assert!(!LarsErr::NonContiguous { index: 0 }.is_config_error());
    }

    #[test]
    fn test_display_mentions_the_option() {
        let err = LarsErr::InvalidConfig {
            option: "epsilon",
            value: -1.,
            expected: "a finite value greater than 0",
        };

        let msg = err.to_string();
        assert!(msg.contains("epsilon"));
        assert!(msg.contains("-1"));
    }
}
