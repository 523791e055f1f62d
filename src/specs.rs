use serde::{Deserialize, Serialize};

use crate::{LarsConfig, LearningRate};

/// The specification for a `LearningRate`.
///
/// A number is a static rate, a list is a per step schedule and `{ "groups": [...] }`
/// assigns one rate to each parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LearningRateSpec {
    Static(f32),
    Dynamic(Vec<f32>),
    Grouped { groups: Vec<f32> },
}

impl From<LearningRateSpec> for LearningRate {
    fn from(value: LearningRateSpec) -> Self {
        match value {
            LearningRateSpec::Static(rate) => LearningRate::Static(rate),
            LearningRateSpec::Dynamic(rates) => LearningRate::Dynamic(rates.into()),
            LearningRateSpec::Grouped { groups } => LearningRate::Grouped(groups.into()),
        }
    }
}

/// The specification for the wrapped `Optimizer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam {
        learning_rate: LearningRateSpec,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: LearningRateSpec,
    },
    GradientDescentWithMomentum {
        learning_rate: LearningRateSpec,
        momentum: f32,
    },
}

/// The specification for a `Lars` optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LarsSpec {
    pub optimizer: OptimizerSpec,
    #[serde(default)]
    pub lars: LarsConfig,
}
