use serde::{Deserialize, Serialize};

use crate::{LarsErr, Result};

/// Immutable hyperparameters of the `Lars` optimizer.
///
/// Missing fields take their default value when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LarsConfig {
    /// Term added to the denominator of the trust ratio for numerical stability.
    pub epsilon: f32,
    /// Trust coefficient used to compute the local learning rate.
    pub hyperpara: f32,
    /// L2 penalty, applied only to parameters that pass the decay filter.
    pub weight_decay: f32,
    /// Whether to cap the product of the local and global rates at 1.
    pub use_clip: bool,
    /// The factor the loss was multiplied by before backpropagation.
    pub loss_scale: f32,
}

impl Default for LarsConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-5,
            hyperpara: 1e-3,
            weight_decay: 0.,
            use_clip: false,
            loss_scale: 1.,
        }
    }
}

impl LarsConfig {
    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_hyperpara(mut self, hyperpara: f32) -> Self {
        self.hyperpara = hyperpara;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_clip(mut self, use_clip: bool) -> Self {
        self.use_clip = use_clip;
        self
    }

    pub fn with_loss_scale(mut self, loss_scale: f32) -> Self {
        self.loss_scale = loss_scale;
        self
    }

    /// Checks that every numeric option lies within its declared range.
    ///
    /// # Returns
    /// An `InvalidConfig` error naming the first offending option.
    pub fn validate(&self) -> Result<()> {
        check_positive("epsilon", self.epsilon)?;
        check_positive("hyperpara", self.hyperpara)?;
        check_non_negative("weight_decay", self.weight_decay)?;
        check_positive("loss_scale", self.loss_scale)
    }
}

pub(crate) fn check_positive(option: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0. {
        return Ok(());
    }

    Err(LarsErr::InvalidConfig {
        option,
        value,
        expected: "a finite value greater than 0",
    })
}

pub(crate) fn check_non_negative(option: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0. {
        return Ok(());
    }

    Err(LarsErr::InvalidConfig {
        option,
        value,
        expected: "a finite value greater than or equal to 0",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LarsConfig::default();

        assert_eq!(config.epsilon, 1e-5);
        assert_eq!(config.hyperpara, 1e-3);
        assert_eq!(config.weight_decay, 0.);
        assert!(!config.use_clip);
        assert_eq!(config.loss_scale, 1.);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_options() {
        let cases = [
            (LarsConfig::default().with_epsilon(0.), "epsilon"),
            (LarsConfig::default().with_hyperpara(-1e-3), "hyperpara"),
            (LarsConfig::default().with_weight_decay(-0.1), "weight_decay"),
            (LarsConfig::default().with_loss_scale(0.), "loss_scale"),
            (LarsConfig::default().with_loss_scale(f32::NAN), "loss_scale"),
            (LarsConfig::default().with_epsilon(f32::INFINITY), "epsilon"),
        ];

        for (config, expected) in cases {
            match config.validate() {
                Err(LarsErr::InvalidConfig { option, .. }) => assert_eq!(option, expected),
                other => panic!("expected InvalidConfig for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_weight_decay_is_valid() {
        let config = LarsConfig::default().with_weight_decay(0.);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: LarsConfig =
            serde_json::from_str(r#"{ "weight_decay": 0.01, "use_clip": true }"#).unwrap();

        assert_eq!(config.weight_decay, 0.01);
        assert!(config.use_clip);
        assert_eq!(config.epsilon, 1e-5);
        assert_eq!(config.loss_scale, 1.);
    }
}
