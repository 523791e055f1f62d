use ndarray::{ArrayD, ArrayViewD, Zip};

use crate::{LarsConfig, ParameterFlags};

/// Computes the squared L2 norms of `w` and `g` in a single pass.
///
/// # Panics
/// If `w` and `g` don't have the same shape.
pub fn square_sum_all(w: ArrayViewD<f32>, g: ArrayViewD<f32>) -> (f32, f32) {
    Zip::from(&w)
        .and(&g)
        .fold((0., 0.), |(w_sq, g_sq), &w, &g| (w_sq + w * w, g_sq + g * g))
}

/// The layer-wise adaptive rate scaling rule.
#[derive(Debug, Clone, Copy)]
pub struct LarsUpdate {
    epsilon: f32,
    hyperpara: f32,
    weight_decay: f32,
    use_clip: bool,
}

impl LarsUpdate {
    /// Creates a new `LarsUpdate` from an already validated configuration.
    pub fn new(config: &LarsConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            hyperpara: config.hyperpara,
            weight_decay: config.weight_decay,
            use_clip: config.use_clip,
        }
    }

    /// Returns the weight decay to use for a parameter, `0` if the parameter is not decayed.
    pub fn decay(&self, flags: ParameterFlags) -> f32 {
        if flags.apply_decay {
            self.weight_decay
        } else {
            0.
        }
    }

    /// Computes the trust ratio, which is `0` whenever `w_norm` is `0`.
    ///
    /// # Arguments
    /// * `w_norm` - The L2 norm of the weights.
    /// * `g_norm` - The L2 norm of the gradient.
    /// * `decay` - The weight decay used for this parameter.
    pub fn trust_ratio(&self, w_norm: f32, g_norm: f32, decay: f32) -> f32 {
        self.hyperpara * w_norm / (g_norm + decay * w_norm + self.epsilon)
    }

    /// Turns the trust ratio into the local rate, capping `trust_ratio / lr` at `1` when clipping.
    pub fn local_rate(&self, trust_ratio: f32, lr: f32) -> f32 {
        if self.use_clip {
            (trust_ratio / lr).min(1.)
        } else {
            trust_ratio
        }
    }

    /// Produces the corrected gradient for a single parameter.
    ///
    /// Parameters without the LARS flag get their gradient back untouched, the rest get
    /// `lr * local_rate * (grad + decay * weight)`.
    ///
    /// # Arguments
    /// * `weight` - The current value of the parameter.
    /// * `grad` - The (already loss scaled) gradient of the parameter.
    /// * `lr` - The global learning rate for this step.
    /// * `flags` - The gate flags of the parameter.
    ///
    /// # Panics
    /// If `weight` and `grad` don't have the same shape.
    pub fn apply(
        &self,
        weight: ArrayViewD<f32>,
        mut grad: ArrayD<f32>,
        lr: f32,
        flags: ParameterFlags,
    ) -> ArrayD<f32> {
        if !flags.apply_lars {
            return grad;
        }

        let (w_sq, g_sq) = square_sum_all(weight.view(), grad.view());
        let w_norm = w_sq.sqrt();
        let g_norm = g_sq.sqrt();

        let decay = self.decay(flags);
        let trust_ratio = self.trust_ratio(w_norm, g_norm, decay);
        let scale = lr * self.local_rate(trust_ratio, lr);

        Zip::from(&mut grad)
            .and(&weight)
            .for_each(|g, &w| *g = scale * (*g + decay * w));

        grad
    }
}
