use ndarray::ArrayD;

/// Undoes the loss scaling on raw gradients.
#[derive(Debug, Clone, Copy)]
pub struct GradientScaler {
    reciprocal: f32,
}

impl GradientScaler {
    /// Creates a new `GradientScaler`.
    ///
    /// # Arguments
    /// * `loss_scale` - The factor the loss was multiplied by, must be greater than 0.
    pub fn new(loss_scale: f32) -> Self {
        Self {
            reciprocal: 1. / loss_scale,
        }
    }

    pub fn reciprocal(&self) -> f32 {
        self.reciprocal
    }

    /// Multiplies every gradient by the reciprocal of the loss scale, in place.
    ///
    /// # Arguments
    /// * `grads` - The gradients to rescale.
    pub fn scale(&self, grads: &mut [ArrayD<f32>]) {
        let r = self.reciprocal;

        if r == 1. {
            return;
        }

        for grad in grads {
            grad.par_mapv_inplace(|g| g * r);
        }
    }
}
