use crate::Result;

/// Defines how a parameter tensor moves given its gradient.
pub trait Optimizer {
    /// Updates the provided slice of parameters in place.
    ///
    /// # Arguments
    /// * `lr` - The learning rate for this step.
    /// * `grad` - The gradient of `params`.
    /// * `params` - The parameters to update.
    ///
    /// # Returns
    /// A `SizeMismatch` error if `grad` and `params` don't have the same length.
    fn update_params(&mut self, lr: f32, grad: &[f32], params: &mut [f32]) -> Result<()>;
}

impl<T: Optimizer + ?Sized> Optimizer for Box<T> {
    fn update_params(&mut self, lr: f32, grad: &[f32], params: &mut [f32]) -> Result<()> {
        (**self).update_params(lr, grad, params)
    }
}
