use ndarray::ArrayD;

use crate::{LearningRate, Parameter};

/// The base optimization algorithm wrapped by `Lars`.
///
/// It owns the parameters and the actual update rule, `Lars` only rescales the
/// gradients it receives.
pub trait Delegate {
    /// Whatever the update returns, handed back to the caller untouched.
    type Output;

    /// Returns the ordered parameters this optimizer updates.
    fn parameters(&self) -> &[Parameter];

    /// Returns the learning rate of this optimizer.
    fn learning_rate(&self) -> &LearningRate;

    /// Applies a step of the update rule.
    ///
    /// # Arguments
    /// * `grads` - One gradient per parameter, in the same order as `parameters`.
    fn apply(&mut self, grads: &[ArrayD<f32>]) -> Self::Output;
}

impl<T: Delegate + ?Sized> Delegate for Box<T> {
    type Output = T::Output;

    fn parameters(&self) -> &[Parameter] {
        (**self).parameters()
    }

    fn learning_rate(&self) -> &LearningRate {
        (**self).learning_rate()
    }

    fn apply(&mut self, grads: &[ArrayD<f32>]) -> Self::Output {
        (**self).apply(grads)
    }
}
