use super::{Optimizer, check_len};
use crate::Result;

/// Plain gradient descent.
#[derive(Debug, Default)]
pub struct GradientDescent;

impl GradientDescent {
    pub fn new() -> Self {
        Self
    }
}

impl Optimizer for GradientDescent {
    fn update_params(&mut self, lr: f32, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_len(grad, params)?;

        for (p, g) in params.iter_mut().zip(grad) {
            *p -= lr * g;
        }

        Ok(())
    }
}
