mod adam;
mod gradient_descent;
mod gradient_descent_with_momentum;
mod optimizer;
mod store;

pub use adam::Adam;
pub use gradient_descent::GradientDescent;
pub use gradient_descent_with_momentum::GradientDescentWithMomentum;
pub use optimizer::Optimizer;
pub use store::ParameterStore;

use crate::{LarsErr, Result};

fn check_len(a: &[f32], params: &[f32]) -> Result<()> {
    if a.len() != params.len() {
        return Err(LarsErr::SizeMismatch {
            got: a.len(),
            expected: params.len(),
        });
    }

    Ok(())
}
