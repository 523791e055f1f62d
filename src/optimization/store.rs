use std::{fmt, sync::Arc};

use log::debug;
use ndarray::ArrayD;
use rayon::prelude::*;

use super::Optimizer;
use crate::{Delegate, LarsErr, LearningRate, LearningRateSource, Parameter, Result};

enum StoreRate {
    Global(LearningRateSource),
    Grouped(Arc<[f32]>),
}

/// Owns a set of parameters and updates them with one `Optimizer` per parameter.
///
/// It's the stock `Delegate` for `Lars`, each step every parameter is updated in parallel.
pub struct ParameterStore<O: Optimizer> {
    params: Vec<Parameter>,
    optimizers: Vec<O>,
    learning_rate: LearningRate,
    rate: StoreRate,
}

impl<O: Optimizer> fmt::Debug for ParameterStore<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("params", &self.params.len())
            .field("learning_rate", &self.learning_rate)
            .finish_non_exhaustive()
    }
}

impl<O: Optimizer> ParameterStore<O> {
    /// Creates a new `ParameterStore`.
    ///
    /// # Arguments
    /// * `params` - The ordered parameters to train.
    /// * `learning_rate` - A static rate, a schedule with one rate per step, or one rate per parameter.
    /// * `optimizer_factory` - Builds the optimizer of a parameter given its amount of elements.
    ///
    /// # Returns
    /// A new `ParameterStore` or an error if the learning rate is invalid.
    pub fn new<F>(
        params: Vec<Parameter>,
        learning_rate: impl Into<LearningRate>,
        optimizer_factory: F,
    ) -> Result<Self>
    where
        F: FnMut(usize) -> O,
    {
        let learning_rate = learning_rate.into();

        let rate = match &learning_rate {
            LearningRate::Grouped(rates) => {
                learning_rate.validate()?;

                if rates.len() != params.len() {
                    return Err(LarsErr::InvalidConfig {
                        option: "learning_rate",
                        value: rates.len() as f32,
                        expected: "one rate per parameter",
                    });
                }

                StoreRate::Grouped(Arc::clone(rates))
            }
            _ => StoreRate::Global(LearningRateSource::new(&learning_rate)?),
        };

        let optimizers = params
            .iter()
            .map(|param| param.value().len())
            .map(optimizer_factory)
            .collect();

        Ok(Self {
            params,
            optimizers,
            learning_rate,
            rate,
        })
    }

    pub fn into_parameters(self) -> Vec<Parameter> {
        self.params
    }

    fn check_gradients(&self, grads: &[ArrayD<f32>]) -> Result<()> {
        if grads.len() != self.params.len() {
            return Err(LarsErr::GradientCountMismatch {
                got: grads.len(),
                expected: self.params.len(),
            });
        }

        for (index, (grad, param)) in grads.iter().zip(&self.params).enumerate() {
            if grad.shape() != param.shape() {
                return Err(LarsErr::ShapeMismatch {
                    index,
                    got: grad.shape().to_vec(),
                    expected: param.shape().to_vec(),
                });
            }
        }

        Ok(())
    }
}

impl<O: Optimizer + Send> Delegate for ParameterStore<O> {
    type Output = Result<()>;

    fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    fn learning_rate(&self) -> &LearningRate {
        &self.learning_rate
    }

    /// Updates every parameter with its gradient.
    ///
    /// All the gradients are checked before any parameter is touched.
    fn apply(&mut self, grads: &[ArrayD<f32>]) -> Result<()> {
        self.check_gradients(grads)?;

        let rates = match &self.rate {
            StoreRate::Global(source) => vec![source.current_rate()?; self.params.len()],
            StoreRate::Grouped(rates) => rates.to_vec(),
        };

        debug!(params = self.params.len(); "updating parameters");

        self.params
            .par_iter_mut()
            .zip(self.optimizers.par_iter_mut())
            .zip(grads.par_iter())
            .zip(rates.par_iter())
            .enumerate()
            .try_for_each(|(index, (((param, optimizer), grad), &lr))| {
                let grad = grad.as_standard_layout();
                let grad = grad.as_slice().ok_or(LarsErr::NonContiguous { index })?;
                let value = param
                    .value_mut()
                    .as_slice_mut()
                    .ok_or(LarsErr::NonContiguous { index })?;

                optimizer.update_params(lr, grad, value)
            })
    }
}
