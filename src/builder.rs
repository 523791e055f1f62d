use log::info;

use crate::{
    Delegate, Lars, LearningRate, Parameter, Result,
    gate::default_filter,
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer, ParameterStore},
    specs::{LarsSpec, OptimizerSpec},
};

/// The delegate built by `LarsBuilder`.
pub type BoxedStore = ParameterStore<Box<dyn Optimizer + Send>>;

type Filter = Box<dyn Fn(&Parameter) -> bool>;

/// Builds `Lars` optimizers given a specification.
pub struct LarsBuilder {
    decay_filter: Filter,
    lars_filter: Filter,
}

impl Default for LarsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LarsBuilder {
    /// Creates a new `LarsBuilder` using the default filters.
    ///
    /// # Returns
    /// A new `LarsBuilder` instance.
    pub fn new() -> Self {
        Self {
            decay_filter: Box::new(default_filter),
            lars_filter: Box::new(default_filter),
        }
    }

    pub fn with_decay_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Parameter) -> bool + 'static,
    {
        self.decay_filter = Box::new(filter);
        self
    }

    pub fn with_lars_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Parameter) -> bool + 'static,
    {
        self.lars_filter = Box::new(filter);
        self
    }

    /// Builds a new `Lars` optimizer following a spec.
    ///
    /// # Arguments
    /// * `spec` - The specification of the optimizer.
    /// * `params` - The ordered parameters to train.
    ///
    /// # Returns
    /// A new `Lars` optimizer wrapping a `ParameterStore`, or a configuration error.
    pub fn build(&self, spec: LarsSpec, params: Vec<Parameter>) -> Result<Lars<BoxedStore>> {
        let LarsSpec { optimizer, lars } = spec;
        let store = self.resolve_optimizer(optimizer, params)?;

        info!(params = store.parameters().len(); "built lars optimizer from spec");
        Lars::with_filters(store, lars, &self.decay_filter, &self.lars_filter)
    }

    /// Parses a JSON `LarsSpec` and builds it.
    ///
    /// # Arguments
    /// * `json` - The JSON encoded specification.
    /// * `params` - The ordered parameters to train.
    ///
    /// # Returns
    /// A new `Lars` optimizer, an `InvalidSpec` error if the JSON is malformed or a
    /// configuration error.
    pub fn build_json(&self, json: &str, params: Vec<Parameter>) -> Result<Lars<BoxedStore>> {
        let spec = serde_json::from_str(json)?;
        self.build(spec, params)
    }

    /// Resolves the `ParameterStore` for this optimizer.
    ///
    /// # Arguments
    /// * `spec` - The specification of the update rule.
    /// * `params` - The ordered parameters to train.
    ///
    /// # Returns
    /// A new store or an error if its learning rate is invalid.
    fn resolve_optimizer(&self, spec: OptimizerSpec, params: Vec<Parameter>) -> Result<BoxedStore> {
        match spec {
            OptimizerSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                let factory = |len| boxed(Adam::new(len, beta1, beta2, epsilon));
                ParameterStore::new(params, LearningRate::from(learning_rate), factory)
            }
            OptimizerSpec::GradientDescent { learning_rate } => {
                let factory = |_| boxed(GradientDescent::new());
                ParameterStore::new(params, LearningRate::from(learning_rate), factory)
            }
            OptimizerSpec::GradientDescentWithMomentum {
                learning_rate,
                momentum,
            } => {
                let factory = |len| boxed(GradientDescentWithMomentum::new(len, momentum));
                ParameterStore::new(params, LearningRate::from(learning_rate), factory)
            }
        }
    }
}

fn boxed<O: Optimizer + Send + 'static>(optimizer: O) -> Box<dyn Optimizer + Send> {
    Box::new(optimizer)
}
