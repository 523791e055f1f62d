use ndarray::{Array, ArrayD, Dimension};

/// A named trainable tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    value: ArrayD<f32>,
}

impl Parameter {
    /// Creates a new `Parameter`.
    ///
    /// # Arguments
    /// * `name` - The identity of the parameter, used by the decay and LARS filters.
    /// * `value` - The initial value, it's stored in standard (row major) layout.
    ///
    /// # Returns
    /// A new `Parameter` instance.
    pub fn new<D: Dimension>(name: impl Into<String>, value: Array<f32, D>) -> Self {
        Self {
            name: name.into(),
            value: value.into_dyn().as_standard_layout().into_owned(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &ArrayD<f32> {
        &self.value
    }

    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    pub(crate) fn value_mut(&mut self) -> &mut ArrayD<f32> {
        &mut self.value
    }
}
