use crate::Parameter;

/// Whether weight decay and the LARS rule apply to a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterFlags {
    pub apply_decay: bool,
    pub apply_lars: bool,
}

/// The default decay and LARS filter.
///
/// Normalization scales and biases are left alone, any other parameter passes.
pub fn default_filter(param: &Parameter) -> bool {
    let name = param.name();
    !name.contains("LayerNorm") && !name.contains("bias")
}

/// Per parameter flags, computed once and frozen for the lifetime of the optimizer.
#[derive(Debug, Clone)]
pub struct ParameterGate {
    flags: Box<[ParameterFlags]>,
}

impl ParameterGate {
    /// Creates a new `ParameterGate`.
    ///
    /// # Arguments
    /// * `params` - The ordered parameters of the wrapped optimizer.
    /// * `decay_filter` - Decides whether a parameter gets weight decay.
    /// * `lars_filter` - Decides whether a parameter gets the LARS rule.
    ///
    /// # Returns
    /// A new `ParameterGate` with one entry per parameter, in the same order.
    pub fn new<FD, FL>(params: &[Parameter], decay_filter: FD, lars_filter: FL) -> Self
    where
        FD: Fn(&Parameter) -> bool,
        FL: Fn(&Parameter) -> bool,
    {
        let flags = params
            .iter()
            .map(|param| ParameterFlags {
                apply_decay: decay_filter(param),
                apply_lars: lars_filter(param),
            })
            .collect();

        Self { flags }
    }

    pub fn flags(&self, index: usize) -> Option<ParameterFlags> {
        self.flags.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterFlags> {
        self.flags.iter()
    }

    pub fn as_slice(&self) -> &[ParameterFlags] {
        &self.flags
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
