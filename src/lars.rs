use log::{debug, info, warn};
use ndarray::ArrayD;
use rayon::prelude::*;

use crate::{
    Delegate, GradientScaler, LarsConfig, LarsErr, LarsUpdate, LearningRateSource, Parameter,
    ParameterGate, Result, gate::default_filter,
};

/// Layer-wise adaptive rate scaling on top of another optimizer.
///
/// Every step rescales the gradients by the loss scale, replaces the gradient of each
/// gated parameter by its LARS corrected version and hands the result to the wrapped
/// `Delegate`.
#[derive(Debug)]
pub struct Lars<D: Delegate> {
    delegate: D,
    config: LarsConfig,
    update: LarsUpdate,
    scaler: GradientScaler,
    gate: ParameterGate,
    learning_rate: LearningRateSource,
}

impl<D: Delegate> Lars<D> {
    /// Creates a new `Lars` optimizer that skips weight decay and LARS on
    /// normalization and bias parameters.
    ///
    /// # Arguments
    /// * `delegate` - The optimizer to wrap, it must use a single global learning rate.
    /// * `config` - The LARS hyperparameters.
    ///
    /// # Returns
    /// A new `Lars` instance or a configuration error.
    pub fn new(delegate: D, config: LarsConfig) -> Result<Self> {
        Self::with_filters(delegate, config, default_filter, default_filter)
    }

    /// Creates a new `Lars` optimizer with custom parameter filters.
    ///
    /// The filters are evaluated once per parameter, here.
    ///
    /// # Arguments
    /// * `delegate` - The optimizer to wrap, it must use a single global learning rate.
    /// * `config` - The LARS hyperparameters.
    /// * `decay_filter` - Decides which parameters get weight decay.
    /// * `lars_filter` - Decides which parameters get the LARS rule.
    ///
    /// # Returns
    /// A new `Lars` instance, a `GroupedLearningRate` error if the delegate uses per group rates
    /// or an `InvalidConfig` error if any option is out of range.
    pub fn with_filters<FD, FL>(
        delegate: D,
        config: LarsConfig,
        decay_filter: FD,
        lars_filter: FL,
    ) -> Result<Self>
    where
        FD: Fn(&Parameter) -> bool,
        FL: Fn(&Parameter) -> bool,
    {
        if delegate.learning_rate().is_grouped() {
            return Err(LarsErr::GroupedLearningRate);
        }

        config.validate()?;

        let learning_rate = LearningRateSource::new(delegate.learning_rate())?;
        let gate = ParameterGate::new(delegate.parameters(), decay_filter, lars_filter);

        info!(
            params = gate.len(),
            dynamic_lr = learning_rate.is_dynamic(),
            use_clip = config.use_clip;
            "lars optimizer ready"
        );

        Ok(Self {
            delegate,
            config,
            update: LarsUpdate::new(&config),
            scaler: GradientScaler::new(config.loss_scale),
            gate,
            learning_rate,
        })
    }

    /// Performs a full optimization step.
    ///
    /// The gradients are validated before anything else happens, a malformed step neither
    /// consumes a learning rate nor reaches the delegate.
    ///
    /// # Arguments
    /// * `grads` - One gradient per parameter, in the delegate's parameter order.
    ///
    /// # Returns
    /// The delegate's output, or an error if the gradients are malformed or the learning
    /// rate schedule ran out.
    pub fn step(&mut self, grads: Vec<ArrayD<f32>>) -> Result<D::Output> {
        self.check_gradients(&grads)?;

        let step = self.learning_rate.step();
        let lr = self.learning_rate.current_rate().inspect_err(|e| {
            warn!(step = step; "aborting lars step: {e}");
        })?;

        debug!(step = step, lr = lr, params = grads.len(); "applying lars step");

        let corrected = self.correct(lr, grads);
        Ok(self.delegate.apply(&corrected))
    }

    /// Computes the corrected gradients for a given learning rate without stepping.
    ///
    /// The step counter is left untouched and the result only depends on the inputs.
    ///
    /// # Arguments
    /// * `lr` - The global learning rate to use.
    /// * `grads` - One gradient per parameter, in the delegate's parameter order.
    ///
    /// # Returns
    /// The corrected gradients, in the same order, or an error if the gradients are malformed.
    pub fn transform(&self, lr: f32, grads: Vec<ArrayD<f32>>) -> Result<Vec<ArrayD<f32>>> {
        self.check_gradients(&grads)?;
        Ok(self.correct(lr, grads))
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn into_inner(self) -> D {
        self.delegate
    }

    pub fn config(&self) -> &LarsConfig {
        &self.config
    }

    pub fn gate(&self) -> &ParameterGate {
        &self.gate
    }

    /// Returns the amount of learning rates consumed so far, always `0` for static rates.
    pub fn global_step(&self) -> usize {
        self.learning_rate.step()
    }

    fn check_gradients(&self, grads: &[ArrayD<f32>]) -> Result<()> {
        let params = self.delegate.parameters();

        if grads.len() != params.len() {
            return Err(LarsErr::GradientCountMismatch {
                got: grads.len(),
                expected: params.len(),
            });
        }

        for (index, (grad, param)) in grads.iter().zip(params).enumerate() {
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

    fn correct(&self, lr: f32, mut grads: Vec<ArrayD<f32>>) -> Vec<ArrayD<f32>> {
        self.scaler.scale(&mut grads);

        let update = self.update;

        grads
            .into_par_iter()
            .zip(self.delegate.parameters().par_iter())
            .zip(self.gate.as_slice().par_iter())
            .map(|((grad, param), &flags)| update.apply(param.value().view(), grad, lr, flags))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{Array1, Array2, array};

    use super::*;
    use crate::LearningRate;

    #[derive(Debug)]
    struct RecordingDelegate {
        params: Vec<Parameter>,
        learning_rate: LearningRate,
        applied: Vec<Vec<ArrayD<f32>>>,
    }

    impl RecordingDelegate {
        fn new(learning_rate: LearningRate) -> Self {
            let params = vec![
                Parameter::new(
                    "fc.weight",
                    array![[0.5_f32, -1.], [2., 0.25], [1., 1.]],
                ),
                Parameter::new("fc.bias", array![0.1_f32, -0.1]),
                Parameter::new("LayerNorm.gamma", Array1::<f32>::ones(2)),
            ];

            Self {
                params,
                learning_rate,
                applied: Vec::new(),
            }
        }
    }

    impl Delegate for RecordingDelegate {
        type Output = usize;

        fn parameters(&self) -> &[Parameter] {
            &self.params
        }

        fn learning_rate(&self) -> &LearningRate {
            &self.learning_rate
        }

        fn apply(&mut self, grads: &[ArrayD<f32>]) -> usize {
            self.applied.push(grads.to_vec());
            self.applied.len()
        }
    }

    fn grads() -> Vec<ArrayD<f32>> {
        vec![
            array![[0.2_f32, 0.4], [-0.6, 0.8], [0., 1.]].into_dyn(),
            array![0.3_f32, -0.5].into_dyn(),
            array![1_f32, 2.].into_dyn(),
        ]
    }

    #[test]
    fn test_step_forwards_corrected_gradients() {
        let delegate = RecordingDelegate::new(LearningRate::Static(0.1));
        let config = LarsConfig::default().with_weight_decay(0.01);
        let mut lars = Lars::new(delegate, config).unwrap();

        let expected = LarsUpdate::new(&config).apply(
            lars.delegate().parameters()[0].value().view(),
            grads()[0].clone(),
            0.1,
            lars.gate().flags(0).unwrap(),
        );

        assert_eq!(lars.step(grads()).unwrap(), 1);

        let applied = &lars.delegate().applied[0];
        assert_eq!(applied.len(), 3);
        assert_eq!(applied[0], expected);
        assert_eq!(applied[1], grads()[1]);
        assert_eq!(applied[2], grads()[2]);
    }

    #[test]
    fn test_ungated_parameters_get_loss_scaled_gradient() {
        let delegate = RecordingDelegate::new(LearningRate::Static(0.1));
        let config = LarsConfig::default().with_loss_scale(2.);
        let mut lars = Lars::new(delegate, config).unwrap();

        lars.step(grads()).unwrap();

        let applied = &lars.delegate().applied[0];
        assert_eq!(applied[1], grads()[1].mapv(|g| g * 0.5));
        assert_eq!(applied[2], grads()[2].mapv(|g| g * 0.5));
    }

    #[test]
    fn test_loss_scale_halves_transform_input() {
        let unscaled = Lars::new(
            RecordingDelegate::new(LearningRate::Static(0.1)),
            LarsConfig::default(),
        )
        .unwrap();
        let scaled = Lars::new(
            RecordingDelegate::new(LearningRate::Static(0.1)),
            LarsConfig::default().with_loss_scale(2.),
        )
        .unwrap();

        let halved: Vec<_> = grads().into_iter().map(|g| g * 0.5_f32).collect();

        assert_eq!(
            scaled.transform(0.1, grads()).unwrap(),
            unscaled.transform(0.1, halved).unwrap()
        );
    }

    #[test]
    fn test_grouped_learning_rate_is_rejected() {
        let delegate = RecordingDelegate::new(LearningRate::Grouped(vec![0.1, 0.2, 0.3].into()));

        let err = Lars::new(delegate, LarsConfig::default()).unwrap_err();
        assert!(matches!(err, LarsErr::GroupedLearningRate));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let delegate = RecordingDelegate::new(LearningRate::Static(0.1));

        let err = Lars::new(delegate, LarsConfig::default().with_hyperpara(0.)).unwrap_err();
        assert!(matches!(
            err,
            LarsErr::InvalidConfig {
                option: "hyperpara",
                ..
            }
        ));
    }

    #[test]
    fn test_dynamic_schedule_advances_once_per_step() {
        let rates = vec![0.3, 0.2, 0.1];
        let delegate = RecordingDelegate::new(LearningRate::from(rates.clone()));
        let mut lars = Lars::new(delegate, LarsConfig::default()).unwrap();

        for (i, lr) in rates.into_iter().enumerate() {
            let expected = lars.transform(lr, grads()).unwrap();
            assert_eq!(lars.global_step(), i);

            lars.step(grads()).unwrap();
            assert_eq!(lars.delegate().applied[i], expected);
        }

        assert_eq!(lars.global_step(), 3);
        assert!(matches!(
            lars.step(grads()),
            Err(LarsErr::ScheduleExhausted { step: 3, len: 3 })
        ));
        assert_eq!(lars.delegate().applied.len(), 3);
    }

    #[test]
    fn test_shape_mismatch_aborts_step() {
        let delegate = RecordingDelegate::new(LearningRate::from(vec![0.1, 0.1]));
        let mut lars = Lars::new(delegate, LarsConfig::default()).unwrap();

        let mut bad = grads();
        bad[1] = Array2::<f32>::zeros((2, 1)).into_dyn();

        match lars.step(bad) {
            Err(LarsErr::ShapeMismatch {
                index,
                got,
                expected,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(got, vec![2, 1]);
                assert_eq!(expected, vec![2]);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }

        assert_eq!(lars.global_step(), 0);
        assert!(lars.delegate().applied.is_empty());
    }

    #[test]
    fn test_gradient_count_mismatch_aborts_step() {
        let delegate = RecordingDelegate::new(LearningRate::Static(0.1));
        let mut lars = Lars::new(delegate, LarsConfig::default()).unwrap();

        let mut short = grads();
        short.pop();

        assert!(matches!(
            lars.step(short),
            Err(LarsErr::GradientCountMismatch {
                got: 2,
                expected: 3
            })
        ));
        assert!(lars.delegate().applied.is_empty());
    }

    #[test]
    fn test_transform_is_bit_identical() {
        let delegate = RecordingDelegate::new(LearningRate::from(vec![0.1]));
        let config = LarsConfig::default()
            .with_weight_decay(1e-4)
            .with_clip(true)
            .with_loss_scale(128.);
        let lars = Lars::new(delegate, config).unwrap();

        let a = lars.transform(0.1, grads()).unwrap();
        let b = lars.transform(0.1, grads()).unwrap();

        assert_eq!(a, b);
        assert_eq!(lars.global_step(), 0);
    }

    #[test]
    fn test_custom_filters() {
        let delegate = RecordingDelegate::new(LearningRate::Static(0.1));
        let mut lars = Lars::with_filters(delegate, LarsConfig::default(), |_| false, |_| false)
            .unwrap();

        lars.step(grads()).unwrap();
        assert_eq!(lars.delegate().applied[0], grads());
        assert!(lars.gate().iter().all(|f| !f.apply_decay && !f.apply_lars));
    }
}
