use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::{LarsErr, Result, config::check_non_negative};

/// The learning rate exposed by a delegate optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum LearningRate {
    /// A single rate for every step.
    Static(f32),
    /// A precomputed rate per step, it must cover the whole training horizon.
    Dynamic(Arc<[f32]>),
    /// A rate per parameter, index-aligned with the parameters.
    Grouped(Arc<[f32]>),
}

impl LearningRate {
    pub fn is_grouped(&self) -> bool {
        matches!(self, LearningRate::Grouped(_))
    }

    /// Checks every rate is finite and non negative and that schedules aren't empty.
    pub fn validate(&self) -> Result<()> {
        let rates = match self {
            LearningRate::Static(rate) => return check_non_negative("learning_rate", *rate),
            LearningRate::Dynamic(rates) | LearningRate::Grouped(rates) => rates,
        };

        if rates.is_empty() {
            return Err(LarsErr::EmptySchedule);
        }

        rates
            .iter()
            .try_for_each(|&rate| check_non_negative("learning_rate", rate))
    }
}

impl From<f32> for LearningRate {
    fn from(value: f32) -> Self {
        Self::Static(value)
    }
}

impl From<Vec<f32>> for LearningRate {
    fn from(value: Vec<f32>) -> Self {
        Self::Dynamic(value.into())
    }
}

/// Supplies the global learning rate for each step.
#[derive(Debug)]
pub enum LearningRateSource {
    Static(f32),
    Dynamic {
        rates: Arc<[f32]>,
        step: AtomicUsize,
    },
}

impl LearningRateSource {
    /// Creates a new `LearningRateSource` with its step counter at zero.
    ///
    /// # Arguments
    /// * `learning_rate` - The rate to serve, dynamic schedules are shared, not copied.
    ///
    /// # Returns
    /// A `GroupedLearningRate` error if the rate is per group, or the error of `LearningRate::validate`.
    pub fn new(learning_rate: &LearningRate) -> Result<Self> {
        if learning_rate.is_grouped() {
            return Err(LarsErr::GroupedLearningRate);
        }

        learning_rate.validate()?;

        match learning_rate {
            LearningRate::Static(rate) => Ok(Self::Static(*rate)),
            LearningRate::Dynamic(rates) => Ok(Self::Dynamic {
                rates: Arc::clone(rates),
                step: AtomicUsize::new(0),
            }),
            LearningRate::Grouped(_) => Err(LarsErr::GroupedLearningRate),
        }
    }

    /// Returns the rate for the current step and advances the step counter.
    ///
    /// Concurrent callers each observe a distinct step, with no gaps.
    ///
    /// # Returns
    /// The current rate or a `ScheduleExhausted` error if the schedule is too short.
    pub fn current_rate(&self) -> Result<f32> {
        match self {
            LearningRateSource::Static(rate) => Ok(*rate),
            LearningRateSource::Dynamic { rates, step } => {
                let step = step.fetch_add(1, Ordering::AcqRel);

                rates
                    .get(step)
                    .copied()
                    .ok_or(LarsErr::ScheduleExhausted {
                        step,
                        len: rates.len(),
                    })
            }
        }
    }

    /// Returns the amount of rates consumed so far, always `0` for static rates.
    pub fn step(&self) -> usize {
        match self {
            LearningRateSource::Static(_) => 0,
            LearningRateSource::Dynamic { step, .. } => step.load(Ordering::Acquire),
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, LearningRateSource::Dynamic { .. })
    }
}
