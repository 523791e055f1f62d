mod builder;
mod config;
mod delegate;
mod error;
mod gate;
mod lars;
mod local_rate;
pub mod optimization;
mod parameter;
mod scaler;
mod schedule;
pub mod specs;

pub use builder::{BoxedStore, LarsBuilder};
pub use config::LarsConfig;
pub use delegate::Delegate;
pub use error::{LarsErr, Result};
pub use gate::{ParameterFlags, ParameterGate, default_filter};
pub use lars::Lars;
pub use local_rate::{LarsUpdate, square_sum_all};
pub use parameter::Parameter;
pub use scaler::GradientScaler;
pub use schedule::{LearningRate, LearningRateSource};
