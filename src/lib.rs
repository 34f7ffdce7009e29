pub mod config;
pub mod error;
pub mod measure;
pub mod pose;
pub mod record;
pub mod render;
pub mod session;

pub use error::{Error, Result};
pub use session::{FrameMeasurements, MeasurementSession};
