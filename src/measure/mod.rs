pub mod analysis;
pub mod calculator;
pub mod calibrator;
pub mod definitions;
pub mod stabilizer;

pub use analysis::{validate, BodyProportions, RangeWarning};
pub use calculator::{compute_measurements, pixel_length, MeasurementSet};
pub use calibrator::{calibrate, calibrate_from_reference, Calibration, Reference};
pub use definitions::{Measurement, Rule};
pub use stabilizer::Stabilizer;
