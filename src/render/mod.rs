pub mod report;
pub mod skeleton;

pub use report::{calibration_status, format_analysis, format_report};
pub use skeleton::{
    keypoint_markers, measurement_segments, visible_segments, Marker, Segment, SKELETON_CONNECTIONS,
};
